//! Device
//!
//! Port contract between the instrument and whatever produces sound, plus
//! two adapters: an in-memory recorder and a raw MIDI byte writer.
//!
//! Messages are validated against their MIDI wire widths when sent and
//! encoded with `midly`.

use std::io::Write;

use midly::{
    live::{LiveEvent, SystemRealtime},
    num::{u14, u4, u7},
    MidiMessage, PitchBend,
};
use thiserror::Error;

/// Controller number of channel volume, the default continuous controller.
pub const CHANNEL_VOLUME: u8 = 7;

/// Centre position of the 14-bit pitch wheel.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Errors raised by device ports.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A message field does not fit its MIDI data width.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u32,
    },

    /// The port was used after `close`.
    #[error("device port is closed")]
    Closed,

    /// Writing to the underlying transport failed.
    #[error("device i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// One message for the sound-producing device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceMessage {
    /// Start sounding a note.
    NoteOn {
        /// Note number (0..=127).
        note: u8,
        /// Attack velocity (0..=127).
        velocity: u8,
        /// Channel (0..=15).
        channel: u8,
    },
    /// Stop sounding a note.
    NoteOff {
        /// Note number (0..=127).
        note: u8,
        /// Release velocity (0..=127).
        velocity: u8,
        /// Channel (0..=15).
        channel: u8,
    },
    /// Continuous controller change.
    ControlChange {
        /// Controller number (0..=127).
        controller: u8,
        /// Controller value (0..=127).
        value: u8,
        /// Channel (0..=15).
        channel: u8,
    },
    /// Pitch wheel position.
    PitchBend {
        /// 14-bit position, `PITCH_BEND_CENTER` is no bend.
        value: u16,
        /// Channel (0..=15).
        channel: u8,
    },
    /// System reset.
    Reset,
}

impl DeviceMessage {
    /// Convert into a `midly` live event, checking every field width.
    pub fn to_live_event(&self) -> Result<LiveEvent<'static>, DeviceError> {
        let event = match *self {
            DeviceMessage::NoteOn {
                note,
                velocity,
                channel,
            } => LiveEvent::Midi {
                channel: channel_field(channel)?,
                message: MidiMessage::NoteOn {
                    key: data_field("note", note)?,
                    vel: data_field("velocity", velocity)?,
                },
            },
            DeviceMessage::NoteOff {
                note,
                velocity,
                channel,
            } => LiveEvent::Midi {
                channel: channel_field(channel)?,
                message: MidiMessage::NoteOff {
                    key: data_field("note", note)?,
                    vel: data_field("velocity", velocity)?,
                },
            },
            DeviceMessage::ControlChange {
                controller,
                value,
                channel,
            } => LiveEvent::Midi {
                channel: channel_field(channel)?,
                message: MidiMessage::Controller {
                    controller: data_field("controller", controller)?,
                    value: data_field("value", value)?,
                },
            },
            DeviceMessage::PitchBend { value, channel } => {
                let bend = u14::try_from(value).ok_or(DeviceError::OutOfRange {
                    field: "pitch bend",
                    value: u32::from(value),
                })?;
                LiveEvent::Midi {
                    channel: channel_field(channel)?,
                    message: MidiMessage::PitchBend {
                        bend: PitchBend(bend),
                    },
                }
            }
            DeviceMessage::Reset => LiveEvent::Realtime(SystemRealtime::Reset),
        };
        Ok(event)
    }

    /// Raw MIDI bytes of this message.
    pub fn encode(&self) -> Result<Vec<u8>, DeviceError> {
        let mut buf = Vec::with_capacity(3);
        self.to_live_event()?.write_std(&mut buf)?;
        Ok(buf)
    }
}

fn data_field(field: &'static str, value: u8) -> Result<u7, DeviceError> {
    u7::try_from(value).ok_or(DeviceError::OutOfRange {
        field,
        value: u32::from(value),
    })
}

fn channel_field(channel: u8) -> Result<u4, DeviceError> {
    u4::try_from(channel).ok_or(DeviceError::OutOfRange {
        field: "channel",
        value: u32::from(channel),
    })
}

/// Output side of a sound-producing device.
///
/// Implementations own the device handle; dropping or closing the port
/// releases it.
pub trait DevicePort {
    /// Transmit one message.
    fn send(&mut self, message: DeviceMessage) -> Result<(), DeviceError>;

    /// Release the device. Further sends fail with `DeviceError::Closed`.
    fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl<P: DevicePort + ?Sized> DevicePort for Box<P> {
    fn send(&mut self, message: DeviceMessage) -> Result<(), DeviceError> {
        (**self).send(message)
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        (**self).close()
    }
}

/// Port that keeps every message it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingPort {
    messages: Vec<DeviceMessage>,
    closed: bool,
}

impl RecordingPort {
    /// An open, empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far.
    pub fn messages(&self) -> &[DeviceMessage] {
        &self.messages
    }

    /// Drain the received messages.
    pub fn take(&mut self) -> Vec<DeviceMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Note numbers of every note-on received, in order.
    pub fn notes_on(&self) -> Vec<u8> {
        self.messages
            .iter()
            .filter_map(|m| match *m {
                DeviceMessage::NoteOn { note, .. } => Some(note),
                _ => None,
            })
            .collect()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DevicePort for RecordingPort {
    fn send(&mut self, message: DeviceMessage) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        message.to_live_event()?;
        self.messages.push(message);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }
}

/// Port writing raw MIDI bytes to any `Write` transport (serial line, pipe, file).
#[derive(Debug)]
pub struct WirePort<W: Write> {
    out: W,
    closed: bool,
}

impl<W: Write> WirePort<W> {
    /// Wrap an open transport.
    pub fn new(out: W) -> Self {
        WirePort { out, closed: false }
    }

    /// Give back the transport.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DevicePort for WirePort<W> {
    fn send(&mut self, message: DeviceMessage) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        message.to_live_event()?.write_std(&mut self.out)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        if !self.closed {
            self.closed = true;
            self.out.flush()?;
        }
        Ok(())
    }
}
