//! Chord Selector
//!
//! The playable instrument: holds the current key and its cached chord
//! tables, picks chords by degree and modifiers, and drives a device port.

use log::{debug, info, warn};

use crate::chord_table::{build_tables, ChordTables, Key, NoteSet};
use crate::device::{DeviceError, DeviceMessage, DevicePort, CHANNEL_VOLUME};
use crate::tonality::{chord_name, grade_name, tonality_name, Grade};

/// Interval of the sub-minor borrow: the key a minor third above.
const SUB_MINOR_SHIFT: i32 = 3;

const OCTAVE: i32 = 12;

/// Number of MIDI notes.
const NOTE_COUNT: i32 = 128;

/// Chord modifiers. Both may be combined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Play the dominant seventh resolving to the degree instead of the degree itself.
    pub secondary_dominant: bool,
    /// Borrow from the key a minor third above, with the degree remapped.
    pub sub_minor: bool,
}

impl Modifiers {
    /// No modifier: the plain diatonic chord.
    pub const NONE: Modifiers = Modifiers {
        secondary_dominant: false,
        sub_minor: false,
    };

    /// Set the secondary-dominant flag.
    pub const fn secondary_dominant(self, on: bool) -> Self {
        Modifiers {
            secondary_dominant: on,
            ..self
        }
    }

    /// Set the sub-minor flag.
    pub const fn sub_minor(self, on: bool) -> Self {
        Modifiers {
            sub_minor: on,
            ..self
        }
    }
}

/// What the player sees for a selected chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChordLabel {
    /// Chord symbol, e.g. `Dm7` or `A7`.
    pub label: String,
    /// Roman-numeral degree the chord was taken from.
    pub grade_name: &'static str,
}

/// Builder for `ChordSelector` to customize key, channel and velocity
pub struct ChordSelectorBuilder {
    key: Key,
    channel: u8,
    velocity: u8,
}

impl ChordSelectorBuilder {
    /// Start with key = 60 (middle C), channel = 0, velocity = 64.
    pub fn new() -> Self {
        ChordSelectorBuilder {
            key: Key::DEFAULT,
            channel: 0,
            velocity: 64,
        }
    }

    /// Set the starting key.
    pub fn key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    /// Set the channel every message is sent on.
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set the velocity of emitted notes.
    pub fn velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    /// Build the selector around `port` and silence every note on its channel.
    pub fn start<P: DevicePort>(self, port: P) -> Result<ChordSelector<P>, DeviceError> {
        let mut selector = self.build(port);
        selector.release_pedal()?;
        info!("instrument started in {}", selector.current_tonality());
        Ok(selector)
    }

    /// Build the selector around `port` without touching the device.
    pub fn build<P: DevicePort>(self, port: P) -> ChordSelector<P> {
        ChordSelector {
            key: self.key,
            tables: build_tables(self.key),
            channel: self.channel,
            velocity: self.velocity,
            port,
        }
    }
}

impl Default for ChordSelectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Harmonic instrument bound to one device port.
///
/// One instance per session. Methods take `&mut self`, so sharing across
/// threads needs an outer lock around the whole selector.
pub struct ChordSelector<P: DevicePort> {
    key: Key,
    // always build_tables(key)
    tables: ChordTables,
    channel: u8,
    velocity: u8,
    port: P,
}

impl<P: DevicePort> ChordSelector<P> {
    /// Selector with default settings.
    pub fn new(port: P) -> Self {
        ChordSelectorBuilder::new().build(port)
    }

    /// Default selector that has already silenced the device.
    pub fn start(port: P) -> Result<Self, DeviceError> {
        ChordSelectorBuilder::new().start(port)
    }

    /// Current key.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Cached tables of the current key.
    pub fn tables(&self) -> &ChordTables {
        &self.tables
    }

    /// The device port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// The device port, mutably.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Name of the current key's tonic.
    pub fn current_tonality(&self) -> &'static str {
        tonality_name(self.key.pitch())
    }

    /// Move the key by `delta` semitones and rebuild the tables.
    pub fn move_tonality(&mut self, delta: i32) {
        self.key = self.key.transpose(delta);
        self.tables = build_tables(self.key);
        debug!("moved tonality by {delta} to {}", self.current_tonality());
    }

    /// Chord and label for `grade` under `modifiers`, without sounding it.
    pub fn chord_for(&self, grade: Grade, modifiers: Modifiers) -> (NoteSet, ChordLabel) {
        let (key, grade, borrowed) = if modifiers.sub_minor {
            let key = self.key.transpose(SUB_MINOR_SHIFT);
            (key, grade.sub_minor(), Some(build_tables(key)))
        } else {
            (self.key, grade, None)
        };
        let tables = borrowed.as_ref().unwrap_or(&self.tables);

        let (notes, label) = if modifiers.secondary_dominant {
            // named as the V of the key rooted on the target degree
            let target = key.tonality().transpose(grade.root_offset());
            (
                tables.secondary_dominant[grade].clone(),
                chord_name(target, Grade::V),
            )
        } else {
            (
                tables.diatonic[grade].clone(),
                chord_name(key.tonality(), grade),
            )
        };

        let label = ChordLabel {
            label,
            grade_name: grade_name(grade),
        };
        (notes, label)
    }

    /// Release the chord register and sound the chord of `grade`.
    pub fn select_chord(
        &mut self,
        grade: Grade,
        modifiers: Modifiers,
    ) -> Result<ChordLabel, DeviceError> {
        let (notes, label) = self.chord_for(grade, modifiers);
        debug!(
            "{} ({}) {:?}: {} notes",
            label.label,
            label.grade_name,
            modifiers,
            notes.len()
        );

        self.release_chords_pedal()?;
        for &note in &notes {
            self.note_on(note)?;
        }
        Ok(label)
    }

    /// Sound one note `offset` semitones above the octave over the key.
    pub fn play_single_note(&mut self, offset: i32) -> Result<(), DeviceError> {
        let note = self.key.pitch().checked_add(OCTAVE).and_then(|n| n.checked_add(offset));
        match note {
            Some(note) => self.note_on(note),
            None => {
                warn!("skipping single note at offset {offset} outside the MIDI range");
                Ok(())
            }
        }
    }

    /// Send a controller change; `controller` defaults to channel volume.
    pub fn send_control_change(
        &mut self,
        value: u8,
        controller: Option<u8>,
    ) -> Result<(), DeviceError> {
        self.port.send(DeviceMessage::ControlChange {
            controller: controller.unwrap_or(CHANNEL_VOLUME),
            value,
            channel: self.channel,
        })
    }

    /// Move the pitch wheel (14-bit, 8192 is centre).
    pub fn send_pitch_bend(&mut self, value: u16) -> Result<(), DeviceError> {
        self.port.send(DeviceMessage::PitchBend {
            value,
            channel: self.channel,
        })
    }

    /// Stop every note on the channel, resetting the device after each.
    pub fn release_pedal(&mut self) -> Result<(), DeviceError> {
        self.release_below(NOTE_COUNT)
    }

    /// Stop every note below the octave over the key, where chords sound.
    pub fn release_chords_pedal(&mut self) -> Result<(), DeviceError> {
        self.release_below(self.key.pitch().saturating_add(OCTAVE))
    }

    /// Release the device and hand back the port.
    pub fn close(mut self) -> Result<P, DeviceError> {
        self.port.close()?;
        info!("instrument closed");
        Ok(self.port)
    }

    fn release_below(&mut self, end: i32) -> Result<(), DeviceError> {
        for note in 0..end.clamp(0, NOTE_COUNT) {
            self.port.send(DeviceMessage::NoteOff {
                note: note as u8,
                velocity: 0,
                channel: self.channel,
            })?;
            self.port.send(DeviceMessage::Reset)?;
        }
        Ok(())
    }

    fn note_on(&mut self, note: i32) -> Result<(), DeviceError> {
        match u8::try_from(note) {
            Ok(note) if i32::from(note) < NOTE_COUNT => self.port.send(DeviceMessage::NoteOn {
                note,
                velocity: self.velocity,
                channel: self.channel,
            }),
            _ => {
                warn!("skipping note {note} outside the MIDI range");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingPort;

    #[test]
    fn builder_defaults() {
        let selector = ChordSelectorBuilder::new().build(RecordingPort::new());
        assert_eq!(selector.key(), Key::DEFAULT);
        assert_eq!(selector.channel, 0);
        assert_eq!(selector.velocity, 64);
        assert_eq!(selector.tables(), &build_tables(Key::DEFAULT));
    }

    #[test]
    fn chord_for_does_not_emit() {
        let selector = ChordSelector::new(RecordingPort::new());
        let (notes, label) = selector.chord_for(Grade::VII, Modifiers::NONE);
        assert_eq!(label.label, "Bm7(b5)");
        assert_eq!(label.grade_name, "vii°");
        assert_eq!(notes.notes(), [59, 62, 65, 69]);
        assert!(selector.port().messages().is_empty());
    }

    #[test]
    fn extreme_offsets_and_moves_are_skipped() {
        let mut selector = ChordSelector::new(RecordingPort::new());
        selector.play_single_note(i32::MAX).unwrap();
        selector.play_single_note(i32::MIN).unwrap();
        assert!(selector.port().messages().is_empty());

        selector.move_tonality(i32::MAX);
        assert_eq!(selector.key(), Key::new(i32::MAX));
        selector.play_single_note(0).unwrap();
        let label = selector
            .select_chord(Grade::I, Modifiers::NONE.sub_minor(true))
            .unwrap();
        assert_eq!(label.grade_name, "vi");
        assert!(selector.port().notes_on().is_empty());
        assert_eq!(selector.port().messages().len(), 256);

        selector.port_mut().take();
        selector.move_tonality(i32::MIN);
        selector.move_tonality(i32::MIN);
        assert_eq!(selector.key(), Key::new(i32::MIN));
        selector.release_chords_pedal().unwrap();
        selector
            .select_chord(Grade::V, Modifiers::NONE.secondary_dominant(true))
            .unwrap();
        assert!(selector.port().messages().is_empty());
    }

    #[test]
    fn builder_start_releases_on_the_configured_channel() {
        let selector = ChordSelectorBuilder::new()
            .key(Key::new(48))
            .channel(5)
            .start(RecordingPort::new())
            .unwrap();
        let messages = selector.port().messages();
        assert_eq!(messages.len(), 256);
        assert_eq!(
            messages[0],
            DeviceMessage::NoteOff {
                note: 0,
                velocity: 0,
                channel: 5
            }
        );
        assert_eq!(selector.key(), Key::new(48));
    }

    #[test]
    fn chord_release_tracks_the_key() {
        let mut selector = ChordSelector::new(RecordingPort::new());
        selector.move_tonality(-60);
        selector.release_chords_pedal().unwrap();
        assert_eq!(selector.port().messages().len(), 24);

        selector.port_mut().take();
        selector.move_tonality(-20);
        selector.release_chords_pedal().unwrap();
        assert!(selector.port().messages().is_empty());
    }
}
