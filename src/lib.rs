//! # keys_harmony
//!
//! A small harmonic instrument: pick a scale degree of the current key, add
//! modifiers, and the matching chord is sounded on a device while its label
//! comes back for display.
//!
//! ## Example
//! ```rust
//! use keys_harmony::{ChordSelector, Grade, Modifiers, RecordingPort};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Build an instrument around a device port
//!     let mut instrument = ChordSelector::start(RecordingPort::new())?;
//!
//!     // 2) Play the V7 of the ii chord
//!     let chord = instrument.select_chord(
//!         Grade::new(2)?,
//!         Modifiers::NONE.secondary_dominant(true),
//!     )?;
//!     assert_eq!(chord.label, "A7");
//!
//!     // 3) Change key and release the device
//!     instrument.move_tonality(7);
//!     assert_eq!(instrument.current_tonality(), "G");
//!     instrument.close()?;
//!
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! The crate logs through the `log` facade and never installs a logger.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Chord selection and device control.
pub use chord_selector::{ChordLabel, ChordSelector, ChordSelectorBuilder, Modifiers};

/// Chord tables and voicing alterations.
pub use chord_table::{
    add_tension, build_tables, invert, ChordTable, ChordTables, Key, NoteSet, Tension,
};

/// Device port contract and adapters.
pub use device::{DeviceError, DeviceMessage, DevicePort, RecordingPort, WirePort};

/// Pitch-class and degree naming.
pub use tonality::{chord_name, grade_name, tonality_name, Grade, NoteName, TonalityError};

/// Chord selector module.
pub mod chord_selector;

/// Chord table module.
pub mod chord_table;

/// Device port module.
pub mod device;

/// Tonality module.
pub mod tonality;
