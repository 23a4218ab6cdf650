//! Tonality
//!
//! Pitch-class naming, scale degrees and chord/degree labels for major keys.

use std::fmt::Display;
use thiserror::Error;

const SEMITONES: i32 = 12;

/// Number of scale degrees in a major key.
pub const NUM_GRADES: usize = 7;

/// Semitone offset of each major-scale degree above the tonic.
const MAJOR_SCALE: [i32; NUM_GRADES] = [0, 2, 4, 5, 7, 9, 11];

/// Seventh-chord suffix of each diatonic degree, same order as `MAJOR_SCALE`.
const DEGREE_SUFFIXES: [&str; NUM_GRADES] = ["maj7", "m7", "m7", "maj7", "7", "m7", "m7(b5)"];

/// Roman-numeral names, uppercase for major degrees.
const GRADE_NAMES: [&str; NUM_GRADES] = ["I", "ii", "iii", "IV", "V", "vi", "vii°"];

/// Errors when converting raw values into tonality types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TonalityError {
    /// A scale degree outside 1..=7 was supplied.
    #[error("grade must be in 1..=7, got {got}")]
    InvalidGrade {
        /// The rejected grade number.
        got: u8,
    },
}

/// Twelve chromatic pitch classes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NoteName {
    /// C
    C,
    /// C sharp
    Cs,
    /// D
    D,
    /// E flat
    Eb,
    /// E
    E,
    /// F
    F,
    /// F sharp
    Fs,
    /// G
    G,
    /// A flat
    Ab,
    /// A
    A,
    /// B flat
    Bb,
    /// B
    B,
}

impl NoteName {
    /// All pitch classes in ascending order from C.
    pub const ALL: [NoteName; SEMITONES as usize] = [
        NoteName::C,
        NoteName::Cs,
        NoteName::D,
        NoteName::Eb,
        NoteName::E,
        NoteName::F,
        NoteName::Fs,
        NoteName::G,
        NoteName::Ab,
        NoteName::A,
        NoteName::Bb,
        NoteName::B,
    ];

    /// Pitch class of a semitone offset from C.
    ///
    /// Total over all integers: offsets wrap every octave, negatives included.
    pub const fn from_offset(offset: i32) -> NoteName {
        NoteName::ALL[offset.rem_euclid(SEMITONES) as usize]
    }

    /// Semitones above C (0..12).
    pub const fn offset(self) -> i32 {
        self as i32
    }

    /// Conventional display name.
    pub const fn name(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Eb => "Eb",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Ab => "Ab",
            NoteName::A => "A",
            NoteName::Bb => "Bb",
            NoteName::B => "B",
        }
    }

    /// Move by `semitones`, wrapping within the octave.
    pub const fn transpose(self, semitones: i32) -> NoteName {
        NoteName::from_offset(self.offset() + semitones)
    }
}

impl Display for NoteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scale degree of a major key, 1-indexed (I = tonic, VII = leading tone).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    /// Tonic
    I = 1,
    /// Supertonic
    II,
    /// Mediant
    III,
    /// Subdominant
    IV,
    /// Dominant
    V,
    /// Submediant
    VI,
    /// Leading tone
    VII,
}

impl Grade {
    /// All degrees in scale order.
    pub const ALL: [Grade; NUM_GRADES] = [
        Grade::I,
        Grade::II,
        Grade::III,
        Grade::IV,
        Grade::V,
        Grade::VI,
        Grade::VII,
    ];

    /// Degree from its 1-based number.
    ///
    /// Returns `Err(TonalityError::InvalidGrade)` outside 1..=7.
    pub fn new(number: u8) -> Result<Grade, TonalityError> {
        match number {
            1..=7 => Ok(Grade::ALL[usize::from(number) - 1]),
            got => Err(TonalityError::InvalidGrade { got }),
        }
    }

    /// The 1-based degree number.
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// 0-based position, for table storage.
    pub(crate) const fn index(self) -> usize {
        self as usize - 1
    }

    /// Semitones from the tonic to this degree's root in a major scale.
    pub const fn root_offset(self) -> i32 {
        MAJOR_SCALE[self.index()]
    }

    /// Degree used when borrowing from the key a minor third above:
    /// `((grade + 4) % 7) + 1`.
    pub const fn sub_minor(self) -> Grade {
        Grade::ALL[(self.number() as usize + 4) % NUM_GRADES]
    }
}

impl TryFrom<u8> for Grade {
    type Error = TonalityError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Grade::new(number)
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(grade_name(*self))
    }
}

/// Name of the pitch class `semitone_offset` semitones above C.
pub fn tonality_name(semitone_offset: i32) -> &'static str {
    NoteName::from_offset(semitone_offset).name()
}

/// Chord symbol of `grade` in the major key of `tonality`, e.g. `(C, II)` is `Dm7`.
pub fn chord_name(tonality: NoteName, grade: Grade) -> String {
    let root = tonality.transpose(grade.root_offset());
    format!("{root}{}", DEGREE_SUFFIXES[grade.index()])
}

/// Roman-numeral name of a degree.
pub fn grade_name(grade: Grade) -> &'static str {
    GRADE_NAMES[grade.index()]
}
