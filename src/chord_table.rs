//! Chord Table
//!
//! Diatonic and secondary-dominant chord tables for a major key, voiced
//! around the key's root with a fixed inversion and tension policy.
//!
//! Every chord of a table built on key `k` lies in `[k - 12, k + 12)`.

use std::ops::Index;

use crate::tonality::{Grade, NoteName, NUM_GRADES};

const OCTAVE: i32 = 12;

/// Perfect fifth, in semitones
const FIFTH: i32 = 7;

/// Chord tones of each seventh-chord quality, in semitones above the root
const MAJOR_SEVENTH: &[i32] = &[0, 4, 7, 11];
const MINOR_SEVENTH: &[i32] = &[0, 3, 7, 10];
const DOMINANT_SEVENTH: &[i32] = &[0, 4, 7, 10];
const HALF_DIMINISHED: &[i32] = &[0, 3, 6, 10];

/// Diatonic seventh chord of each degree of the major scale
const DIATONIC_QUALITIES: [&[i32]; NUM_GRADES] = [
    MAJOR_SEVENTH,
    MINOR_SEVENTH,
    MINOR_SEVENTH,
    MAJOR_SEVENTH,
    DOMINANT_SEVENTH,
    MINOR_SEVENTH,
    HALF_DIMINISHED,
];

/// Tensions added to each diatonic degree. iii and vii° carry avoid notes on the 9th.
const DIATONIC_TENSIONS: [&[Tension]; NUM_GRADES] = [
    &[Tension::Ninth],
    &[Tension::Ninth],
    &[],
    &[Tension::Ninth],
    &[Tension::Ninth, Tension::Thirteenth],
    &[Tension::Ninth],
    &[],
];

/// Tension of the dominant resolving to each degree: natural 9th towards
/// major targets, flat 9th towards minor and diminished ones.
const SECONDARY_TENSIONS: [Tension; NUM_GRADES] = [
    Tension::Ninth,
    Tension::FlatNinth,
    Tension::FlatNinth,
    Tension::Ninth,
    Tension::Ninth,
    Tension::FlatNinth,
    Tension::FlatNinth,
];

/// Root pitch of a key, as an absolute (MIDI-style) note number.
///
/// Not validated: moving far enough yields notes outside the MIDI range,
/// which the selector skips when emitting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Key(i32);

impl Key {
    /// Middle C.
    pub const DEFAULT: Key = Key(60);

    /// Key rooted on `pitch`.
    pub const fn new(pitch: i32) -> Self {
        Key(pitch)
    }

    /// Absolute root pitch.
    pub const fn pitch(self) -> i32 {
        self.0
    }

    /// Key moved by `delta` semitones, saturating at the `i32` bounds.
    pub const fn transpose(self, delta: i32) -> Self {
        Key(self.0.saturating_add(delta))
    }

    /// Pitch class of the root.
    pub const fn tonality(self) -> NoteName {
        NoteName::from_offset(self.0)
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::DEFAULT
    }
}

/// Notes sounded together for one chord, ascending and without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NoteSet(Vec<i32>);

impl NoteSet {
    /// Build from absolute pitches in any order.
    pub fn new(mut notes: Vec<i32>) -> Self {
        notes.sort_unstable();
        notes.dedup();
        NoteSet(notes)
    }

    /// Pitches, lowest first.
    pub fn notes(&self) -> &[i32] {
        &self.0
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no note is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate pitches, lowest first.
    pub fn iter(&self) -> std::slice::Iter<'_, i32> {
        self.0.iter()
    }

    /// Lowest pitch.
    pub fn lowest(&self) -> Option<i32> {
        self.0.first().copied()
    }

    /// Highest pitch.
    pub fn highest(&self) -> Option<i32> {
        self.0.last().copied()
    }

    /// Distinct pitch classes, ordered from C.
    pub fn pitch_classes(&self) -> Vec<NoteName> {
        let mut classes: Vec<NoteName> =
            self.0.iter().map(|&n| NoteName::from_offset(n)).collect();
        classes.sort_by_key(|c| c.offset());
        classes.dedup();
        classes
    }
}

impl<'a> IntoIterator for &'a NoteSet {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extra chord tones stacked above the seventh
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tension {
    /// Major ninth
    Ninth,
    /// Minor ninth
    FlatNinth,
    /// Major thirteenth
    Thirteenth,
}

impl Tension {
    /// Semitones above the chord root.
    pub const fn interval(self) -> i32 {
        match self {
            Tension::Ninth => 14,
            Tension::FlatNinth => 13,
            Tension::Thirteenth => 21,
        }
    }
}

/// Raise the lowest note by an octave, `times` times.
///
/// Pitch-class content is unchanged.
pub fn invert(chord: &NoteSet, times: usize) -> NoteSet {
    let mut notes = chord.0.clone();
    for _ in 0..times {
        notes.sort_unstable();
        if let Some(lowest) = notes.first_mut() {
            *lowest += OCTAVE;
        }
    }
    NoteSet::new(notes)
}

/// Add `tension` above `root`, dropped by octaves until it sits below `ceiling`.
pub fn add_tension(chord: &NoteSet, root: i32, tension: Tension, ceiling: i32) -> NoteSet {
    let mut pitch = root + tension.interval();
    while pitch >= ceiling && pitch - OCTAVE > root {
        pitch -= OCTAVE;
    }
    let mut notes = chord.0.clone();
    notes.push(pitch);
    NoteSet::new(notes)
}

/// Seven chords, one per scale degree, indexed by `Grade` (I..=VII).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChordTable {
    chords: [NoteSet; NUM_GRADES],
}

impl ChordTable {
    /// Chord of `grade`.
    pub fn get(&self, grade: Grade) -> &NoteSet {
        &self.chords[grade.index()]
    }

    /// Chords paired with their degree, I first.
    pub fn iter(&self) -> impl Iterator<Item = (Grade, &NoteSet)> + '_ {
        Grade::ALL.iter().copied().zip(self.chords.iter())
    }

    /// Always 7.
    pub const fn len(&self) -> usize {
        NUM_GRADES
    }

    /// Always false.
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl Index<Grade> for ChordTable {
    type Output = NoteSet;

    fn index(&self, grade: Grade) -> &NoteSet {
        self.get(grade)
    }
}

/// Both tables for one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChordTables {
    /// Diatonic seventh chords with tensions.
    pub diatonic: ChordTable,
    /// Dominant sevenths resolving to each degree.
    pub secondary_dominant: ChordTable,
}

/// Build the diatonic and secondary-dominant tables of `key`.
///
/// Pure: the same key always yields identical tables.
pub fn build_tables(key: Key) -> ChordTables {
    let base = -OCTAVE;

    let diatonic = Grade::ALL.map(|grade| {
        let root = base + grade.root_offset();
        build_chord(
            key,
            root,
            DIATONIC_QUALITIES[grade.index()],
            DIATONIC_TENSIONS[grade.index()],
        )
    });

    let secondary_dominant = Grade::ALL.map(|grade| {
        let root = base + (grade.root_offset() + FIFTH) % OCTAVE;
        build_chord(
            key,
            root,
            DOMINANT_SEVENTH,
            &[SECONDARY_TENSIONS[grade.index()]],
        )
    });

    ChordTables {
        diatonic: ChordTable { chords: diatonic },
        secondary_dominant: ChordTable {
            chords: secondary_dominant,
        },
    }
}

/// Stack `intervals` on `root` (relative to the key), add `tensions`, then
/// invert until the bass sits no more than a fifth below the key.
///
/// Voiced around 0 and moved onto the key last; pitches saturate at the
/// `i32` bounds for extreme keys.
fn build_chord(key: Key, root: i32, intervals: &[i32], tensions: &[Tension]) -> NoteSet {
    let ceiling = OCTAVE;
    let floor = -FIFTH;

    let mut chord = NoteSet::new(intervals.iter().map(|i| root + i).collect());
    for &tension in tensions {
        chord = add_tension(&chord, root, tension, ceiling);
    }

    let inversions = chord.iter().filter(|&&n| n < floor).count();
    let voiced = invert(&chord, inversions);
    NoteSet::new(voiced.iter().map(|&n| key.pitch().saturating_add(n)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(table: &ChordTable, grade: Grade) -> Vec<i32> {
        table[grade].notes().to_vec()
    }

    #[test]
    fn diatonic_table_in_c() {
        let tables = build_tables(Key::DEFAULT);
        let t = &tables.diatonic;
        assert_eq!(notes(t, Grade::I), [55, 59, 60, 62, 64]);
        assert_eq!(notes(t, Grade::II), [53, 57, 60, 62, 64]);
        assert_eq!(notes(t, Grade::III), [55, 59, 62, 64]);
        assert_eq!(notes(t, Grade::IV), [53, 57, 60, 64, 67]);
        assert_eq!(notes(t, Grade::V), [55, 59, 62, 64, 65, 69]);
        assert_eq!(notes(t, Grade::VI), [57, 60, 64, 67, 71]);
        assert_eq!(notes(t, Grade::VII), [59, 62, 65, 69]);
    }

    #[test]
    fn secondary_dominant_table_in_c() {
        let tables = build_tables(Key::DEFAULT);
        let t = &tables.secondary_dominant;
        assert_eq!(notes(t, Grade::I), [55, 59, 62, 65, 69]);
        assert_eq!(notes(t, Grade::II), [57, 61, 64, 67, 70]);
        assert_eq!(notes(t, Grade::III), [59, 60, 63, 66, 69]);
        assert_eq!(notes(t, Grade::IV), [55, 58, 60, 62, 64]);
        assert_eq!(notes(t, Grade::V), [54, 57, 60, 62, 64]);
        assert_eq!(notes(t, Grade::VI), [56, 59, 62, 64, 65]);
        assert_eq!(notes(t, Grade::VII), [54, 58, 61, 64, 67]);
    }

    #[test]
    fn secondary_dominant_is_dominant_seventh_a_fifth_above() {
        use NoteName::*;
        let tables = build_tables(Key::DEFAULT);
        // V7/V in C is D7(9): D F# A C E
        assert_eq!(
            tables.secondary_dominant[Grade::V].pitch_classes(),
            [C, D, E, Fs, A]
        );
    }

    #[test]
    fn invert_keeps_pitch_classes() {
        let chord = NoteSet::new(vec![48, 52, 55, 59]);
        let inverted = invert(&chord, 2);
        assert_eq!(inverted.notes(), [55, 59, 60, 64]);
        assert_eq!(inverted.pitch_classes(), chord.pitch_classes());
        assert_eq!(invert(&chord, 4).notes(), [60, 64, 67, 71]);
    }

    #[test]
    fn tension_drops_below_ceiling() {
        let chord = NoteSet::new(vec![55, 59, 62, 65]);
        let with_13 = add_tension(&chord, 55, Tension::Thirteenth, 72);
        assert_eq!(with_13.notes(), [55, 59, 62, 64, 65]);
        let with_9 = add_tension(&chord, 55, Tension::Ninth, 72);
        assert_eq!(with_9.notes(), [55, 59, 62, 65, 69]);
    }

    #[test]
    fn tables_stay_within_two_octaves_of_key() {
        for pitch in 0..=127 {
            let key = Key::new(pitch);
            let tables = build_tables(key);
            for table in [&tables.diatonic, &tables.secondary_dominant] {
                assert_eq!(table.len(), 7);
                for (grade, chord) in table.iter() {
                    assert!(!chord.is_empty(), "empty chord at {grade:?}");
                    assert!(chord.lowest().unwrap() >= pitch - 12);
                    assert!(chord.highest().unwrap() < pitch + 12);
                }
            }
        }
    }

    #[test]
    fn extreme_keys_saturate() {
        assert_eq!(Key::new(i32::MAX).transpose(1), Key::new(i32::MAX));
        assert_eq!(Key::new(i32::MIN).transpose(-1), Key::new(i32::MIN));

        let high = build_tables(Key::new(i32::MAX));
        let low = build_tables(Key::new(i32::MIN));
        for grade in Grade::ALL {
            assert!(!high.diatonic[grade].is_empty());
            assert_eq!(high.secondary_dominant[grade].highest(), Some(i32::MAX));
            assert_eq!(low.diatonic[grade].lowest(), Some(i32::MIN));
        }
    }

    #[test]
    fn transposing_the_key_transposes_the_tables() {
        let c = build_tables(Key::DEFAULT);
        let d = build_tables(Key::DEFAULT.transpose(2));
        for grade in Grade::ALL {
            let shifted: Vec<i32> = c.diatonic[grade].iter().map(|n| n + 2).collect();
            assert_eq!(d.diatonic[grade].notes(), shifted.as_slice());
        }
    }
}
