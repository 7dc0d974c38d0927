//! Equal-tempered note table and pitch arithmetic.
//!
//! All frequencies follow twelve-tone equal temperament anchored on A4 = 440 Hz
//! (MIDI note 69).

use std::fmt;
use std::ops::RangeInclusive;

use crate::config::{MAX_SUPPORTED_OCTAVE, MIN_SUPPORTED_OCTAVE};
use crate::error::{ConfigError, Result};

pub mod mapper;

pub const A4_FREQUENCY: f64 = 440.0;
pub const A4_MIDI: i32 = 69;

/// Language used for note names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum NoteNaming {
    /// C, D, E, ...
    English,
    /// Do, Re, Mi, ...
    Solfege,
}

/// How the five black-key pitch classes are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Accidentals {
    Sharps,
    Flats,
}

/// One of the twelve pitch classes, in ascending order from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitones above C.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch class `semitones` above C, wrapping every octave.
    pub fn from_semitone(semitones: i32) -> PitchClass {
        PitchClass::ALL[semitones.rem_euclid(12) as usize]
    }

    pub fn is_natural(self) -> bool {
        !self.is_sharp()
    }

    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }

    pub fn name(self, naming: NoteNaming, accidentals: Accidentals) -> &'static str {
        const ENGLISH_SHARPS: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        const ENGLISH_FLATS: [&str; 12] = [
            "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
        ];
        const SOLFEGE_SHARPS: [&str; 12] = [
            "Do", "Do#", "Re", "Re#", "Mi", "Fa", "Fa#", "Sol", "Sol#", "La", "La#", "Si",
        ];
        const SOLFEGE_FLATS: [&str; 12] = [
            "Do", "Reb", "Re", "Mib", "Mi", "Fa", "Solb", "Sol", "Lab", "La", "Sib", "Si",
        ];

        let names = match (naming, accidentals) {
            (NoteNaming::English, Accidentals::Sharps) => &ENGLISH_SHARPS,
            (NoteNaming::English, Accidentals::Flats) => &ENGLISH_FLATS,
            (NoteNaming::Solfege, Accidentals::Sharps) => &SOLFEGE_SHARPS,
            (NoteNaming::Solfege, Accidentals::Flats) => &SOLFEGE_FLATS,
        };
        names[self.index()]
    }

    /// Display colour, running from red (C) through the spectrum to violet (B).
    pub fn color(self) -> &'static str {
        const COLORS: [&str; 12] = [
            "#FF0000", "#FF4000", "#FF8000", "#FFB000", "#FFFF00", "#80FF00", "#00FF00",
            "#00FF80", "#00FFFF", "#0080FF", "#0000FF", "#8000FF",
        ];
        COLORS[self.index()]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name(NoteNaming::English, Accidentals::Sharps))
    }
}

/// MIDI number of `pitch_class` in `octave` (C4 = 60).
pub fn midi_number(pitch_class: PitchClass, octave: i32) -> i32 {
    (octave + 1) * 12 + pitch_class.index() as i32
}

/// Equal-tempered frequency of a MIDI note.
pub fn midi_to_frequency(midi: i32) -> f64 {
    A4_FREQUENCY * 2f64.powf((midi - A4_MIDI) as f64 / 12.0)
}

/// Nearest MIDI note to `frequency`, or `None` when the frequency is not a positive
/// finite number.
pub fn frequency_to_midi(frequency: f64) -> Option<i32> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return None;
    }
    Some((A4_MIDI as f64 + 12.0 * (frequency / A4_FREQUENCY).log2()).round() as i32)
}

/// Interval from `reference` to `frequency` in cents; 0 when either is not positive.
pub fn calculate_cents(frequency: f64, reference: f64) -> f64 {
    if frequency <= 0.0 || reference <= 0.0 {
        return 0.0;
    }
    let cents = 1200.0 * (frequency / reference).log2();
    if cents.is_finite() {
        cents
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NoteTableEntry {
    pub pitch_class: PitchClass,
    pub octave: i32,
    pub frequency: f64,
    pub is_natural: bool,
    pub midi_number: i32,
}

impl NoteTableEntry {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        let midi = midi_number(pitch_class, octave);
        NoteTableEntry {
            pitch_class,
            octave,
            frequency: midi_to_frequency(midi),
            is_natural: pitch_class.is_natural(),
            midi_number: midi,
        }
    }

    pub fn is_sharp(&self) -> bool {
        self.pitch_class.is_sharp()
    }
}

impl fmt::Display for NoteTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

/// Every note of an octave range, sorted by ascending frequency.
///
/// A table is built once for its range and never edited; changing the range means
/// building a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    min_octave: i32,
    max_octave: i32,
    entries: Vec<NoteTableEntry>,
}

impl NoteTable {
    pub fn new(min_octave: i32, max_octave: i32) -> Result<Self> {
        for octave in [min_octave, max_octave] {
            if !(MIN_SUPPORTED_OCTAVE..=MAX_SUPPORTED_OCTAVE).contains(&octave) {
                return Err(ConfigError::UnsupportedOctave(octave));
            }
        }
        if min_octave > max_octave {
            return Err(ConfigError::InvertedOctaveRange {
                min: min_octave,
                max: max_octave,
            });
        }

        let entries = (min_octave..=max_octave)
            .flat_map(|octave| {
                PitchClass::ALL
                    .iter()
                    .map(move |&pitch_class| NoteTableEntry::new(pitch_class, octave))
            })
            .collect();

        Ok(NoteTable {
            min_octave,
            max_octave,
            entries,
        })
    }

    pub fn octave_range(&self) -> RangeInclusive<i32> {
        self.min_octave..=self.max_octave
    }

    pub fn entries(&self) -> &[NoteTableEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteTableEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NoteTableEntry> {
        self.entries.get(index)
    }

    pub fn lowest(&self) -> &NoteTableEntry {
        &self.entries[0]
    }

    pub fn highest(&self) -> &NoteTableEntry {
        &self.entries[self.entries.len() - 1]
    }

    pub fn min_frequency(&self) -> f64 {
        self.lowest().frequency
    }

    pub fn max_frequency(&self) -> f64 {
        self.highest().frequency
    }

    /// Whether `frequency` lies within the table's lowest and highest notes.
    pub fn contains_frequency(&self, frequency: f64) -> bool {
        frequency.is_finite()
            && frequency >= self.min_frequency()
            && frequency <= self.max_frequency()
    }

    /// Index of the entry closest to `frequency`. A frequency exactly halfway between
    /// two entries resolves to the lower one. `None` outside the table.
    pub fn nearest_index(&self, frequency: f64) -> Option<usize> {
        if !self.contains_frequency(frequency) {
            return None;
        }
        let upper = self.entries.partition_point(|e| e.frequency < frequency);
        if upper == 0 {
            return Some(0);
        }
        let lower = upper - 1;
        if upper == self.entries.len() {
            return Some(lower);
        }
        let below = frequency - self.entries[lower].frequency;
        let above = self.entries[upper].frequency - frequency;
        Some(if below <= above { lower } else { upper })
    }

    pub fn nearest(&self, frequency: f64) -> Option<&NoteTableEntry> {
        self.nearest_index(frequency).map(|i| &self.entries[i])
    }

    pub fn previous(&self, index: usize) -> Option<&NoteTableEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn next(&self, index: usize) -> Option<&NoteTableEntry> {
        self.entries.get(index + 1)
    }

    pub fn position_of(&self, pitch_class: PitchClass, octave: i32) -> Option<usize> {
        if !self.octave_range().contains(&octave) {
            return None;
        }
        Some(((octave - self.min_octave) as usize) * 12 + pitch_class.index())
    }

    pub fn entry_for(&self, pitch_class: PitchClass, octave: i32) -> Option<&NoteTableEntry> {
        self.position_of(pitch_class, octave)
            .and_then(|i| self.entries.get(i))
    }

    /// Entries whose octave lies in `min_octave..=max_octave`.
    pub fn notes_in_range(
        &self,
        min_octave: i32,
        max_octave: i32,
    ) -> impl Iterator<Item = &NoteTableEntry> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.octave >= min_octave && e.octave <= max_octave)
    }

    /// Natural (white key) entries whose octave lies in `min_octave..=max_octave`.
    pub fn natural_notes_in_range(
        &self,
        min_octave: i32,
        max_octave: i32,
    ) -> impl Iterator<Item = &NoteTableEntry> + '_ {
        self.notes_in_range(min_octave, max_octave)
            .filter(|e| e.is_natural)
    }

    pub fn natural_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_natural).count()
    }

    pub fn sharp_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_sharp()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn table_is_sorted_and_complete() {
        for (min, max) in [(1, 8), (4, 4), (-1, 9), (2, 5)] {
            let table = NoteTable::new(min, max).unwrap();
            assert_eq!(table.len(), 12 * (max - min + 1) as usize);
            assert!(table
                .entries()
                .windows(2)
                .all(|w| w[0].frequency < w[1].frequency));
        }
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert_eq!(
            NoteTable::new(5, 2),
            Err(ConfigError::InvertedOctaveRange { min: 5, max: 2 })
        );
        assert_eq!(NoteTable::new(-2, 4), Err(ConfigError::UnsupportedOctave(-2)));
    }

    #[test]
    fn midi_numbers() {
        assert_eq!(midi_number(PitchClass::A, 4), 69);
        assert_eq!(midi_number(PitchClass::C, 4), 60);
        assert_eq!(midi_number(PitchClass::C, -1), 0);
        let a4 = NoteTableEntry::new(PitchClass::A, 4);
        assert_eq!(a4.frequency, 440.0);
        assert_eq!(a4.to_string(), "A4");
    }

    #[test]
    fn midi_frequency_conversions() {
        assert_eq!(midi_to_frequency(69), 440.0);
        assert_abs_diff_eq!(midi_to_frequency(60), 261.6256, epsilon = 1e-4);
        assert_eq!(frequency_to_midi(440.0), Some(69));
        assert_eq!(frequency_to_midi(261.63), Some(60));
        assert_eq!(frequency_to_midi(0.0), None);
        assert_eq!(frequency_to_midi(f64::NAN), None);

        for midi in 0..=127 {
            assert_eq!(frequency_to_midi(midi_to_frequency(midi)), Some(midi));
        }
        // Off-grid frequencies come back within half a semitone.
        for &f in &[27.5, 100.0, 333.3, 1234.5, 4000.0] {
            let back = midi_to_frequency(frequency_to_midi(f).unwrap());
            assert!(calculate_cents(f, back).abs() <= 50.0);
        }
    }

    #[test]
    fn cents() {
        assert_eq!(calculate_cents(440.0, 440.0), 0.0);
        assert_abs_diff_eq!(calculate_cents(466.16, 440.0), 100.0, epsilon = 1.0);
        assert_abs_diff_eq!(calculate_cents(220.0, 440.0), -1200.0, epsilon = 1e-9);
        assert_eq!(calculate_cents(0.0, 440.0), 0.0);
        assert_eq!(calculate_cents(440.0, -1.0), 0.0);
    }

    #[test]
    fn nearest_lookup() {
        let table = NoteTable::new(1, 8).unwrap();
        let a4 = table.nearest(440.0).unwrap();
        assert_eq!((a4.pitch_class, a4.octave), (PitchClass::A, 4));
        let a4_sharp = table.nearest(450.0).unwrap();
        assert_eq!(a4_sharp.pitch_class, PitchClass::A);
        let b_flat = table.nearest(460.0).unwrap();
        assert_eq!(b_flat.pitch_class, PitchClass::ASharp);

        assert_eq!(table.nearest(table.min_frequency()), Some(table.lowest()));
        assert_eq!(table.nearest(table.max_frequency()), Some(table.highest()));
        assert_eq!(table.nearest(table.min_frequency() - 0.01), None);
        assert_eq!(table.nearest(table.max_frequency() + 0.01), None);
        assert_eq!(table.nearest(f64::INFINITY), None);
    }

    #[test]
    fn ties_resolve_to_lower_entry() {
        let table = NoteTable::new(4, 4).unwrap();
        let a = table.entry_for(PitchClass::A, 4).unwrap().frequency;
        let a_sharp = table.entry_for(PitchClass::ASharp, 4).unwrap().frequency;
        let midpoint = (a + a_sharp) / 2.0;
        let expected = if midpoint - a <= a_sharp - midpoint {
            PitchClass::A
        } else {
            PitchClass::ASharp
        };
        assert_eq!(table.nearest(midpoint).unwrap().pitch_class, expected);
        assert_eq!(
            table.nearest(midpoint - 1e-6).unwrap().pitch_class,
            PitchClass::A
        );
        assert_eq!(
            table.nearest(midpoint + 1e-6).unwrap().pitch_class,
            PitchClass::ASharp
        );
    }

    #[test]
    fn neighbours_and_ranges() {
        let table = NoteTable::new(3, 5).unwrap();
        let c3 = table.position_of(PitchClass::C, 3).unwrap();
        assert_eq!(c3, 0);
        assert_eq!(table.previous(c3), None);
        assert_eq!(table.next(c3).unwrap().pitch_class, PitchClass::CSharp);

        let b5 = table.position_of(PitchClass::B, 5).unwrap();
        assert_eq!(b5, table.len() - 1);
        assert_eq!(table.next(b5), None);
        assert_eq!(table.previous(b5).unwrap().pitch_class, PitchClass::ASharp);

        assert_eq!(table.position_of(PitchClass::C, 6), None);
        assert_eq!(table.notes_in_range(4, 4).count(), 12);
        assert_eq!(table.natural_notes_in_range(4, 5).count(), 14);
        assert_eq!(table.natural_count(), 21);
        assert_eq!(table.sharp_count(), 15);
    }

    #[test]
    fn pitch_class_names() {
        let class = PitchClass::from_semitone(10);
        assert_eq!(class, PitchClass::ASharp);
        assert_eq!(class.name(NoteNaming::English, Accidentals::Sharps), "A#");
        assert_eq!(class.name(NoteNaming::English, Accidentals::Flats), "Bb");
        assert_eq!(class.name(NoteNaming::Solfege, Accidentals::Sharps), "La#");
        assert_eq!(class.name(NoteNaming::Solfege, Accidentals::Flats), "Sib");
        assert_eq!(PitchClass::from_semitone(-1), PitchClass::B);
        assert_eq!(PitchClass::C.color(), "#FF0000");
        assert!(PitchClass::E.is_natural() && !PitchClass::E.is_sharp());
    }
}
