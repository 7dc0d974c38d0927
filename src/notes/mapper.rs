//! Mapping of detected frequencies onto the note table.

use std::fmt;

use tracing::debug;

use crate::config::{MapperConfig, MapperConfigUpdate};
use crate::detector::{PitchEstimate, Rejection};
use crate::error::Result;
use crate::float::Float;
use crate::notes::{calculate_cents, NoteTable, NoteTableEntry};

/// Deviations above this many cents are [PrecisionTier::Far].
pub const NEAR_CENTS_THRESHOLD: f64 = 100.0;

/// Placeholder shown when there is no note.
pub const NO_NOTE_DISPLAY: &str = "--";
/// Colour shown when there is no note.
pub const NO_NOTE_COLOR: &str = "#666666";

/// How far a frequency is from its nearest note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PrecisionTier {
    Exact,
    Close,
    Near,
    Far,
    /// No note was matched.
    None,
}

impl fmt::Display for PrecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrecisionTier::Exact => "exact",
            PrecisionTier::Close => "close",
            PrecisionTier::Near => "near",
            PrecisionTier::Far => "far",
            PrecisionTier::None => "none",
        };
        f.write_str(name)
    }
}

/// Table entry matched by a mapping, with its neighbours.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MatchedNote {
    pub entry: NoteTableEntry,
    pub previous: Option<NoteTableEntry>,
    pub next: Option<NoteTableEntry>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NoteMapping {
    pub note: Option<MatchedNote>,
    pub detected_frequency: f64,
    /// Signed deviation from `note` in cents; 0 when there is no note.
    pub cents: f64,
    pub precision: PrecisionTier,
    pub display_name: String,
    pub reason: Option<Rejection>,
}

impl NoteMapping {
    fn invalid(detected_frequency: f64, reason: Rejection) -> Self {
        NoteMapping {
            note: None,
            detected_frequency,
            cents: 0.0,
            precision: PrecisionTier::None,
            display_name: NO_NOTE_DISPLAY.to_string(),
            reason: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.note.is_some()
    }

    pub fn entry(&self) -> Option<&NoteTableEntry> {
        self.note.as_ref().map(|n| &n.entry)
    }

    pub fn midi_number(&self) -> Option<i32> {
        self.entry().map(|e| e.midi_number)
    }

    pub fn cents_abs(&self) -> f64 {
        self.cents.abs()
    }

    pub fn color(&self) -> &'static str {
        self.entry()
            .map_or(NO_NOTE_COLOR, |e| e.pitch_class.color())
    }
}

/// Summary of the current note table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ScaleInfo {
    pub total_notes: usize,
    pub natural_notes: usize,
    pub sharp_notes: usize,
    pub octaves: usize,
    pub lowest: NoteTableEntry,
    pub highest: NoteTableEntry,
}

/// Maps frequencies to the nearest note of an equal-tempered table.
///
/// ```
/// use voice_pitch::notes::mapper::{NoteMapper, PrecisionTier};
/// use voice_pitch::notes::PitchClass;
///
/// let mapper = NoteMapper::new();
/// let mapping = mapper.map_frequency(440.0);
/// let a4 = mapping.entry().unwrap();
/// assert_eq!((a4.pitch_class, a4.octave), (PitchClass::A, 4));
/// assert_eq!(mapping.precision, PrecisionTier::Exact);
/// ```
#[derive(Debug, Clone)]
pub struct NoteMapper {
    config: MapperConfig,
    table: NoteTable,
}

impl Default for NoteMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteMapper {
    pub fn new() -> Self {
        let config = MapperConfig::default();
        let table = NoteTable::new(config.min_octave, config.max_octave)
            .unwrap_or_else(|e| unreachable!("default mapper config is invalid: {}", e));
        NoteMapper { config, table }
    }

    pub fn try_new(config: MapperConfig) -> Result<Self> {
        config.validate()?;
        let table = NoteTable::new(config.min_octave, config.max_octave)?;
        Ok(NoteMapper { config, table })
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn table(&self) -> &NoteTable {
        &self.table
    }

    /// Apply a partial configuration change. The note table is rebuilt only when the
    /// octave range changes; on error nothing is modified.
    pub fn update_config(&mut self, update: &MapperConfigUpdate) -> Result<()> {
        let config = self.config.merge(update)?;
        if config.min_octave != self.config.min_octave
            || config.max_octave != self.config.max_octave
        {
            let table = NoteTable::new(config.min_octave, config.max_octave)?;
            debug!(
                min_octave = config.min_octave,
                max_octave = config.max_octave,
                notes = table.len(),
                "regenerated note table"
            );
            self.table = table;
        }
        self.config = config;
        Ok(())
    }

    pub fn classify(&self, cents_abs: f64) -> PrecisionTier {
        if cents_abs <= self.config.exact_cents_threshold {
            PrecisionTier::Exact
        } else if cents_abs <= self.config.close_cents_threshold {
            PrecisionTier::Close
        } else if cents_abs <= NEAR_CENTS_THRESHOLD {
            PrecisionTier::Near
        } else {
            PrecisionTier::Far
        }
    }

    /// Name of `entry` using the configured naming, accidentals and octave display.
    pub fn display_name(&self, entry: &NoteTableEntry) -> String {
        let name = entry
            .pitch_class
            .name(self.config.naming, self.config.accidentals);
        if self.config.show_octave {
            format!("{}{}", name, entry.octave)
        } else {
            name.to_string()
        }
    }

    pub fn map_frequency(&self, frequency: f64) -> NoteMapping {
        if !(frequency.is_finite() && frequency > 0.0) {
            return NoteMapping::invalid(frequency, Rejection::InvalidFrequency);
        }
        let index = match self.table.nearest_index(frequency) {
            Some(index) => index,
            None => return NoteMapping::invalid(frequency, Rejection::FrequencyOutOfRange),
        };
        let entry = self.table.entries()[index];
        let cents = calculate_cents(frequency, entry.frequency);

        NoteMapping {
            note: Some(MatchedNote {
                entry,
                previous: self.table.previous(index).copied(),
                next: self.table.next(index).copied(),
            }),
            detected_frequency: frequency,
            cents,
            precision: self.classify(cents.abs()),
            display_name: self.display_name(&entry),
            reason: None,
        }
    }

    /// Map the frequency of a valid estimate; invalid estimates map to no note.
    pub fn map_estimate<T: Float>(&self, estimate: &PitchEstimate<T>) -> NoteMapping {
        match estimate.valid_frequency() {
            Some(frequency) => self.map_frequency(frequency.as_f64()),
            None => NoteMapping::invalid(
                estimate.frequency.map_or(0.0, |f| f.as_f64()),
                estimate.reason.unwrap_or(Rejection::InvalidFrequency),
            ),
        }
    }

    pub fn notes_in_range(&self, min_octave: i32, max_octave: i32) -> Vec<NoteTableEntry> {
        self.table
            .notes_in_range(min_octave, max_octave)
            .copied()
            .collect()
    }

    pub fn natural_notes_in_range(&self, min_octave: i32, max_octave: i32) -> Vec<NoteTableEntry> {
        self.table
            .natural_notes_in_range(min_octave, max_octave)
            .copied()
            .collect()
    }

    pub fn scale_info(&self) -> ScaleInfo {
        ScaleInfo {
            total_notes: self.table.len(),
            natural_notes: self.table.natural_count(),
            sharp_notes: self.table.sharp_count(),
            octaves: self.config.octave_count(),
            lowest: *self.table.lowest(),
            highest: *self.table.highest(),
        }
    }
}
