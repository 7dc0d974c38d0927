//! # Voice Pitch
//! *voice_pitch* estimates the fundamental frequency of a monophonic voice signal,
//! one capture window at a time, and maps it to the nearest note of an
//! equal-tempered scale with its deviation in cents.
//!
//! # Pipeline
//! Each window of unsigned 8-bit samples goes through
//!
//!   * [preprocessing][utils::window]: rescaling to [-1, 1] and a Hamming taper,
//!   * [YIN][detector::yin], falling back on
//!     [autocorrelation][detector::autocorrelation] when YIN finds no usable pitch,
//!   * [tracking][tracker]: exponential smoothing and stability detection,
//!   * [note mapping][notes::mapper]: nearest note, cents and precision tier.
//!
//! Degraded input such as silence is not an error: the returned [PitchEstimate] or
//! [NoteMapping] is marked invalid and carries a [Rejection]. Only invalid
//! configuration produces a [ConfigError].
//!
//! # Examples
//! ```
//! use voice_pitch::{NoteMapper, PitchTracker, SampleWindow};
//!
//! const SAMPLE_RATE: u32 = 44100;
//! const SIZE: usize = 2048;
//!
//! // 8-bit samples centred on 128, as delivered by a capture layer.
//! let freq = 440.0;
//! let samples: Vec<u8> = (0..SIZE)
//!     .map(|i| {
//!         let t = i as f64 / SAMPLE_RATE as f64;
//!         let y = 0.8 * (2.0 * std::f64::consts::PI * freq * t).sin();
//!         (128.0 + 127.0 * y).round() as u8
//!     })
//!     .collect();
//!
//! let mut tracker = PitchTracker::<f64>::new(SIZE);
//! let mapper = NoteMapper::new();
//!
//! let estimate = tracker.process(&SampleWindow::new(&samples, SAMPLE_RATE, 0.5));
//! assert!(estimate.valid);
//!
//! let note = mapper.map_estimate(&estimate);
//! println!(
//!     "{} Hz -> {} ({:+.1} cents)",
//!     estimate.frequency.unwrap(),
//!     note.display_name,
//!     note.cents
//! );
//! assert_eq!(note.midi_number(), Some(69));
//! ```

pub use config::{DetectorConfig, DetectorConfigUpdate, MapperConfig, MapperConfigUpdate};
pub use detector::{Algorithm, PitchEstimate, Rejection};
pub use error::ConfigError;
pub use notes::mapper::{NoteMapper, NoteMapping, PrecisionTier};
pub use notes::{calculate_cents, frequency_to_midi, midi_to_frequency, NoteTable, PitchClass};
pub use tracker::PitchTracker;
pub use utils::window::SampleWindow;

pub mod config;
pub mod detector;
pub mod error;
pub mod float;
pub mod notes;
pub mod tracker;
pub mod utils;
