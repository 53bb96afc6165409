//! # Track-Aligner
//!
//! Find out how similar two recordings of a song are and how far apart in
//! time they start.
//!
//! The library decodes audio to mono, separates the percussive content,
//! reduces it to an onset strength envelope and compares envelopes by
//! normalized correlation: a similarity score for "is this the same
//! performance" and a lag estimate for "how much later does it start".
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use track_aligner::{AlignmentEngine, Config, Track};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//!
//! let desk_mix = Track::open("desk_mix.wav", None, &config)?;
//! let crowd = Track::open("crowd_recording.wav", None, &config)?;
//!
//! let engine = AlignmentEngine::new(config);
//! let result = engine.compare(&desk_mix, &crowd)?;
//!
//! println!("Similarity: {:.3}", result.similarity);
//! println!("Offset: {:.2} s", result.offset_seconds);
//!
//! desk_mix.close()?;
//! crowd.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`audio`] - Decoding, STFT, source separation and rhythm features
//! - [`dsp`] - Smoothing, similarity scoring and lag estimation primitives
//! - [`track`] - Track lifecycle and the raw-sample feature cache
//! - [`align`] - The comparison engine tying the pipeline together
//! - [`config`] - Configuration management
//!
//! ## Feature Cache
//!
//! Decoding dominates the cost of repeated comparisons, so [`Track`]
//! persists its decoded samples next to the source file (or under an output
//! directory of your choice) on release. Reopening a track restores the
//! samples and rederives everything else; derived features are never
//! persisted, so analysis changes take effect without invalidating caches.

pub mod align;
pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod track;

// Re-export commonly used types for convenience
pub use crate::{
    align::{AlignmentEngine, ComparisonResult},
    config::Config,
    error::{AlignerError, Result},
    track::Track,
};
