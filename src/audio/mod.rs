//! # Audio Loading & Analysis Module
//!
//! Provides audio decoding and the rhythm analysis the alignment pipeline
//! runs on: harmonic/percussive separation, onset strength envelopes, tempo
//! estimation and beat tracking.
//!
//! ## Core Features
//!
//! - **Decoding**: WAV via a fast dedicated path, everything else through a
//!   general-purpose demuxer, always downmixed to mono `f32`
//! - **Spectral Analysis**: Hann-windowed STFT with exact interior
//!   reconstruction for the separation round trip
//! - **Source Separation**: median-filtering HPSS with soft Wiener masks
//! - **Rhythm Features**: spectral-flux onset envelope, autocorrelation
//!   tempo estimate and beat grid tracking
//!
//! ## Usage
//!
//! ```rust,no_run
//! use track_aligner::audio::{AudioAnalyzer, AudioLoader};
//!
//! # fn main() -> anyhow::Result<()> {
//! // Load and downmix an audio file
//! let audio = AudioLoader::load("song.wav")?;
//!
//! // Extract the rhythm features
//! let analyzer = AudioAnalyzer::new();
//! let (_harmonic, percussive) = analyzer.separate(&audio.samples)?;
//! let envelope = analyzer.onset_envelope(&percussive)?;
//! let (bpm, beats) = analyzer.tempo_and_beats(&envelope, audio.sample_rate);
//!
//! println!("Estimated BPM: {bpm}");
//! println!("Tracked {} beats", beats.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod loader;
pub mod stft;
pub mod types;

pub use analyzer::AudioAnalyzer;
pub use loader::AudioLoader;
pub use stft::Stft;
pub use types::AudioData;
