//! Track loading, feature derivation and the raw-state cache.
//!
//! A [`Track`] moves through three stages: opened (raw samples restored from
//! cache or decoded, derived features regenerated either way), in use, and
//! persisted (raw state written back on release). Persistence runs on every
//! exit path: [`Track::close`] reports write errors, and dropping a track
//! without closing it persists best-effort.

pub mod cache;

pub use cache::{CacheEntry, RawCache};

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::audio::{AudioAnalyzer, AudioLoader};
use crate::config::Config;
use crate::error::{AudioError, CacheError, Result};

/// A loaded audio track: identity, raw samples and derived rhythm features
pub struct Track {
    name: String,
    source_path: PathBuf,
    output_dir: PathBuf,
    cache_path: PathBuf,
    cache_enabled: bool,
    persisted: bool,

    // Raw state (cached)
    samples: Vec<f32>,
    sample_rate: u32,

    // Derived state (regenerated on every open)
    harmonic: Vec<f32>,
    percussive: Vec<f32>,
    onset_envelope: Vec<f32>,
    tempo: f32,
    beat_frames: Vec<usize>,
}

impl Track {
    /// Open a track: restore raw samples from the cache or decode the source
    /// file, then derive rhythm features.
    ///
    /// `output_dir` houses the cache; it defaults to the source file's parent
    /// directory. A cache hit whose recorded source path differs from
    /// `source_path` is treated as a miss.
    pub fn open<P: AsRef<Path>>(
        source_path: P,
        output_dir: Option<&Path>,
        config: &Config,
    ) -> Result<Self> {
        let source_path = source_path.as_ref();

        let name = source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AudioError::LoadFailed {
                path: source_path.display().to_string(),
            })?;

        let output_dir = output_dir
            .map(|d| d.to_path_buf())
            .or_else(|| source_path.parent().map(|d| d.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        let cache_path = RawCache::entry_path(&output_dir, &name);

        let (samples, sample_rate) = if config.cache.enabled {
            match RawCache::load(&cache_path) {
                Ok(entry) if entry.source_path == source_path => {
                    info!("Restored '{}' from cache", name);
                    (entry.samples, entry.sample_rate)
                }
                Ok(entry) => {
                    debug!(
                        "Cache entry at {} belongs to {}, treating as miss",
                        cache_path.display(),
                        entry.source_path.display()
                    );
                    Self::decode(source_path)?
                }
                Err(CacheError::Miss { path }) => {
                    debug!("Cache miss at {}, decoding source", path);
                    Self::decode(source_path)?
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            Self::decode(source_path)?
        };

        // Derived features come from the same routine on both paths, so a
        // restored track is indistinguishable from a freshly decoded one
        let analyzer = AudioAnalyzer::with_config(config.analysis.clone());
        let (harmonic, percussive) = analyzer.separate(&samples)?;
        let onset_envelope = analyzer.onset_envelope(&percussive)?;
        let (tempo, beat_frames) = analyzer.tempo_and_beats(&onset_envelope, sample_rate);

        info!(
            "Opened '{}': {:.1} s at {} Hz, {} envelope frames, tempo {:.1} BPM",
            name,
            samples.len() as f64 / sample_rate.max(1) as f64,
            sample_rate,
            onset_envelope.len(),
            tempo
        );

        Ok(Self {
            name,
            source_path: source_path.to_path_buf(),
            output_dir,
            cache_path,
            cache_enabled: config.cache.enabled,
            persisted: false,
            samples,
            sample_rate,
            harmonic,
            percussive,
            onset_envelope,
            tempo,
            beat_frames,
        })
    }

    fn decode(source_path: &Path) -> Result<(Vec<f32>, u32)> {
        let audio = AudioLoader::load(source_path)?;
        Ok((audio.samples, audio.sample_rate))
    }

    /// Release the track, persisting raw state if no cache entry exists yet.
    ///
    /// Dropping a track without calling this persists too, but swallows
    /// write errors (they are only logged).
    pub fn close(mut self) -> Result<()> {
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        if self.persisted {
            return Ok(());
        }
        self.persisted = true;

        if !self.cache_enabled {
            return Ok(());
        }

        let entry = CacheEntry {
            name: self.name.clone(),
            source_path: std::mem::take(&mut self.source_path),
            sample_rate: self.sample_rate,
            samples: std::mem::take(&mut self.samples),
        };
        RawCache::store(&self.cache_path, &entry)
    }

    /// Short name: the source file stem
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decoded mono samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }

    /// Harmonic component of the samples
    pub fn harmonic(&self) -> &[f32] {
        &self.harmonic
    }

    /// Percussive component of the samples
    pub fn percussive(&self) -> &[f32] {
        &self.percussive
    }

    /// Onset strength per analysis frame, computed from the percussive
    /// component
    pub fn onset_envelope(&self) -> &[f32] {
        &self.onset_envelope
    }

    /// Estimated tempo in BPM, 0.0 when none was found
    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Frame indices of tracked beats
    pub fn beat_frames(&self) -> &[usize] {
        &self.beat_frames
    }
}

impl Drop for Track {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist '{}' on release: {}", self.name, e);
        }
    }
}
