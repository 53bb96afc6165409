use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    dsp::WindowKind,
    error::{ConfigError, Result},
};

/// Main configuration for the Track-Aligner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Spectral analysis settings
    pub analysis: AnalysisConfig,

    /// Envelope smoothing settings
    pub smoothing: SmoothingConfig,

    /// Feature cache settings
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            smoothing: SmoothingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.smoothing.validate()?;
        Ok(())
    }
}

/// Spectral analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Window size for FFT analysis
    pub window_size: usize,

    /// Hop size for analysis windows
    pub hop_size: usize,

    /// Median-filter length for harmonic/percussive separation (odd)
    pub hpss_kernel: usize,

    /// Minimum BPM to detect
    pub min_bpm: f32,

    /// Maximum BPM to detect
    pub max_bpm: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 512,
            hpss_kernel: 31,
            min_bpm: 50.0,
            max_bpm: 220.0,
        }
    }
}

impl AnalysisConfig {
    fn validate(&self) -> Result<()> {
        if self.window_size < 16 || !self.window_size.is_power_of_two() {
            return Err(ConfigError::InvalidValue {
                key: "analysis.window_size".to_string(),
                value: self.window_size.to_string()
            }.into());
        }

        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(ConfigError::InvalidValue {
                key: "analysis.hop_size".to_string(),
                value: self.hop_size.to_string()
            }.into());
        }

        if self.hpss_kernel < 3 || self.hpss_kernel % 2 == 0 {
            return Err(ConfigError::InvalidValue {
                key: "analysis.hpss_kernel".to_string(),
                value: self.hpss_kernel.to_string()
            }.into());
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(ConfigError::InvalidValue {
                key: "analysis.bpm_range".to_string(),
                value: format!("{}-{}", self.min_bpm, self.max_bpm)
            }.into());
        }

        Ok(())
    }
}

/// Envelope smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Smoothing window length in frames
    pub window_length: usize,

    /// Window shape applied before comparison
    pub window: WindowKind,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_length: 11,
            window: WindowKind::Hanning,
        }
    }
}

impl SmoothingConfig {
    fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "smoothing.window_length".to_string(),
                value: self.window_length.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Feature cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Persist decoded samples and restore them on the next run
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
