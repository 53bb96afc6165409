use thiserror::Error;

/// Main error type for the Track-Aligner library
#[derive(Error, Debug)]
pub enum AlignerError {
    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Signal processing error: {0}")]
    Dsp(#[from] DspError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Audio decoding and analysis errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("No decodable audio track in file: {path}")]
    NoAudioTrack { path: String },

    #[error("Failed to decode audio file: {path} - {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("Audio analysis failed: {reason}")]
    AnalysisFailed { reason: String },
}

/// Errors from the pure signal-processing layer
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Smoothing window ({window}) is longer than the signal ({len})")]
    WindowTooLong { window: usize, len: usize },

    #[error("Unknown smoothing window kind: {name}")]
    UnknownWindow { name: String },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },
}

/// Errors raised while comparing two tracks
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Sample rates differ: {rate_a} Hz vs {rate_b} Hz")]
    SampleRateMismatch { rate_a: u32, rate_b: u32 },

    #[error("Track '{name}' has a silent or empty onset envelope")]
    DegenerateEnvelope { name: String },
}

/// Feature cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No usable cache entry at: {path}")]
    Miss { path: String },

    #[error("Failed to write cache entry: {path} - {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to serialize cache entry: {reason}")]
    SerializeFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using AlignerError
pub type Result<T> = std::result::Result<T, AlignerError>;

impl AlignerError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // Loading might work on retry
            Self::Audio(AudioError::LoadFailed { .. }) => true,
            // A cache miss is the expected fallback path, not a failure
            Self::Cache(CacheError::Miss { .. }) => true,
            // Most other errors are permanent
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Audio(AudioError::UnsupportedFormat { format }) => {
                format!("Audio format '{}' is not supported. Supported formats: wav, mp3, flac, ogg, m4a.", format)
            }
            Self::Compare(CompareError::SampleRateMismatch { rate_a, rate_b }) => {
                format!("Cannot compare tracks with different sample rates ({} Hz vs {} Hz). Resample one of them first.", rate_a, rate_b)
            }
            Self::Compare(CompareError::DegenerateEnvelope { name }) => {
                format!("Track '{}' is silent or empty; there is nothing to align.", name)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
