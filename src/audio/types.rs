use std::path::PathBuf;

/// Decoded audio with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Mono samples, channel-averaged at decode time
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels in the source file
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Build from interleaved samples, averaging all channels down to mono
    pub fn from_interleaved(
        interleaved: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        file_path: PathBuf,
    ) -> Self {
        let samples = if channels <= 1 {
            interleaved
        } else {
            let mut mono = Vec::with_capacity(interleaved.len() / channels as usize);
            for chunk in interleaved.chunks(channels as usize) {
                let sum: f32 = chunk.iter().sum();
                mono.push(sum / chunk.len() as f32);
            }
            mono
        };

        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };

        Self {
            samples,
            sample_rate,
            channels,
            duration,
            file_path,
        }
    }

    /// Get time in seconds for a sample index
    pub fn time_for_sample(&self, sample_index: usize) -> f64 {
        sample_index as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_downmix_averages_channels() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // L, R, L, R, L, R
        let audio = AudioData::from_interleaved(interleaved, 2, 44100, PathBuf::from("test.wav"));

        assert_eq!(audio.samples, vec![1.5, 3.5, 5.5]);
        assert_eq!(audio.channels, 2);
    }

    #[test]
    fn test_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        let audio = AudioData::from_interleaved(samples.clone(), 1, 22050, PathBuf::from("m.wav"));

        assert_eq!(audio.samples, samples);
        assert!((audio.duration - 3.0 / 22050.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_for_sample() {
        let audio = AudioData::from_interleaved(vec![0.0; 44100], 1, 44100, PathBuf::from("s.wav"));
        assert!((audio.time_for_sample(22050) - 0.5).abs() < 1e-9);
    }
}
