use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::error::{AudioError, Result};

/// Short-time Fourier transform with weighted overlap-add inversion.
///
/// Frames are taken every `hop_size` samples, each `window_size` samples long
/// and Hann-windowed. The trailing partial window is dropped; `inverse`
/// zero-fills whatever it cannot reconstruct so output length always matches
/// the requested length.
pub struct Stft {
    window_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
}

impl Stft {
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        let mut planner = RealFftPlanner::new();
        let forward = planner.plan_fft_forward(window_size);
        let inverse = planner.plan_fft_inverse(window_size);

        // Hann window
        let window: Vec<f32> = (0..window_size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (window_size - 1) as f32).cos())
            })
            .collect();

        Self {
            window_size,
            hop_size,
            window,
            forward,
            inverse,
        }
    }

    /// Number of frequency bins per frame
    pub fn bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Number of complete frames available for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.window_size {
            0
        } else {
            (len - self.window_size) / self.hop_size + 1
        }
    }

    /// Forward transform: complex spectrum per frame
    pub fn forward(&self, samples: &[f32]) -> Result<Vec<Vec<Complex<f32>>>> {
        let mut input_buffer = self.forward.make_input_vec();
        let mut frames = Vec::with_capacity(self.frame_count(samples.len()));

        for window in samples.windows(self.window_size).step_by(self.hop_size) {
            for (i, &sample) in window.iter().enumerate() {
                input_buffer[i] = sample * self.window[i];
            }

            let mut spectrum = self.forward.make_output_vec();
            self.forward
                .process(&mut input_buffer, &mut spectrum)
                .map_err(|_| AudioError::AnalysisFailed {
                    reason: "forward FFT failed".to_string(),
                })?;

            frames.push(spectrum);
        }

        Ok(frames)
    }

    /// Magnitude spectrogram for a set of complex frames
    pub fn magnitudes(frames: &[Vec<Complex<f32>>]) -> Vec<Vec<f32>> {
        frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Inverse transform via weighted overlap-add, resized to `output_len`
    pub fn inverse(
        &self,
        mut frames: Vec<Vec<Complex<f32>>>,
        output_len: usize,
    ) -> Result<Vec<f32>> {
        let span = if frames.is_empty() {
            0
        } else {
            (frames.len() - 1) * self.hop_size + self.window_size
        };

        let mut accum = vec![0.0f32; span];
        let mut norm = vec![0.0f32; span];
        let mut frame_buffer = self.inverse.make_output_vec();
        let scale = 1.0 / self.window_size as f32;

        for (t, spectrum) in frames.iter_mut().enumerate() {
            self.inverse
                .process(spectrum, &mut frame_buffer)
                .map_err(|_| AudioError::AnalysisFailed {
                    reason: "inverse FFT failed".to_string(),
                })?;

            let offset = t * self.hop_size;
            for i in 0..self.window_size {
                accum[offset + i] += frame_buffer[i] * scale * self.window[i];
                norm[offset + i] += self.window[i] * self.window[i];
            }
        }

        for (sample, weight) in accum.iter_mut().zip(norm.iter()) {
            if *weight > 1e-8 {
                *sample /= *weight;
            }
        }

        accum.resize(output_len, 0.0);
        Ok(accum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_frame_count() {
        let stft = Stft::new(1024, 512);
        assert_eq!(stft.frame_count(0), 0);
        assert_eq!(stft.frame_count(1023), 0);
        assert_eq!(stft.frame_count(1024), 1);
        assert_eq!(stft.frame_count(1536), 2);
        assert_eq!(stft.frame_count(2048), 3);
    }

    #[test]
    fn test_forward_dimensions() {
        let stft = Stft::new(1024, 512);
        let samples = sine(440.0, 44100, 4096);
        let frames = stft.forward(&samples).unwrap();

        assert_eq!(frames.len(), stft.frame_count(4096));
        assert!(frames.iter().all(|f| f.len() == stft.bins()));
    }

    #[test]
    fn test_sine_peak_bin() {
        let sample_rate = 8000;
        let stft = Stft::new(1024, 512);
        // 1000 Hz at 8 kHz -> bin 1000/8000*1024 = 128
        let samples = sine(1000.0, sample_rate, 4096);
        let frames = stft.forward(&samples).unwrap();
        let mags = Stft::magnitudes(&frames);

        let peak_bin = mags[1]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak_bin as i64 - 128).abs() <= 1);
    }

    #[test]
    fn test_roundtrip_reconstruction() {
        let stft = Stft::new(1024, 512);
        let samples = sine(440.0, 8000, 8192);
        let frames = stft.forward(&samples).unwrap();
        let rebuilt = stft.inverse(frames, samples.len()).unwrap();

        assert_eq!(rebuilt.len(), samples.len());
        // Interior samples reconstruct closely; edges lack full overlap
        for i in 1024..7168 {
            assert!(
                (rebuilt[i] - samples[i]).abs() < 1e-3,
                "sample {} differs: {} vs {}",
                i,
                rebuilt[i],
                samples[i]
            );
        }
    }

    #[test]
    fn test_short_input_yields_no_frames() {
        let stft = Stft::new(1024, 512);
        let frames = stft.forward(&[0.1; 100]).unwrap();
        assert!(frames.is_empty());

        let rebuilt = stft.inverse(frames, 100).unwrap();
        assert_eq!(rebuilt, vec![0.0; 100]);
    }
}
