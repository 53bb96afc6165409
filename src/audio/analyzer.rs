use tracing::debug;

use crate::audio::stft::Stft;
use crate::config::AnalysisConfig;
use crate::error::Result;

/// Rhythm-oriented feature extraction: harmonic/percussive separation,
/// onset strength, tempo estimation and beat tracking.
pub struct AudioAnalyzer {
    config: AnalysisConfig,
}

impl AudioAnalyzer {
    /// Create a new analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    /// Create a new analyzer with custom configuration
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Split samples into harmonic and percussive components.
    ///
    /// Median-filtering the magnitude spectrogram along time enhances
    /// sustained (harmonic) ridges, along frequency enhances broadband
    /// (percussive) columns. Soft Wiener masks built from the two filtered
    /// spectrograms are applied to the complex spectrum, and each masked
    /// spectrogram is inverted back to the time domain. Both outputs have
    /// the same length as the input.
    pub fn separate(&self, samples: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        let stft = Stft::new(self.config.window_size, self.config.hop_size);
        let frames = stft.forward(samples)?;

        if frames.is_empty() {
            // Input shorter than one analysis window: nothing separable
            return Ok((vec![0.0; samples.len()], vec![0.0; samples.len()]));
        }

        let mags = Stft::magnitudes(&frames);
        let n_frames = mags.len();
        let n_bins = stft.bins();
        let half = (self.config.hpss_kernel / 2) as isize;

        debug!(
            "Separating {} frames x {} bins (median kernel {})",
            n_frames, n_bins, self.config.hpss_kernel
        );

        let mut kernel_buf = vec![0.0f32; self.config.hpss_kernel];

        // Median along time for each bin: harmonic enhancement
        let mut harmonic_mag = vec![vec![0.0f32; n_bins]; n_frames];
        for bin in 0..n_bins {
            for t in 0..n_frames {
                for (k, off) in (-half..=half).enumerate() {
                    let idx = t as isize + off;
                    kernel_buf[k] = if idx >= 0 && (idx as usize) < n_frames {
                        mags[idx as usize][bin]
                    } else {
                        0.0
                    };
                }
                harmonic_mag[t][bin] = median(&mut kernel_buf);
            }
        }

        // Median along frequency for each frame: percussive enhancement
        let mut percussive_mag = vec![vec![0.0f32; n_bins]; n_frames];
        for t in 0..n_frames {
            for bin in 0..n_bins {
                for (k, off) in (-half..=half).enumerate() {
                    let idx = bin as isize + off;
                    kernel_buf[k] = if idx >= 0 && (idx as usize) < n_bins {
                        mags[t][idx as usize]
                    } else {
                        0.0
                    };
                }
                percussive_mag[t][bin] = median(&mut kernel_buf);
            }
        }

        // Soft masks (power 2); bins silent in both estimates stay silent
        let mut harmonic_frames = frames.clone();
        let mut percussive_frames = frames;
        for t in 0..n_frames {
            for bin in 0..n_bins {
                let h2 = harmonic_mag[t][bin] * harmonic_mag[t][bin];
                let p2 = percussive_mag[t][bin] * percussive_mag[t][bin];
                let denom = h2 + p2;
                let (h_mask, p_mask) = if denom > 1e-12 {
                    (h2 / denom, p2 / denom)
                } else {
                    (0.0, 0.0)
                };
                harmonic_frames[t][bin] *= h_mask;
                percussive_frames[t][bin] *= p_mask;
            }
        }

        let harmonic = stft.inverse(harmonic_frames, samples.len())?;
        let percussive = stft.inverse(percussive_frames, samples.len())?;
        Ok((harmonic, percussive))
    }

    /// Per-frame onset strength: half-wave rectified spectral flux.
    ///
    /// One value per STFT frame; the first frame has no predecessor and is
    /// reported as zero.
    pub fn onset_envelope(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let stft = Stft::new(self.config.window_size, self.config.hop_size);
        let frames = stft.forward(samples)?;
        let mags = Stft::magnitudes(&frames);

        let mut envelope = vec![0.0f32; mags.len()];
        for t in 1..mags.len() {
            let flux: f32 = mags[t]
                .iter()
                .zip(mags[t - 1].iter())
                .map(|(&curr, &prev)| (curr - prev).max(0.0))
                .sum();
            envelope[t] = flux;
        }

        debug!("Onset envelope: {} frames", envelope.len());
        Ok(envelope)
    }

    /// Estimate tempo and beat positions from an onset envelope.
    ///
    /// Returns `(0.0, [])` when the envelope is too short or shows no stable
    /// periodicity in the configured BPM range. Beat positions are frame
    /// indices into the envelope.
    pub fn tempo_and_beats(&self, envelope: &[f32], sample_rate: u32) -> (f32, Vec<usize>) {
        let Some((bpm, period_frames)) = self.estimate_tempo(envelope, sample_rate) else {
            return (0.0, Vec::new());
        };

        let beats = self.track_beats(envelope, period_frames);
        debug!("Tempo {:.1} BPM, {} beats", bpm, beats.len());
        (bpm, beats)
    }

    /// Convert an envelope frame index to seconds
    pub fn frames_to_time(&self, frame: usize, sample_rate: u32) -> f64 {
        (frame * self.config.hop_size) as f64 / sample_rate as f64
    }

    /// Autocorrelation tempo estimate over the configured BPM range.
    ///
    /// The envelope is mean-centered and correlated against itself at every
    /// candidate beat period; parabolic interpolation around the winning lag
    /// gives sub-frame precision. Implausibly fast results are folded down an
    /// octave when the half-tempo correlation is nearly as strong.
    fn estimate_tempo(&self, envelope: &[f32], sample_rate: u32) -> Option<(f32, f32)> {
        if envelope.len() < 64 {
            return None;
        }

        let frame_duration = self.config.hop_size as f32 / sample_rate as f32;
        let min_lag = ((60.0 / (self.config.max_bpm * frame_duration)).floor() as usize).max(1);
        let max_lag = ((60.0 / (self.config.min_bpm * frame_duration)).ceil() as usize)
            .min(envelope.len() / 2);

        if min_lag >= max_lag {
            return None;
        }

        let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
        let centered: Vec<f32> = envelope.iter().map(|&x| x - mean).collect();

        let energy: f32 = centered.iter().map(|&x| x * x).sum();
        if energy < 1e-10 {
            return None;
        }

        let n = centered.len();
        let corr_at = |lag: usize| -> f32 {
            centered[..n - lag]
                .iter()
                .zip(centered[lag..].iter())
                .map(|(&a, &b)| a * b)
                .sum::<f32>()
                / energy
        };

        let mut best_lag = min_lag;
        let mut best_corr = f32::NEG_INFINITY;
        for lag in min_lag..=max_lag {
            let corr = corr_at(lag);
            if corr > best_corr {
                best_corr = corr;
                best_lag = lag;
            }
        }

        // Require minimum correlation strength
        if best_corr < 0.05 {
            return None;
        }

        // Parabolic interpolation around the peak for sub-frame precision
        let mut period = if best_lag > min_lag && best_lag < max_lag {
            let prev = corr_at(best_lag - 1);
            let next = corr_at(best_lag + 1);
            let denom = prev - 2.0 * best_corr + next;
            if denom.abs() > 1e-10 {
                best_lag as f32 + 0.5 * (prev - next) / denom
            } else {
                best_lag as f32
            }
        } else {
            best_lag as f32
        };

        let mut bpm = 60.0 / (period * frame_duration);

        // Octave ambiguity: very fast estimates often halve cleanly
        if bpm > 160.0 {
            let half_lag = (period * 2.0).round() as usize;
            if half_lag <= max_lag && corr_at(half_lag) > best_corr * 0.6 {
                bpm /= 2.0;
                period *= 2.0;
            }
        }

        if bpm.is_finite() && bpm > 0.0 {
            Some((bpm, period))
        } else {
            None
        }
    }

    /// Place beats on the tempo grid, phased against envelope peaks
    fn track_beats(&self, envelope: &[f32], period_frames: f32) -> Vec<usize> {
        let peaks = self.envelope_peaks(envelope);
        if peaks.is_empty() || period_frames < 1.0 {
            return Vec::new();
        }

        let tolerance = (period_frames * 0.2).max(1.0);

        // Try the earliest peaks as grid anchors, keep the phase that
        // lines up with the most peak mass
        let mut best_anchor = peaks[0];
        let mut best_score = f32::NEG_INFINITY;

        for &anchor in peaks.iter().take(10) {
            let mut score = 0.0f32;
            let mut grid = anchor as f32;
            while (grid as usize) < envelope.len() {
                for &p in &peaks {
                    let distance = (p as f32 - grid).abs();
                    if distance < tolerance {
                        score += 1.0 / (1.0 + distance);
                    }
                }
                grid += period_frames;
            }

            if score > best_score {
                best_score = score;
                best_anchor = anchor;
            }
        }

        let mut beats = Vec::new();
        let mut grid = best_anchor as f32;
        while (grid.round() as usize) < envelope.len() {
            beats.push(grid.round() as usize);
            grid += period_frames;
        }

        beats
    }

    /// Local maxima of the envelope clearly above its mean level
    fn envelope_peaks(&self, envelope: &[f32]) -> Vec<usize> {
        if envelope.len() < 5 {
            return Vec::new();
        }

        let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
        let threshold = mean * 1.5;

        let mut peaks = Vec::new();
        for t in 2..envelope.len() - 2 {
            let v = envelope[t];
            if v > threshold
                && v >= envelope[t - 1]
                && v >= envelope[t - 2]
                && v > envelope[t + 1]
                && v > envelope[t + 2]
            {
                peaks.push(t);
            }
        }

        peaks
    }
}

impl Default for AudioAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Median of a scratch buffer, reordering it in place
fn median(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    *values.select_nth_unstable_by(mid, f32::total_cmp).1
}
