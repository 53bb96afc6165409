use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    audio::AudioAnalyzer,
    config::Config,
    dsp::{find_lag, score, smooth},
    error::{CompareError, Result},
    track::Track,
};

/// Outcome of comparing two tracks
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    /// Name of the first track
    pub track_a: String,

    /// Name of the second track
    pub track_b: String,

    /// Zero-lag similarity of the smoothed onset envelopes, ~[0, 1]
    pub similarity: f32,

    /// Recovered offset in analysis frames, folded to the nearer direction
    pub lag_frames: usize,

    /// Recovered offset as a magnitude in seconds
    pub offset_seconds: f64,
}

/// Alignment engine that compares tracks by their rhythm envelopes
///
/// The comparison pipeline:
/// 1. Envelope Check - Both tracks must carry a usable onset envelope
/// 2. Length Equalization - The shorter envelope is zero-padded, never cut
/// 3. Smoothing - Both envelopes pass through the same configured window
/// 4. Scoring - Zero-lag similarity of the smoothed pair
/// 5. Lag Recovery - Circular cross-correlation peak, folded past the midpoint
pub struct AlignmentEngine {
    config: Config,
}

impl AlignmentEngine {
    /// Create a new alignment engine with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Compare two opened tracks and recover their relative offset.
    ///
    /// The reported `offset_seconds` is a magnitude: a lag past the envelope
    /// midpoint is the same alignment approached from the other side and is
    /// folded back. Tracks with different sample rates cannot be compared
    /// because their frame clocks disagree.
    pub fn compare(&self, a: &Track, b: &Track) -> Result<ComparisonResult> {
        info!("🎯 Comparing '{}' vs '{}'", a.name(), b.name());

        if a.sample_rate() != b.sample_rate() {
            return Err(CompareError::SampleRateMismatch {
                rate_a: a.sample_rate(),
                rate_b: b.sample_rate(),
            }
            .into());
        }

        let env_a = self.usable_envelope(a)?;
        let env_b = self.usable_envelope(b)?;

        // Equalize by padding the shorter envelope at the trailing edge
        let target = env_a.len().max(env_b.len());
        let mut padded_a = env_a.to_vec();
        let mut padded_b = env_b.to_vec();
        padded_a.resize(target, 0.0);
        padded_b.resize(target, 0.0);

        debug!(
            "Envelopes: {} and {} frames, equalized to {}",
            env_a.len(),
            env_b.len(),
            target
        );

        let smoothing = &self.config.smoothing;
        let smoothed_a = smooth(&padded_a, smoothing.window_length, smoothing.window)?;
        let smoothed_b = smooth(&padded_b, smoothing.window_length, smoothing.window)?;

        let similarity = score(&smoothed_a, &smoothed_b)?;
        let raw_lag = find_lag(&smoothed_a, &smoothed_b)?;

        // A circular peak past the midpoint is the same alignment seen from
        // the other side
        let len = smoothed_a.len();
        let lag_frames = if raw_lag > len / 2 {
            len - raw_lag
        } else {
            raw_lag
        };

        let analyzer = AudioAnalyzer::with_config(self.config.analysis.clone());
        let offset_seconds = analyzer.frames_to_time(lag_frames, a.sample_rate());

        info!(
            "   ✅ Similarity {:.3}, offset {:.3}s ({} frames, raw lag {})",
            similarity, offset_seconds, lag_frames, raw_lag
        );

        Ok(ComparisonResult {
            track_a: a.name().to_string(),
            track_b: b.name().to_string(),
            similarity,
            lag_frames,
            offset_seconds,
        })
    }

    /// Compare one reference track against many candidate files.
    ///
    /// Candidates are opened, compared and released independently and in
    /// parallel; one broken candidate never aborts the batch. Successful
    /// comparisons come first, sorted by descending similarity, followed by
    /// the failures.
    pub fn match_against(
        &self,
        reference: &Track,
        candidates: &[PathBuf],
    ) -> Vec<(String, Result<ComparisonResult>)> {
        info!(
            "🔍 Matching '{}' against {} candidates",
            reference.name(),
            candidates.len()
        );

        let mut outcomes: Vec<(String, Result<ComparisonResult>)> = candidates
            .par_iter()
            .map(|path| {
                let name = candidate_name(path);
                let outcome = self.compare_candidate(reference, path);
                if let Err(e) = &outcome {
                    warn!("Skipping '{}': {}", name, e);
                }
                (name, outcome)
            })
            .collect();

        outcomes.sort_by(|a, b| match (&a.1, &b.1) {
            (Ok(x), Ok(y)) => y.similarity.total_cmp(&x.similarity),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.0.cmp(&b.0),
        });

        let matched = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
        info!(
            "   ✅ Batch complete: {} compared, {} failed",
            matched,
            outcomes.len() - matched
        );

        outcomes
    }

    fn compare_candidate(&self, reference: &Track, path: &Path) -> Result<ComparisonResult> {
        let candidate = Track::open(path, Some(reference.output_dir()), &self.config)?;
        let result = self.compare(reference, &candidate)?;
        if let Err(e) = candidate.close() {
            warn!("Failed to persist '{}' after comparison: {}", result.track_b, e);
        }
        Ok(result)
    }

    /// Envelope of `track`, rejected when empty or silent
    fn usable_envelope<'t>(&self, track: &'t Track) -> Result<&'t [f32]> {
        let envelope = track.onset_envelope();
        let energy: f64 = envelope.iter().map(|&v| (v as f64) * (v as f64)).sum();
        if envelope.is_empty() || energy < 1e-10 {
            return Err(CompareError::DegenerateEnvelope {
                name: track.name().to_string(),
            }
            .into());
        }
        Ok(envelope)
    }
}

fn candidate_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlignerError;
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use tempfile::tempdir;

    const SAMPLE_RATE: u32 = 8000;
    /// 120 BPM at 8 kHz
    const CLICK_PERIOD: usize = 4000;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.analysis.window_size = 512;
        config.analysis.hop_size = 256;
        config
    }

    /// Per-click amplitudes, deterministic so both renditions of a track
    /// carry the same sequence
    fn click_amplitudes(count: usize, seed: u64) -> Vec<f32> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..count).map(|_| rng.gen_range(0.7..1.0)).collect()
    }

    /// A click train starting after `lead_in` samples of silence
    fn click_track(amplitudes: &[f32], lead_in: usize, total_len: usize) -> Vec<f32> {
        let mut samples = vec![0.0f32; total_len];
        for (k, &amp) in amplitudes.iter().enumerate() {
            let pos = lead_in + k * CLICK_PERIOD;
            if pos + 8 > total_len {
                break;
            }
            for i in 0..8 {
                samples[pos + i] = if i % 2 == 0 { amp } else { -amp };
            }
        }
        samples
    }

    fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_track_matches_itself() {
        let dir = tempdir().unwrap();
        let wav = dir.path().join("loop.wav");
        let amps = click_amplitudes(10, 7);
        write_wav(&wav, &click_track(&amps, 0, 5 * SAMPLE_RATE as usize), SAMPLE_RATE);

        let track = Track::open(&wav, None, &test_config()).unwrap();
        let engine = AlignmentEngine::new(test_config());
        let result = engine.compare(&track, &track).unwrap();

        assert_eq!(result.track_a, "loop");
        assert_eq!(result.track_b, "loop");
        assert!(result.similarity > 0.999);
        assert_eq!(result.lag_frames, 0);
        assert!(result.offset_seconds.abs() < 1e-9);
    }

    #[test]
    fn test_comparison_is_symmetric() {
        let dir = tempdir().unwrap();
        let config = test_config();

        let amps = click_amplitudes(12, 3);
        let wav_a = dir.path().join("one.wav");
        let wav_b = dir.path().join("two.wav");
        write_wav(&wav_a, &click_track(&amps, 0, 6 * SAMPLE_RATE as usize), SAMPLE_RATE);
        write_wav(&wav_b, &click_track(&amps, 2000, 6 * SAMPLE_RATE as usize), SAMPLE_RATE);

        let a = Track::open(&wav_a, None, &config).unwrap();
        let b = Track::open(&wav_b, None, &config).unwrap();

        let engine = AlignmentEngine::new(config);
        let forward = engine.compare(&a, &b).unwrap();
        let reverse = engine.compare(&b, &a).unwrap();

        assert!((forward.similarity - reverse.similarity).abs() < 1e-6);
        assert_eq!(forward.lag_frames, reverse.lag_frames);
        assert!((forward.offset_seconds - reverse.offset_seconds).abs() < 1e-9);
    }

    #[test]
    fn test_unequal_durations_are_padded() {
        let dir = tempdir().unwrap();
        let config = test_config();

        let amps = click_amplitudes(16, 5);
        let wav_short = dir.path().join("short.wav");
        let wav_long = dir.path().join("long.wav");
        write_wav(&wav_short, &click_track(&amps, 0, 4 * SAMPLE_RATE as usize), SAMPLE_RATE);
        write_wav(&wav_long, &click_track(&amps, 0, 8 * SAMPLE_RATE as usize), SAMPLE_RATE);

        let short = Track::open(&wav_short, None, &config).unwrap();
        let long = Track::open(&wav_long, None, &config).unwrap();
        assert!(short.onset_envelope().len() < long.onset_envelope().len());

        let engine = AlignmentEngine::new(config);
        let result = engine.compare(&short, &long).unwrap();

        // The shared first half dominates, so the tracks still align at zero
        assert_eq!(result.lag_frames, 0);
        assert!(result.similarity > 0.5);
    }

    #[test]
    fn test_sample_rate_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let config = test_config();

        let amps = click_amplitudes(8, 11);
        let wav_a = dir.path().join("eight.wav");
        let wav_b = dir.path().join("eleven.wav");
        write_wav(&wav_a, &click_track(&amps, 0, 2 * SAMPLE_RATE as usize), 8000);
        write_wav(&wav_b, &click_track(&amps, 0, 2 * SAMPLE_RATE as usize), 11025);

        let a = Track::open(&wav_a, None, &config).unwrap();
        let b = Track::open(&wav_b, None, &config).unwrap();

        let engine = AlignmentEngine::new(config);
        let err = engine.compare(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            AlignerError::Compare(CompareError::SampleRateMismatch {
                rate_a: 8000,
                rate_b: 11025,
            })
        ));
    }

    #[test]
    fn test_silent_track_is_named_in_error() {
        let dir = tempdir().unwrap();
        let config = test_config();

        let amps = click_amplitudes(8, 13);
        let wav_good = dir.path().join("good.wav");
        let wav_silent = dir.path().join("hush.wav");
        write_wav(&wav_good, &click_track(&amps, 0, 3 * SAMPLE_RATE as usize), SAMPLE_RATE);
        write_wav(&wav_silent, &vec![0.0; 3 * SAMPLE_RATE as usize], SAMPLE_RATE);

        let good = Track::open(&wav_good, None, &config).unwrap();
        let silent = Track::open(&wav_silent, None, &config).unwrap();

        let engine = AlignmentEngine::new(config);
        let err = engine.compare(&good, &silent).unwrap_err();
        match err {
            AlignerError::Compare(CompareError::DegenerateEnvelope { name }) => {
                assert_eq!(name, "hush");
            }
            other => panic!("expected degenerate envelope error, got {other:?}"),
        }
    }

    #[test]
    fn test_recovers_known_offset() {
        let dir = tempdir().unwrap();
        let mut config = test_config();
        // 0.5 s beat = 16 hops and 5 s delay = 160 hops, both exact, so the
        // delayed copy reproduces the original's analysis frames bit for bit
        config.analysis.hop_size = 250;

        // 30 s of clicks on a 0.5 s grid. The delay below is a whole number
        // of beats, so the grids also coincide unshifted and similarity
        // stays high. One weaker click in the never-copied tail breaks that
        // symmetry: only the true shift lines every click up at full
        // strength.
        let len = 30 * SAMPLE_RATE as usize;
        let mut original = vec![0.0f32; len];
        for slot in 1..=59usize {
            let amp = if slot == 55 { 0.45 } else { 0.9 };
            let pos = slot * CLICK_PERIOD;
            for i in 0..8 {
                original[pos + i] = if i % 2 == 0 { amp } else { -amp };
            }
        }

        // The same performance started 5 s later, cut at the same 30 s
        let delay_seconds = 5.0;
        let delay_samples = 5 * SAMPLE_RATE as usize;
        let mut delayed = vec![0.0f32; len];
        delayed[delay_samples..].copy_from_slice(&original[..len - delay_samples]);

        let wav_orig = dir.path().join("original.wav");
        let wav_late = dir.path().join("delayed.wav");
        write_wav(&wav_orig, &original, SAMPLE_RATE);
        write_wav(&wav_late, &delayed, SAMPLE_RATE);

        let original = Track::open(&wav_orig, None, &config).unwrap();
        let delayed = Track::open(&wav_late, None, &config).unwrap();

        let engine = AlignmentEngine::new(config);
        let result = engine.compare(&original, &delayed).unwrap();

        assert_eq!(result.track_a, "original");
        assert_eq!(result.track_b, "delayed");

        // Same performance on coinciding beat grids: high, but visibly
        // below a self-comparison because of the content only one side has
        assert!(
            result.similarity > 0.9 && result.similarity < 0.95,
            "similarity {} outside the expected band",
            result.similarity
        );

        let frame_seconds = 250.0 / SAMPLE_RATE as f64;
        assert!(
            (result.offset_seconds - delay_seconds).abs() < frame_seconds,
            "recovered offset {} s, wanted {} s",
            result.offset_seconds,
            delay_seconds
        );
    }

    #[test]
    fn test_match_against_ranks_candidates() {
        let dir = tempdir().unwrap();
        let config = test_config();

        let amps = click_amplitudes(10, 21);
        let reference_samples = click_track(&amps, 0, 5 * SAMPLE_RATE as usize);

        let wav_ref = dir.path().join("reference.wav");
        write_wav(&wav_ref, &reference_samples, SAMPLE_RATE);

        // Same content under another name, a shifted rendition, and garbage
        let wav_same = dir.path().join("same.wav");
        write_wav(&wav_same, &reference_samples, SAMPLE_RATE);

        let wav_shifted = dir.path().join("shifted.wav");
        write_wav(
            &wav_shifted,
            &click_track(&amps, SAMPLE_RATE as usize, 5 * SAMPLE_RATE as usize),
            SAMPLE_RATE,
        );

        let wav_broken = dir.path().join("broken.wav");
        std::fs::write(&wav_broken, b"not audio at all").unwrap();

        let reference = Track::open(&wav_ref, None, &config).unwrap();
        let engine = AlignmentEngine::new(config);

        let outcomes = engine.match_against(
            &reference,
            &[wav_same, wav_shifted, wav_broken],
        );
        assert_eq!(outcomes.len(), 3);

        // Identical content first, failures last
        assert_eq!(outcomes[0].0, "same");
        let top = outcomes[0].1.as_ref().unwrap();
        assert!(top.similarity > 0.999);
        assert_eq!(top.lag_frames, 0);

        assert_eq!(outcomes[1].0, "shifted");
        assert!(outcomes[1].1.is_ok());

        assert_eq!(outcomes[2].0, "broken");
        assert!(outcomes[2].1.is_err());
    }
}
