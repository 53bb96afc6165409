use crate::error::{DspError, Result};

/// Normalized similarity between two sequences at zero lag.
///
/// Returns the inner product divided by the geometric mean of the two
/// energies, which lands in [-1, 1]: 1.0 for identical shapes regardless of
/// scale, 0.0 for orthogonal ones. Sums run in f64 so long envelopes do not
/// lose precision. Trailing samples of the longer input are ignored.
pub fn score(a: &[f32], b: &[f32]) -> Result<f32> {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    let denom = (norm_a * norm_b).sqrt();
    if denom < 1e-10 {
        return Err(DspError::DegenerateInput {
            reason: "zero-energy sequence".to_string(),
        }
        .into());
    }

    Ok((dot / denom) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_signals_score_one() {
        let signal: Vec<f32> = (0..100).map(|i| (i as f32 * 0.1).sin()).collect();
        let s = score(&signal, &signal).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_score_is_symmetric() {
        let a: Vec<f32> = (0..80).map(|i| (i as f32 * 0.3).sin()).collect();
        let b: Vec<f32> = (0..80).map(|i| (i as f32 * 0.3).cos()).collect();
        let ab = score(&a, &b).unwrap();
        let ba = score(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_scale_invariance() {
        let a: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin()).collect();
        let scaled: Vec<f32> = a.iter().map(|&x| x * 7.5).collect();
        let s = score(&a, &scaled).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_signals_score_minus_one() {
        let a: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin()).collect();
        let negated: Vec<f32> = a.iter().map(|&x| -x).collect();
        let s = score(&a, &negated).unwrap();
        assert!((s + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_signals_score_zero() {
        // One full period of sine against cosine
        let n = 256;
        let a: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / n as f32).sin())
            .collect();
        let b: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
            .collect();
        let s = score(&a, &b).unwrap();
        assert!(s.abs() < 1e-4);
    }

    #[test]
    fn test_zero_signal_rejected() {
        let silent = vec![0.0f32; 50];
        let signal: Vec<f32> = (0..50).map(|i| i as f32).collect();
        assert!(score(&silent, &signal).is_err());
        assert!(score(&signal, &signal).is_ok());
    }
}
