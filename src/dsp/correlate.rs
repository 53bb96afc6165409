use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{DspError, Result};

/// Circular lag between two sequences, in samples.
///
/// Computes the circular cross-correlation via FFT and returns the index of
/// its strongest peak: the non-negative number of samples `b`'s content is
/// delayed relative to `a`, modulo the transform length. A lag past the
/// midpoint is the same alignment approached from the other side; callers
/// fold it with `len - lag` when a magnitude is wanted.
///
/// Equal lengths are the intended use. Mismatched lengths are not rejected:
/// the transform spans the longer input and the shorter one is implicitly
/// zero-extended, which makes the result well-defined but rarely meaningful.
pub fn find_lag(a: &[f32], b: &[f32]) -> Result<usize> {
    let fft_len = a.len().max(b.len());
    if fft_len == 0 {
        return Err(DspError::DegenerateInput {
            reason: "empty sequence".to_string(),
        }
        .into());
    }

    let energy_a: f64 = a.iter().map(|&x| (x as f64) * (x as f64)).sum();
    let energy_b: f64 = b.iter().map(|&x| (x as f64) * (x as f64)).sum();
    if energy_a < 1e-10 || energy_b < 1e-10 {
        return Err(DspError::DegenerateInput {
            reason: "zero-energy sequence".to_string(),
        }
        .into());
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut freq_a: Vec<Complex<f64>> = a
        .iter()
        .map(|&x| Complex::new(x as f64, 0.0))
        .collect();
    freq_a.resize(fft_len, Complex::new(0.0, 0.0));

    let mut freq_b: Vec<Complex<f64>> = b
        .iter()
        .map(|&x| Complex::new(x as f64, 0.0))
        .collect();
    freq_b.resize(fft_len, Complex::new(0.0, 0.0));

    forward.process(&mut freq_a);
    forward.process(&mut freq_b);

    // conj(A) * B puts the correlation peak at b's delay relative to a
    let scale = 1.0 / fft_len as f64;
    let mut cross: Vec<Complex<f64>> = freq_a
        .iter()
        .zip(freq_b.iter())
        .map(|(x, y)| x.conj() * y * scale)
        .collect();

    inverse.process(&mut cross);

    let mut best_idx = 0;
    let mut best_mag = f64::NEG_INFINITY;
    for (i, c) in cross.iter().enumerate() {
        let mag = c.norm();
        if mag > best_mag {
            best_mag = mag;
            best_idx = i;
        }
    }

    Ok(best_idx)
}
