use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DspError, Result};

/// Window shapes available for smoothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Moving average
    Flat,
    Hanning,
    Hamming,
    Bartlett,
    Blackman,
}

impl Default for WindowKind {
    fn default() -> Self {
        Self::Hanning
    }
}

impl FromStr for WindowKind {
    type Err = DspError;

    fn from_str(s: &str) -> std::result::Result<Self, DspError> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "hanning" => Ok(Self::Hanning),
            "hamming" => Ok(Self::Hamming),
            "bartlett" => Ok(Self::Bartlett),
            "blackman" => Ok(Self::Blackman),
            _ => Err(DspError::UnknownWindow {
                name: s.to_string(),
            }),
        }
    }
}

impl WindowKind {
    /// Window coefficients of the given length (unnormalized)
    fn coefficients(&self, len: usize) -> Vec<f32> {
        let denom = (len - 1) as f32;
        (0..len)
            .map(|i| {
                let x = i as f32 / denom;
                match self {
                    Self::Flat => 1.0,
                    Self::Hanning => 0.5 - 0.5 * (2.0 * std::f32::consts::PI * x).cos(),
                    Self::Hamming => 0.54 - 0.46 * (2.0 * std::f32::consts::PI * x).cos(),
                    Self::Bartlett => 1.0 - (2.0 * x - 1.0).abs(),
                    Self::Blackman => {
                        0.42 - 0.5 * (2.0 * std::f32::consts::PI * x).cos()
                            + 0.08 * (4.0 * std::f32::consts::PI * x).cos()
                    }
                }
            })
            .collect()
    }
}

/// Smooth a sequence by convolving it with a normalized window.
///
/// The input is mirror-extended by `window_length - 1` samples at each end
/// (the edge sample itself is not repeated) before convolution, so the
/// result covers the same span as the input without boundary collapse. The
/// output is the valid-mode convolution of the extended sequence: its length
/// is `signal.len() + window_length - 1`, not the input length.
///
/// A `window_length` below 3 returns the input unchanged. A window longer
/// than the signal is rejected.
pub fn smooth(signal: &[f32], window_length: usize, kind: WindowKind) -> Result<Vec<f32>> {
    if window_length < 3 {
        return Ok(signal.to_vec());
    }

    let n = signal.len();
    if n < window_length {
        return Err(DspError::WindowTooLong {
            window: window_length,
            len: n,
        }
        .into());
    }

    // Mirror extension: for [a b c d] and window 3, [c b | a b c d | c b]
    let ext = window_length - 1;
    let mut extended = Vec::with_capacity(n + 2 * ext);
    for i in (1..=ext).rev() {
        extended.push(signal[i]);
    }
    extended.extend_from_slice(signal);
    for i in (n - ext - 1..n - 1).rev() {
        extended.push(signal[i]);
    }

    let mut window = kind.coefficients(window_length);
    let sum: f32 = window.iter().sum();
    for w in &mut window {
        *w /= sum;
    }

    // Valid-mode convolution of the extended signal; the window is
    // symmetric so correlation and convolution coincide
    let out_len = extended.len() - window_length + 1;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let mut acc = 0.0f32;
        for (j, &w) in window.iter().enumerate() {
            acc += extended[i + j] * w;
        }
        out.push(acc);
    }

    Ok(out)
}
