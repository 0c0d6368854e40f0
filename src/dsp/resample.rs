//! Rational polyphase resampler
//!
//! Converts the 218.75 kHz channel dumps to 48 kHz by the exact ratio
//! 192/875. Conceptually the input is zero-stuffed by `L`, low-pass filtered
//! at the upsampled rate and decimated by `M`; the implementation evaluates
//! only the filter taps that land on kept output samples, one polyphase bank
//! per upsampling phase.

use std::f64::consts::PI;

// ============================================================================
// Constants
// ============================================================================

/// Interpolation factor `L` for 218750 Hz -> 48000 Hz
pub const UPSAMPLE_FACTOR: usize = 192;

/// Decimation factor `M` for 218750 Hz -> 48000 Hz
pub const DOWNSAMPLE_FACTOR: usize = 875;

/// Kaiser window shape parameter of the anti-aliasing filter
pub const KAISER_BETA: f64 = 5.0;

/// Filter half length in units of `max(L, M)`
const HALF_LEN_PER_RATE: usize = 10;

// ============================================================================
// Helper Functions
// ============================================================================

/// Zeroth order modified Bessel function of the first kind
///
/// Power series; converges quickly for the window shapes used here.
pub fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;

    loop {
        term *= (half / k) * (half / k);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
        k += 1.0;
    }

    sum
}

/// Symmetric Kaiser window of `len` points
pub fn kaiser_window(len: usize, beta: f64) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }

    let alpha = (len - 1) as f64 / 2.0;
    let denom = bessel_i0(beta);

    (0..len)
        .map(|n| {
            let ratio = (n as f64 - alpha) / alpha;
            bessel_i0(beta * (1.0 - ratio * ratio).max(0.0).sqrt()) / denom
        })
        .collect()
}

/// Normalized sinc, `sin(pi x) / (pi x)`
#[inline]
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Kaiser-windowed sinc low-pass with unity DC gain
///
/// # Arguments
/// * `num_taps` - Filter length (odd for a type I linear phase filter)
/// * `cutoff` - Cutoff as a fraction of Nyquist (0.0 to 1.0)
/// * `beta` - Kaiser window shape
pub fn windowed_sinc_lowpass(num_taps: usize, cutoff: f64, beta: f64) -> Vec<f64> {
    let alpha = (num_taps - 1) as f64 / 2.0;
    let window = kaiser_window(num_taps, beta);

    let mut taps: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(n, w)| cutoff * sinc(cutoff * (n as f64 - alpha)) * w)
        .collect();

    let sum: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }

    taps
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

// ============================================================================
// Polyphase Resampler
// ============================================================================

/// Polyphase rational resampler for a fixed `up / down` ratio
///
/// Output sample `i` is aligned with input time `i * down / up`; the FIR
/// group delay is compensated so no leading padding appears in the output.
#[derive(Debug, Clone)]
pub struct PolyphaseResampler {
    up: usize,
    down: usize,
    half_len: usize,
    /// `banks[p][j]` is prototype tap `p + j * up`
    banks: Vec<Vec<f64>>,
}

impl PolyphaseResampler {
    /// Build a resampler for `up / down`, reducing the ratio first
    ///
    /// # Panics
    /// Panics if either factor is zero.
    pub fn new(up: usize, down: usize) -> Self {
        assert!(up > 0 && down > 0, "resampling factors must be non-zero");

        let g = gcd(up, down);
        let (up, down) = (up / g, down / g);

        let max_rate = up.max(down);
        let half_len = HALF_LEN_PER_RATE * max_rate;
        let mut prototype =
            windowed_sinc_lowpass(2 * half_len + 1, 1.0 / max_rate as f64, KAISER_BETA);
        for tap in &mut prototype {
            *tap *= up as f64;
        }

        let mut banks = vec![Vec::with_capacity(prototype.len() / up + 1); up];
        for (n, tap) in prototype.iter().enumerate() {
            banks[n % up].push(*tap);
        }

        Self {
            up,
            down,
            half_len,
            banks,
        }
    }

    /// Resampler for the AY dump rate to the output rate (192/875)
    pub fn ay_to_output() -> Self {
        Self::new(UPSAMPLE_FACTOR, DOWNSAMPLE_FACTOR)
    }

    /// Reduced interpolation factor
    pub fn up(&self) -> usize {
        self.up
    }

    /// Reduced decimation factor
    pub fn down(&self) -> usize {
        self.down
    }

    /// Total number of prototype filter taps
    pub fn num_taps(&self) -> usize {
        self.banks.iter().map(Vec::len).sum()
    }

    /// Number of output samples produced for `input_len` input samples
    ///
    /// `ceil(input_len * up / down)`.
    pub fn output_len(&self, input_len: usize) -> usize {
        (input_len * self.up).div_ceil(self.down)
    }

    /// Resample a whole signal
    pub fn process(&self, input: &[f64]) -> Vec<f64> {
        let n_in = input.len();
        let n_out = self.output_len(n_in);
        let mut output = Vec::with_capacity(n_out);

        for i in 0..n_out {
            // Position on the upsampled grid, shifted by the filter delay
            let t = i * self.down + self.half_len;
            let bank = &self.banks[t % self.up];
            let newest = t / self.up;

            // Bank tap j multiplies input sample (newest - j)
            let j_start = if newest >= n_in { newest - (n_in - 1) } else { 0 };
            let j_end = bank.len().min(newest + 1);

            let mut acc = 0.0;
            for j in j_start..j_end {
                acc += input[newest - j] * bank[j];
            }
            output.push(acc);
        }

        output
    }

    /// Resample raw unsigned dump samples
    pub fn process_u16(&self, input: &[u16]) -> Vec<f64> {
        let converted: Vec<f64> = input.iter().map(|&s| f64::from(s)).collect();
        self.process(&converted)
    }
}

// ============================================================================
// Tests
// ============================================================================
