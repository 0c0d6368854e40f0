//! Shaping IIR filter
//!
//! A single elliptic filter is designed once per process from fixed
//! parameters and applied, with identical coefficients, to the left and
//! right channels after mixing.

use std::f64::consts::PI;
use std::sync::OnceLock;

use log::debug;
use rustfft::num_complex::Complex;

use super::elliptic::{ellipap, ellipord, BandType, ZeroPoleGain};
use crate::engine::buffer::{StereoSignal, OUTPUT_SAMPLE_RATE};

// ============================================================================
// Design parameters
// ============================================================================

/// Passband edge of the shaping filter (Hz)
pub const SHAPING_PASSBAND_HZ: f64 = 10.0;

/// Stopband edge of the shaping filter (Hz)
///
/// Lies below the passband edge, which makes the design a high-pass.
pub const SHAPING_STOPBAND_HZ: f64 = 2.5;

/// Maximum passband ripple (dB)
pub const SHAPING_PASSBAND_RIPPLE_DB: f64 = 0.1;

/// Minimum stopband attenuation (dB)
pub const SHAPING_STOPBAND_ATTENUATION_DB: f64 = 60.0;

/// Parameters of a single-edge elliptic IIR filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticDesign {
    /// Passband edge (Hz)
    pub passband_hz: f64,
    /// Stopband edge (Hz)
    pub stopband_hz: f64,
    /// Passband ripple (dB)
    pub ripple_db: f64,
    /// Stopband attenuation (dB)
    pub attenuation_db: f64,
    /// Sample rate (Hz)
    pub sample_rate: f64,
}

impl EllipticDesign {
    /// The fixed shaping filter of the render pipeline
    pub fn shaping() -> Self {
        Self {
            passband_hz: SHAPING_PASSBAND_HZ,
            stopband_hz: SHAPING_STOPBAND_HZ,
            ripple_db: SHAPING_PASSBAND_RIPPLE_DB,
            attenuation_db: SHAPING_STOPBAND_ATTENUATION_DB,
            sample_rate: OUTPUT_SAMPLE_RATE as f64,
        }
    }

    /// Low-pass or high-pass, decided by the order of the edges
    pub fn band_type(&self) -> BandType {
        BandType::from_edges(self.passband_hz, self.stopband_hz)
    }

    /// Design the digital filter in factored form
    ///
    /// Edges are normalized to Nyquist, the minimum order is estimated,
    /// the analog prototype is moved to the pre-warped natural frequency and
    /// mapped to the z-plane with the bilinear transform.
    pub fn design_zpk(&self) -> ZeroPoleGain {
        let nyquist = self.sample_rate / 2.0;
        let wp = self.passband_hz / nyquist;
        let ws = self.stopband_hz / nyquist;

        let (order, wn) = ellipord(wp, ws, self.ripple_db, self.attenuation_db);
        let prototype = ellipap(order, self.ripple_db, self.attenuation_db);

        // Digital design on a normalized rate of 2 (Nyquist = 1)
        let fs = 2.0;
        let warped = 2.0 * fs * (PI * wn / fs).tan();

        let analog = match self.band_type() {
            BandType::LowPass => prototype.lowpass_to_lowpass(warped),
            BandType::HighPass => prototype.lowpass_to_highpass(warped),
        };
        analog.bilinear(fs)
    }

    /// Design the digital filter as `b`/`a` polynomials
    ///
    /// The expanded form is what gets applied. With poles this close to
    /// `z = 1` it only approximates the factored response in the stopband.
    pub fn design(&self) -> FilterCoefficients {
        let (b, a) = self.design_zpk().to_transfer_function();
        FilterCoefficients::new(b, a)
    }
}

// ============================================================================
// Coefficients
// ============================================================================

/// Numerator and denominator of a rational transfer function in `z^-1`
///
/// Always normalized so that `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoefficients {
    /// Create from raw vectors, normalizing by `a[0]` and padding to equal length
    ///
    /// # Panics
    /// Panics if `a` is empty or `a[0]` is zero.
    pub fn new(mut b: Vec<f64>, mut a: Vec<f64>) -> Self {
        assert!(
            a.first().is_some_and(|&a0| a0 != 0.0),
            "leading denominator coefficient must be non-zero"
        );

        let a0 = a[0];
        for c in b.iter_mut().chain(a.iter_mut()) {
            *c /= a0;
        }

        let len = a.len().max(b.len());
        a.resize(len, 0.0);
        b.resize(len, 0.0);

        Self { b, a }
    }

    /// Numerator coefficients
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients, `a[0] == 1`
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Filter order
    pub fn order(&self) -> usize {
        self.a.len() - 1
    }

    /// Complex response at `freq_hz` for sample rate `sample_rate`
    pub fn frequency_response(&self, freq_hz: f64, sample_rate: f64) -> Complex<f64> {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let z_inv = Complex::from_polar(1.0, -w);

        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .rev()
                .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z_inv + c)
        };

        eval(&self.b) / eval(&self.a)
    }

    /// Magnitude response in dB
    pub fn magnitude_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        20.0 * self.frequency_response(freq_hz, sample_rate).norm().log10()
    }

    /// Filter `samples` in place
    ///
    /// Direct form II transposed, zero initial state, single forward pass.
    pub fn apply(&self, samples: &mut [f64]) {
        let order = self.order();
        let mut state = vec![0.0_f64; order];

        for sample in samples.iter_mut() {
            let x = *sample;
            let y = self.b[0] * x + state.first().copied().unwrap_or(0.0);

            for i in 0..order {
                let next = state.get(i + 1).copied().unwrap_or(0.0);
                state[i] = self.b[i + 1] * x + next - self.a[i + 1] * y;
            }

            *sample = y;
        }
    }

    /// Filter both channels of a stereo signal independently
    pub fn apply_stereo(&self, signal: &mut StereoSignal) {
        self.apply(&mut signal.left);
        self.apply(&mut signal.right);
    }
}

/// The shaping filter shared by both channels, designed on first use
pub fn shaping_filter() -> &'static FilterCoefficients {
    static SHAPING: OnceLock<FilterCoefficients> = OnceLock::new();

    SHAPING.get_or_init(|| {
        let coeffs = EllipticDesign::shaping().design();
        debug!(
            "Shaping filter: order {}, b = {:?}, a = {:?}",
            coeffs.order(),
            coeffs.b(),
            coeffs.a()
        );
        coeffs
    })
}

// ============================================================================
// Tests
// ============================================================================
