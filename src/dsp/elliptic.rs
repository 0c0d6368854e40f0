//! Elliptic (Cauer) filter design
//!
//! Jacobi elliptic special functions, the analog elliptic low-pass
//! prototype, the minimum order estimate and the zero/pole/gain transforms
//! used to turn the prototype into a digital filter.

use std::f64::consts::{FRAC_PI_2, PI};

use rustfft::num_complex::Complex;

/// Machine epsilon used by the Jacobi function iteration
const MACHEP: f64 = 1.110_223_024_625_156_5e-16;

/// Threshold below which a zero/pole component is treated as zero
const NEGLIGIBLE: f64 = f64::EPSILON;

/// Terms of the nome series used by [`elliptic_degree`]
const DEGREE_SERIES_TERMS: i32 = 7;

// ============================================================================
// Special functions
// ============================================================================

/// Arithmetic-geometric mean of `a` and `b`
fn agm(mut a: f64, mut b: f64) -> f64 {
    for _ in 0..64 {
        if (a - b).abs() <= 1e-16 * a {
            break;
        }
        let next = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = next;
    }
    a
}

/// Complete elliptic integral of the first kind, `K(m)` with parameter `m = k^2`
pub fn ellipk(m: f64) -> f64 {
    PI / (2.0 * agm(1.0, (1.0 - m).sqrt()))
}

/// `K(1 - p)`, accurate for `p` close to zero
pub fn ellipkm1(p: f64) -> f64 {
    PI / (2.0 * agm(1.0, p.sqrt()))
}

/// Carlson's symmetric elliptic integral `R_F(x, y, z)`
fn carlson_rf(mut x: f64, mut y: f64, mut z: f64) -> f64 {
    const ERRTOL: f64 = 0.0025;

    loop {
        let (sx, sy, sz) = (x.sqrt(), y.sqrt(), z.sqrt());
        let lambda = sx * (sy + sz) + sy * sz;
        x = 0.25 * (x + lambda);
        y = 0.25 * (y + lambda);
        z = 0.25 * (z + lambda);

        let mu = (x + y + z) / 3.0;
        let (dx, dy, dz) = ((mu - x) / mu, (mu - y) / mu, (mu - z) / mu);
        if dx.abs().max(dy.abs()).max(dz.abs()) < ERRTOL {
            let e2 = dx * dy - dz * dz;
            let e3 = dx * dy * dz;
            return (1.0 + (e2 / 24.0 - 0.1 - 3.0 / 44.0 * e3) * e2 + e3 / 14.0) / mu.sqrt();
        }
    }
}

/// Jacobi elliptic functions of argument `u` and parameter `m`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobi {
    pub sn: f64,
    pub cn: f64,
    pub dn: f64,
    /// Amplitude `phi`, with `sn = sin(phi)`
    pub ph: f64,
}

/// Evaluate `sn`, `cn`, `dn` and the amplitude for `0 <= m <= 1`
///
/// Descending Landen / AGM scheme with series expansions near `m = 0` and
/// `m = 1`.
pub fn ellipj(u: f64, m: f64) -> Jacobi {
    if m < 1e-9 {
        let t = u.sin();
        let b = u.cos();
        let ai = 0.25 * m * (u - t * b);
        return Jacobi {
            sn: t - ai * b,
            cn: b + ai * t,
            dn: 1.0 - 0.5 * m * t * t,
            ph: u - ai,
        };
    }

    if m >= 0.999_999_999_9 {
        let mut ai = 0.25 * (1.0 - m);
        let b = u.cosh();
        let t = u.tanh();
        let phi = 1.0 / b;
        let twon = b * u.sinh();
        let sn = t + ai * (twon - u) / (b * b);
        let ph = 2.0 * u.exp().atan() - FRAC_PI_2 + ai * (twon - u) / b;
        ai *= t * phi;
        return Jacobi {
            sn,
            cn: phi - ai * (twon - u),
            dn: phi + ai * (twon + u),
            ph,
        };
    }

    let mut a = [0.0_f64; 9];
    let mut c = [0.0_f64; 9];
    a[0] = 1.0;
    c[0] = m.sqrt();
    let mut b = (1.0 - m).sqrt();
    let mut twon = 1.0;
    let mut i = 0;

    while (c[i] / a[i]).abs() > MACHEP && i < 8 {
        let ai = a[i];
        i += 1;
        c[i] = 0.5 * (ai - b);
        let t = (ai * b).sqrt();
        a[i] = 0.5 * (ai + b);
        b = t;
        twon *= 2.0;
    }

    let mut phi = twon * a[i] * u;
    let mut prev = phi;
    while i > 0 {
        let t = c[i] * phi.sin() / a[i];
        prev = phi;
        phi = 0.5 * (t.asin() + phi);
        i -= 1;
    }

    let t = phi.cos();
    Jacobi {
        sn: phi.sin(),
        cn: t,
        dn: t / (phi - prev).cos(),
        ph: phi,
    }
}

/// Solve `w = sc(z, 1 - m)` for real `z`
///
/// With `phi = atan(w)`, `z` is the incomplete integral `F(phi | 1 - m)`.
pub fn arc_sc_complement(w: f64, m: f64) -> f64 {
    let phi = w.atan();
    let (s, c) = phi.sin_cos();
    // 1 - (1 - m) sin^2 written to keep precision for tiny m
    s * carlson_rf(c * c, c * c + m * s * s, 1.0)
}

/// Solve the degree equation for the prototype's selectivity parameter
///
/// Given order `n` and discrimination parameter `m1`, returns `m` such that
/// `K(m') / K(m) = K(m1') / (n * K(m1))`, via the nome `q`.
pub fn elliptic_degree(n: usize, m1: f64) -> f64 {
    let q1 = (-PI * ellipkm1(m1) / ellipk(m1)).exp();
    let q = q1.powf(1.0 / n as f64);

    let num: f64 = (0..=DEGREE_SERIES_TERMS)
        .map(|k| q.powi(k * (k + 1)))
        .sum();
    let den: f64 = 1.0
        + 2.0
            * (1..=DEGREE_SERIES_TERMS + 1)
                .map(|k| q.powi(k * k))
                .sum::<f64>();

    16.0 * q * (num / den).powi(4)
}

// ============================================================================
// Zero / pole / gain representation
// ============================================================================

/// A transfer function in factored form
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroPoleGain {
    pub zeros: Vec<Complex<f64>>,
    pub poles: Vec<Complex<f64>>,
    pub gain: f64,
}

fn product(values: impl Iterator<Item = Complex<f64>>) -> Complex<f64> {
    values.fold(Complex::new(1.0, 0.0), |acc, v| acc * v)
}

/// Expand roots into monic polynomial coefficients, highest power first
fn poly(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for root in roots {
        let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
        for (i, c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

impl ZeroPoleGain {
    /// Analog low-pass (cutoff 1 rad/s) to low-pass with cutoff `wo`
    pub fn lowpass_to_lowpass(&self, wo: f64) -> Self {
        let degree = self.poles.len() - self.zeros.len();
        let scale = |v: &Complex<f64>| v * wo;

        Self {
            zeros: self.zeros.iter().map(scale).collect(),
            poles: self.poles.iter().map(scale).collect(),
            gain: self.gain * wo.powi(degree as i32),
        }
    }

    /// Analog low-pass (cutoff 1 rad/s) to high-pass with cutoff `wo`
    pub fn lowpass_to_highpass(&self, wo: f64) -> Self {
        let degree = self.poles.len() - self.zeros.len();
        let to_hp = |v: &Complex<f64>| Complex::from(wo) / v;

        let mut zeros: Vec<_> = self.zeros.iter().map(to_hp).collect();
        zeros.extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(degree));
        let poles = self.poles.iter().map(to_hp).collect();

        let ratio =
            product(self.zeros.iter().map(|z| -z)) / product(self.poles.iter().map(|p| -p));

        Self {
            zeros,
            poles,
            gain: self.gain * ratio.re,
        }
    }

    /// Bilinear transform of an analog filter at sample rate `fs`
    pub fn bilinear(&self, fs: f64) -> Self {
        let fs2 = Complex::from(2.0 * fs);
        let degree = self.poles.len() - self.zeros.len();
        let map = |v: &Complex<f64>| (fs2 + v) / (fs2 - v);

        let mut zeros: Vec<_> = self.zeros.iter().map(map).collect();
        zeros.extend(std::iter::repeat(Complex::new(-1.0, 0.0)).take(degree));
        let poles = self.poles.iter().map(map).collect();

        let ratio = product(self.zeros.iter().map(|z| fs2 - z))
            / product(self.poles.iter().map(|p| fs2 - p));

        Self {
            zeros,
            poles,
            gain: self.gain * ratio.re,
        }
    }

    /// Response of a digital filter at `freq_hz`
    pub fn frequency_response(&self, freq_hz: f64, sample_rate: f64) -> Complex<f64> {
        let z = Complex::from_polar(1.0, 2.0 * PI * freq_hz / sample_rate);
        let num = product(self.zeros.iter().map(|zero| z - zero));
        let den = product(self.poles.iter().map(|pole| z - pole));
        num / den * self.gain
    }

    /// Magnitude response of a digital filter in dB
    pub fn magnitude_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        20.0 * self.frequency_response(freq_hz, sample_rate).norm().log10()
    }

    /// Expand into `(b, a)` polynomial coefficients
    ///
    /// Zeros and poles come in conjugate pairs, so imaginary parts cancel and
    /// only the real parts are kept.
    pub fn to_transfer_function(&self) -> (Vec<f64>, Vec<f64>) {
        let b = poly(&self.zeros).iter().map(|c| c.re * self.gain).collect();
        let a = poly(&self.poles).iter().map(|c| c.re).collect();
        (b, a)
    }
}

// ============================================================================
// Prototype and order
// ============================================================================

/// Analog elliptic low-pass prototype of order `order`
///
/// Cutoff is normalized to 1 rad/s, passband ripple `rp` and stopband
/// attenuation `rs` are in dB.
pub fn ellipap(order: usize, rp: f64, rs: f64) -> ZeroPoleGain {
    let eps_sq = 10.0_f64.powf(0.1 * rp) - 1.0;

    if order == 1 {
        let pole = -(1.0 / eps_sq).sqrt();
        return ZeroPoleGain {
            zeros: Vec::new(),
            poles: vec![Complex::from(pole)],
            gain: -pole,
        };
    }

    let eps = eps_sq.sqrt();
    let ck1_sq = eps_sq / (10.0_f64.powf(0.1 * rs) - 1.0);
    let k_ck1 = ellipk(ck1_sq);

    let m = elliptic_degree(order, ck1_sq);
    let capk = ellipk(m);

    // Odd orders carry one real pole at j = 0
    let first = 1 - order % 2;
    let jacobi: Vec<Jacobi> = (first..order)
        .step_by(2)
        .map(|j| ellipj(j as f64 * capk / order as f64, m))
        .collect();

    let mut zeros: Vec<Complex<f64>> = jacobi
        .iter()
        .filter(|f| f.sn.abs() > NEGLIGIBLE)
        .map(|f| Complex::new(0.0, 1.0 / (m.sqrt() * f.sn)))
        .collect();
    let conj: Vec<_> = zeros.iter().map(|z| z.conj()).collect();
    zeros.extend(conj);

    let r = arc_sc_complement(1.0 / eps, ck1_sq);
    let v0 = capk * r / (order as f64 * k_ck1);
    let v = ellipj(v0, 1.0 - m);

    let mut poles: Vec<Complex<f64>> = jacobi
        .iter()
        .map(|f| {
            let num = Complex::new(f.cn * f.dn * v.sn * v.cn, f.sn * v.dn);
            let den = 1.0 - (f.dn * v.sn).powi(2);
            -num / den
        })
        .collect();

    if order % 2 == 1 {
        let scale: f64 = poles.iter().map(|p| p.norm_sqr()).sum::<f64>().sqrt();
        let conj: Vec<_> = poles
            .iter()
            .filter(|p| p.im.abs() > NEGLIGIBLE * scale)
            .map(|p| p.conj())
            .collect();
        poles.extend(conj);
    } else {
        let conj: Vec<_> = poles.iter().map(|p| p.conj()).collect();
        poles.extend(conj);
    }

    let mut gain = (product(poles.iter().map(|p| -p)) / product(zeros.iter().map(|z| -z))).re;
    if order % 2 == 0 {
        gain /= (1.0 + eps_sq).sqrt();
    }

    ZeroPoleGain { zeros, poles, gain }
}

/// Response shape of a single-edge filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandType {
    LowPass,
    HighPass,
}

impl BandType {
    /// Classify from the edges: a passband above the stopband is high-pass
    pub fn from_edges(passband: f64, stopband: f64) -> Self {
        if passband < stopband {
            BandType::LowPass
        } else {
            BandType::HighPass
        }
    }
}

/// Minimum elliptic order for a digital single-edge design
///
/// Edges are fractions of Nyquist. Returns the order and the natural
/// frequency (also a fraction of Nyquist), which for elliptic filters is the
/// passband edge.
pub fn ellipord(passband: f64, stopband: f64, gpass: f64, gstop: f64) -> (usize, f64) {
    let passb = (PI * passband / 2.0).tan();
    let stopb = (PI * stopband / 2.0).tan();

    let nat = match BandType::from_edges(passband, stopband) {
        BandType::LowPass => stopb / passb,
        BandType::HighPass => passb / stopb,
    }
    .abs();

    let g_stop = 10.0_f64.powf(0.1 * gstop);
    let g_pass = 10.0_f64.powf(0.1 * gpass);
    let arg1_sq = (g_pass - 1.0) / (g_stop - 1.0);
    let arg0_sq = 1.0 / (nat * nat);

    let ratio = ellipk(arg0_sq) * ellipkm1(arg1_sq) / (ellipkm1(arg0_sq) * ellipk(arg1_sq));
    let order = ratio.ceil() as usize;

    (order.max(1), passb.atan() * 2.0 / PI)
}

// ============================================================================
// Tests
// ============================================================================
