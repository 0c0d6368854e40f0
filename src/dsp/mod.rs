//! Signal processing stages
//!
//! Resampling, stereo mixing, the elliptic shaping filter and peak
//! normalization. Every stage is a plain function over owned buffers.

pub mod elliptic;
pub mod filter;
pub mod mixer;
pub mod normalize;
pub mod resample;

pub use filter::{shaping_filter, EllipticDesign, FilterCoefficients};
pub use mixer::{mix, pan_gains, PAN_MATRIX};
pub use normalize::normalize_peak;
pub use resample::{PolyphaseResampler, DOWNSAMPLE_FACTOR, UPSAMPLE_FACTOR};
