//! Noise-floor estimation for radio maps.
//!
//! [`estimate_rms`] measures the per-beam RMS of a map with an iterative
//! sigma-clip; [`BeamGeometry`] converts that RMS into a surface-brightness
//! noise floor per square arcsecond.

pub mod beam;
pub mod rms;

pub use beam::{BeamGeometry, NoiseFloor, NoiseSource};
pub use rms::{estimate_rms, estimate_rms_default, sigma_clip, NoiseMap, SigmaClip};
