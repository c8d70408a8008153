//! Core statistics for point-to-point surface-brightness analysis.
//!
//! The crate estimates the noise floor of a radio map with an iterative
//! sigma-clip, selects cells above that floor, and correlates the radio
//! channel against X-ray and SZ channels in log-log space. Each step is
//! exposed both as a plain function and as a [`ProcessingStage`].

pub mod cells;
pub mod correlation;
pub mod math;
pub mod noise;
pub mod prelude;
pub mod processing;
pub mod regression;
pub mod telemetry;

pub use correlation::{correlation_with_ci, CorrelationMethod, CorrelationResult};
pub use noise::{estimate_rms, estimate_rms_default, NoiseMap};
pub use prelude::{AnalysisError, AnalysisResult, ProcessingStage, StageConfig};
