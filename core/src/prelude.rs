use serde::{Deserialize, Serialize};

/// Values below this magnitude are treated as blanked pixels.
pub const DEFAULT_MASK_THRESHOLD: f64 = 1e-7;
/// Significance level used for confidence intervals unless configured.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Shared configuration for each analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub mask_threshold: f64,
    /// Radio cells must exceed `detection_sigma` times the noise floor.
    pub detection_sigma: f64,
    pub alpha: f64,
    /// Cells with `log10(y) <= sz_log_floor` are dropped once SZ is normalised.
    pub sz_log_floor: f64,
    pub include_sz: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            detection_sigma: 3.0,
            alpha: DEFAULT_ALPHA,
            sz_log_floor: -1.25,
            include_sz: true,
        }
    }
}

/// Common error type for the analysis routines and stages.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no values left after {0}")]
    EmptyInput(String),
    #[error("insufficient sample: need at least {needed} values, got {actual}")]
    InsufficientSample { needed: usize, actual: usize },
    #[error("degenerate correlation coefficient {coefficient}")]
    DegenerateCorrelation { coefficient: f64 },
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Trait describing the stages chained by the analysis runner.
pub trait ProcessingStage {
    type Input;
    type Output;

    fn initialize(&mut self, config: &StageConfig) -> AnalysisResult<()>;
    fn execute(&mut self, input: Self::Input) -> AnalysisResult<Self::Output>;
    fn cleanup(&mut self);
}
