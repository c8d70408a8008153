//! Correlation coefficients with Fisher-transform confidence intervals.

pub mod coefficient;
pub mod interval;

pub use coefficient::{pearson, spearman};
pub use interval::{correlation_with_ci, fisher_interval};

use crate::prelude::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which underlying statistic a correlation is computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    /// Coefficient and two-sided p-value for the pair.
    pub fn coefficient(self, x: &[f64], y: &[f64]) -> AnalysisResult<(f64, f64)> {
        match self {
            CorrelationMethod::Pearson => pearson(x, y),
            CorrelationMethod::Spearman => spearman(x, y),
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Pearson => write!(f, "Pearson"),
            CorrelationMethod::Spearman => write!(f, "Spearman"),
        }
    }
}

/// Coefficient, p-value and confidence bounds of one correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    pub coefficient: f64,
    pub p_value: f64,
    pub lower: f64,
    pub upper: f64,
    pub samples: usize,
}

impl CorrelationResult {
    /// Distance from the coefficient to the upper bound.
    pub fn upper_margin(&self) -> f64 {
        self.upper - self.coefficient
    }
}
