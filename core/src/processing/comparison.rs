use crate::cells::{Channel, ChannelKind};
use crate::correlation::{correlation_with_ci, CorrelationMethod, CorrelationResult};
use crate::prelude::{AnalysisError, AnalysisResult, ProcessingStage, StageConfig};
use crate::processing::selection::Selection;
use crate::regression::{linregress, LinearRegression};
use crate::telemetry::log::LogManager;
use serde::Serialize;

/// Converts a relative error into an error on `log10`.
pub const LOG_ERROR_FACTOR: f64 = 0.434;

/// One cell in log-log space with its propagated errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogPoint {
    pub x: f64,
    pub y: f64,
    pub x_err: f64,
    pub y_err: f64,
}

/// Fit and correlation statistics of one channel against radio.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelComparison {
    pub channel: ChannelKind,
    pub points: Vec<LogPoint>,
    /// Cells dropped because a log value was not finite.
    pub excluded: usize,
    pub regression: LinearRegression,
    pub pearson: CorrelationResult,
    pub spearman: CorrelationResult,
}

impl ChannelComparison {
    pub fn label(&self) -> String {
        format!("{} vs radio", self.channel)
    }
}

/// Stage that correlates every selected channel against radio in log space.
pub struct ComparisonStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl ComparisonStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("ComparisonStage"),
        }
    }

    fn compare(
        &self,
        channel: &Channel,
        radio: &Channel,
        alpha: f64,
    ) -> AnalysisResult<ChannelComparison> {
        if channel.len() != radio.len() {
            return Err(AnalysisError::LengthMismatch {
                left: channel.len(),
                right: radio.len(),
            });
        }

        let candidates = channel
            .values
            .iter()
            .zip(&channel.errors)
            .zip(radio.values.iter().zip(&radio.errors));
        let mut points = Vec::with_capacity(channel.len());
        for ((&xv, &xe), (&yv, &ye)) in candidates {
            let point = LogPoint {
                x: xv.log10(),
                y: yv.log10(),
                x_err: LOG_ERROR_FACTOR * xe / xv,
                y_err: LOG_ERROR_FACTOR * ye / yv,
            };
            if point.x.is_finite() && point.y.is_finite() {
                points.push(point);
            }
        }
        let excluded = channel.len() - points.len();
        if excluded > 0 {
            self.logger.warn(&format!(
                "{} {} cells have no finite log value and were excluded",
                excluded, channel.kind
            ));
        }

        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let regression = linregress(&xs, &ys)?;
        let pearson = correlation_with_ci(&xs, &ys, alpha, CorrelationMethod::Pearson)?;
        let spearman = correlation_with_ci(&xs, &ys, alpha, CorrelationMethod::Spearman)?;

        self.logger.record(&format!(
            "{} vs radio: slope {:.4} +- {:.4}, pearson {:.4}, spearman {:.4}",
            channel.kind,
            regression.slope,
            regression.slope_stderr,
            pearson.coefficient,
            spearman.coefficient
        ));

        Ok(ChannelComparison {
            channel: channel.kind,
            points,
            excluded,
            regression,
            pearson,
            spearman,
        })
    }
}

impl Default for ComparisonStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for ComparisonStage {
    type Input = Selection;
    type Output = Vec<ChannelComparison>;

    fn initialize(&mut self, config: &StageConfig) -> AnalysisResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Selection) -> AnalysisResult<Vec<ChannelComparison>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AnalysisError::Internal("stage not initialized".into()))?;

        let mut comparisons = vec![self.compare(&input.xray, &input.radio, config.alpha)?];
        if let Some(sz) = input.sz.as_ref() {
            comparisons.push(self.compare(sz, &input.radio, config.alpha)?);
        }
        Ok(comparisons)
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
