use crate::cells::{CellRecord, Channel, ChannelKind, SZ_ERROR_SCALE};
use crate::noise::NoiseFloor;
use crate::prelude::{AnalysisError, AnalysisResult, ProcessingStage, StageConfig};
use crate::telemetry::log::LogManager;
use serde::Serialize;

/// Cell table and the floor it is thresholded against.
#[derive(Debug, Clone)]
pub struct SelectionInput {
    pub cells: Vec<CellRecord>,
    pub noise: NoiseFloor,
}

/// Row-aligned channels of the cells that passed selection.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    /// Cells above the radio detection threshold, before the SZ mask.
    pub cells_used: usize,
    pub threshold: f64,
    /// Whether every channel was divided by its mean.
    pub normalized: bool,
    pub radio: Channel,
    pub xray: Channel,
    pub sz: Option<Channel>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.radio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radio.is_empty()
    }
}

/// Stage that keeps radio detections and prepares the comparison channels.
pub struct SelectionStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl SelectionStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("SelectionStage"),
        }
    }
}

impl Default for SelectionStage {
    fn default() -> Self {
        Self::new()
    }
}

fn sz_channel(cells: &[&CellRecord]) -> AnalysisResult<Channel> {
    let mut values = Vec::with_capacity(cells.len());
    let mut errors = Vec::with_capacity(cells.len());
    for cell in cells {
        let y_sb = cell
            .y_sb
            .ok_or_else(|| AnalysisError::MissingColumn("y_sb".into()))?;
        let y_sb_err = cell
            .y_sb_err
            .ok_or_else(|| AnalysisError::MissingColumn("y_sb_err".into()))?;
        let y = y_sb * y_sb;
        values.push(y);
        errors.push(2.0 * y.sqrt() * y_sb_err / SZ_ERROR_SCALE);
    }
    Ok(Channel::new(ChannelKind::Sz, values, errors))
}

impl ProcessingStage for SelectionStage {
    type Input = SelectionInput;
    type Output = Selection;

    fn initialize(&mut self, config: &StageConfig) -> AnalysisResult<()> {
        if !config.detection_sigma.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "detection sigma must be finite, got {}",
                config.detection_sigma
            )));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: SelectionInput) -> AnalysisResult<Selection> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AnalysisError::Internal("stage not initialized".into()))?;

        let threshold = input.noise.detection_threshold(config.detection_sigma);
        let detected: Vec<&CellRecord> = input
            .cells
            .iter()
            .filter(|cell| cell.radio_sb > threshold)
            .collect();
        if detected.is_empty() {
            return Err(AnalysisError::EmptyInput(format!(
                "the radio threshold {:.4e}",
                threshold
            )));
        }
        let cells_used = detected.len();
        self.logger.record(&format!(
            "{} of {} cells above {:.1} sigma ({:.4e})",
            cells_used,
            input.cells.len(),
            config.detection_sigma,
            threshold
        ));

        let mut radio = Channel::new(
            ChannelKind::Radio,
            detected.iter().map(|c| c.radio_sb).collect(),
            detected.iter().map(|c| c.radio_sb_err).collect(),
        );
        let mut xray = Channel::new(
            ChannelKind::Xray,
            detected.iter().map(|c| c.xray_sb).collect(),
            detected.iter().map(|c| c.xray_sb_err).collect(),
        );

        let sz = if config.include_sz {
            let mut sz = sz_channel(&detected)?;
            radio.normalize();
            xray.normalize();
            sz.normalize();

            let keep: Vec<bool> = sz
                .values
                .iter()
                .map(|y| y.log10() > config.sz_log_floor)
                .collect();
            radio.retain_rows(&keep);
            xray.retain_rows(&keep);
            sz.retain_rows(&keep);
            self.logger.detail(&format!(
                "{} cells above the SZ log floor {}",
                sz.len(),
                config.sz_log_floor
            ));
            if sz.is_empty() {
                return Err(AnalysisError::EmptyInput(format!(
                    "the SZ log floor {}",
                    config.sz_log_floor
                )));
            }
            Some(sz)
        } else {
            None
        };

        Ok(Selection {
            cells_used,
            threshold,
            normalized: config.include_sz,
            radio,
            xray,
            sz,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
