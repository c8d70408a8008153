use anyhow::Context;
use ptpcore::cells::CellRecord;
use ptpcore::noise::NoiseFloor;
use ptpcore::prelude::{ProcessingStage, StageConfig};
use ptpcore::processing::{
    ChannelComparison, ComparisonStage, NoiseInput, NoiseStage, SelectionInput, SelectionStage,
};
use serde::Serialize;

/// Everything a run consumes.
pub struct AnalysisInputs {
    pub cells: Vec<CellRecord>,
    pub noise: NoiseInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub noise: NoiseFloor,
    pub threshold: f64,
    pub cells_used: usize,
    pub normalized: bool,
    pub comparisons: Vec<ChannelComparison>,
}

#[derive(Clone)]
pub struct Runner {
    config: StageConfig,
}

impl Runner {
    pub fn new(config: StageConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, inputs: AnalysisInputs) -> anyhow::Result<AnalysisReport> {
        let mut noise_stage = NoiseStage::new();
        noise_stage
            .initialize(&self.config)
            .context("initializing noise stage")?;
        let noise = noise_stage
            .execute(inputs.noise)
            .context("executing noise stage")?;
        noise_stage.cleanup();

        let mut selection_stage = SelectionStage::new();
        selection_stage
            .initialize(&self.config)
            .context("initializing selection stage")?;
        let selection = selection_stage
            .execute(SelectionInput {
                cells: inputs.cells,
                noise: noise.clone(),
            })
            .context("executing selection stage")?;
        selection_stage.cleanup();

        let threshold = selection.threshold;
        let cells_used = selection.cells_used;
        let normalized = selection.normalized;

        let mut comparison_stage = ComparisonStage::new();
        comparison_stage
            .initialize(&self.config)
            .context("initializing comparison stage")?;
        let comparisons = comparison_stage
            .execute(selection)
            .context("executing comparison stage")?;
        comparison_stage.cleanup();

        Ok(AnalysisReport {
            noise,
            threshold,
            cells_used,
            normalized,
            comparisons,
        })
    }
}
