use crate::noise::{BeamGeometry, NoiseFloor, NoiseMap, NoiseSource};
use crate::prelude::{AnalysisError, AnalysisResult, ProcessingStage, StageConfig};
use crate::telemetry::log::LogManager;

/// Source of the surface-brightness noise floor.
#[derive(Debug, Clone)]
pub enum NoiseInput {
    /// Estimate the floor from a radio map and its beam.
    Map { map: NoiseMap, beam: BeamGeometry },
    /// Use a floor measured elsewhere, in Jy/arcsec^2.
    Precomputed(f64),
}

/// Stage that turns a noise map into the radio detection floor.
pub struct NoiseStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl NoiseStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("NoiseStage"),
        }
    }
}

impl Default for NoiseStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for NoiseStage {
    type Input = NoiseInput;
    type Output = NoiseFloor;

    fn initialize(&mut self, config: &StageConfig) -> AnalysisResult<()> {
        if config.mask_threshold.is_nan() || config.mask_threshold < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "mask threshold must be non-negative, got {}",
                config.mask_threshold
            )));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: NoiseInput) -> AnalysisResult<NoiseFloor> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AnalysisError::Internal("stage not initialized".into()))?;

        match input {
            NoiseInput::Precomputed(sb_rms) => {
                let floor = NoiseFloor::configured(sb_rms)?;
                self.logger
                    .record(&format!("using configured noise floor {:.4e}", sb_rms));
                Ok(floor)
            }
            NoiseInput::Map { map, beam } => {
                beam.validate()?;
                let clip = map.sigma_clip(config.mask_threshold)?;
                let (rows, cols) = map.dim();
                self.logger.detail(&format!(
                    "{}x{} map, {} unmasked pixels",
                    rows, cols, clip.unmasked
                ));
                if !clip.converged {
                    self.logger.warn(&format!(
                        "sigma clip stopped after {} rounds without converging",
                        clip.rounds
                    ));
                }

                let beam_area_pix = beam.beam_area_pixels();
                let sb_rms = beam.surface_brightness_rms(clip.rms);
                self.logger.record(&format!(
                    "map rms {:.4e}, beam area {:.2} pix, noise floor {:.4e}",
                    clip.rms, beam_area_pix, sb_rms
                ));

                Ok(NoiseFloor {
                    sb_rms,
                    source: NoiseSource::Map {
                        map_rms: clip.rms,
                        beam_area_pix,
                        pixel_scale_arcsec: beam.pixel_scale_arcsec(),
                        rounds: clip.rounds,
                        converged: clip.converged,
                    },
                })
            }
        }
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
