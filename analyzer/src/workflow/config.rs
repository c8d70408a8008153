use crate::io::noise_map::read_noise_map;
use anyhow::{bail, Context};
use ptpcore::noise::BeamGeometry;
use ptpcore::prelude::{StageConfig, DEFAULT_ALPHA, DEFAULT_MASK_THRESHOLD};
use ptpcore::processing::NoiseInput;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Analysis settings read from YAML and overridden from the command line.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Headerless CSV grid of the radio map used for the noise estimate.
    pub noise_map: Option<PathBuf>,
    /// Surface-brightness noise floor that skips the map estimate.
    pub noise_floor: Option<f64>,
    pub beam: Option<BeamGeometry>,
    pub mask_threshold: f64,
    pub detection_sigma: f64,
    pub alpha: f64,
    pub sz_log_floor: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let stage = StageConfig::default();
        Self {
            noise_map: None,
            noise_floor: None,
            beam: None,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            detection_sigma: stage.detection_sigma,
            alpha: DEFAULT_ALPHA,
            sz_log_floor: stage.sz_log_floor,
        }
    }
}

impl AnalysisConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading analysis config {}", path_ref.display()))?;
        let config: AnalysisConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing analysis config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn apply_overrides(
        &mut self,
        noise_map: Option<PathBuf>,
        noise_floor: Option<f64>,
        alpha: Option<f64>,
    ) {
        if noise_map.is_some() {
            self.noise_map = noise_map;
        }
        if noise_floor.is_some() {
            self.noise_floor = noise_floor;
        }
        if let Some(alpha) = alpha {
            self.alpha = alpha;
        }
    }

    pub fn to_stage_config(&self, include_sz: bool) -> StageConfig {
        StageConfig {
            mask_threshold: self.mask_threshold,
            detection_sigma: self.detection_sigma,
            alpha: self.alpha,
            sz_log_floor: self.sz_log_floor,
            include_sz,
        }
    }

    /// Resolves where the noise floor comes from; a configured floor takes
    /// precedence over a noise map.
    pub fn noise_input(&self) -> anyhow::Result<NoiseInput> {
        if let Some(floor) = self.noise_floor {
            return Ok(NoiseInput::Precomputed(floor));
        }
        let Some(path) = self.noise_map.as_ref() else {
            bail!("no noise source: set noise_floor or noise_map");
        };
        let beam = self
            .beam
            .context("a noise map needs the beam geometry (beam.bmaj_deg, ...)")?;
        let map = read_noise_map(path)?;
        Ok(NoiseInput::Map { map, beam })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_stage_defaults() {
        let cfg = AnalysisConfig::default();
        let stage = cfg.to_stage_config(true);
        assert_eq!(stage.detection_sigma, 3.0);
        assert_eq!(stage.alpha, 0.05);
        assert_eq!(stage.sz_log_floor, -1.25);
        assert!(stage.include_sz);
        assert!(!cfg.to_stage_config(false).include_sz);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"noise_floor: 2.5e-8\nalpha: 0.1\nbeam:\n  bmaj_deg: 0.0167\n  bmin_deg: 0.0167\n  cdelt1_deg: -0.0042\n  cdelt2_deg: 0.0042\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = AnalysisConfig::load(&path).unwrap();
        assert_eq!(cfg.noise_floor, Some(2.5e-8));
        assert_eq!(cfg.alpha, 0.1);
        assert_eq!(cfg.detection_sigma, 3.0);
        assert_eq!(cfg.beam.unwrap().cdelt2_deg, 0.0042);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = AnalysisConfig {
            noise_floor: Some(1.0),
            ..Default::default()
        };
        cfg.apply_overrides(Some(PathBuf::from("map.csv")), None, Some(0.01));
        assert_eq!(cfg.noise_map, Some(PathBuf::from("map.csv")));
        assert_eq!(cfg.noise_floor, Some(1.0));
        assert_eq!(cfg.alpha, 0.01);
    }

    #[test]
    fn configured_floor_wins_over_map() {
        let cfg = AnalysisConfig {
            noise_floor: Some(4e-8),
            noise_map: Some(PathBuf::from("does-not-exist.csv")),
            ..Default::default()
        };
        assert!(matches!(
            cfg.noise_input().unwrap(),
            NoiseInput::Precomputed(v) if v == 4e-8
        ));
    }

    #[test]
    fn missing_noise_source_is_an_error() {
        let err = AnalysisConfig::default().noise_input().unwrap_err();
        assert!(err.to_string().contains("no noise source"));
    }
}
