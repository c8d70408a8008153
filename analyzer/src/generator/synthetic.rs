use crate::io::cells::write_cells;
use crate::io::noise_map::write_noise_map;
use crate::workflow::config::AnalysisConfig;
use crate::workflow::runner::AnalysisInputs;
use anyhow::{bail, Context};
use ndarray::Array2;
use ptpcore::cells::CellRecord;
use ptpcore::noise::{BeamGeometry, NoiseMap};
use ptpcore::processing::NoiseInput;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Blanked border around the synthetic map, in pixels.
const MAP_BORDER: usize = 6;
/// Brightness of injected point sources, in units of the map noise.
const SOURCE_SIGMA: f64 = 200.0;
/// Radio brightness at the centre of the X-ray range, in units of the floor.
const RADIO_PIVOT_SIGMA: f64 = 12.0;
const XRAY_PIVOT_SB: f64 = 1e-6;
const SZ_PIVOT_SB: f64 = 1e-5;

/// Configuration for generating a synthetic cell table and noise map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub cells: usize,
    /// Power-law index of radio against X-ray.
    pub radio_slope: f64,
    /// Power-law index of the squared SZ signal against X-ray.
    pub sz_slope: f64,
    /// Intrinsic log scatter, in dex.
    pub scatter_dex: f64,
    pub relative_error: f64,
    pub map_size: usize,
    /// Per-beam map noise, Jy/beam.
    pub map_sigma: f64,
    pub sources: usize,
    pub seed: u64,
    pub beam: BeamGeometry,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            cells: 300,
            radio_slope: 0.8,
            sz_slope: 1.1,
            scatter_dex: 0.08,
            relative_error: 0.1,
            map_size: 96,
            map_sigma: 1e-4,
            sources: 8,
            seed: 0,
            beam: BeamGeometry {
                bmaj_deg: 60.0 / 3600.0,
                bmin_deg: 60.0 / 3600.0,
                cdelt1_deg: -15.0 / 3600.0,
                cdelt2_deg: 15.0 / 3600.0,
            },
        }
    }
}

/// Gaussian noise map with a blanked border and a few bright sources.
pub fn build_noise_map(config: &SyntheticConfig, rng: &mut StdRng) -> anyhow::Result<NoiseMap> {
    let size = config.map_size.max(2 * MAP_BORDER + 4);
    let normal = Normal::new(0.0, config.map_sigma)
        .with_context(|| format!("invalid synthetic map sigma {}", config.map_sigma))?;

    let mut data = Array2::from_shape_fn((size, size), |(r, c)| {
        let inside = (MAP_BORDER..size - MAP_BORDER).contains(&r)
            && (MAP_BORDER..size - MAP_BORDER).contains(&c);
        if inside {
            normal.sample(rng)
        } else {
            0.0
        }
    });

    for _ in 0..config.sources {
        let r = rng.gen_range(MAP_BORDER + 1..size - MAP_BORDER - 1);
        let c = rng.gen_range(MAP_BORDER + 1..size - MAP_BORDER - 1);
        for dr in 0..3 {
            for dc in 0..3 {
                data[[r + dr - 1, c + dc - 1]] += SOURCE_SIGMA * config.map_sigma;
            }
        }
    }

    Ok(NoiseMap::new(data))
}

/// Cells following power laws in X-ray, scattered in log space.
pub fn build_cells(
    config: &SyntheticConfig,
    noise_floor: f64,
    rng: &mut StdRng,
) -> anyhow::Result<Vec<CellRecord>> {
    let scatter = Normal::new(0.0, config.scatter_dex)
        .with_context(|| format!("invalid synthetic scatter {}", config.scatter_dex))?;

    let cells = (0..config.cells)
        .map(|_| {
            let log_x: f64 = rng.gen_range(-1.0..1.0);
            let xray_sb = XRAY_PIVOT_SB * 10f64.powf(log_x);
            let radio_sb = RADIO_PIVOT_SIGMA
                * noise_floor
                * 10f64.powf(config.radio_slope * log_x + scatter.sample(rng));
            let y_sb = SZ_PIVOT_SB * 10f64.powf(0.5 * (config.sz_slope * log_x + scatter.sample(rng)));
            CellRecord {
                radio_sb,
                radio_sb_err: config.relative_error * radio_sb,
                xray_sb,
                xray_sb_err: config.relative_error * xray_sb,
                y_sb: Some(y_sb),
                y_sb_err: Some(config.relative_error * y_sb),
            }
        })
        .collect();
    Ok(cells)
}

pub fn build_synthetic_inputs(config: &SyntheticConfig) -> anyhow::Result<AnalysisInputs> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let map = build_noise_map(config, &mut rng)?;
    let floor = config.beam.surface_brightness_rms(config.map_sigma);
    let cells = build_cells(config, floor, &mut rng)?;
    Ok(AnalysisInputs {
        cells,
        noise: NoiseInput::Map {
            map,
            beam: config.beam,
        },
    })
}

/// Writes generated inputs as `cells.csv`, `noise_map.csv` and an
/// `analysis.yaml` that points at them, so a later run can read them back.
pub fn export_synthetic_inputs(inputs: &AnalysisInputs, dir: &Path) -> anyhow::Result<()> {
    let NoiseInput::Map { map, beam } = &inputs.noise else {
        bail!("only map-based synthetic inputs can be exported");
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;

    write_cells(dir.join("cells.csv"), &inputs.cells)?;
    let map_path = dir.join("noise_map.csv");
    write_noise_map(&map_path, map)?;

    let config = AnalysisConfig {
        noise_map: Some(map_path),
        beam: Some(*beam),
        ..Default::default()
    };
    let yaml = serde_yaml::to_string(&config).context("serializing synthetic config")?;
    fs::write(dir.join("analysis.yaml"), yaml)
        .with_context(|| format!("writing analysis.yaml to {}", dir.display()))?;
    log::info!("synthetic inputs exported to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_cell_count() {
        let config = SyntheticConfig {
            cells: 40,
            ..Default::default()
        };
        let inputs = build_synthetic_inputs(&config).unwrap();
        assert_eq!(inputs.cells.len(), 40);
        assert!(inputs.cells.iter().all(|c| c.y_sb.is_some()));
        match inputs.noise {
            NoiseInput::Map { map, .. } => assert_eq!(map.dim(), (96, 96)),
            other => panic!("unexpected noise input {other:?}"),
        }
    }

    #[test]
    fn map_noise_survives_injected_sources() {
        let config = SyntheticConfig::default();
        let mut rng = StdRng::seed_from_u64(21);
        let map = build_noise_map(&config, &mut rng).unwrap();

        assert_eq!(map.data()[[0, 0]], 0.0);
        let rms = map.rms(1e-7).unwrap();
        assert!((rms - config.map_sigma).abs() < 0.1 * config.map_sigma, "rms {rms}");
    }

    #[test]
    fn exported_inputs_load_through_the_config() {
        let config = SyntheticConfig {
            cells: 25,
            map_size: 32,
            ..Default::default()
        };
        let inputs = build_synthetic_inputs(&config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        export_synthetic_inputs(&inputs, dir.path()).unwrap();

        let cells = crate::io::cells::read_cells(dir.path().join("cells.csv")).unwrap();
        assert_eq!(cells.len(), 25);

        let loaded = AnalysisConfig::load(dir.path().join("analysis.yaml")).unwrap();
        assert_eq!(loaded.beam, Some(config.beam));
        match loaded.noise_input().unwrap() {
            NoiseInput::Map { map, .. } => assert_eq!(map.dim(), (32, 32)),
            other => panic!("unexpected noise input {other:?}"),
        }
    }

    #[test]
    fn same_seed_repeats_the_table() {
        let config = SyntheticConfig {
            cells: 10,
            seed: 13,
            ..Default::default()
        };
        let first = build_synthetic_inputs(&config).unwrap().cells;
        let second = build_synthetic_inputs(&config).unwrap().cells;
        assert_eq!(first, second);
    }
}
