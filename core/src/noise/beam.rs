use crate::prelude::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};

const ARCSEC_PER_DEG: f64 = 3600.0;

/// Restoring beam and pixel scale of a radio image, all in degrees.
///
/// Field names follow the FITS header keywords they are read from
/// (`BMAJ`, `BMIN`, `CDELT1`, `CDELT2`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamGeometry {
    pub bmaj_deg: f64,
    pub bmin_deg: f64,
    pub cdelt1_deg: f64,
    pub cdelt2_deg: f64,
}

impl BeamGeometry {
    pub fn validate(&self) -> AnalysisResult<()> {
        let fields = [
            ("bmaj_deg", self.bmaj_deg),
            ("bmin_deg", self.bmin_deg),
            ("cdelt1_deg", self.cdelt1_deg),
            ("cdelt2_deg", self.cdelt2_deg),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value == 0.0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "beam {} must be finite and non-zero, got {}",
                    name, value
                )));
            }
        }
        if self.bmaj_deg < 0.0 || self.bmin_deg < 0.0 {
            return Err(AnalysisError::InvalidInput(
                "beam axes must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Gaussian beam solid angle expressed in pixels.
    pub fn beam_area_pixels(&self) -> f64 {
        let fwhm_to_sigma = 2.0 * (2.0 * LN_2).sqrt();
        let sigma_maj = self.bmaj_deg / fwhm_to_sigma;
        let sigma_min = self.bmin_deg / fwhm_to_sigma;
        let beam_area = 2.0 * PI * sigma_maj * sigma_min;
        let pixel_area = (self.cdelt1_deg * self.cdelt2_deg).abs();
        beam_area / pixel_area
    }

    /// Pixel side along the second axis, in arcseconds.
    pub fn pixel_scale_arcsec(&self) -> f64 {
        self.cdelt2_deg.abs() * ARCSEC_PER_DEG
    }

    /// Converts a per-beam map RMS into surface brightness per square arcsecond.
    pub fn surface_brightness_rms(&self, map_rms: f64) -> f64 {
        let scale = self.pixel_scale_arcsec();
        map_rms / self.beam_area_pixels() / (scale * scale)
    }
}

/// Where a noise floor came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseSource {
    Map {
        map_rms: f64,
        beam_area_pix: f64,
        pixel_scale_arcsec: f64,
        rounds: usize,
        converged: bool,
    },
    Configured,
}

/// Surface-brightness noise used to threshold the radio channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseFloor {
    /// Noise in Jy/arcsec^2.
    pub sb_rms: f64,
    pub source: NoiseSource,
}

impl NoiseFloor {
    pub fn configured(sb_rms: f64) -> AnalysisResult<Self> {
        if !sb_rms.is_finite() || sb_rms < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "noise floor must be finite and non-negative, got {}",
                sb_rms
            )));
        }
        Ok(Self {
            sb_rms,
            source: NoiseSource::Configured,
        })
    }

    pub fn detection_threshold(&self, detection_sigma: f64) -> f64 {
        detection_sigma * self.sb_rms
    }
}
