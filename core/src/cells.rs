//! Binned cell measurements and the per-channel columns derived from them.

use crate::math::stats::StatsHelper;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Divisor applied to the propagated SZ uncertainty.
pub const SZ_ERROR_SCALE: f64 = 35.0;

/// One row of the input cell table.
///
/// Column names follow the table produced by the cell extraction step.
/// The SZ columns may be absent when only radio and X-ray are compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    #[serde(rename = "radio1_sb")]
    pub radio_sb: f64,
    #[serde(rename = "radio1_sb_err")]
    pub radio_sb_err: f64,
    pub xray_sb: f64,
    pub xray_sb_err: f64,
    #[serde(default)]
    pub y_sb: Option<f64>,
    #[serde(default)]
    pub y_sb_err: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Radio,
    Xray,
    Sz,
}

impl ChannelKind {
    pub fn label(self) -> &'static str {
        match self {
            ChannelKind::Radio => "radio",
            ChannelKind::Xray => "x-ray",
            ChannelKind::Sz => "sz",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Values of one channel with their measurement errors, row-aligned with
/// the other channels of the same selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub kind: ChannelKind,
    pub values: Vec<f64>,
    pub errors: Vec<f64>,
}

impl Channel {
    pub fn new(kind: ChannelKind, values: Vec<f64>, errors: Vec<f64>) -> Self {
        Self {
            kind,
            values,
            errors,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        StatsHelper::mean(&self.values)
    }

    /// Divides values and errors by the mean of the values.
    pub fn normalize(&mut self) {
        let mean = self.mean();
        for v in self.values.iter_mut().chain(self.errors.iter_mut()) {
            *v /= mean;
        }
    }

    /// Keeps the rows whose flag is set.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.values.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.errors.retain(|_| *flags.next().unwrap_or(&false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_divides_errors_by_value_mean() {
        let mut channel = Channel::new(ChannelKind::Xray, vec![1.0, 3.0], vec![0.2, 0.4]);
        channel.normalize();
        assert_eq!(channel.values, vec![0.5, 1.5]);
        assert_eq!(channel.errors, vec![0.1, 0.2]);
        assert!((channel.mean() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn retain_rows_keeps_values_and_errors_aligned() {
        let mut channel = Channel::new(
            ChannelKind::Radio,
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.1, 0.2, 0.3, 0.4],
        );
        channel.retain_rows(&[true, false, false, true]);
        assert_eq!(channel.values, vec![1.0, 4.0]);
        assert_eq!(channel.errors, vec![0.1, 0.4]);
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn labels_match_report_wording() {
        assert_eq!(ChannelKind::Xray.to_string(), "x-ray");
        assert_eq!(ChannelKind::Sz.label(), "sz");
    }
}
