use crate::workflow::runner::AnalysisReport;
use anyhow::Context;
use ptpcore::correlation::CorrelationResult;
use ptpcore::noise::NoiseSource;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

fn write_correlation<W: Write>(
    out: &mut W,
    label: &str,
    result: &CorrelationResult,
) -> io::Result<()> {
    writeln!(
        out,
        "{} R ({}): {} +- {}  [{}, {}] p={:.3e}",
        result.method,
        label,
        result.coefficient,
        result.upper_margin(),
        result.lower,
        result.upper,
        result.p_value
    )
}

/// Prints the per-channel fit and correlation summary.
pub fn write_summary<W: Write>(out: &mut W, report: &AnalysisReport) -> io::Result<()> {
    match &report.noise.source {
        NoiseSource::Map {
            map_rms,
            beam_area_pix,
            ..
        } => writeln!(
            out,
            "Noise floor: {:.4e} Jy/arcsec^2 (map rms {:.4e}, beam {:.2} pix)",
            report.noise.sb_rms, map_rms, beam_area_pix
        )?,
        NoiseSource::Configured => writeln!(
            out,
            "Noise floor: {:.4e} Jy/arcsec^2 (configured)",
            report.noise.sb_rms
        )?,
    }
    writeln!(out, "Number of cells used: {}", report.cells_used)?;

    for comparison in &report.comparisons {
        let label = comparison.label();
        writeln!(
            out,
            "{} VERSUS RADIO",
            comparison.channel.label().replace('-', "").to_uppercase()
        )?;
        let fit = &comparison.regression;
        writeln!(out, "y = {:.5} * x + {:.5}", fit.slope, fit.intercept)?;
        writeln!(out, "Slope is {} +- {}", fit.slope, fit.slope_stderr)?;
        write_correlation(out, &label, &comparison.pearson)?;
        write_correlation(out, &label, &comparison.spearman)?;
    }
    Ok(())
}

pub fn write_report_json<P: AsRef<Path>>(path: P, report: &AnalysisReport) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    let json = serde_json::to_string_pretty(report).context("serializing analysis report")?;
    fs::write(path_ref, json)
        .with_context(|| format!("writing analysis report {}", path_ref.display()))?;
    Ok(())
}
