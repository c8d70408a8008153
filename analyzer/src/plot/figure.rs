use crate::workflow::runner::AnalysisReport;
use anyhow::{ensure, Context};
use plotters::coord::Shift;
use plotters::prelude::*;
use ptpcore::cells::ChannelKind;
use ptpcore::processing::ChannelComparison;
use std::ops::Range;
use std::path::Path;

const FIGURE_SIZE: (u32, u32) = (1024, 768);
/// Padding added beyond the outermost error bar on each axis.
const AXIS_PAD: f64 = 0.1;
const DASH: f64 = 0.08;
const GAP: f64 = 0.05;

const DARK_RED: RGBColor = RGBColor(139, 0, 0);
const DARK_BLUE: RGBColor = RGBColor(0, 0, 139);

struct ChannelStyle {
    point: RGBColor,
    bar: RGBColor,
    legend: &'static str,
}

impl ChannelStyle {
    fn for_channel(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Sz => Self {
                point: DARK_BLUE,
                bar: BLUE,
                legend: "Radio vs. SZ",
            },
            _ => Self {
                point: DARK_RED,
                bar: RED,
                legend: "Radio vs. X-ray",
            },
        }
    }
}

fn axis_descriptions(normalized: bool) -> (&'static str, &'static str) {
    if normalized {
        (
            "log(I_X) [SB/mean(SB)] and log(I_SZ^2) [SZ/mean(SZ)]",
            "log(I_R) [SB/mean(SB)]",
        )
    } else {
        (
            "log(I_X) (counts/s/arcsec^2)",
            "log(I_R) (Jy/arcsec^2)",
        )
    }
}

/// Axis ranges covering every error bar, padded by [`AXIS_PAD`].
pub fn axis_limits(comparisons: &[ChannelComparison]) -> anyhow::Result<(Range<f64>, Range<f64>)> {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);
    for point in comparisons.iter().flat_map(|c| &c.points) {
        x = (x.0.min(point.x - point.x_err), x.1.max(point.x + point.x_err));
        y = (y.0.min(point.y - point.y_err), y.1.max(point.y + point.y_err));
    }
    ensure!(
        x.0.is_finite() && x.1.is_finite() && y.0.is_finite() && y.1.is_finite(),
        "no finite points to plot"
    );
    Ok((
        (x.0 - AXIS_PAD)..(x.1 + AXIS_PAD),
        (y.0 - AXIS_PAD)..(y.1 + AXIS_PAD),
    ))
}

/// Splits the fitted line across `x_range` into dash segments.
fn dashed_fit(comparison: &ChannelComparison, x_range: &Range<f64>) -> Vec<Vec<(f64, f64)>> {
    let fit = &comparison.regression;
    let mut segments = Vec::new();
    let mut start = x_range.start;
    while start < x_range.end {
        let end = (start + DASH).min(x_range.end);
        segments.push(vec![(start, fit.predict(start)), (end, fit.predict(end))]);
        start = end + GAP;
    }
    segments
}

/// Draws the figure. Bitmap backends have no glyph renderer in this build,
/// so `with_text == false` leaves out tick labels, axis titles and legend.
fn draw<DB>(
    root: DrawingArea<DB, Shift>,
    report: &AnalysisReport,
    with_text: bool,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_range, y_range) = axis_limits(&report.comparisons)?;
    let (x_desc, y_desc) = axis_descriptions(report.normalized);

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh();
    if with_text {
        mesh.x_desc(x_desc)
            .y_desc(y_desc)
            .label_style(("sans-serif", 14));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    for comparison in &report.comparisons {
        let style = ChannelStyle::for_channel(comparison.channel);
        let bar = style.bar.stroke_width(1);

        chart.draw_series(comparison.points.iter().map(|p| {
            ErrorBar::new_vertical(p.x, p.y - p.y_err, p.y, p.y + p.y_err, bar, 0)
        }))?;
        chart.draw_series(comparison.points.iter().map(|p| {
            ErrorBar::new_horizontal(p.y, p.x - p.x_err, p.x, p.x + p.x_err, bar, 0)
        }))?;

        let marker = style.point;
        chart
            .draw_series(
                comparison
                    .points
                    .iter()
                    .map(|p| Circle::new((p.x, p.y), 2, marker.filled())),
            )?
            .label(style.legend)
            .legend(move |(x, y)| Circle::new((x, y), 4, marker.filled()));

        chart.draw_series(
            dashed_fit(comparison, &x_range)
                .into_iter()
                .map(|segment| PathElement::new(segment, marker.stroke_width(2))),
        )?;
    }

    if with_text && report.comparisons.len() > 1 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 14))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Renders the log-log scatter; `.svg` paths get vector output, anything
/// else a bitmap.
pub fn render_figure(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    let rendered = if is_svg {
        draw(SVGBackend::new(path, FIGURE_SIZE).into_drawing_area(), report, true)
    } else {
        log::warn!("bitmap figures are drawn without text; use a .svg path for labels");
        draw(BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area(), report, false)
    };
    rendered.with_context(|| format!("rendering figure {}", path.display()))?;

    log::info!("figure written to {}", path.display());
    Ok(())
}
