//! PNG rendering through plotters

use std::fs;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::ComparisonChart;
use crate::{Error, Result};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub(super) fn draw_png(chart: &ComparisonChart, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let settings = chart.settings();
    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    draw(chart, &root).map_err(|e| Error::Render(e.to_string()))?;
    root.present()
        .map_err(|e| Error::Render(format!("failed to write {}: {e}", path.display())))?;

    info!(path = %path.display(), series = chart.len(), "chart written");
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn draw<DB>(chart: &ComparisonChart, root: &DrawingArea<DB, Shift>) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (y_low, y_high) = chart.y_range();
    if !(y_low > 0.0 && y_low < y_high) {
        return Err(format!("invalid log-scale y range {y_low}..{y_high}").into());
    }
    let x_max = chart.max_generations().saturating_sub(1).max(1) as f64;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40);
    if let Some(caption) = chart.settings().caption.as_deref() {
        builder.caption(caption, ("sans-serif", 20));
    }
    let mut ctx = builder.build_cartesian_2d(0.0..x_max, (y_low..y_high).log_scale())?;

    ctx.configure_mesh()
        .x_desc("generation")
        .y_desc("best")
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    for (index, series) in chart.series().iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        // Non-positive values have no position on a log axis
        let points = series
            .trajectory
            .points()
            .filter(|&(_, best)| best > 0.0)
            .map(|(generation, best)| (generation, best.min(y_high)));

        ctx.draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
    }

    if !chart.is_empty() {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::ChartSettings;
    use super::*;
    use crate::trajectory::Trajectory;

    #[test]
    fn test_render_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("plot.png");

        let mut chart = ComparisonChart::new(ChartSettings {
            width: 320,
            height: 240,
            ..ChartSettings::default()
        });
        chart
            .add_series("a.txt", Trajectory::new(vec![5000, 500, 120, 90]))
            .add_series("b.txt", Trajectory::new(vec![480, 200, 0, 95]));

        chart.render(&path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);

        // Overwrites on re-render
        chart.render(&path).unwrap();
    }

    #[test]
    fn test_render_rejects_non_positive_limit() {
        let dir = tempfile::tempdir().unwrap();
        let chart = ComparisonChart::new(ChartSettings {
            y_max: 0.0,
            ..ChartSettings::default()
        });
        let err = chart.render(dir.path().join("plot.png")).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }
}
