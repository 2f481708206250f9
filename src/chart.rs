/// Per-station water-level charts.
///
/// Each station gets one SVG showing the look-back window with a dashed-style
/// guide line at the configured low-water mark (200 cm by default). The y
/// axis always includes the guide line so a quick glance shows how far the
/// river is from it. When a station returned no history a placeholder chart
/// is written instead, so the published file set stays stable.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;

use crate::model::Sample;
use crate::stations::safe_station_filename;

/// Extra room above and below the data, in cm.
const Y_MARGIN_CM: f64 = 30.0;

const CHART_SIZE: (u32, u32) = (900, 400);
const LEVEL_COLOR: RGBColor = RGBColor(31, 119, 180);
const GUIDE_COLOR: RGBColor = RGBColor(255, 165, 0);

#[derive(Debug)]
pub enum ChartError {
    Io(std::io::Error),
    Render(String),
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::Io(e) => write!(f, "Chart I/O error: {}", e),
            ChartError::Render(msg) => write!(f, "Chart rendering failed: {}", msg),
        }
    }
}

impl std::error::Error for ChartError {}

/// `{graph_dir}/{safe_name}_{hours}h.svg`
pub fn chart_path(graph_dir: &Path, station: &str, hours_back: u32) -> PathBuf {
    graph_dir.join(format!("{}_{}h.svg", safe_station_filename(station), hours_back))
}

/// Y axis bounds covering every value and the guide line, plus margin.
/// With no values the range spans from zero (or the guide, if negative).
pub fn y_bounds(values: &[f64], low_line_cm: f64) -> (f64, f64) {
    if values.is_empty() {
        return (0f64.min(low_line_cm) - Y_MARGIN_CM, low_line_cm + Y_MARGIN_CM);
    }
    let min = values.iter().copied().fold(low_line_cm, f64::min);
    let max = values.iter().copied().fold(low_line_cm, f64::max);
    (min - Y_MARGIN_CM, max + Y_MARGIN_CM)
}

/// Renders the chart for one station to `path`, creating parent directories.
pub fn render_chart(
    path: &Path,
    title: &str,
    samples: &[Sample],
    low_line_cm: f64,
) -> Result<(), ChartError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ChartError::Io)?;
    }

    let result = if samples.is_empty() {
        draw_placeholder(path, title, low_line_cm)
    } else {
        draw_levels(path, title, samples, low_line_cm)
    };
    result.map_err(|e| ChartError::Render(e.to_string()))
}

fn draw_levels(
    path: &Path,
    title: &str,
    samples: &[Sample],
    low_line_cm: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(NaiveDateTime, f64)> = samples
        .iter()
        .map(|s| (s.timestamp.naive_utc(), s.value))
        .collect();
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let (y_min, y_max) = y_bounds(&values, low_line_cm);

    let (Some(x_start), Some(mut x_end)) = (
        points.iter().map(|(t, _)| *t).min(),
        points.iter().map(|(t, _)| *t).max(),
    ) else {
        return draw_placeholder(path, title, low_line_cm);
    };
    if x_end <= x_start {
        x_end = x_start + Duration::hours(1);
    }

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(RangedDateTime::from(x_start..x_end), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time (UTC)")
        .y_desc("Water level (cm)")
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format("%d-%m %H:%M").to_string())
        .light_line_style(BLACK.mix(0.15))
        .draw()?;

    chart
        .draw_series(LineSeries::new(points, LEVEL_COLOR.stroke_width(2)))?
        .label("Water level")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LEVEL_COLOR));

    chart
        .draw_series(LineSeries::new(
            vec![(x_start, low_line_cm), (x_end, low_line_cm)],
            GUIDE_COLOR,
        ))?
        .label(format!("{} cm", low_line_cm))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GUIDE_COLOR));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_placeholder(
    path: &Path,
    title: &str,
    low_line_cm: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (y_min, y_max) = y_bounds(&[], low_line_cm);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..1f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(0)
        .y_desc("Water level (cm)")
        .light_line_style(BLACK.mix(0.15))
        .draw()?;

    chart
        .draw_series(LineSeries::new(vec![(0.0, low_line_cm), (1.0, low_line_cm)], GUIDE_COLOR))?
        .label(format!("{} cm", low_line_cm))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GUIDE_COLOR));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(BLACK)
        .draw()?;

    let (width, height) = CHART_SIZE;
    root.draw(&Text::new(
        "No data available",
        (width as i32 / 2 - 90, height as i32 / 2),
        ("sans-serif", 24).into_font(),
    ))?;

    root.present()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("rijnagent-charts-{}", std::process::id()))
    }

    #[test]
    fn test_chart_path_uses_ascii_station_name() {
        let path = chart_path(Path::new("graphs"), "DÜSSELDORF", 48);
        assert_eq!(path, PathBuf::from("graphs/duesseldorf_48h.svg"));
    }

    #[test]
    fn test_y_bounds_always_include_guide_line() {
        // River well above the guide line: lower bound comes from the guide.
        let (lo, hi) = y_bounds(&[410.0, 430.0, 425.0], 200.0);
        assert_eq!(lo, 170.0);
        assert_eq!(hi, 460.0);

        // River below the guide line: upper bound comes from the guide.
        let (lo, hi) = y_bounds(&[120.0, 140.0], 200.0);
        assert_eq!(lo, 90.0);
        assert_eq!(hi, 230.0);
    }

    #[test]
    fn test_y_bounds_without_data_span_zero_to_guide() {
        assert_eq!(y_bounds(&[], 200.0), (-30.0, 230.0));
    }

    #[test]
    fn test_render_writes_svg_file() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let samples: Vec<Sample> = (0..48)
            .map(|h| Sample::new(t0 + Duration::hours(h), 300.0 + h as f64))
            .collect();
        let path = chart_path(&temp_dir(), "BONN", 48);

        render_chart(&path, "Rhine – BONN – last 48 hours", &samples, 200.0).expect("should render");

        let svg = fs::read_to_string(&path).expect("file should exist");
        assert!(svg.contains("<svg"), "output should be an SVG document");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_render_placeholder_for_empty_history() {
        let path = chart_path(&temp_dir(), "KÖLN", 48);
        render_chart(&path, "Rhine – KÖLN – last 48 hours", &[], 200.0).expect("should render");

        let svg = fs::read_to_string(&path).expect("file should exist");
        assert!(svg.contains("No data available"), "placeholder text should be present");
        let _ = fs::remove_file(&path);
    }
}
