//! Two-panel comparison chart.
//!
//! Series are collected into a [`Figure`] first; nothing is drawn until
//! [`Figure::render`] consumes it and writes the PNG.

use std::{path::Path, process::Command};

use anyhow::Result;
use chrono::NaiveDate;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::series::{format_decimal, CountrySummary};

/// Days covered by the exponential reference curve.
const REFERENCE_DAYS: f64 = 30.0;
const REFERENCE_POINTS: usize = 50;

#[derive(Debug, Clone)]
pub struct FigureConfig {
    pub width: u32,
    pub height: u32,
    pub date: NaiveDate,
    pub threshold: i64,
    pub window: usize,
    pub growth_rate: f64,
    pub caption: String,
}

#[derive(Debug, Clone)]
struct Line {
    label: String,
    cumulative: Vec<(f64, f64)>,
    smoothed: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct Figure {
    config: FigureConfig,
    lines: Vec<Line>,
}

impl Figure {
    pub fn new(config: FigureConfig) -> Self {
        Figure {
            config,
            lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one country to both panels. Points without a logarithm are dropped.
    pub fn add_country(&mut self, summary: &CountrySummary) {
        let label = format!(
            "{}, (death rate: {}), {} cases",
            summary.geo_id,
            summary.death_rate_label(1),
            summary.total_cases
        );
        let (cumulative, smoothed) = match &summary.trajectory {
            Some(t) if !t.is_empty() => (
                t.cumulative
                    .iter()
                    .enumerate()
                    .map(|(day, &c)| (day as f64, c as f64))
                    .filter(|&(_, y)| y > 0.0)
                    .collect(),
                t.smoothed(self.config.window)
                    .into_iter()
                    .filter(|&(x, y)| x > 0.0 && y > 0.0)
                    .collect(),
            ),
            _ => (Vec::new(), Vec::new()),
        };

        self.lines.push(Line {
            label,
            cumulative,
            smoothed,
        });
    }

    /// `threshold * exp(growth_rate * d)` sampled evenly over `0..=30` days.
    pub fn reference_curve(&self) -> Vec<(f64, f64)> {
        let step = REFERENCE_DAYS / (REFERENCE_POINTS - 1) as f64;
        (0..REFERENCE_POINTS)
            .map(|i| {
                let d = i as f64 * step;
                (d, self.config.threshold as f64 * (self.config.growth_rate * d).exp())
            })
            .collect()
    }

    pub fn reference_label(&self) -> String {
        format!("{}% exponential growth", format_decimal(self.config.growth_rate * 100.0))
    }

    /// Axis ranges of the left panel: days from 0, cases from the threshold.
    pub fn cumulative_ranges(&self) -> ((f64, f64), (f64, f64)) {
        let reference = self.reference_curve();
        let points = self
            .lines
            .iter()
            .flat_map(|l| l.cumulative.iter())
            .chain(reference.iter());

        let (x_max, y_max) = points.fold((1.0f64, 1.0f64), |(x, y), &(px, py)| (x.max(px), y.max(py)));
        let y_min = self.config.threshold.max(1) as f64;

        ((0.0, x_max), (y_min, (y_max * 1.1).max(y_min * 10.0)))
    }

    /// Axis ranges of the right panel, spanning the smoothed points.
    pub fn smoothed_ranges(&self) -> ((f64, f64), (f64, f64)) {
        let points: Vec<(f64, f64)> = self.lines.iter().flat_map(|l| l.smoothed.iter().copied()).collect();
        if points.is_empty() {
            return ((1.0, 10.0), (1.0, 10.0));
        }

        let span = |values: Vec<f64>| {
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if hi > lo {
                (lo * 0.9, hi * 1.1)
            } else {
                (lo / 10.0, hi * 10.0)
            }
        };

        (
            span(points.iter().map(|p| p.0).collect()),
            span(points.iter().map(|p| p.1).collect()),
        )
    }

    pub fn render(self, path: &Path) -> Result<()> {
        let root = BitMapBackend::new(path, (self.config.width, self.config.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(&self.config.caption, ("sans-serif", 12))?;
        let (left, right) = root.split_horizontally((self.config.width / 2) as i32);

        self.draw_cumulative(&left)?;
        self.draw_smoothed(&right)?;

        root.present()?;
        info!("chart written to {}", path.display());

        Ok(())
    }

    fn draw_cumulative(&self, area: &DrawingArea<BitMapBackend, plotters::coord::Shift>) -> Result<()> {
        let ((x_min, x_max), (y_min, y_max)) = self.cumulative_ranges();

        let mut chart = ChartBuilder::on(area)
            .caption(self.config.date.format("%d-%m-%Y").to_string(), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, (y_min..y_max).log_scale())?;

        chart
            .configure_mesh()
            .x_desc(format!("Days from {}th case", self.config.threshold))
            .y_desc("Cumulative cases")
            .light_line_style(BLACK.mix(0.1))
            .draw()?;

        for (idx, line) in self.lines.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            chart
                .draw_series(LineSeries::new(line.cumulative.iter().copied(), color.stroke_width(2)))?
                .label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .draw_series(DashedLineSeries::new(self.reference_curve(), 8, 4, BLACK.stroke_width(1)))?
            .label(self.reference_label())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }

    fn draw_smoothed(&self, area: &DrawingArea<BitMapBackend, plotters::coord::Shift>) -> Result<()> {
        let ((x_min, x_max), (y_min, y_max)) = self.smoothed_ranges();

        let mut chart = ChartBuilder::on(area)
            .caption(format!("Moving average window {} days", self.config.window), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((x_min..x_max).log_scale(), (y_min..y_max).log_scale())?;

        chart
            .configure_mesh()
            .x_desc("Cumulative cases")
            .y_desc("New cases")
            .light_line_style(BLACK.mix(0.1))
            .draw()?;

        for (idx, line) in self.lines.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            chart.draw_series(LineSeries::new(line.smoothed.iter().copied(), color.stroke_width(2)))?;
        }

        Ok(())
    }
}

/// Opens the saved chart with the platform's image viewer.
pub fn show(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    if let Err(e) = command.arg(path).spawn() {
        warn!("cannot open {}: {}", path.display(), e);
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::series::Trajectory;

    use super::*;

    fn config() -> FigureConfig {
        FigureConfig {
            width: 1536,
            height: 759,
            date: NaiveDate::from_ymd_opt(2020, 3, 21).unwrap(),
            threshold: 100,
            window: 2,
            growth_rate: 0.25,
            caption: "test".to_string(),
        }
    }

    fn summary(geo_id: &str, trajectory: Option<Trajectory>) -> CountrySummary {
        CountrySummary {
            geo_id: geo_id.to_string(),
            total_cases: 400,
            total_deaths: 4,
            death_rate: Some(0.01),
            trajectory,
        }
    }

    fn trajectory() -> Trajectory {
        Trajectory {
            dates: (18..=21).map(|d| NaiveDate::from_ymd_opt(2020, 3, d).unwrap()).collect(),
            new_cases: vec![0, 100, 100, 100],
            cumulative: vec![100, 200, 300, 400],
        }
    }

    #[test]
    fn should_sample_reference_curve() {
        let figure = Figure::new(config());
        let curve = figure.reference_curve();

        assert_eq!(curve.len(), 50);
        assert_eq!(curve[0], (0.0, 100.0));
        let (d, y) = curve[49];
        assert!((d - 30.0).abs() < 1e-9);
        assert!((y - 100.0 * (7.5f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn should_collect_country_lines() {
        let mut figure = Figure::new(config());
        figure.add_country(&summary("DE", Some(trajectory())));
        figure.add_country(&summary("XX", None));

        assert_eq!(figure.lines.len(), 2);
        assert_eq!(figure.lines[0].label, "DE, (death rate: 1.0%), 400 cases");
        assert_eq!(figure.lines[0].cumulative[0], (0.0, 100.0));
        // new cases of 0 on the first day still give a positive average
        assert_eq!(figure.lines[0].smoothed, vec![(150.0, 50.0), (250.0, 100.0), (350.0, 100.0)]);
        assert!(figure.lines[1].cumulative.is_empty());
    }

    #[test]
    fn should_label_reference_curve() {
        let mut config = config();
        assert_eq!(Figure::new(config.clone()).reference_label(), "25.0% exponential growth");

        config.growth_rate = 0.125;
        assert_eq!(Figure::new(config).reference_label(), "12.5% exponential growth");
    }

    #[test]
    fn should_start_left_panel_at_threshold() {
        let mut figure = Figure::new(config());
        figure.add_country(&summary("DE", Some(trajectory())));
        let ((x_min, x_max), (y_min, y_max)) = figure.cumulative_ranges();

        assert_eq!(x_min, 0.0);
        assert!((x_max - 30.0).abs() < 1e-9);
        assert_eq!(y_min, 100.0);
        assert!(y_max > 100.0 * (7.5f64).exp());
    }

    #[test]
    fn should_default_ranges_without_points() {
        let figure = Figure::new(config());

        assert_eq!(figure.smoothed_ranges(), ((1.0, 10.0), (1.0, 10.0)));
    }

    #[test]
    fn should_span_smoothed_points() {
        let mut figure = Figure::new(config());
        figure.add_country(&summary("DE", Some(trajectory())));
        let ((x_lo, x_hi), (y_lo, y_hi)) = figure.smoothed_ranges();

        assert!(x_lo < 150.0 && x_hi > 350.0);
        assert!(y_lo < 50.0 && y_hi > 100.0);
    }
}
