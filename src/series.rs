//! Per-country statistics: death rate, cumulative cases, threshold alignment
//! and moving averages.

use chrono::NaiveDate;

use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Default)]
/// One country's rows, in file order.
pub struct CountrySeries {
    pub geo_id: String,
    pub dates: Vec<NaiveDate>,
    pub cases: Vec<i64>,
    pub deaths: Vec<i64>,
}

impl CountrySeries {
    pub fn from_dataset(dataset: &Dataset, geo_id: &str) -> Self {
        let mut series = CountrySeries {
            geo_id: geo_id.to_string(),
            ..Default::default()
        };
        for record in dataset.country(geo_id) {
            series.dates.push(record.date);
            series.cases.push(record.cases);
            series.deaths.push(record.deaths);
        }

        series
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn total_cases(&self) -> i64 {
        self.cases.iter().sum()
    }

    pub fn total_deaths(&self) -> i64 {
        self.deaths.iter().sum()
    }

    /// `sum(deaths) / sum(cases)`, or `None` when there are no cases to divide by.
    pub fn death_rate(&self) -> Option<f64> {
        let cases = self.total_cases();
        if cases <= 0 {
            return None;
        }
        Some(self.total_deaths() as f64 / cases as f64)
    }

    /// Cumulative cases for each row, see [`reverse_cumsum`].
    pub fn cumulative(&self) -> Vec<i64> {
        reverse_cumsum(&self.cases)
    }

    /// Cuts the series at the row whose cumulative count is closest to
    /// `threshold` and returns it in chronological order, starting there.
    pub fn align(&self, threshold: i64) -> Option<Trajectory> {
        let cumulative = self.cumulative();
        let start = closest_index(&cumulative, threshold)?;

        Some(Trajectory {
            dates: self.dates[..=start].iter().rev().copied().collect(),
            new_cases: self.cases[..=start].iter().rev().copied().collect(),
            cumulative: cumulative[..=start].iter().rev().copied().collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A country's series from the day it reached the threshold onwards.
/// Index `i` is "days since threshold".
pub struct Trajectory {
    pub dates: Vec<NaiveDate>,
    pub new_cases: Vec<i64>,
    pub cumulative: Vec<i64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Moving averages of cumulative and new cases, paired point by point.
    pub fn smoothed(&self, window: usize) -> Vec<(f64, f64)> {
        let cumulative = moving_average(&to_f64(&self.cumulative), window);
        let new_cases = moving_average(&to_f64(&self.new_cases), window);

        cumulative.into_iter().zip(new_cases).collect()
    }
}

#[derive(Debug, Clone)]
pub struct CountrySummary {
    pub geo_id: String,
    pub total_cases: i64,
    pub total_deaths: i64,
    pub death_rate: Option<f64>,
    pub trajectory: Option<Trajectory>,
}

impl CountrySummary {
    pub fn new(series: &CountrySeries, threshold: i64) -> Self {
        CountrySummary {
            geo_id: series.geo_id.clone(),
            total_cases: series.total_cases(),
            total_deaths: series.total_deaths(),
            death_rate: series.death_rate(),
            trajectory: series.align(threshold),
        }
    }

    /// Death rate in percent rounded to `decimals`, or `n/a`. Trailing zeros
    /// are dropped: 2.5% rather than 2.500%.
    pub fn death_rate_label(&self, decimals: i32) -> String {
        match self.death_rate {
            Some(rate) => {
                let scale = 10f64.powi(decimals);
                format!("{}%", format_decimal((rate * 100.0 * scale).round() / scale))
            }
            None => "n/a".to_string(),
        }
    }
}

/// Shortest decimal form of `value`, keeping one fractional digit for whole
/// numbers (`2.0`, `2.5`, `2.567`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// `out[i] = values[i] + values[i + 1] + ... + values[n - 1]`.
///
/// On a newest-first table this is the running total as of each row's date.
pub fn reverse_cumsum(values: &[i64]) -> Vec<i64> {
    let mut out: Vec<i64> = values
        .iter()
        .rev()
        .scan(0i64, |total, v| {
            *total += v;
            Some(*total)
        })
        .collect();
    out.reverse();

    out
}

/// Index of the value nearest to `target`. Ties go to the earliest index.
pub fn closest_index(values: &[i64], target: i64) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (idx, v) in values.iter().enumerate() {
        let distance = v.abs_diff(target);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((idx, distance)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Simple trailing mean over full windows only: `values.len() - window + 1`
/// outputs, none if the window does not fit.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

fn to_f64(values: &[i64]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::dataset::Record;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn record(geo_id: &str, d: u32, cases: i64, deaths: i64) -> Record {
        Record {
            date: day(d),
            cases,
            deaths,
            geo_id: geo_id.to_string(),
            country: None,
            country_code: None,
            population: None,
        }
    }

    fn zz_fixture() -> Dataset {
        Dataset::new(vec![
            record("ZZ", 1, 10, 1),
            record("AA", 1, 999, 9),
            record("ZZ", 2, 20, 2),
            record("ZZ", 3, 30, 3),
            record("ZZ", 4, 40, 4),
            record("ZZ", 5, 100, 5),
        ])
    }

    #[test]
    fn should_filter_country_in_row_order() {
        let series = CountrySeries::from_dataset(&zz_fixture(), "ZZ");

        assert_eq!(series.cases, vec![10, 20, 30, 40, 100]);
        assert_eq!(series.deaths, vec![1, 2, 3, 4, 5]);
        assert_eq!(series.dates.first(), Some(&day(1)));
    }

    #[test]
    fn should_compute_reverse_cumulative_and_threshold_row() {
        let series = CountrySeries::from_dataset(&zz_fixture(), "ZZ");
        let cumulative = series.cumulative();

        assert_eq!(cumulative, vec![200, 190, 170, 140, 100]);
        let idx = closest_index(&cumulative, 100).unwrap();
        assert_eq!(idx, 4);
        assert_eq!(cumulative[idx].abs_diff(100), 0);
    }

    #[test]
    fn should_compute_death_rate() {
        let series = CountrySeries::from_dataset(&zz_fixture(), "ZZ");

        assert_eq!(series.death_rate(), Some(15.0 / 200.0));
    }

    #[test]
    fn should_not_divide_by_zero_cases() {
        let dataset = Dataset::new(vec![record("QQ", 1, 0, 0), record("QQ", 2, 0, 1)]);
        let series = CountrySeries::from_dataset(&dataset, "QQ");

        assert_eq!(series.death_rate(), None);
        assert_eq!(CountrySummary::new(&series, 100).death_rate_label(3), "n/a");
    }

    #[test]
    fn should_label_death_rate_without_padding() {
        let summary = |rate: f64| CountrySummary {
            geo_id: "ZZ".to_string(),
            total_cases: 0,
            total_deaths: 0,
            death_rate: Some(rate),
            trajectory: None,
        };

        assert_eq!(summary(0.025).death_rate_label(3), "2.5%");
        assert_eq!(summary(0.02).death_rate_label(3), "2.0%");
        assert_eq!(summary(0.0256789).death_rate_label(3), "2.568%");
        assert_eq!(summary(15.0 / 200.0).death_rate_label(3), "7.5%");
        assert_eq!(summary(0.0256789).death_rate_label(1), "2.6%");
    }

    #[test]
    fn should_format_decimals() {
        assert_eq!(format_decimal(25.0), "25.0");
        assert_eq!(format_decimal(12.5), "12.5");
        assert_eq!(format_decimal(0.0), "0.0");
    }

    #[test]
    fn should_handle_missing_country() {
        let series = CountrySeries::from_dataset(&zz_fixture(), "XX");
        let summary = CountrySummary::new(&series, 100);

        assert!(series.is_empty());
        assert_eq!(summary.death_rate, None);
        assert!(summary.trajectory.is_none());
    }

    #[test]
    fn should_break_ties_by_first_occurrence() {
        assert_eq!(closest_index(&[90, 110, 100, 100], 100), Some(2));
        assert_eq!(closest_index(&[95, 105, 95], 100), Some(0));
        assert_eq!(closest_index(&[], 100), None);
    }

    #[test]
    fn should_compute_moving_average() {
        assert_eq!(moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3), vec![2.0, 3.0, 4.0]);
        assert_eq!(moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 5), vec![3.0]);
    }

    #[test]
    fn should_return_empty_average_when_window_does_not_fit() {
        assert!(moving_average(&[1.0, 2.0], 3).is_empty());
        assert!(moving_average(&[1.0, 2.0], 0).is_empty());
        assert!(moving_average(&[], 1).is_empty());
    }

    #[test]
    fn should_align_newest_first_series_at_threshold() {
        // ECDC layout: newest row first.
        let dataset = Dataset::new(vec![
            record("DE", 6, 80, 3),
            record("DE", 5, 50, 1),
            record("DE", 4, 40, 0),
            record("DE", 3, 20, 0),
            record("DE", 2, 8, 0),
            record("DE", 1, 2, 0),
        ]);
        let series = CountrySeries::from_dataset(&dataset, "DE");
        assert_eq!(series.cumulative(), vec![200, 120, 70, 30, 10, 2]);

        let trajectory = series.align(100).unwrap();

        assert_eq!(trajectory.start_date(), Some(day(5)));
        assert_eq!(trajectory.cumulative, vec![120, 200]);
        assert_eq!(trajectory.new_cases, vec![50, 80]);
        assert_eq!(trajectory.dates, vec![day(5), day(6)]);
    }

    #[test]
    fn should_pair_smoothed_series() {
        let trajectory = Trajectory {
            dates: (1..=4).map(day).collect(),
            new_cases: vec![100, 20, 30, 40],
            cumulative: vec![100, 120, 150, 190],
        };
        let smoothed = trajectory.smoothed(2);

        assert_eq!(smoothed, vec![(110.0, 60.0), (135.0, 25.0), (170.0, 35.0)]);
        assert!(trajectory.smoothed(5).is_empty());
    }
}
