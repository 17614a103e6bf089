// crates/core/src/stats.rs
//! Summary statistics shared by the report builders.

use chrono::Weekday;

/// Trailing window for the daily-trend moving averages.
pub const MOVING_AVERAGE_WINDOW: usize = 7;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Percentage change from `previous` to `current`, rounded to 2 decimals.
///
/// `None` when the previous value is zero or either value is not finite.
pub fn growth_pct(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some(round_to((current - previous) / previous * 100.0, 2))
}

/// `numerator / denominator`, or `None` for a zero denominator.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// `numerator / denominator × 100`, or `None` for a zero denominator.
pub fn percent(numerator: f64, denominator: f64) -> Option<f64> {
    ratio(numerator, denominator).map(|r| r * 100.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; an even count averages the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Sample standard deviation from SQL-side aggregates.
pub fn stddev_from_sums(count: i64, sum: f64, sum_of_squares: f64) -> Option<f64> {
    if count < 2 {
        return None;
    }
    let n = count as f64;
    let variance = (sum_of_squares - sum * sum / n) / (n - 1.0);
    // Cancellation can leave a tiny negative residue for constant series.
    Some(variance.max(0.0).sqrt())
}

/// Trailing moving average with min-periods 1: the first points average
/// over however many values are available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut running = 0.0;
    for (i, v) in values.iter().enumerate() {
        running += v;
        if i >= window {
            running -= values[i - window];
        }
        let n = (i + 1).min(window);
        out.push(running / n as f64);
    }
    out
}

/// Sum of the `⌊n × fraction⌋` largest values, and that count.
pub fn top_fraction_sum(values: &[f64], fraction: f64) -> (usize, f64) {
    let n = (values.len() as f64 * fraction).floor() as usize;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    (n, sorted.iter().take(n).sum())
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_growth_pct_zero_previous_is_none() {
        assert_eq!(growth_pct(100.0, 0.0), None);
        assert_eq!(growth_pct(0.0, 0.0), None);
        assert_eq!(growth_pct(100.0, f64::NAN), None);
    }

    #[test]
    fn test_growth_pct_rounds_to_two_places() {
        assert_eq!(growth_pct(150.0, 100.0), Some(50.0));
        assert_eq!(growth_pct(50.0, 100.0), Some(-50.0));
        assert_eq!(growth_pct(2.0, 3.0), Some(-33.33));
    }

    #[test]
    fn test_ratio_and_percent() {
        assert_eq!(ratio(10.0, 0.0), None);
        assert_eq!(ratio(10.0, 4.0), Some(2.5));
        assert_eq!(percent(1.0, 4.0), Some(25.0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_sample_stddev() {
        assert_eq!(sample_stddev(&[5.0]), None);
        let sd = sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(close(sd, 2.138089935299395));
    }

    #[test]
    fn test_stddev_from_sums_matches_direct() {
        let values = [10.0, 12.0, 15.0];
        let sum: f64 = values.iter().sum();
        let sq: f64 = values.iter().map(|v| v * v).sum();
        let a = stddev_from_sums(3, sum, sq).unwrap();
        let b = sample_stddev(&values).unwrap();
        assert!(close(a, b));
        assert_eq!(stddev_from_sums(1, 10.0, 100.0), None);
        assert_eq!(stddev_from_sums(3, 15.0, 75.0), Some(0.0));
    }

    #[test]
    fn test_moving_average_min_periods_one() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 7);
        assert!(close(ma[0], 1.0));
        assert!(close(ma[1], 1.5));
        assert!(close(ma[6], 4.0));
        assert!(close(ma[7], 5.0));
        assert!(moving_average(&[], 7).is_empty());
    }

    #[test]
    fn test_top_fraction_sum() {
        let values: Vec<f64> = (1..=25).map(f64::from).collect();
        let (n, sum) = top_fraction_sum(&values, 0.1);
        assert_eq!(n, 2);
        assert!(close(sum, 49.0));
        assert_eq!(top_fraction_sum(&[5.0, 1.0], 0.1), (0, 0.0));
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_name(Weekday::Wed), "Wednesday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }
}
