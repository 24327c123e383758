//! Future time axis

use chrono::{DateTime, Duration, Utc};

/// Spacing of forecast steps, derived from a provider interval label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUnit {
    Minute,
    Hour,
    Day,
}

impl StepUnit {
    /// Classify by substring: a `d` means days, otherwise an `h` means
    /// hours, anything else is minutes ("1d", "4h", "15m").
    pub fn from_interval(interval: &str) -> Self {
        let label = interval.to_lowercase();
        if label.contains('d') {
            StepUnit::Day
        } else if label.contains('h') {
            StepUnit::Hour
        } else {
            StepUnit::Minute
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            StepUnit::Minute => Duration::minutes(1),
            StepUnit::Hour => Duration::hours(1),
            StepUnit::Day => Duration::days(1),
        }
    }

    /// Capitalized plural, used in chart titles
    pub fn title(&self) -> &'static str {
        match self {
            StepUnit::Minute => "Minutes",
            StepUnit::Hour => "Hours",
            StepUnit::Day => "Days",
        }
    }

    /// `horizon` contiguous steps after `last`
    pub fn future_axis(&self, last: DateTime<Utc>, horizon: usize) -> Vec<DateTime<Utc>> {
        let step = self.duration();
        let mut t = last;
        (0..horizon)
            .map(|_| {
                t += step;
                t
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interval_classification() {
        assert_eq!(StepUnit::from_interval("1d"), StepUnit::Day);
        assert_eq!(StepUnit::from_interval("1D"), StepUnit::Day);
        assert_eq!(StepUnit::from_interval("daily"), StepUnit::Day);
        assert_eq!(StepUnit::from_interval("4h"), StepUnit::Hour);
        assert_eq!(StepUnit::from_interval("1H"), StepUnit::Hour);
        assert_eq!(StepUnit::from_interval("15m"), StepUnit::Minute);
        assert_eq!(StepUnit::from_interval("1w"), StepUnit::Minute);
    }

    #[test]
    fn test_future_axis_is_contiguous() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap();
        let axis = StepUnit::Hour.future_axis(last, 24);

        assert_eq!(axis.len(), 24);
        assert_eq!(axis[0], last + Duration::hours(1));
        assert_eq!(axis[23], last + Duration::hours(24));
        for pair in axis.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(1));
        }
    }

    #[test]
    fn test_future_axis_long_horizon() {
        let last = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let axis = StepUnit::Minute.future_axis(last, 70_000);
        assert_eq!(axis.len(), 70_000);
        assert_eq!(axis[69_999], last + Duration::minutes(70_000));
    }

    #[test]
    fn test_future_axis_daily() {
        let last = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        let axis = StepUnit::Day.future_axis(last, 3);
        assert_eq!(axis[1], Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_titles() {
        assert_eq!(StepUnit::Day.title(), "Days");
        assert_eq!(StepUnit::Minute.title(), "Minutes");
    }
}
