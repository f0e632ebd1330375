//! Headline metrics for the report header.

use crate::config::ThresholdsConfig;
use crate::offenders::OffenderBuckets;
use serde::Serialize;
use std::fmt;

use super::aggregator::round1;

/// Traffic-light level of a headline metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Ok,
    Warning,
    Critical,
}

impl Level {
    /// Returns an emoji representation of the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            Level::Ok => "🟢",
            Level::Warning => "🟡",
            Level::Critical => "🔴",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(usize),
    Average(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Average(v) => write!(f, "{:.1}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub title: String,
    pub value: MetricValue,
    pub level: Level,
}

impl Metric {
    fn count(title: &str, value: usize, level: Level) -> Self {
        Self {
            title: title.to_string(),
            value: MetricValue::Count(value),
            level,
        }
    }
}

fn critical_above(value: usize, limit: usize) -> Level {
    if value > limit {
        Level::Critical
    } else {
        Level::Ok
    }
}

/// Build the headline metrics for the canonical set.
pub fn headline_metrics(
    total: usize,
    average_stalled_days: f64,
    offenders: &OffenderBuckets<'_>,
    thresholds: &ThresholdsConfig,
) -> Vec<Metric> {
    let total_level = if total > thresholds.total_critical {
        Level::Critical
    } else if total > thresholds.total_warning {
        Level::Warning
    } else {
        Level::Ok
    };

    let pending = offenders.pending_scheduling.len();
    let overdue = offenders.overdue_scheduled.len();
    let closed = offenders.incorrectly_closed.len();
    let average = round1(average_stalled_days);

    vec![
        Metric::count("Orders in Scope", total, total_level),
        Metric::count(
            "Pending (> 0 days)",
            pending,
            critical_above(pending, thresholds.pending_critical),
        ),
        Metric::count(
            "Overdue Scheduled",
            overdue,
            critical_above(overdue, thresholds.overdue_scheduled_critical),
        ),
        Metric::count(
            "Incorrect Status",
            closed,
            critical_above(closed, thresholds.incorrectly_closed_critical),
        ),
        Metric {
            title: "Average Stalled Days".to_string(),
            value: MetricValue::Average(average),
            level: if average > thresholds.average_stalled_critical {
                Level::Critical
            } else {
                Level::Ok
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_levels() {
        let buckets = OffenderBuckets::default();
        let thresholds = ThresholdsConfig::default();

        let metrics = headline_metrics(99, 0.0, &buckets, &thresholds);
        assert_eq!(metrics[0].level, Level::Ok);
        let metrics = headline_metrics(100, 0.0, &buckets, &thresholds);
        assert_eq!(metrics[0].level, Level::Warning);
        let metrics = headline_metrics(116, 0.0, &buckets, &thresholds);
        assert_eq!(metrics[0].level, Level::Critical);
    }

    #[test]
    fn test_metric_titles() {
        let metrics = headline_metrics(0, 0.0, &OffenderBuckets::default(), &ThresholdsConfig::default());
        let titles: Vec<&str> = metrics.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Orders in Scope",
                "Pending (> 0 days)",
                "Overdue Scheduled",
                "Incorrect Status",
                "Average Stalled Days",
            ]
        );
    }

    #[test]
    fn test_empty_buckets_are_ok() {
        let metrics = headline_metrics(0, 0.0, &OffenderBuckets::default(), &ThresholdsConfig::default());
        assert_eq!(metrics.len(), 5);
        assert!(metrics.iter().all(|m| m.level == Level::Ok));
    }

    #[test]
    fn test_average_metric() {
        let metrics = headline_metrics(10, 3.04, &OffenderBuckets::default(), &ThresholdsConfig::default());
        assert_eq!(metrics[4].value, MetricValue::Average(3.0));
        assert_eq!(metrics[4].level, Level::Ok);
        assert_eq!(metrics[4].value.to_string(), "3.0");

        let metrics = headline_metrics(10, 3.06, &OffenderBuckets::default(), &ThresholdsConfig::default());
        assert_eq!(metrics[4].level, Level::Critical);
    }
}
