//! Dashboard metrics and the fallbacks used when there is nothing to aggregate

use crate::infrastructure::entities::GroupCount;

pub const DEFAULT_COMPLETION_RATE: i64 = 87;
pub const DEFAULT_AVERAGE_SATISFACTION: f64 = 4.5;
pub const DEFAULT_AVERAGE_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsOverview {
    pub total_contents: i64,
    pub total_activities: i64,
    pub total_resources: i64,
    pub completion_rate: i64,
    pub average_satisfaction: f64,
    pub average_time_days: i64,
    pub active_users: i64,
    pub total_interactions: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationMetrics {
    pub total: i64,
    pub active: i64,
    pub resolved: i64,
    pub rated: i64,
    pub average_satisfaction: f64,
    pub total_messages: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityMetrics {
    pub total: i64,
    pub mandatory: i64,
    pub by_modality: Vec<GroupCount>,
    pub by_kind: Vec<GroupCount>,
    pub total_capacity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetrics {
    pub total: i64,
    pub mandatory: i64,
    pub by_category: Vec<GroupCount>,
    pub by_kind: Vec<GroupCount>,
    pub total_accesses: i64,
    pub total_downloads: i64,
}

/// Share of mandatory activities, as a whole percentage.
pub fn completion_rate(mandatory: i64, total: i64) -> i64 {
    if total <= 0 {
        return DEFAULT_COMPLETION_RATE;
    }

    (mandatory as f64 / total as f64 * 100.0).round() as i64
}

pub fn average_satisfaction(average: Option<f64>) -> f64 {
    average
        .filter(|avg| avg.is_finite())
        .map(round_2)
        .unwrap_or(DEFAULT_AVERAGE_SATISFACTION)
}

pub fn average_days(average: Option<f64>) -> i64 {
    average
        .filter(|avg| avg.is_finite())
        .map(|avg| avg.round() as i64)
        .unwrap_or(DEFAULT_AVERAGE_DAYS)
}

pub fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate_without_activities_is_default() {
        assert_eq!(completion_rate(0, 0), 87);
    }

    #[test]
    fn test_completion_rate_is_rounded_percentage() {
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(0, 4), 0);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn test_average_satisfaction_default_and_rounding() {
        assert_eq!(average_satisfaction(None), 4.5);
        assert_eq!(average_satisfaction(Some(f64::NAN)), 4.5);
        assert_eq!(average_satisfaction(Some(11.0 / 3.0)), 3.67);
    }

    #[test]
    fn test_average_days_default_and_rounding() {
        assert_eq!(average_days(None), 14);
        assert_eq!(average_days(Some(6.6)), 7);
    }
}
