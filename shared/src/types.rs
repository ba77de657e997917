//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and scope of the operator performing a recording operation.
///
/// Supplied explicitly by the caller on every recorder call; the recorders
/// perform no authentication themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorContext {
    pub user_id: Uuid,
    pub factory_id: Uuid,
}

impl OperatorContext {
    pub fn new(user_id: Uuid, factory_id: Uuid) -> Self {
        Self { user_id, factory_id }
    }
}

/// Roll-up granularity for reception summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl SummaryPeriod {
    /// `DATE_TRUNC` field name
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryPeriod::Day => "day",
            SummaryPeriod::Week => "week",
            SummaryPeriod::Month => "month",
            SummaryPeriod::Year => "year",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_period_serde_names() {
        let period: SummaryPeriod = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(period, SummaryPeriod::Week);
        assert_eq!(serde_json::to_string(&SummaryPeriod::Year).unwrap(), "\"year\"");
    }

    #[test]
    fn test_summary_period_sql_field() {
        assert_eq!(SummaryPeriod::Day.as_str(), "day");
        assert_eq!(SummaryPeriod::Month.as_str(), "month");
    }
}
