use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A dated absence request. Stored status/type are the lowercase strings
/// produced by the enums below.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = "2026-03-10", value_type = String, format = "date")]
    pub leave_date: NaiveDate,
    pub notes: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = 7, nullable = true)]
    pub reviewed_by: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Unpaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// pending -> approved/rejected, one-way. Reviewed requests stay put.
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        matches!(
            (self, next),
            (LeaveStatus::Pending, LeaveStatus::Approved)
                | (LeaveStatus::Pending, LeaveStatus::Rejected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_strings_round_trip() {
        assert_eq!(LeaveStatus::Approved.to_string(), "approved");
        assert_eq!(LeaveStatus::from_str("pending").unwrap(), LeaveStatus::Pending);
        assert!(LeaveStatus::from_str("undone").is_err());
    }

    #[test]
    fn review_is_one_way() {
        assert!(LeaveStatus::Pending.can_transition_to(LeaveStatus::Approved));
        assert!(LeaveStatus::Pending.can_transition_to(LeaveStatus::Rejected));
        assert!(!LeaveStatus::Approved.can_transition_to(LeaveStatus::Pending));
        assert!(!LeaveStatus::Rejected.can_transition_to(LeaveStatus::Approved));
        assert!(!LeaveStatus::Approved.can_transition_to(LeaveStatus::Rejected));
    }

    #[test]
    fn leave_types_parse_lowercase() {
        assert_eq!(LeaveType::from_str("unpaid").unwrap(), LeaveType::Unpaid);
        assert_eq!(LeaveType::Casual.to_string(), "casual");
    }
}
