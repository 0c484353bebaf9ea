use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One continuous work session. `end_time` is NULL while in progress;
/// `break_seconds` accumulates as breaks are closed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Shift {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-03-10T09:00:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(example = "2026-03-10T17:00:00", value_type = String, format = "date-time", nullable = true)]
    pub end_time: Option<NaiveDateTime>,
    #[schema(example = 1800)]
    pub break_seconds: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ShiftBreak {
    pub id: u64,
    pub shift_id: u64,
    #[schema(example = "2026-03-10T12:00:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(example = "2026-03-10T12:30:00", value_type = String, format = "date-time", nullable = true)]
    pub end_time: Option<NaiveDateTime>,
}

/// Lifecycle state derived from the row: a shift row always exists in one
/// of these three states (`not_started` is the absence of a row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShiftState {
    Active,
    OnBreak,
    Ended,
}

impl Shift {
    pub fn state(&self, has_open_break: bool) -> ShiftState {
        if self.end_time.is_some() {
            ShiftState::Ended
        } else if has_open_break {
            ShiftState::OnBreak
        } else {
            ShiftState::Active
        }
    }

    /// Wall-clock duration minus accumulated breaks, clamped at zero.
    /// Open shifts are measured up to `now`.
    pub fn net_work_seconds(&self, now: NaiveDateTime) -> i64 {
        let until = self.end_time.unwrap_or(now);
        let gross = (until - self.start_time).num_seconds();
        (gross - self.break_seconds).max(0)
    }
}

impl ShiftBreak {
    /// Seconds this break contributes once closed at `end`.
    pub fn seconds_until(&self, end: NaiveDateTime) -> i64 {
        (end - self.start_time).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn shift(start: &str, end: Option<&str>, break_seconds: i64) -> Shift {
        Shift {
            id: 1,
            user_id: 42,
            start_time: t(start),
            end_time: end.map(t),
            break_seconds,
            notes: None,
        }
    }

    #[test]
    fn net_time_subtracts_breaks() {
        // 09:00 start, 12:00-12:30 break, 17:00 end
        let s = shift("2026-03-10 09:00:00", Some("2026-03-10 17:00:00"), 1800);
        assert_eq!(s.net_work_seconds(t("2026-03-10 18:00:00")), 27_000);
    }

    #[test]
    fn open_shift_measures_to_now() {
        let s = shift("2026-03-10 09:00:00", None, 0);
        assert_eq!(s.net_work_seconds(t("2026-03-10 10:30:00")), 5400);
    }

    #[test]
    fn net_time_never_negative() {
        let s = shift("2026-03-10 09:00:00", Some("2026-03-10 09:10:00"), 3600);
        assert_eq!(s.net_work_seconds(t("2026-03-10 12:00:00")), 0);
    }

    #[test]
    fn state_follows_end_time_and_open_break() {
        let open = shift("2026-03-10 09:00:00", None, 0);
        assert_eq!(open.state(false), ShiftState::Active);
        assert_eq!(open.state(true), ShiftState::OnBreak);

        let ended = shift("2026-03-10 09:00:00", Some("2026-03-10 17:00:00"), 0);
        assert_eq!(ended.state(false), ShiftState::Ended);
    }

    #[test]
    fn break_accumulation_clamps_at_zero() {
        let b = ShiftBreak {
            id: 1,
            shift_id: 1,
            start_time: t("2026-03-10 12:00:00"),
            end_time: None,
        };
        assert_eq!(b.seconds_until(t("2026-03-10 12:30:00")), 1800);
        assert_eq!(b.seconds_until(t("2026-03-10 11:00:00")), 0);
    }
}
