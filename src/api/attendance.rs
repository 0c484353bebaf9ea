use crate::api::leave_request::fetch_approved_in_range;
use crate::api::shift::{ShiftResponse, fetch_shifts_in_range};
use crate::config::Config;
use crate::error::field_error;
use crate::model::leave_request::LeaveRequest;
use crate::model::shift::Shift;
use crate::utils::time::{is_working_day, working_days_in};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::{BTreeMap, BTreeSet};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Present,
    ExcusedAbsence,
    UnexcusedAbsence,
    Upcoming,
}

/// One calendar day in the aggregated view: a status plus whichever raw
/// records earned it.
#[derive(Debug, Serialize)]
pub struct DayEntry {
    pub status: DayStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shifts: Vec<ShiftResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave: Option<LeaveRequest>,
}

impl DayEntry {
    fn bare(status: DayStatus) -> Self {
        Self {
            status,
            shifts: Vec::new(),
            leave: None,
        }
    }
}

/// Builds the per-day attendance map for `[start, end]`.
///
/// Past days default to unexcused absence; approved leaves overlay an
/// excused absence; shifts overlay presence last, so a day with both a
/// leave and a shift reads as present. Days on/after `today` stay
/// `upcoming` unless a record applies to them.
pub fn build_calendar(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    now: NaiveDateTime,
    leaves: &[LeaveRequest],
    shifts: Vec<Shift>,
) -> BTreeMap<NaiveDate, DayEntry> {
    let mut days: BTreeMap<NaiveDate, DayEntry> = BTreeMap::new();
    for day in start.iter_days().take_while(|d| *d <= end) {
        let status = if day < today {
            DayStatus::UnexcusedAbsence
        } else {
            DayStatus::Upcoming
        };
        days.insert(day, DayEntry::bare(status));
    }

    for leave in leaves {
        if let Some(entry) = days.get_mut(&leave.leave_date) {
            entry.status = DayStatus::ExcusedAbsence;
            entry.leave = Some(leave.clone());
        }
    }

    for shift in shifts {
        let day = shift.start_time.date();
        if let Some(entry) = days.get_mut(&day) {
            // First shift establishes presence; later ones only append.
            entry.status = DayStatus::Present;
            entry.shifts.push(ShiftResponse::build(shift, false, now));
        }
    }

    days
}

/// `(working days - approved leave days on working days) * default shift
/// hours`, floored at zero. Duplicate leave dates count once.
pub fn required_hours(
    start: NaiveDate,
    end: NaiveDate,
    leaves: &[LeaveRequest],
    default_shift_hours: f64,
) -> f64 {
    let working = working_days_in(start, end);
    let leave_days = leaves
        .iter()
        .filter(|l| l.leave_date >= start && l.leave_date <= end && is_working_day(l.leave_date))
        .map(|l| l.leave_date)
        .collect::<BTreeSet<_>>()
        .len() as i64;
    (((working - leave_days) as f64) * default_shift_hours).max(0.0)
}

/// Sum of net work time across the period, in hours to one decimal.
pub fn actual_hours(shifts: &[Shift], now: NaiveDateTime) -> f64 {
    let seconds: i64 = shifts.iter().map(|s| s.net_work_seconds(now)).sum();
    (seconds as f64 / 3600.0 * 10.0).round() / 10.0
}

/* =========================
Calendar endpoint
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Per-day attendance statuses plus period metrics", body = Object, example = json!({
            "success": true,
            "data": {
                "days": {
                    "2026-03-09": { "status": "present", "shifts": [] },
                    "2026-03-10": { "status": "excused_absence", "leave": {} },
                    "2026-03-11": { "status": "unexcused_absence" }
                },
                "metrics": { "required_hours": 168.0, "actual_hours": 151.5 }
            }
        })),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn calendar(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<impl Responder> {
    if query.end_date < query.start_date {
        return Err(field_error("end_date", "must not be before start_date").into());
    }

    let (shifts, leaves) = futures::try_join!(
        fetch_shifts_in_range(
            pool.get_ref(),
            query.user_id,
            Some(query.start_date),
            Some(query.end_date),
        ),
        fetch_approved_in_range(
            pool.get_ref(),
            query.user_id,
            query.start_date,
            query.end_date,
        ),
    )?;

    let now = Local::now().naive_local();
    let today = now.date();

    let required = required_hours(
        query.start_date,
        query.end_date,
        &leaves,
        config.default_shift_hours,
    );
    let actual = actual_hours(&shifts, now);
    let days = build_calendar(
        query.start_date,
        query.end_date,
        today,
        now,
        &leaves,
        shifts,
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "days": days,
            "metrics": {
                "required_hours": required,
                "actual_hours": actual,
            },
        },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveStatus;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn t(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn shift_on(id: u64, start: &str, end: &str, break_seconds: i64) -> Shift {
        Shift {
            id,
            user_id: 42,
            start_time: t(start),
            end_time: Some(t(end)),
            break_seconds,
            notes: None,
        }
    }

    fn approved_leave(date: &str) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            user_id: 42,
            leave_type: "sick".into(),
            leave_date: d(date),
            notes: None,
            status: LeaveStatus::Approved.to_string(),
            reviewed_by: Some(7),
        }
    }

    // 2026-03-09 is a Monday; "today" is Friday the 13th in these tests.
    const TODAY: &str = "2026-03-13";

    fn build(
        leaves: &[LeaveRequest],
        shifts: Vec<Shift>,
    ) -> BTreeMap<NaiveDate, DayEntry> {
        build_calendar(
            d("2026-03-09"),
            d("2026-03-15"),
            d(TODAY),
            t("2026-03-13 12:00:00"),
            leaves,
            shifts,
        )
    }

    #[test]
    fn past_day_without_records_is_unexcused() {
        let days = build(&[], vec![]);
        assert_eq!(days[&d("2026-03-10")].status, DayStatus::UnexcusedAbsence);
    }

    #[test]
    fn approved_leave_marks_excused_absence() {
        let days = build(&[approved_leave("2026-03-10")], vec![]);
        let entry = &days[&d("2026-03-10")];
        assert_eq!(entry.status, DayStatus::ExcusedAbsence);
        assert!(entry.leave.is_some());
    }

    #[test]
    fn presence_wins_over_leave_on_the_same_day() {
        let days = build(
            &[approved_leave("2026-03-10")],
            vec![shift_on(1, "2026-03-10 09:00:00", "2026-03-10 17:00:00", 0)],
        );
        let entry = &days[&d("2026-03-10")];
        assert_eq!(entry.status, DayStatus::Present);
        assert_eq!(entry.shifts.len(), 1);
    }

    #[test]
    fn later_shifts_append_without_downgrading() {
        let days = build(
            &[],
            vec![
                shift_on(1, "2026-03-10 09:00:00", "2026-03-10 12:00:00", 0),
                shift_on(2, "2026-03-10 14:00:00", "2026-03-10 18:00:00", 0),
            ],
        );
        let entry = &days[&d("2026-03-10")];
        assert_eq!(entry.status, DayStatus::Present);
        assert_eq!(entry.shifts.len(), 2);
    }

    #[test]
    fn days_from_today_on_stay_upcoming() {
        let days = build(&[], vec![]);
        assert_eq!(days[&d(TODAY)].status, DayStatus::Upcoming);
        assert_eq!(days[&d("2026-03-14")].status, DayStatus::Upcoming);
    }

    #[test]
    fn a_shift_today_still_marks_present() {
        let days = build(
            &[],
            vec![shift_on(1, "2026-03-13 09:00:00", "2026-03-13 11:00:00", 0)],
        );
        assert_eq!(days[&d(TODAY)].status, DayStatus::Present);
    }

    #[test]
    fn required_hours_discount_approved_working_day_leaves() {
        // Mon-Fri week: 5 working days, one approved leave on Tuesday.
        let hours = required_hours(
            d("2026-03-09"),
            d("2026-03-15"),
            &[approved_leave("2026-03-10")],
            8.0,
        );
        assert_eq!(hours, 32.0);

        // Weekend leave does not discount anything.
        let hours = required_hours(
            d("2026-03-09"),
            d("2026-03-15"),
            &[approved_leave("2026-03-14")],
            8.0,
        );
        assert_eq!(hours, 40.0);
    }

    #[test]
    fn actual_hours_round_to_one_decimal() {
        let shifts = vec![shift_on(1, "2026-03-10 09:00:00", "2026-03-10 17:00:00", 1800)];
        assert_eq!(actual_hours(&shifts, t("2026-03-13 12:00:00")), 7.5);
    }
}
