use crate::config::Config;
use crate::error::{ApiError, field_error, is_duplicate_key};
use crate::model::shift::{Shift, ShiftBreak, ShiftState};
use crate::utils::time::{day_bounds, end_of_day};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, ToSchema)]
pub struct StartShift {
    #[schema(example = 42)]
    pub user_id: u64,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EndShift {
    #[schema(example = 42)]
    pub user_id: u64,
}

/// Raw record creation, used when importing or backfilling shifts.
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateShift {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-03-10T09:00:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(example = "2026-03-10T17:00:00", value_type = String, format = "date-time", nullable = true)]
    pub end_time: Option<NaiveDateTime>,
    #[validate(range(min = 0))]
    #[schema(example = 1800)]
    pub total_break_seconds: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct UpdateShift {
    #[schema(value_type = Option<String>, format = "date-time")]
    pub start_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub end_time: Option<NaiveDateTime>,
    #[validate(range(min = 0))]
    pub break_seconds: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ShiftQuery {
    #[schema(example = 42)]
    pub user_id: u64,
    /// First calendar day of shift start times to include
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Last calendar day (inclusive)
    #[schema(example = "2026-03-31", value_type = String, format = "date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShiftResponse {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub end_time: Option<NaiveDateTime>,
    pub break_seconds: i64,
    pub notes: Option<String>,
    #[schema(example = "active")]
    pub state: ShiftState,
    #[schema(example = 27000)]
    pub net_work_seconds: i64,
}

impl ShiftResponse {
    pub fn build(shift: Shift, has_open_break: bool, now: NaiveDateTime) -> Self {
        let state = shift.state(has_open_break);
        let net_work_seconds = shift.net_work_seconds(now);
        Self {
            id: shift.id,
            user_id: shift.user_id,
            start_time: shift.start_time,
            end_time: shift.end_time,
            break_seconds: shift.break_seconds,
            notes: shift.notes,
            state,
            net_work_seconds,
        }
    }
}

/* =========================
Shared row access
========================= */

pub(crate) async fn fetch_shift(pool: &MySqlPool, id: u64) -> Result<Option<Shift>, ApiError> {
    let shift = sqlx::query_as::<_, Shift>(
        r#"
        SELECT id, user_id, start_time, end_time, break_seconds, notes
        FROM shifts
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(shift)
}

pub(crate) async fn fetch_open_shift(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Option<Shift>, ApiError> {
    let shift = sqlx::query_as::<_, Shift>(
        r#"
        SELECT id, user_id, start_time, end_time, break_seconds, notes
        FROM shifts
        WHERE user_id = ? AND end_time IS NULL AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(shift)
}

pub(crate) async fn fetch_open_break(
    pool: &MySqlPool,
    shift_id: u64,
) -> Result<Option<ShiftBreak>, ApiError> {
    let brk = sqlx::query_as::<_, ShiftBreak>(
        r#"
        SELECT id, shift_id, start_time, end_time
        FROM shift_breaks
        WHERE shift_id = ? AND end_time IS NULL
        "#,
    )
    .bind(shift_id)
    .fetch_optional(pool)
    .await?;
    Ok(brk)
}

async fn count_shifts_on(pool: &MySqlPool, user_id: u64, day: NaiveDate) -> Result<i64, ApiError> {
    let (from, to) = day_bounds(day);
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM shifts
        WHERE user_id = ? AND start_time >= ? AND start_time < ? AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/* =========================
Start shift
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/shifts/start",
    request_body = StartShift,
    responses(
        (status = 200, description = "Shift started", body = ShiftResponse),
        (status = 400, description = "Already in progress or daily limit reached", body = Object, example = json!({
            "success": false,
            "message": "Daily shift limit reached"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn start_shift(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<StartShift>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();

    let started_today = count_shifts_on(pool.get_ref(), payload.user_id, now.date()).await?;
    if started_today >= config.daily_shift_limit {
        return Err(ApiError::InvalidTransition("Daily shift limit reached".into()).into());
    }

    if fetch_open_shift(pool.get_ref(), payload.user_id).await?.is_some() {
        return Err(ApiError::InvalidTransition("Shift already in progress".into()).into());
    }

    // The unique open-shift index closes the race two concurrent starts
    // would otherwise win together.
    let result = sqlx::query(
        r#"
        INSERT INTO shifts (user_id, start_time, notes)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(payload.user_id)
    .bind(now)
    .bind(payload.notes.as_deref())
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::InvalidTransition("Shift already in progress".into()).into());
        }
        Err(e) => return Err(ApiError::Database(e).into()),
    };

    let shift = fetch_shift(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("Shift"))?;

    info!(user_id = payload.user_id, shift_id = shift.id, "shift started");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": ShiftResponse::build(shift, false, now),
    })))
}

/* =========================
End shift
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/shifts/end",
    request_body = EndShift,
    responses(
        (status = 200, description = "Shift ended", body = ShiftResponse),
        (status = 400, description = "No shift in progress", body = Object, example = json!({
            "success": false,
            "message": "No shift in progress"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn end_shift(
    pool: web::Data<MySqlPool>,
    payload: web::Json<EndShift>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();

    let shift = fetch_open_shift(pool.get_ref(), payload.user_id)
        .await?
        .ok_or_else(|| ApiError::InvalidTransition("No shift in progress".into()))?;

    // Ending from on_break closes the open break first.
    let open_break = fetch_open_break(pool.get_ref(), shift.id).await?;
    let break_seconds = shift.break_seconds
        + open_break.as_ref().map_or(0, |b| b.seconds_until(now));

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;

    if let Some(b) = &open_break {
        sqlx::query("UPDATE shift_breaks SET end_time = ? WHERE id = ?")
            .bind(now)
            .bind(b.id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::Database)?;
    }

    sqlx::query("UPDATE shifts SET end_time = ?, break_seconds = ? WHERE id = ?")
        .bind(now)
        .bind(break_seconds)
        .bind(shift.id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

    tx.commit().await.map_err(ApiError::Database)?;

    let shift = fetch_shift(pool.get_ref(), shift.id)
        .await?
        .ok_or(ApiError::NotFound("Shift"))?;

    info!(user_id = payload.user_id, shift_id = shift.id, "shift ended");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": ShiftResponse::build(shift, false, now),
    })))
}

/* =========================
Raw create
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/shifts",
    request_body = CreateShift,
    responses(
        (status = 201, description = "Shift recorded", body = ShiftResponse),
        (status = 400, description = "Another shift is already in progress"),
        (status = 422, description = "Validation failed", body = Object, example = json!({
            "success": false,
            "message": "validation failed",
            "errors": { "end_time": ["must be after start_time"] }
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn create_shift(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateShift>,
) -> actix_web::Result<impl Responder> {
    payload.validate().map_err(ApiError::Validation)?;

    if let Some(end) = payload.end_time {
        if end <= payload.start_time {
            return Err(field_error("end_time", "must be after start_time").into());
        }
    } else if fetch_open_shift(pool.get_ref(), payload.user_id).await?.is_some() {
        return Err(ApiError::InvalidTransition("Shift already in progress".into()).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO shifts (user_id, start_time, end_time, break_seconds, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.total_break_seconds.unwrap_or(0))
    .bind(payload.notes.as_deref())
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::InvalidTransition("Shift already in progress".into()).into());
        }
        Err(e) => return Err(ApiError::Database(e).into()),
    };

    let now = Local::now().naive_local();
    let shift = fetch_shift(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("Shift"))?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": ShiftResponse::build(shift, false, now),
    })))
}

/* =========================
List / detail
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/shifts",
    params(ShiftQuery),
    responses(
        (status = 200, description = "Shifts for the user, oldest first", body = [ShiftResponse]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn list_shifts(
    pool: web::Data<MySqlPool>,
    query: web::Query<ShiftQuery>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();
    let shifts = fetch_shifts_in_range(
        pool.get_ref(),
        query.user_id,
        query.start_date,
        query.end_date,
    )
    .await?;

    let mut data = Vec::with_capacity(shifts.len());
    for shift in shifts {
        let has_open_break = if shift.end_time.is_none() {
            fetch_open_break(pool.get_ref(), shift.id).await?.is_some()
        } else {
            false
        };
        data.push(ShiftResponse::build(shift, has_open_break, now));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}

pub(crate) async fn fetch_shifts_in_range(
    pool: &MySqlPool,
    user_id: u64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<Shift>, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT id, user_id, start_time, end_time, break_seconds, notes
        FROM shifts
        WHERE user_id = ? AND deleted_at IS NULL
        "#,
    );
    let mut bounds: Vec<NaiveDateTime> = Vec::new();

    if let Some(from) = start_date {
        sql.push_str(" AND start_time >= ?");
        bounds.push(day_bounds(from).0);
    }
    if let Some(to) = end_date {
        sql.push_str(" AND start_time < ?");
        bounds.push(day_bounds(to).1);
    }
    sql.push_str(" ORDER BY start_time ASC");

    let mut q = sqlx::query_as::<_, Shift>(&sql).bind(user_id);
    for b in bounds {
        q = q.bind(b);
    }
    Ok(q.fetch_all(pool).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/shifts/{shift_id}",
    params(("shift_id" = u64, Path, description = "Shift ID")),
    responses(
        (status = 200, description = "Shift with its breaks", body = Object),
        (status = 404, description = "Shift not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn get_shift(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let shift_id = path.into_inner();
    let now = Local::now().naive_local();

    let shift = fetch_shift(pool.get_ref(), shift_id)
        .await?
        .ok_or(ApiError::NotFound("Shift"))?;

    let breaks = sqlx::query_as::<_, ShiftBreak>(
        r#"
        SELECT id, shift_id, start_time, end_time
        FROM shift_breaks
        WHERE shift_id = ?
        ORDER BY start_time ASC
        "#,
    )
    .bind(shift_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Database)?;

    let has_open_break = breaks.iter().any(|b| b.end_time.is_none());

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "shift": ShiftResponse::build(shift, has_open_break, now),
            "breaks": breaks,
        },
    })))
}

/* =========================
Update / delete
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/shifts/{shift_id}",
    params(("shift_id" = u64, Path, description = "Shift ID")),
    request_body = UpdateShift,
    responses(
        (status = 200, description = "Shift updated", body = ShiftResponse),
        (status = 404, description = "Shift not found"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn update_shift(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateShift>,
) -> actix_web::Result<impl Responder> {
    body.validate().map_err(ApiError::Validation)?;

    let shift_id = path.into_inner();
    let current = fetch_shift(pool.get_ref(), shift_id)
        .await?
        .ok_or(ApiError::NotFound("Shift"))?;

    // Provided fields merge onto the stored record; absent ones stay.
    let start_time = body.start_time.unwrap_or(current.start_time);
    let end_time = body.end_time.or(current.end_time);
    let break_seconds = body.break_seconds.unwrap_or(current.break_seconds);
    let notes = body.notes.clone().or(current.notes);

    if let Some(end) = end_time {
        if end <= start_time {
            return Err(field_error("end_time", "must be after start_time").into());
        }
    }

    sqlx::query(
        r#"
        UPDATE shifts
        SET start_time = ?, end_time = ?, break_seconds = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(start_time)
    .bind(end_time)
    .bind(break_seconds)
    .bind(notes)
    .bind(shift_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::Database)?;

    let now = Local::now().naive_local();
    let shift = fetch_shift(pool.get_ref(), shift_id)
        .await?
        .ok_or(ApiError::NotFound("Shift"))?;
    let has_open_break = if shift.end_time.is_none() {
        fetch_open_break(pool.get_ref(), shift.id).await?.is_some()
    } else {
        false
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": ShiftResponse::build(shift, has_open_break, now),
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/shifts/{shift_id}",
    params(("shift_id" = u64, Path, description = "Shift ID")),
    responses(
        (status = 200, description = "Shift deleted", body = Object, example = json!({
            "success": true,
            "message": "Shift deleted"
        })),
        (status = 404, description = "Shift not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn delete_shift(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let shift_id = path.into_inner();

    // Soft delete keeps the row for audit; the generated open_flag column
    // also frees the one-open-shift slot for the user.
    let result = sqlx::query(
        "UPDATE shifts SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(shift_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::Database)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Shift").into());
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Shift deleted"
    })))
}

/* =========================
End-of-day force close
========================= */

/// Entry point for the external end-of-day scheduler.
#[utoipa::path(
    post,
    path = "/api/v1/shifts/auto-end",
    responses(
        (status = 200, description = "Open shifts from previous days force-ended", body = Object, example = json!({
            "success": true,
            "data": { "ended": 3 }
        })),
        (status = 400, description = "Auto end-of-day is disabled"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shifts"
)]
pub async fn auto_end(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    if !config.auto_end_enabled {
        return Err(ApiError::InvalidTransition("Auto end-of-day is disabled".into()).into());
    }

    let today = Local::now().date_naive();
    let ended = auto_end_open_shifts(pool.get_ref(), today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "auto end-of-day sweep failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "ended": ended },
    })))
}

/// Force-ends every shift still open from a day before `today`, closing
/// its open break at the day boundary of the shift's start date.
pub async fn auto_end_open_shifts(pool: &MySqlPool, today: NaiveDate) -> anyhow::Result<u64> {
    let cutoff = day_bounds(today).0;

    let stale = sqlx::query_as::<_, Shift>(
        r#"
        SELECT id, user_id, start_time, end_time, break_seconds, notes
        FROM shifts
        WHERE end_time IS NULL AND deleted_at IS NULL AND start_time < ?
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let mut ended = 0u64;
    for shift in stale {
        let boundary = end_of_day(shift.start_time.date());
        let mut tx = pool.begin().await?;

        let open_break = sqlx::query_as::<_, ShiftBreak>(
            r#"
            SELECT id, shift_id, start_time, end_time
            FROM shift_breaks
            WHERE shift_id = ? AND end_time IS NULL
            "#,
        )
        .bind(shift.id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut break_seconds = shift.break_seconds;
        if let Some(b) = open_break {
            break_seconds += b.seconds_until(boundary);
            sqlx::query("UPDATE shift_breaks SET end_time = ? WHERE id = ?")
                .bind(boundary)
                .bind(b.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE shifts SET end_time = ?, break_seconds = ? WHERE id = ?")
            .bind(boundary)
            .bind(break_seconds)
            .bind(shift.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        ended += 1;
    }

    if ended > 0 {
        info!(ended, "force-ended stale shifts at day boundary");
    }
    Ok(ended)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn response_reports_state_and_net_seconds() {
        let shift = Shift {
            id: 1,
            user_id: 42,
            start_time: t("2026-03-10 09:00:00"),
            end_time: Some(t("2026-03-10 17:00:00")),
            break_seconds: 1800,
            notes: None,
        };
        let resp = ShiftResponse::build(shift, false, t("2026-03-10 18:00:00"));
        assert_eq!(resp.state, ShiftState::Ended);
        assert_eq!(resp.net_work_seconds, 27_000);
    }

    #[test]
    fn response_marks_open_break() {
        let shift = Shift {
            id: 1,
            user_id: 42,
            start_time: t("2026-03-10 09:00:00"),
            end_time: None,
            break_seconds: 0,
            notes: None,
        };
        let resp = ShiftResponse::build(shift, true, t("2026-03-10 12:15:00"));
        assert_eq!(resp.state, ShiftState::OnBreak);
    }

    #[test]
    fn update_break_seconds_rejects_negative() {
        let patch = UpdateShift {
            start_time: None,
            end_time: None,
            break_seconds: Some(-5),
            notes: None,
        };
        assert!(patch.validate().is_err());
    }
}
