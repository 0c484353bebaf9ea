use crate::api::shift::{fetch_open_break, fetch_open_shift};
use crate::error::{ApiError, is_duplicate_key};
use crate::model::shift::ShiftBreak;
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct StartBreak {
    #[schema(example = 42)]
    pub user_id: u64,
}

/* =========================
Start break
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/breaks/start",
    request_body = StartBreak,
    responses(
        (status = 200, description = "Break started", body = ShiftBreak),
        (status = 400, description = "No shift in progress, or break already in progress", body = Object, example = json!({
            "success": false,
            "message": "Break already in progress"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Breaks"
)]
pub async fn start_break(
    pool: web::Data<MySqlPool>,
    payload: web::Json<StartBreak>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();

    let shift = fetch_open_shift(pool.get_ref(), payload.user_id)
        .await?
        .ok_or_else(|| ApiError::InvalidTransition("No shift in progress".into()))?;

    if fetch_open_break(pool.get_ref(), shift.id).await?.is_some() {
        return Err(ApiError::InvalidTransition("Break already in progress".into()).into());
    }

    let result = sqlx::query("INSERT INTO shift_breaks (shift_id, start_time) VALUES (?, ?)")
        .bind(shift.id)
        .bind(now)
        .execute(pool.get_ref())
        .await;

    let result = match result {
        Ok(r) => r,
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::InvalidTransition("Break already in progress".into()).into());
        }
        Err(e) => return Err(ApiError::Database(e).into()),
    };

    info!(shift_id = shift.id, "break started");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": ShiftBreak {
            id: result.last_insert_id(),
            shift_id: shift.id,
            start_time: now,
            end_time: None,
        },
    })))
}

/* =========================
End break
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/breaks/{break_id}/end",
    params(("break_id" = u64, Path, description = "Break ID")),
    responses(
        (status = 200, description = "Break ended, seconds accumulated onto the shift", body = Object, example = json!({
            "success": true,
            "data": { "break_seconds_added": 1800 }
        })),
        (status = 400, description = "Break already ended"),
        (status = 404, description = "Break not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Breaks"
)]
pub async fn end_break(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let break_id = path.into_inner();
    let now = Local::now().naive_local();

    let brk = sqlx::query_as::<_, ShiftBreak>(
        r#"
        SELECT id, shift_id, start_time, end_time
        FROM shift_breaks
        WHERE id = ?
        "#,
    )
    .bind(break_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::Database)?
    .ok_or(ApiError::NotFound("Break"))?;

    if brk.end_time.is_some() {
        return Err(ApiError::InvalidTransition("Break already ended".into()).into());
    }

    let added = brk.seconds_until(now);

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;

    // Guard on end_time IS NULL so a racing close cannot double-count.
    let closed = sqlx::query("UPDATE shift_breaks SET end_time = ? WHERE id = ? AND end_time IS NULL")
        .bind(now)
        .bind(brk.id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

    if closed.rows_affected() == 0 {
        return Err(ApiError::InvalidTransition("Break already ended".into()).into());
    }

    sqlx::query("UPDATE shifts SET break_seconds = break_seconds + ? WHERE id = ?")
        .bind(added)
        .bind(brk.shift_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

    tx.commit().await.map_err(ApiError::Database)?;

    info!(break_id, shift_id = brk.shift_id, added, "break ended");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "break": ShiftBreak { end_time: Some(now), ..brk },
            "break_seconds_added": added,
        },
    })))
}
