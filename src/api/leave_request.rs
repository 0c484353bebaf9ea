use crate::error::ApiError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-12", format = "date", value_type = String)]
    pub leave_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    /// User id of the reviewer recording the decision
    #[schema(example = 7)]
    pub reviewer_id: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 42)]
    /// Filter by owner
    pub user_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ApprovedLeaveQuery {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

const LEAVE_COLS: &str = "id, user_id, leave_type, leave_date, notes, status, reviewed_by";

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, leave_type, leave_date, notes, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.leave_type.to_string())
    .bind(payload.leave_date)
    .bind(payload.notes.as_deref())
    .bind(LeaveStatus::Pending.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::Database)?;

    let leave = fetch_leave(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("Leave request"))?;

    info!(user_id = payload.user_id, leave_id = leave.id, "leave request created");

    Ok(HttpResponse::Created().json(json!({ "success": true, "data": leave })))
}

async fn fetch_leave(pool: &MySqlPool, id: u64) -> Result<Option<LeaveRequest>, ApiError> {
    let sql = format!("SELECT {LEAVE_COLS} FROM leave_requests WHERE id = ? AND deleted_at IS NULL");
    let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(leave)
}

/* =========================
List (paginated)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = Object, example = json!({
            "success": true,
            "data": [],
            "page": 1,
            "per_page": 10,
            "total": 0
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE deleted_at IS NULL");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::Database)?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT {LEAVE_COLS}
        FROM leave_requests
        {}
        ORDER BY leave_date DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::Database)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": leaves,
        "page": page,
        "per_page": per_page,
        "total": total,
    })))
}

/* =========================
Detail / delete
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = fetch_leave(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Leave request"))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": leave })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request deleted"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE leave_requests SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::Database)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Leave request").into());
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave request deleted"
    })))
}

/* =========================
Approve / reject (reviewer)
========================= */

async fn review_leave(
    pool: &MySqlPool,
    leave_id: u64,
    reviewer_id: u64,
    decision: LeaveStatus,
) -> Result<(), ApiError> {
    let current = fetch_leave(pool, leave_id)
        .await?
        .ok_or(ApiError::NotFound("Leave request"))?;
    let current_status: LeaveStatus = current.status.parse().map_err(|_| {
        ApiError::Internal(format!(
            "leave request {} has unparseable status '{}'",
            leave_id, current.status
        ))
    })?;
    if !current_status.can_transition_to(decision) {
        return Err(ApiError::InvalidTransition(
            "Leave request already processed".into(),
        ));
    }

    // The pending-only WHERE backstops a racing reviewer; the loser's
    // update matches zero rows.
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, reviewed_by = ?
        WHERE id = ? AND status = ? AND deleted_at IS NULL
        "#,
    )
    .bind(decision.to_string())
    .bind(reviewer_id)
    .bind(leave_id)
    .bind(LeaveStatus::Pending.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::InvalidTransition(
            "Leave request already processed".into(),
        ));
    }

    info!(leave_id, reviewer_id, decision = %decision, "leave request reviewed");
    Ok(())
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "success": true,
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request already processed"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    review_leave(
        pool.get_ref(),
        path.into_inner(),
        payload.reviewer_id,
        LeaveStatus::Approved,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave approved"
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "success": true,
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request already processed"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    review_leave(
        pool.get_ref(),
        path.into_inner(),
        payload.reviewer_id,
        LeaveStatus::Rejected,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave rejected"
    })))
}

/* =========================
Approved leaves in range (calendar feed)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/approved",
    params(ApprovedLeaveQuery),
    responses(
        (status = 200, description = "Approved leaves in the date range", body = [LeaveRequest]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn approved_leaves(
    pool: web::Data<MySqlPool>,
    query: web::Query<ApprovedLeaveQuery>,
) -> actix_web::Result<impl Responder> {
    let leaves =
        fetch_approved_in_range(pool.get_ref(), query.user_id, query.start_date, query.end_date)
            .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": leaves })))
}

pub(crate) async fn fetch_approved_in_range(
    pool: &MySqlPool,
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<LeaveRequest>, ApiError> {
    let sql = format!(
        r#"
        SELECT {LEAVE_COLS}
        FROM leave_requests
        WHERE user_id = ? AND status = ? AND leave_date BETWEEN ? AND ?
              AND deleted_at IS NULL
        ORDER BY leave_date ASC
        "#
    );
    let leaves = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(user_id)
        .bind(LeaveStatus::Approved.to_string())
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await?;
    Ok(leaves)
}
