use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::{Value, json};
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Response envelope: `{"success": false, "message": ..}` plus a
/// field-keyed `errors` map for validation failures.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "validation failed")]
    Validation(ValidationErrors),

    /// A lifecycle action attempted from a state that does not permit it.
    #[display(fmt = "{}", _0)]
    InvalidTransition(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "internal server error")]
    Database(sqlx::Error),

    /// Invariant breakage that is the server's fault, not the caller's
    /// (e.g. a stored booking tag no longer parsing).
    #[display(fmt = "internal server error")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(errs) => HttpResponse::UnprocessableEntity().json(json!({
                "success": false,
                "message": "validation failed",
                "errors": field_error_map(errs),
            })),
            ApiError::InvalidTransition(msg) => HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": msg,
            })),
            ApiError::NotFound(what) => HttpResponse::NotFound().json(json!({
                "success": false,
                "message": format!("{} not found", what),
            })),
            ApiError::Database(e) => {
                tracing::error!(error = %e, "request failed on database error");
                HttpResponse::InternalServerError().json(json!({
                    "success": false,
                    "message": "Internal Server Error",
                }))
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "request failed on internal invariant");
                HttpResponse::InternalServerError().json(json!({
                    "success": false,
                    "message": "Internal Server Error",
                }))
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(e)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        ApiError::Validation(e)
    }
}

/// Single-field validation failure outside of derive-driven checks
/// (cross-field rules like "end must be after start").
pub fn field_error(field: &'static str, message: impl Into<Cow<'static, str>>) -> ApiError {
    ApiError::Validation(validation_error(field, message))
}

/// Raw single-field `ValidationErrors`, for callers that merge or return
/// `ValidationErrors` themselves.
pub fn validation_error(
    field: &'static str,
    message: impl Into<Cow<'static, str>>,
) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    let mut err = ValidationError::new("invalid");
    err.message = Some(message.into());
    errs.add(field, err);
    errs
}

/// MySQL reports unique-index violations as SQLSTATE 23000.
pub fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23000"))
}

/// Flattens nested `ValidationErrors` into `{"field": ["msg", ..]}`,
/// dotting nested struct paths (`details.sell_price`).
fn field_error_map(errs: &ValidationErrors) -> Value {
    let mut out = serde_json::Map::new();
    collect_errors(errs, "", &mut out);
    Value::Object(out)
}

fn collect_errors(errs: &ValidationErrors, prefix: &str, out: &mut serde_json::Map<String, Value>) {
    for (field, kind) in errs.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let msgs: Vec<String> = list
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(key, json!(msgs));
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(inner, &key, out),
            ValidationErrorsKind::List(map) => {
                for (idx, inner) in map {
                    collect_errors(inner, &format!("{}[{}]", key, idx), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_produces_named_entry() {
        let err = field_error("end_time", "must be after start_time");
        match err {
            ApiError::Validation(errs) => {
                let map = field_error_map(&errs);
                assert_eq!(map["end_time"][0], "must be after start_time");
            }
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn nested_errors_are_dotted() {
        let mut inner = ValidationErrors::new();
        inner.add("sell_price", ValidationError::new("required"));
        let outer = ValidationErrors::merge(Ok(()), "details", Err(inner)).unwrap_err();

        let map = field_error_map(&outer);
        assert_eq!(map["details.sell_price"][0], "required");
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            field_error("x", "y").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidTransition("busy".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Shift").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
