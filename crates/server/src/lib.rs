use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{router, run, run_with_listener, spawn_with_listener};

mod card_expenses;
mod cards;
mod categories;
mod dashboard;
mod recurring;
mod server;
mod transactions;
mod user;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

/// JSON error envelope: `{status, message, details}`.
///
/// `status` is `"fail"` for 4xx responses and `"error"` for 5xx.
#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    details: Vec<String>,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "Internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(message) => (StatusCode::BAD_REQUEST, message),
        };

        let body = ErrorBody {
            status: if status.is_server_error() {
                "error"
            } else {
                "fail"
            },
            message,
            details: Vec::new(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses a decimal amount string (≤ 2 fraction digits) into positive minor
/// units.
pub(crate) fn parse_amount(value: &str) -> Result<i64, ServerError> {
    let amount: engine::Money = value.parse()?;
    if !amount.is_positive() {
        return Err(ServerError::Engine(EngineError::Validation(
            "amount must be > 0".to_string(),
        )));
    }
    Ok(amount.minor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_400() {
        let res = ServerError::from(EngineError::Validation("bad".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::Conflict("closed".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_error_maps_to_500() {
        let res = ServerError::from(EngineError::Database(sea_orm::DbErr::Custom(
            "boom".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
