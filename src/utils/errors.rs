use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application error carrying an HTTP status and the underlying cause.
///
/// Handlers never format failures themselves; everything funnels
/// through [`IntoResponse`], which produces the uniform
/// `{"success": false, "error": "..."}` envelope.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// Maps persistence failures onto the public taxonomy: missing row
    /// to 404, unique violation to 400, anything else to 500.
    pub fn database(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::not_found(anyhow::anyhow!("Resource not found")),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::bad_request(anyhow::anyhow!("Duplicate field value entered"))
            }
            _ => Self::internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The raw cause is logged here; clients only see the message.
        tracing::error!(status = %self.status, error = ?self.error, "request failed");

        let message = if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            "Server Error".to_string()
        } else {
            self.error.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

/// Parses a path id, mapping malformed input to the same 404 shape a
/// missing record produces (`"<Resource> not found with id of <id>"`).
pub fn parse_id(resource: &str, raw: &str) -> Result<uuid::Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found(anyhow::anyhow!("{resource} not found with id of {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_valid_uuid() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_id("Bootcamp", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_id_maps_malformed_input_to_not_found() {
        let err = parse_id("Bootcamp", "abc123").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error.to_string(), "Bootcamp not found with id of abc123");
    }

    #[test]
    fn database_maps_row_not_found() {
        let err = AppError::database(sqlx::Error::RowNotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_hide_details() {
        use axum::response::IntoResponse;
        let response = AppError::internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
