use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("Color with name \"{0}\" already exists")]
    NameConflict(String),
    #[error("Color with hex code \"{0}\" already exists")]
    HexConflict(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NameConflict(_) | AppError::HexConflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Field name to messages, e.g. `{"hex": ["Hex code must be in #RRGGBB format"]}`.
fn field_messages(errors: &ValidationErrors) -> Value {
    let mut fields = Map::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| match &e.message {
                Some(message) => Value::from(message.to_string()),
                None => Value::from(e.code.to_string()),
            })
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(fields)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::ValidationError(errors) => json!({
                "error": "Validation failed",
                "fields": field_messages(errors),
            }),
            AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::NameConflict(_) | AppError::HexConflict(_) => {
                tracing::warn!("{}", self);
                json!({ "error": self.to_string() })
            }
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                json!({ "error": "Database error occurred" })
            }
            AppError::MigrationError(err) => {
                tracing::error!("Migration error: {:?}", err);
                json!({ "error": "Database error occurred" })
            }
            AppError::ConfigError(err) => {
                tracing::error!("Config error: {:?}", err);
                json!({ "error": "Configuration error occurred" })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::NotFound("Color with id 1 not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::NameConflict("Red".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::HexConflict("#FF0000".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ValidationError(ValidationErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_body_names_the_field() {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("regex");
        error.message = Some("Hex code must be in #RRGGBB format".into());
        errors.add("hex", error);

        let fields = field_messages(&errors);
        assert_eq!(fields["hex"][0], "Hex code must be in #RRGGBB format");
    }

    #[test]
    fn conflict_message_carries_the_value() {
        let err = AppError::HexConflict("#FF0000".into());
        assert_eq!(err.to_string(), "Color with hex code \"#FF0000\" already exists");
    }
}
