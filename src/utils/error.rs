use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;
use thiserror::Error;

use crate::utils::helpers::service_name;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("Unauthorized: {0}")]
    UnauthorizedError(String),

    #[error("Bad Request: {0}")]
    BadRequestError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Unauthenticated: {0}")]
    UnauthenticatedError(String),

    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    #[error("Not Found: {0}")]
    NotFoundError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl CustomError {
    pub fn error_code(&self) -> &'static str {
        match *self {
            CustomError::UnauthorizedError(..) => "UNAUTHORIZED_ERROR",
            CustomError::BadRequestError(..) => "BAD_REQUEST_ERROR",
            CustomError::ConflictError(..) => "CONFLICT_ERROR",
            CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
            CustomError::UnauthenticatedError(..) => "UNAUTHENTICATED_ERROR",
            CustomError::ForbiddenError(..) => "FORBIDDEN_ERROR",
            CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
            CustomError::ValidationError(..) => "VALIDATION_ERROR",
        }
    }

    /// Log a storage failure and hide its details from the client.
    pub fn storage(context: &str, err: mongodb::error::Error) -> Self {
        error!("{}: {}", context, err);
        CustomError::InternalServerError(context.to_string())
    }

    /// Like [`CustomError::storage`], but a unique index violation becomes a
    /// conflict carrying `conflict`.
    pub fn write(context: &str, conflict: &str, err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return CustomError::ConflictError(conflict.to_string());
        }
        Self::storage(context, err)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::UnauthorizedError(..) => StatusCode::UNAUTHORIZED,
            CustomError::BadRequestError(..) => StatusCode::BAD_REQUEST,
            CustomError::ConflictError(..) => StatusCode::CONFLICT,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::UnauthenticatedError(..) => StatusCode::UNAUTHORIZED,
            CustomError::ForbiddenError(..) => StatusCode::FORBIDDEN,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::ValidationError(..) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = json!({
            "success": false,
            "message": self.to_string(),
            "httpStatusCode": self.status_code().as_u16(),
            "error": self.error_code(),
            "service": service_name(),
        });

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(CustomError::NotFoundError("Post not found".into()), StatusCode::NOT_FOUND)]
    #[case(CustomError::ConflictError("Username already exists".into()), StatusCode::CONFLICT)]
    #[case(CustomError::ValidationError("Title is required".into()), StatusCode::BAD_REQUEST)]
    #[case(CustomError::UnauthenticatedError("Login required".into()), StatusCode::UNAUTHORIZED)]
    #[case(CustomError::ForbiddenError("Staff privileges required".into()), StatusCode::FORBIDDEN)]
    fn maps_variants_to_status(#[case] err: CustomError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[actix_web::test]
    async fn renders_json_envelope() {
        let err = CustomError::NotFoundError("Post not found".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["httpStatusCode"], 404);
        assert_eq!(value["error"], "NOT_FOUND_ERROR");
        assert_eq!(value["message"], "Not Found: Post not found");
    }
}
