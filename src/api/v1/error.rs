use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(error) = err.find::<ApiError>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::from(ApiErrorCode::NotFound)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::with_message(ApiErrorCode::ValidationError, e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidQuery>() {
        ApiError::with_message(ApiErrorCode::ValidationError, e.to_string())
    } else if err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
    {
        ApiError::from(ApiErrorCode::ValidationError)
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::from(ApiErrorCode::MethodNotAllowed)
    } else {
        ApiError::from(ApiErrorCode::internal(format!("unhandled rejection: {:?}", err)))
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub status_code: u16,
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn with_message(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status_code: code.status().as_u16(),
            code,
            message: message.into(),
        }
    }
}

impl reject::Reject for ApiError {}

impl From<ApiErrorCode> for ApiError {
    fn from(code: ApiErrorCode) -> Self {
        ApiError::with_message(code, code.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid request")]
    ValidationError,
    #[error("Access token is not valid")]
    InvalidCredential,
    #[error("Access token has not expired yet")]
    NotYetEligibleForRefresh,
    #[error("Refresh token is not valid")]
    InvalidRefreshToken,
    #[error("Refresh token has expired, authenticate again")]
    RefreshExpired,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotYetEligibleForRefresh => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::RefreshExpired => StatusCode::UNAUTHORIZED,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(message) => {
                ApiError::with_message(ApiErrorCode::ValidationError, message)
            }
            AuthError::InvalidCredential => ApiErrorCode::InvalidCredential.into(),
            AuthError::NotYetEligibleForRefresh => ApiErrorCode::NotYetEligibleForRefresh.into(),
            // Same answer for both so callers cannot probe which guids have sessions.
            AuthError::UnknownSession | AuthError::RefreshMismatch => {
                ApiErrorCode::InvalidRefreshToken.into()
            }
            AuthError::RefreshExpired => ApiErrorCode::RefreshExpired.into(),
            AuthError::Hashing(e) | AuthError::Store(e) | AuthError::InternalError(e) => {
                ApiErrorCode::internal(e).into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_probing_errors_look_the_same() {
        let unknown = ApiError::from(AuthError::UnknownSession);
        let mismatch = ApiError::from(AuthError::RefreshMismatch);

        assert_eq!(unknown.code, mismatch.code);
        assert_eq!(unknown.message, mismatch.message);
        assert_eq!(unknown.status_code, 401);
    }

    #[test]
    fn backend_failures_hide_details() {
        let error = ApiError::from(AuthError::Store("connection refused to 10.0.0.7".into()));

        assert_eq!(error.code, ApiErrorCode::InternalError);
        assert_eq!(error.status_code, 500);
        assert!(!error.message.contains("10.0.0.7"));
    }

    #[test]
    fn validation_keeps_its_message() {
        let error = ApiError::from(AuthError::Validation("guid must not be empty".into()));

        assert_eq!(error.status_code, 400);
        assert_eq!(error.message, "guid must not be empty");
    }
}
