//! # ApiError
//!
//! Maps domain and infrastructure failures onto HTTP responses.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use igx_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid session; pages redirect to the sign-in form.
    #[error("sign in required")]
    SignInRequired,

    /// Signed in but no handle chosen yet.
    #[error("a handle is required")]
    HandleRequired,

    #[error(transparent)]
    App(#[from] AppError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Internal(anyhow::Error),
}

/// Recovers an `AppError` carried inside an `anyhow::Error` from a port.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => ApiError::App(app),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl ApiError {
    /// JSON endpoints answer 401 instead of redirecting.
    pub fn for_api(self) -> Self {
        match self {
            ApiError::SignInRequired => {
                ApiError::App(AppError::Unauthorized("sign in required".to_string()))
            }
            ApiError::HandleRequired => {
                ApiError::App(AppError::Unauthorized("a handle is required".to_string()))
            }
            other => other,
        }
    }

    fn redirect_target(&self) -> Option<&'static str> {
        match self {
            ApiError::SignInRequired => Some("/auth"),
            ApiError::HandleRequired => Some("/username"),
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SignInRequired | ApiError::HandleRequired => StatusCode::SEE_OTHER,
            ApiError::App(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::App(AppError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            ApiError::App(AppError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::App(AppError::Internal(_)) | ApiError::Template(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Some(location) = self.redirect_target() {
            return HttpResponse::SeeOther()
                .insert_header((header::LOCATION, location))
                .finish();
        }

        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("request failed: {self:#}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(serde_json::json!({ "error": message }))
    }
}
