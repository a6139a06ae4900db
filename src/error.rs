use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::classifier::ClassificationError;
use crate::views;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User already exists. Try logging in.")]
    DuplicateUser,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Error during emotion detection: {source}")]
    Classification {
        #[source]
        source: ClassificationError,
        expose: bool,
    },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("The saved {platform} link for {emotion} cannot be opened. Replace it in the Dashboard.")]
    UnusableLink { emotion: String, platform: String },

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Internal error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Classification { .. } => StatusCode::BAD_GATEWAY,
            AppError::UnsupportedPlatform(_) => StatusCode::BAD_REQUEST,
            AppError::UnusableLink { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user. Internal failures get a generic line; the full
    /// error only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Classification { expose: false, .. } => {
                "Error during emotion detection. Please try another photo.".to_string()
            }
            AppError::Storage(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, Html(views::message_page(&self.user_message()))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(AppError::InvalidCredentials.user_message(), "Invalid credentials.");
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn classification_detail_is_hidden_unless_exposed() {
        let hidden = AppError::Classification {
            source: ClassificationError::NoResult,
            expose: false,
        };
        assert!(!hidden.user_message().contains("no face"));

        let shown = AppError::Classification {
            source: ClassificationError::NoResult,
            expose: true,
        };
        assert!(shown.user_message().contains("no face"));
    }

    #[test]
    fn storage_detail_is_never_shown() {
        let err = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("disk on fire"));
    }
}
