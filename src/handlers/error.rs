// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    Validation,
    External,
    Database,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn external_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ErrorKind::External,
            message: message.into(),
        }
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ErrorKind::Database,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::External | ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
