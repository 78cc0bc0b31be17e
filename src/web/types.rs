// src/web/types.rs

use rocket::form::{self, error::ErrorKind, Errors, FromForm};
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::Serialize;
use rocket::{Request, Response};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::dispatch::DispatchError;
use crate::types::{CandidateRecord, DispatchResult, FailedDelivery};

pub const NO_CANDIDATES_MESSAGE: &str = "No candidates loaded. Upload a CSV first.";

pub struct UploadConfig {
    pub uploads_dir: PathBuf,
    pub max_upload_mb: u64,
}

#[derive(FromForm)]
pub struct CsvUploadForm<'f> {
    /// Kept as a result so an oversized file is not mistaken for a missing one
    pub file: form::Result<'f, TempFile<'f>>,
}

/// True when Rocket rejected the upload for exceeding a size limit
pub fn exceeds_limit(errors: &Errors<'_>) -> bool {
    errors
        .iter()
        .any(|e| matches!(e.kind, ErrorKind::InvalidLength { .. }))
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UploadResponse {
    pub success: bool,
    pub count: usize,
    pub candidates: Vec<CandidateRecord>,
}

impl UploadResponse {
    pub fn new(candidates: Vec<CandidateRecord>) -> Self {
        Self {
            success: true,
            count: candidates.len(),
            candidates,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    pub sent: usize,
    pub failed: Vec<FailedDelivery>,
}

impl From<DispatchResult> for SendResponse {
    fn from(result: DispatchResult) -> Self {
        Self {
            success: true,
            message: format!("Emails sent to {} candidates", result.sent),
            sent: result.sent,
            failed: result.failed,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub status: &'static str,
    pub candidates_loaded: usize,
    pub loaded_at: Option<DateTime<Utc>>,
    pub mail_backend: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub error_code: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
            error_code: error_code.into(),
        }
    }
}

/// JSON error body sent with a non-200 status
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: Status, message: impl Into<String>, error_code: &str) -> Self {
        Self {
            status,
            body: ErrorResponse::new(message, error_code),
        }
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.body.error = Some(error.to_string());
        self
    }

    pub fn no_file() -> Self {
        Self::new(Status::BadRequest, "No file uploaded", "NO_FILE")
    }

    pub fn upload_too_large(max_upload_mb: u64) -> Self {
        Self::new(
            Status::PayloadTooLarge,
            format!("File exceeds the {max_upload_mb} MiB upload limit"),
            "UPLOAD_TOO_LARGE",
        )
    }

    pub fn no_candidates() -> Self {
        Self::new(Status::BadRequest, NO_CANDIDATES_MESSAGE, "NO_CANDIDATES")
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NoCandidates => Self::no_candidates(),
            DispatchError::Sender(_) => Self::new(
                Status::InternalServerError,
                "Failed to send some emails",
                "DISPATCH_ERROR",
            )
            .with_error(err),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(Json(self.body).respond_to(request)?)
            .status(self.status)
            .ok()
    }
}
