// src/web/handlers/email_handlers.rs
//! Candidate upload and bulk send

use rocket::form::{Errors, Form};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, info_span, warn, Instrument};

use crate::batch::{Batch, BatchStore};
use crate::core::{FsOps, TempUpload};
use crate::dispatch::{DispatchMode, Dispatcher};
use crate::ingestion::ingest_file;
use crate::utils::validate_file_extension;
use crate::web::types::{
    exceeds_limit, ApiError, CsvUploadForm, SendResponse, UploadConfig, UploadResponse,
};

pub async fn upload_candidates_handler(
    upload: Result<Form<CsvUploadForm<'_>>, Errors<'_>>,
    config: &State<UploadConfig>,
    batches: &State<BatchStore>,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = match upload {
        Ok(form) => form.into_inner(),
        Err(errors) if exceeds_limit(&errors) => {
            warn!("Rejected oversized upload form: {}", errors);
            return Err(ApiError::upload_too_large(config.max_upload_mb).with_error(errors));
        }
        Err(errors) => {
            warn!("Rejected upload form: {}", errors);
            return Err(ApiError::new(
                Status::BadRequest,
                "Invalid upload",
                "INVALID_UPLOAD",
            )
            .with_error(errors));
        }
    };

    let file = match form.file {
        Ok(file) => file,
        Err(errors) if exceeds_limit(&errors) => {
            warn!("Rejected oversized CSV upload: {}", errors);
            return Err(ApiError::upload_too_large(config.max_upload_mb).with_error(errors));
        }
        Err(_) => return Err(ApiError::no_file()),
    };

    let original_name = file
        .raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .filter(|name| !name.trim().is_empty());

    let Some(original_name) = original_name else {
        return Err(ApiError::no_file());
    };

    let span = info_span!("csv_upload", file = %original_name, bytes = file.len());
    store_and_ingest(file, original_name, config, batches)
        .instrument(span)
        .await
}

async fn store_and_ingest(
    mut file: rocket::fs::TempFile<'_>,
    original_name: String,
    config: &UploadConfig,
    batches: &BatchStore,
) -> Result<Json<UploadResponse>, ApiError> {
    if let Err(e) = validate_file_extension(&original_name, &["csv"]) {
        warn!("Rejected non-CSV upload: {}", e);
        return Err(ApiError::new(
            Status::BadRequest,
            "Only CSV files are allowed",
            "INVALID_FORMAT",
        )
        .with_error(e));
    }

    if let Err(e) = FsOps::ensure_dir_exists(&config.uploads_dir).await {
        error!("Failed to prepare uploads directory: {:#}", e);
        return Err(ApiError::new(
            Status::InternalServerError,
            "Error reading CSV",
            "FILE_SAVE_ERROR",
        )
        .with_error(e));
    }

    // Removed on every return path below
    let stored = TempUpload::new(FsOps::upload_path(&config.uploads_dir, &original_name));

    if let Err(e) = file.persist_to(stored.path()).await {
        error!("Failed to save uploaded file: {}", e);
        return Err(ApiError::new(
            Status::InternalServerError,
            "Error reading CSV",
            "FILE_SAVE_ERROR",
        )
        .with_error(e));
    }

    let candidates = match ingest_file(stored.path()).await {
        Ok(candidates) => candidates,
        Err(e) => {
            error!("Failed to parse uploaded CSV: {}", e);
            return Err(ApiError::new(
                Status::InternalServerError,
                "Error reading CSV",
                "CSV_PARSE_ERROR",
            )
            .with_error(e));
        }
    };

    let batch = batches.replace(Batch::new(candidates, original_name)).await;
    info!("Upload accepted with {} candidate(s)", batch.len());

    Ok(Json(UploadResponse::new(batch.candidates.clone())))
}

pub async fn send_emails_handler(
    batches: &State<BatchStore>,
    dispatcher: &State<Dispatcher>,
) -> Result<Json<SendResponse>, ApiError> {
    if batches.len().await == 0 {
        return Err(ApiError::no_candidates());
    }

    let batch = match dispatcher.mode() {
        DispatchMode::Resend => batches.snapshot().await,
        // Nothing can be delivered without a sender, so the batch is kept
        DispatchMode::OneShot if dispatcher.sender_mailbox().is_err() => {
            warn!("Sender address unusable, keeping the one-shot batch loaded");
            batches.snapshot().await
        }
        DispatchMode::OneShot => batches.take().await,
    };

    let Some(batch) = batch.filter(|batch| !batch.is_empty()) else {
        return Err(ApiError::no_candidates());
    };

    let span = info_span!("bulk_dispatch", source = %batch.source, candidates = batch.len());
    let result = dispatcher
        .dispatch(&batch.candidates)
        .instrument(span)
        .await?;

    Ok(Json(SendResponse::from(result)))
}
