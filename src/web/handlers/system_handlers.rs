// src/web/handlers/system_handlers.rs
use crate::batch::BatchStore;
use crate::dispatch::Dispatcher;
use crate::web::types::{HealthResponse, StatusResponse};

use rocket::serde::json::Json;
use rocket::State;
use tracing::debug;

pub async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "Email Trigger Backend is running",
    })
}

pub async fn health_handler(
    batches: &State<BatchStore>,
    dispatcher: &State<Dispatcher>,
) -> Json<HealthResponse> {
    let batch = batches.snapshot().await;
    let candidates_loaded = batch.as_ref().map(|b| b.len()).unwrap_or(0);
    debug!("Health check with {} candidate(s) loaded", candidates_loaded);

    Json(HealthResponse {
        status: "ok",
        candidates_loaded,
        loaded_at: batch.map(|b| b.loaded_at),
        mail_backend: dispatcher.backend_name(),
    })
}
