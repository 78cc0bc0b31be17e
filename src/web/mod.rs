// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::batch::BatchStore;
use crate::core::ConfigManager;
use crate::dispatch::Dispatcher;
use crate::mail::{build_sender, EmailSender};
use anyhow::{Context, Result};
use rocket::data::ToByteUnit;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::{Errors, Form};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[get("/")]
pub async fn root() -> Json<StatusResponse> {
    handlers::root_handler().await
}

#[get("/health")]
pub async fn health(
    batches: &State<BatchStore>,
    dispatcher: &State<Dispatcher>,
) -> Json<HealthResponse> {
    handlers::health_handler(batches, dispatcher).await
}

#[post("/upload", data = "<upload>")]
pub async fn upload_candidates(
    upload: Result<Form<CsvUploadForm<'_>>, Errors<'_>>,
    config: &State<UploadConfig>,
    batches: &State<BatchStore>,
) -> Result<Json<UploadResponse>, ApiError> {
    handlers::upload_candidates_handler(upload, config, batches).await
}

// Requests that are not forms at all fall through to here
#[post("/upload", rank = 2)]
pub async fn upload_without_form() -> ApiError {
    ApiError::no_file()
}

#[post("/send")]
pub async fn send_emails(
    batches: &State<BatchStore>,
    dispatcher: &State<Dispatcher>,
) -> Result<Json<SendResponse>, ApiError> {
    handlers::send_emails_handler(batches, dispatcher).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request format", "BAD_REQUEST"))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Resource not found", "NOT_FOUND"))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request format", "BAD_REQUEST"))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error", "INTERNAL_ERROR"))
}

/// Assemble the server around an already constructed mail sender
pub fn build_rocket(config: &ConfigManager, sender: Arc<dyn EmailSender>) -> Rocket<Build> {
    let upload_limit = config.server.max_upload_mb.mebibytes();
    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("limits.file", upload_limit.as_u64()))
        .merge(("limits.data-form", (upload_limit + 1.mebibytes()).as_u64()));

    rocket::custom(figment)
        .attach(Cors)
        .manage(UploadConfig {
            uploads_dir: config.server.uploads_dir.clone(),
            max_upload_mb: config.server.max_upload_mb,
        })
        .manage(BatchStore::new())
        .manage(Dispatcher::new(sender, config.dispatch.clone()))
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount("/", routes![root, options])
        .mount("/api", routes![health])
        .mount(
            "/api/email",
            routes![upload_candidates, upload_without_form, send_emails],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    config.warn_on_missing_credentials();
    config.ensure_directories().await?;

    let sender = build_sender(config.mail.backend, &config.mail.smtp)
        .context("Failed to initialize mail sender")?;

    info!("Starting candidate mailer API server");
    info!("Environment: {}", config.environment);
    info!(
        "Uploads: {} (limit {} MiB)",
        config.server.uploads_dir.display(),
        config.server.max_upload_mb
    );
    info!(
        "Mail backend: {} (dispatch mode {:?}, concurrency {})",
        sender.backend_name(),
        config.dispatch.mode,
        config.dispatch.concurrency
    );
    info!(
        "Server: http://{}:{}",
        config.server.address, config.server.port
    );

    if let Err(e) = build_rocket(&config, sender).launch().await {
        error!("Server stopped with error: {}", e);
        anyhow::bail!("Rocket failed to launch: {}", e);
    }

    Ok(())
}
