pub mod batch;
pub mod cli;
pub mod core;
pub mod dispatch;
pub mod ingestion;
pub mod mail;
pub mod types;
pub mod utils;
pub mod web;

pub use web::{build_rocket, start_web_server};
