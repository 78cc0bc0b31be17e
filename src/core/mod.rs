// src/core/mod.rs
//! Configuration and file system plumbing shared by the server and the CLI

pub mod config_manager;
pub mod fs_ops;

pub use config_manager::{ConfigManager, MailConfig, ServerConfig};
pub use fs_ops::{FsOps, TempUpload};
