// src/cli.rs
use crate::ingestion::ingest_file;
use crate::types::{CandidateRecord, MISSING_FIELDS_REASON};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "candidate-mailer")]
#[command(about = "Upload candidate lists and email assessment links")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API (default)
    Serve {
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show which candidates of a CSV would be emailed, without sending
    Preview { csv_file: PathBuf },
}

/// Per-row outcome of a dry run
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewSummary {
    pub total: usize,
    pub deliverable: usize,
    /// 1-based data row numbers that would be skipped
    pub skipped_rows: Vec<usize>,
}

pub fn summarize(candidates: &[CandidateRecord]) -> PreviewSummary {
    let skipped_rows: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_deliverable())
        .map(|(idx, _)| idx + 1)
        .collect();

    PreviewSummary {
        total: candidates.len(),
        deliverable: candidates.len() - skipped_rows.len(),
        skipped_rows,
    }
}

pub fn render_preview(candidates: &[CandidateRecord]) -> String {
    let mut lines = Vec::with_capacity(candidates.len() + 1);

    for (idx, candidate) in candidates.iter().enumerate() {
        let line = match (candidate.email(), candidate.test_link()) {
            (Some(email), Some(link)) => format!(
                "{:>4}  SEND  {} <{}> -> {}",
                idx + 1,
                candidate.display_name(),
                email,
                link
            ),
            _ => format!(
                "{:>4}  SKIP  {} ({})",
                idx + 1,
                candidate.display_name(),
                MISSING_FIELDS_REASON
            ),
        };
        lines.push(line);
    }

    let summary = summarize(candidates);
    lines.push(format!(
        "{} row(s): {} would be sent, {} skipped",
        summary.total,
        summary.deliverable,
        summary.skipped_rows.len()
    ));
    lines.join("\n")
}

pub async fn run_preview(csv_file: &Path) -> Result<PreviewSummary> {
    if !csv_file.exists() {
        anyhow::bail!("CSV file not found: {}", csv_file.display());
    }

    let candidates = ingest_file(csv_file)
        .await
        .with_context(|| format!("Failed to ingest {}", csv_file.display()))?;

    println!("{}", render_preview(&candidates));
    Ok(summarize(&candidates))
}
