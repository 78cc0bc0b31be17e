// src/ingestion.rs
//! CSV ingestion: uploaded bytes become candidate records

use std::borrow::Cow;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::CandidateRecord;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The stream is not structurally valid CSV
    #[error("malformed CSV: {message}")]
    Malformed { message: String, line: Option<u64> },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line());
        Self::Malformed {
            message: err.to_string(),
            line,
        }
    }
}

/// Parse a CSV with a header row into candidate records.
///
/// Rows shorter than the header simply lack the trailing keys; cells past
/// the last header are dropped. Values are kept verbatim, except that bytes
/// which are not valid UTF-8 (Latin-1 spreadsheet exports) are replaced
/// with U+FFFD.
pub fn parse_candidates(bytes: &[u8]) -> Result<Vec<CandidateRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let header = decode_cell(header, 1);
            if idx == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header
            }
        })
        .collect();

    let mut candidates = Vec::new();
    for result in reader.byte_records() {
        let row = result?;
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();

        if row.len() > headers.len() {
            debug!(
                "Ignoring {} cell(s) beyond the header on line {}",
                row.len() - headers.len(),
                line
            );
        }

        candidates.push(CandidateRecord::from_fields(
            headers
                .iter()
                .zip(row.iter())
                .map(|(header, value)| (header.as_str(), decode_cell(value, line))),
        ));
    }

    Ok(candidates)
}

fn decode_cell(raw: &[u8], line: u64) -> String {
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(valid) => valid.to_string(),
        Cow::Owned(replaced) => {
            warn!("Replaced invalid UTF-8 in a cell on line {}", line);
            replaced
        }
    }
}

/// Read a stored upload and parse it
pub async fn ingest_file(path: &Path) -> Result<Vec<CandidateRecord>, IngestError> {
    let content = tokio::fs::read(path).await.map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let candidates = parse_candidates(&content)?;
    info!(
        "Parsed {} candidate row(s) from {}",
        candidates.len(),
        path.display()
    );
    Ok(candidates)
}
