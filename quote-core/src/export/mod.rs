//! File exports of the current quote.

mod document;
mod json;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use document::{DocumentRenderer, DocumentRow, QuoteDocument, export_pdf, format_date_uk, valid_until};
pub use json::export_json;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not serialize quote: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not render document: {0}")]
    Render(String),

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An export ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Writes the artifact into `dir` under its own file name.
    pub fn write_to(
        &self,
        dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
