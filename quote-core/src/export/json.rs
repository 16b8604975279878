use super::{ExportArtifact, ExportError};
use crate::models::FormSnapshot;

/// Pretty-printed snapshot named after the reference, or `quote.json`.
pub fn export_json(snapshot: &FormSnapshot) -> Result<ExportArtifact, ExportError> {
    let stem = if snapshot.quote_ref.is_empty() {
        "quote"
    } else {
        snapshot.quote_ref.as_str()
    };
    Ok(ExportArtifact {
        file_name: format!("{stem}.json"),
        bytes: serde_json::to_vec_pretty(snapshot)?,
    })
}
