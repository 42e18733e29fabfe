//! Export-cover command implementation

use super::open_catalog;
use anyhow::{Context, Result};
use shelfscan_core::CatalogConfig;
use std::path::Path;

/// Decode an entry's stored cover and write the image bytes to `output`
pub async fn export_cover(config: &CatalogConfig, isbn: &str, output: &Path) -> Result<()> {
    let (controller, _feed) = open_catalog(config)?;
    let record = controller
        .record(isbn)
        .await
        .with_context(|| format!("Failed to read entry {}", isbn))?
        .with_context(|| format!("No catalog entry with ISBN {}", isbn))?;

    if !record.has_cover() {
        anyhow::bail!("Entry {} has no cover image", isbn);
    }
    let data = record
        .cover_bytes()
        .with_context(|| format!("Stored cover of {} is not valid base64", isbn))?;

    tokio::fs::write(output, &data)
        .await
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    println!("Wrote {} bytes to {}", data.len(), output.display());
    Ok(())
}
