//! Show command implementation

use super::{open_catalog, print_record};
use anyhow::{Context, Result};
use shelfscan_core::CatalogConfig;

/// Print one stored entry
pub async fn show(config: &CatalogConfig, isbn: &str, json: bool) -> Result<()> {
    let (controller, _feed) = open_catalog(config)?;
    let record = controller
        .record(isbn)
        .await
        .with_context(|| format!("Failed to read entry {}", isbn))?
        .with_context(|| format!("No catalog entry with ISBN {}", isbn))?;
    print_record(&record, json)
}
