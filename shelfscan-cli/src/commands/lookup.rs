//! Lookup command implementation

use super::{await_lookup, open_catalog, print_record, spinner};
use anyhow::{Context, Result};
use shelfscan_core::CatalogConfig;

/// Resolve an ISBN and print what the catalog would store for it
pub async fn lookup(config: &CatalogConfig, isbn: &str, json: bool) -> Result<()> {
    let (mut controller, _feed) = open_catalog(config)?;
    controller.new_entry()?;
    controller.set_isbn(isbn.trim())?;
    controller.lookup()?;

    let pb = spinner(format!("Looking up {}...", isbn))?;
    let result = await_lookup(&mut controller, &pb).await;
    pb.finish_and_clear();
    result.with_context(|| format!("Lookup of {} failed", isbn))?;

    let record = controller.draft().cloned().unwrap_or_default();
    controller.cancel().await?;
    print_record(&record, json)
}
