//! Add command implementation

use super::{await_lookup, open_catalog, print_record, spinner, FieldArgs};
use anyhow::{Context, Result};
use shelfscan_core::{CatalogConfig, SaveOutcome};

/// Create a new entry, optionally filled from the lookup service
///
/// Explicit field values win over looked-up ones.
pub async fn add(
    config: &CatalogConfig,
    isbn: Option<String>,
    fields: &FieldArgs,
    lookup: bool,
) -> Result<()> {
    let (mut controller, _feed) = open_catalog(config)?;
    controller.new_entry()?;
    if let Some(isbn) = isbn {
        controller.set_isbn(isbn.trim())?;
    }

    if lookup {
        controller.lookup()?;
        let pb = spinner("Looking up metadata...")?;
        let result = await_lookup(&mut controller, &pb).await;
        pb.finish_and_clear();
        if let Err(e) = result {
            tracing::warn!("lookup failed, keeping typed fields: {:#}", e);
        }
    }

    fields.apply(&mut controller).await?;

    let record = controller.draft().cloned().unwrap_or_default();
    match controller.save().await.context("Failed to save entry")? {
        SaveOutcome::Saved { isbn } => {
            tracing::info!(%isbn, "entry added");
            print_record(&record, false)
        }
        SaveOutcome::Discarded => anyhow::bail!("The entry has no ISBN; nothing saved"),
    }
}
