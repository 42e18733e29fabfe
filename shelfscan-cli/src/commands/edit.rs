//! Edit command implementation

use super::{open_catalog, print_record, FieldArgs};
use anyhow::{Context, Result};
use shelfscan_core::{CatalogConfig, SaveOutcome};

/// Open an existing entry, apply the given edits and save it
pub async fn edit(config: &CatalogConfig, isbn: &str, fields: &FieldArgs) -> Result<()> {
    let (mut controller, _feed) = open_catalog(config)?;
    controller
        .refresh()
        .await
        .context("Failed to read the catalog")?;
    controller.select(isbn)?;
    controller.open()?;
    fields.apply(&mut controller).await?;

    let record = controller.draft().cloned().unwrap_or_default();
    match controller.save().await.context("Failed to save entry")? {
        SaveOutcome::Saved { isbn } => {
            tracing::info!(%isbn, "entry updated");
            print_record(&record, false)
        }
        SaveOutcome::Discarded => anyhow::bail!("Entry {} has no ISBN; nothing saved", isbn),
    }
}
