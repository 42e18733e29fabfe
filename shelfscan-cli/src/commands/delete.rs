//! Delete command implementation

use super::open_catalog;
use anyhow::{Context, Result};
use shelfscan_core::CatalogConfig;

/// Remove an entry from the catalog
pub async fn delete(config: &CatalogConfig, isbn: &str) -> Result<()> {
    let (mut controller, _feed) = open_catalog(config)?;
    controller
        .refresh()
        .await
        .context("Failed to read the catalog")?;
    controller.select(isbn)?;
    controller
        .delete()
        .await
        .with_context(|| format!("Failed to delete {}", isbn))?;

    println!("Deleted {}", isbn);
    Ok(())
}
