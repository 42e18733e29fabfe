//! List command implementation

use super::open_catalog;
use anyhow::{Context, Result};
use serde::Serialize;
use shelfscan_core::CatalogConfig;

/// One line of the listing
#[derive(Serialize)]
struct Entry<'a> {
    isbn: &'a str,
    title: &'a str,
    author: &'a str,
    publisher: &'a str,
    has_cover: bool,
}

/// Print every catalog entry, sorted by title
pub async fn list(config: &CatalogConfig, json: bool) -> Result<()> {
    let (mut controller, _feed) = open_catalog(config)?;
    let mut records = controller
        .refresh()
        .await
        .context("Failed to read the catalog")?
        .to_vec();
    records.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.isbn.cmp(&b.isbn)));

    let entries: Vec<Entry> = records
        .iter()
        .map(|record| Entry {
            isbn: &record.isbn,
            title: &record.title,
            author: &record.author,
            publisher: &record.publisher,
            has_cover: record.has_cover(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("The catalog is empty");
        return Ok(());
    }
    for entry in &entries {
        let title = if entry.title.is_empty() {
            "(untitled)"
        } else {
            entry.title
        };
        println!("{:<15} {}  {}", entry.isbn, title, entry.author);
    }
    println!("{} book(s)", entries.len());
    Ok(())
}
