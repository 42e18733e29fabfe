//! CLI command implementations

mod add;
mod delete;
mod edit;
mod export_cover;
mod list;
mod lookup;
mod scan;
mod show;

pub use add::add;
pub use delete::delete;
pub use edit::edit;
pub use export_cover::export_cover;
pub use list::list;
pub use lookup::lookup;
pub use scan::scan;
pub use show::show;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use shelfscan_core::lookup::GoogleBooksGateway;
use shelfscan_core::scan::{ManualScanEngine, ScanFeed};
use shelfscan_core::storage::{LocalStorage, RecordStore};
use shelfscan_core::{CatalogConfig, CatalogController, EditableField, Progress, Record};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Field edits shared by `add` and `edit`
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    /// Title
    #[arg(long)]
    pub title: Option<String>,

    /// Author(s), comma separated
    #[arg(long)]
    pub author: Option<String>,

    /// Publisher
    #[arg(long)]
    pub publisher: Option<String>,

    /// Cover image file
    #[arg(long, value_name = "FILE")]
    pub cover: Option<PathBuf>,
}

impl FieldArgs {
    /// Apply every given edit to the controller's draft
    pub async fn apply(&self, controller: &mut CatalogController) -> Result<()> {
        let edits = [
            (EditableField::Title, &self.title),
            (EditableField::Author, &self.author),
            (EditableField::Publisher, &self.publisher),
        ];
        for (field, value) in edits {
            if let Some(value) = value {
                controller.edit(field, value.as_str())?;
            }
        }

        if let Some(path) = &self.cover {
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read cover image: {}", path.display()))?;
            controller.set_cover(&data)?;
        }
        Ok(())
    }
}

/// Build a controller over the configured catalog
///
/// The returned feed drives the controller's scanner.
pub fn open_catalog(config: &CatalogConfig) -> Result<(CatalogController, ScanFeed)> {
    let store = RecordStore::new(Arc::new(LocalStorage::new(&config.storage_path)));
    let gateway =
        GoogleBooksGateway::new(&config.lookup).context("Failed to set up the lookup client")?;
    let (engine, feed) = ManualScanEngine::pair();

    let controller = CatalogController::new(store, Arc::new(gateway), Arc::new(engine))
        .with_scan_settings(config.scan.clone())
        .with_cover_timeout(config.lookup.cover_timeout());
    Ok((controller, feed))
}

/// Wait until the running lookup lands in the draft
pub async fn await_lookup(controller: &mut CatalogController, spinner: &ProgressBar) -> Result<()> {
    loop {
        match controller.next_progress().await? {
            Progress::Decoded { isbn } => spinner.set_message(format!("Looking up {}...", isbn)),
            Progress::Fetched { .. } => return Ok(()),
        }
    }
}

pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.into());
    Ok(pb)
}

pub fn print_record(record: &Record, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("ISBN:      {}", record.isbn);
    println!("Title:     {}", record.title);
    println!("Author:    {}", record.author);
    println!("Publisher: {}", record.publisher);
    match record.cover_bytes() {
        Ok(bytes) if !bytes.is_empty() => println!("Cover:     {} bytes", bytes.len()),
        Ok(_) => println!("Cover:     none"),
        Err(_) => println!("Cover:     unreadable"),
    }
    Ok(())
}
