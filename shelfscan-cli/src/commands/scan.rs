//! Scan command implementation
//!
//! Each stdin line is presented to the scanner as one decoded barcode, the
//! way a handheld wedge scanner types into a terminal.

use super::{open_catalog, print_record, spinner};
use anyhow::{Context, Result};
use shelfscan_core::scan::ScanFeed;
use shelfscan_core::{CatalogConfig, CatalogError, Progress, SaveOutcome};
use std::io::BufRead;
use tokio::sync::mpsc;

/// Catalog the first EAN-13 barcode read from stdin
pub async fn scan(config: &CatalogConfig, dry_run: bool) -> Result<()> {
    let (mut controller, feed) = open_catalog(config)?;
    controller
        .refresh()
        .await
        .context("Failed to read the catalog")?;
    controller.new_entry()?;
    controller
        .start_scan()
        .await
        .context("Failed to start the scanner")?;

    let pb = spinner("Waiting for a barcode on stdin...")?;
    let reader = tokio::spawn(forward_stdin(feed));

    loop {
        match controller.next_progress().await {
            Ok(Progress::Decoded { isbn }) => {
                pb.set_message(format!("Looking up {}...", isbn));
            }
            Ok(Progress::Fetched { .. }) => break,
            Err(CatalogError::Scan(e)) => {
                pb.finish_and_clear();
                reader.abort();
                controller.cancel().await?;
                return Err(e).context("stdin closed before a barcode was read");
            }
            Err(e) => {
                // The draft keeps the scanned ISBN
                tracing::warn!("lookup failed: {}", e);
                break;
            }
        }
    }
    pb.finish_and_clear();
    reader.abort();

    let record = controller.draft().cloned().unwrap_or_default();
    if dry_run {
        controller.cancel().await?;
        print_record(&record, false)?;
        println!("(dry run, nothing saved)");
        return Ok(());
    }

    match controller.save().await.context("Failed to save entry")? {
        SaveOutcome::Saved { isbn } => {
            tracing::info!(%isbn, "scanned entry saved");
            print_record(&record, false)
        }
        SaveOutcome::Discarded => anyhow::bail!("The scanned entry has no ISBN; nothing saved"),
    }
}

/// Push stdin lines into the scanner, then close the feed at EOF
///
/// Stdin is read on a plain thread so a pending read never holds up runtime
/// shutdown.
async fn forward_stdin(feed: ScanFeed) {
    let (tx, mut lines) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    while let Some(line) = lines.recv().await {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if !feed.emit(text).await {
            tracing::debug!(text, "input not accepted as a barcode");
        }
    }
    feed.close();
}
