//! ISBN-keyed persistence of catalog records

use super::{StorageProvider, StorageResult};
use crate::error::StorageError;
use crate::types::Record;
use std::sync::Arc;

const RECORDS_DIR: &str = "records";
const RECORD_EXT: &str = ".json";

/// Durable mapping from ISBN to [`Record`]
///
/// One entry per record, stored as JSON under `records/<encoded isbn>.json`.
/// There is no locking here: callers serialize mutations to the same key.
#[derive(Clone)]
pub struct RecordStore {
    provider: Arc<dyn StorageProvider>,
}

impl RecordStore {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Write or overwrite the entry for `record.isbn`
    pub async fn save(&self, record: &Record) -> StorageResult<()> {
        if !record.is_storable() {
            return Err(StorageError::InvalidKey(record.isbn.clone()));
        }
        let data = serde_json::to_vec(record).map_err(|e| StorageError::Corrupt {
            key: record.isbn.clone(),
            reason: e.to_string(),
        })?;
        self.provider.write(&entry_path(&record.isbn), data).await?;
        tracing::info!(isbn = %record.isbn, "saved catalog entry");
        Ok(())
    }

    /// Remove the entry if present
    pub async fn delete(&self, isbn: &str) -> StorageResult<()> {
        if isbn.is_empty() {
            return Err(StorageError::InvalidKey(String::new()));
        }
        self.provider.delete(&entry_path(isbn)).await?;
        tracing::info!(isbn, "deleted catalog entry");
        Ok(())
    }

    /// Fetch one entry. A missing key is `Ok(None)`.
    pub async fn get(&self, isbn: &str) -> StorageResult<Option<Record>> {
        if isbn.is_empty() {
            return Ok(None);
        }
        let data = match self.provider.read(&entry_path(isbn)).await {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let record: Record =
            serde_json::from_slice(&data).map_err(|e| StorageError::Corrupt {
                key: isbn.to_string(),
                reason: e.to_string(),
            })?;
        if record.isbn != isbn {
            return Err(StorageError::Corrupt {
                key: isbn.to_string(),
                reason: format!("stored ISBN {:?} does not match its key", record.isbn),
            });
        }
        Ok(Some(record))
    }

    pub async fn contains(&self, isbn: &str) -> StorageResult<bool> {
        if isbn.is_empty() {
            return Ok(false);
        }
        self.provider.exists(&entry_path(isbn)).await
    }

    /// Every stored ISBN, in storage order
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let names = self.provider.list(RECORDS_DIR).await?;
        Ok(names
            .iter()
            .filter_map(|name| name.strip_suffix(RECORD_EXT))
            .filter_map(|stem| urlencoding::decode(stem).ok())
            .map(|key| key.into_owned())
            .collect())
    }

    /// Every stored record, order not guaranteed
    ///
    /// Enumerates keys, then reads each entry in turn. Corrupt entries are
    /// skipped with a warning; entries deleted between the two steps are
    /// simply absent.
    pub async fn list_all(&self) -> StorageResult<Vec<Record>> {
        let keys = self.keys().await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get(&key).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(StorageError::Corrupt { key, reason }) => {
                    tracing::warn!(isbn = %key, %reason, "skipping corrupt catalog entry");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }
}

/// Percent-encode the key so every ISBN maps to one safe file name
fn entry_path(isbn: &str) -> String {
    format!("{}/{}{}", RECORDS_DIR, urlencoding::encode(isbn), RECORD_EXT)
}
