//! Bibliographic lookup
//!
//! A [`LookupGateway`] resolves an ISBN to metadata and, separately, fetches
//! the cover image it points at. [`resolve`] combines the two calls with the
//! rule that only the metadata call is allowed to fail the lookup.

mod google_books;

pub use google_books::GoogleBooksGateway;

use crate::error::{CoverError, LookupError};
use crate::types::{encode_cover, Record};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Separator used when folding an author list into [`Record::author`]
pub const AUTHOR_SEPARATOR: &str = ",";

/// Metadata returned by a successful lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub publisher: String,
    /// Where the cover image can be fetched from
    pub cover_ref: Option<String>,
}

impl BookMetadata {
    pub fn joined_authors(&self) -> String {
        self.authors.join(AUTHOR_SEPARATOR)
    }

    /// Build a record for `isbn` from this metadata and an encoded cover
    pub fn into_record(self, isbn: impl Into<String>, cover_image: String) -> Record {
        Record {
            isbn: isbn.into(),
            author: self.joined_authors(),
            title: self.title,
            publisher: self.publisher,
            cover_image,
        }
    }
}

/// Source of bibliographic metadata and cover images
#[async_trait]
pub trait LookupGateway: Send + Sync {
    /// Resolve metadata for an ISBN
    async fn lookup(&self, isbn: &str) -> Result<BookMetadata, LookupError>;

    /// Fetch cover image bytes from a reference returned by `lookup`
    async fn fetch_cover(&self, reference: &str) -> Result<Vec<u8>, CoverError>;
}

/// Look up `isbn` and attach its cover
///
/// A failed or timed-out cover fetch yields an empty cover; only a metadata
/// failure is returned as an error.
pub async fn resolve(
    gateway: &dyn LookupGateway,
    isbn: &str,
    cover_timeout: Duration,
) -> Result<Record, LookupError> {
    let metadata = gateway.lookup(isbn).await?;
    tracing::debug!(isbn, title = %metadata.title, "metadata resolved");

    let cover_image = match metadata.cover_ref.as_deref() {
        Some(reference) => {
            match tokio::time::timeout(cover_timeout, gateway.fetch_cover(reference)).await {
                Ok(Ok(bytes)) => encode_cover(&bytes),
                Ok(Err(e)) => {
                    tracing::warn!(isbn, reference, error = %e, "cover fetch failed");
                    String::new()
                }
                Err(_) => {
                    tracing::warn!(isbn, reference, error = %CoverError::Timeout, "cover fetch failed");
                    String::new()
                }
            }
        }
        None => String::new(),
    };

    Ok(metadata.into_record(isbn, cover_image))
}

/// In-memory gateway (for testing and offline use)
#[derive(Default)]
pub struct MemoryGateway {
    books: HashMap<String, BookMetadata>,
    covers: HashMap<String, Vec<u8>>,
    lookups: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for an ISBN
    pub fn with_book(mut self, isbn: impl Into<String>, metadata: BookMetadata) -> Self {
        self.books.insert(isbn.into(), metadata);
        self
    }

    /// Register cover bytes for a reference
    pub fn with_cover(mut self, reference: impl Into<String>, data: Vec<u8>) -> Self {
        self.covers.insert(reference.into(), data);
        self
    }

    /// Number of metadata lookups served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupGateway for MemoryGateway {
    async fn lookup(&self, isbn: &str) -> Result<BookMetadata, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.books
            .get(isbn)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(isbn.to_string()))
    }

    async fn fetch_cover(&self, reference: &str) -> Result<Vec<u8>, CoverError> {
        self.covers
            .get(reference)
            .cloned()
            .ok_or_else(|| CoverError::Status(404))
    }
}
