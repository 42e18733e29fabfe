//! Shared test harness for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use shelfscan_core::error::{CoverError, LookupError, StorageError};
use shelfscan_core::lookup::{BookMetadata, LookupGateway};
use shelfscan_core::scan::{ManualScanEngine, ScanFeed};
use shelfscan_core::storage::{MemoryStorage, RecordStore, StorageProvider, StorageResult};
use shelfscan_core::CatalogController;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const KR_ISBN: &str = "9780134190440";
pub const KR_COVER: &str = "http://covers.test/kr.jpg";

pub fn kr_metadata() -> BookMetadata {
    BookMetadata {
        title: "The C Programming Language".to_string(),
        authors: vec!["Brian Kernighan".to_string(), "Dennis Ritchie".to_string()],
        publisher: "Prentice Hall".to_string(),
        cover_ref: Some(KR_COVER.to_string()),
    }
}

// =============================================================================
// ScriptedGateway: lookup double with an optional gate
// =============================================================================

/// Gateway whose lookups can be held in flight until released
pub struct ScriptedGateway {
    books: HashMap<String, BookMetadata>,
    covers: HashMap<String, Vec<u8>>,
    cover_fails: bool,
    gate: Option<Semaphore>,
    lookups: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
            covers: HashMap::new(),
            cover_fails: false,
            gate: None,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_book(mut self, isbn: &str, metadata: BookMetadata) -> Self {
        self.books.insert(isbn.to_string(), metadata);
        self
    }

    pub fn with_cover(mut self, reference: &str, data: &[u8]) -> Self {
        self.covers.insert(reference.to_string(), data.to_vec());
        self
    }

    pub fn with_failing_covers(mut self) -> Self {
        self.cover_fails = true;
        self
    }

    /// Hold every lookup until [`ScriptedGateway::release`] is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupGateway for ScriptedGateway {
    async fn lookup(&self, isbn: &str) -> Result<BookMetadata, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| LookupError::Transport(e.to_string()))?;
        }
        self.books
            .get(isbn)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(isbn.to_string()))
    }

    async fn fetch_cover(&self, reference: &str) -> Result<Vec<u8>, CoverError> {
        if self.cover_fails {
            return Err(CoverError::Transport("connection reset".to_string()));
        }
        self.covers
            .get(reference)
            .cloned()
            .ok_or(CoverError::Status(404))
    }
}

// =============================================================================
// FlakyStorage: memory storage with switchable write and listing failures
// =============================================================================

#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing: AtomicBool,
    listing_failing: AtomicBool,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `list` fail while reads and writes keep working
    pub fn set_listing_failing(&self, failing: bool) {
        self.listing_failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::BackendError("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageProvider for FlakyStorage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        self.check()?;
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.check()?;
        self.inner.delete(path).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        if self.listing_failing.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("io".to_string()));
        }
        self.inner.list(prefix).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.inner.exists(path).await
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub controller: CatalogController,
    pub feed: ScanFeed,
    pub gateway: Arc<ScriptedGateway>,
    pub storage: Arc<FlakyStorage>,
    pub store: RecordStore,
}

pub fn harness(gateway: ScriptedGateway) -> Harness {
    let storage = Arc::new(FlakyStorage::new());
    let store = RecordStore::new(storage.clone());
    let gateway = Arc::new(gateway);
    let (engine, feed) = ManualScanEngine::pair();

    let controller = CatalogController::new(store.clone(), gateway.clone(), Arc::new(engine))
        .with_cover_timeout(Duration::from_secs(5));

    Harness {
        controller,
        feed,
        gateway,
        storage,
        store,
    }
}

/// Give spawned tasks a chance to run on the current-thread runtime
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
