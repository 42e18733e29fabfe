//! The cataloging workflow state machine
//!
//! [`CatalogController`] owns the workflow state and is mutated from a single
//! task. User actions are `&mut self` methods. Waiting for a barcode and
//! resolving an ISBN run on spawned tasks that report back through an
//! internal channel; the owner drives those reports with
//! [`CatalogController::next_progress`], typically inside a `tokio::select!`
//! next to its input source.
//!
//! Every report carries the epoch of the logging session that issued it.
//! Leaving the logging state bumps the epoch and aborts outstanding tasks, so
//! a late result can never touch the browse list or a discarded draft.

mod state;

pub use state::{Action, CatalogState, LoggingPhase, Progress, SaveOutcome, StateKind};

use crate::error::{CatalogError, LookupError, Result, ScanError};
use crate::lookup::{self, LookupGateway};
use crate::scan::{self, ScanEngine, ScanSession, ScanSettings};
use crate::storage::RecordStore;
use crate::types::{encode_cover, EditBuffer, EditableField, Record};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

const DEFAULT_COVER_TIMEOUT: Duration = Duration::from_secs(10);

/// A report from a background task
#[derive(Debug)]
struct Completion {
    epoch: u64,
    kind: CompletionKind,
}

#[derive(Debug)]
enum CompletionKind {
    /// `None` when the engine closed its channel without decoding anything
    Decoded(Option<String>),
    Fetched {
        isbn: String,
        result: std::result::Result<Record, LookupError>,
    },
}

/// Orchestrates browse, scan, fetch, edit, save and delete
pub struct CatalogController {
    store: RecordStore,
    gateway: Arc<dyn LookupGateway>,
    scanner: Arc<dyn ScanEngine>,
    scan_settings: ScanSettings,
    cover_timeout: Duration,

    state: CatalogState,
    catalog: Vec<Record>,

    epoch: u64,
    scan: Option<ScanSession>,
    tasks: Vec<AbortHandle>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl CatalogController {
    pub fn new(
        store: RecordStore,
        gateway: Arc<dyn LookupGateway>,
        scanner: Arc<dyn ScanEngine>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            store,
            gateway,
            scanner,
            scan_settings: ScanSettings::default(),
            cover_timeout: DEFAULT_COVER_TIMEOUT,
            state: CatalogState::Browsing,
            catalog: Vec::new(),
            epoch: 0,
            scan: None,
            tasks: Vec::new(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn with_scan_settings(mut self, settings: ScanSettings) -> Self {
        self.scan_settings = settings;
        self
    }

    pub fn with_cover_timeout(mut self, timeout: Duration) -> Self {
        self.cover_timeout = timeout;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    /// Last snapshot of the persisted catalog
    pub fn catalog(&self) -> &[Record] {
        &self.catalog
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        match &self.state {
            CatalogState::Logging { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// The draft being edited, if logging
    pub fn draft(&self) -> Option<&Record> {
        self.buffer().map(EditBuffer::draft)
    }

    /// The record chosen from the browse list, if in the action menu
    pub fn selected(&self) -> Option<&Record> {
        match &self.state {
            CatalogState::ActionMenu { selected } => Some(selected),
            _ => None,
        }
    }

    /// Whether a lookup is in flight
    pub fn is_busy(&self) -> bool {
        self.buffer().is_some_and(EditBuffer::is_fetching)
    }

    /// Read a single stored record
    pub async fn record(&self, isbn: &str) -> Result<Option<Record>> {
        Ok(self.store.get(isbn).await?)
    }

    /// Re-read the catalog from the store
    pub async fn refresh(&mut self) -> Result<&[Record]> {
        self.catalog = self.store.list_all().await?;
        tracing::debug!(entries = self.catalog.len(), "catalog refreshed");
        Ok(&self.catalog)
    }

    // ------------------------------------------------------------------
    // Browsing and the action menu
    // ------------------------------------------------------------------

    /// Start a new, all-empty entry
    pub fn new_entry(&mut self) -> Result<()> {
        self.require(StateKind::Browsing, Action::NewEntry)?;
        self.enter_logging(EditBuffer::empty());
        Ok(())
    }

    /// Pick a record from the current catalog snapshot
    pub fn select(&mut self, isbn: &str) -> Result<()> {
        self.require(StateKind::Browsing, Action::Select)?;
        let selected = self
            .catalog
            .iter()
            .find(|record| record.isbn == isbn)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownRecord(isbn.to_string()))?;
        tracing::debug!(isbn, "record selected");
        self.state = CatalogState::ActionMenu { selected };
        Ok(())
    }

    /// Edit the selected record
    pub fn open(&mut self) -> Result<()> {
        let selected = match &self.state {
            CatalogState::ActionMenu { selected } => selected.clone(),
            _ => return Err(self.invalid(Action::Open)),
        };
        self.enter_logging(EditBuffer::from_record(selected));
        Ok(())
    }

    /// Delete the selected record and return to browsing
    ///
    /// If the store refuses, the menu stays open on the same record.
    pub async fn delete(&mut self) -> Result<()> {
        let isbn = match &self.state {
            CatalogState::ActionMenu { selected } => selected.isbn.clone(),
            _ => return Err(self.invalid(Action::Delete)),
        };
        self.store.delete(&isbn).await?;
        self.state = CatalogState::Browsing;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Close the action menu without doing anything
    pub fn dismiss(&mut self) -> Result<()> {
        self.require(StateKind::ActionMenu, Action::Dismiss)?;
        self.state = CatalogState::Browsing;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn edit(&mut self, field: EditableField, value: impl Into<String>) -> Result<()> {
        self.editing_buffer()?.set_field(field, value);
        Ok(())
    }

    /// Type an ISBN by hand
    pub fn set_isbn(&mut self, isbn: impl Into<String>) -> Result<()> {
        self.editing_buffer()?.set_isbn(isbn);
        Ok(())
    }

    /// Replace the cover with picked image bytes
    pub fn set_cover(&mut self, data: &[u8]) -> Result<()> {
        let encoded = encode_cover(data);
        self.editing_buffer()?.set_cover(encoded);
        Ok(())
    }

    /// Look up the ISBN currently in the draft
    pub fn lookup(&mut self) -> Result<()> {
        self.require(StateKind::Editing, Action::Lookup)?;
        let isbn = self.editing_buffer()?.isbn().to_string();
        if isbn.is_empty() {
            return Err(CatalogError::MissingIsbn);
        }
        self.begin_fetch(isbn);
        Ok(())
    }

    /// Acquire the scanner and wait for a barcode
    ///
    /// When the engine cannot be acquired the error is returned and the
    /// controller stays in editing.
    pub async fn start_scan(&mut self) -> Result<()> {
        self.require(StateKind::Editing, Action::Scan)?;

        let mut session = ScanSession::acquire(self.scanner.as_ref(), &self.scan_settings).await?;
        let events = session
            .take_events()
            .ok_or_else(|| ScanError::Engine("scan session has no event channel".to_string()))?;

        let tx = self.completions_tx.clone();
        let epoch = self.epoch;
        let task = tokio::spawn(async move {
            let text = scan::first_decode(events).await;
            let _ = tx.send(Completion {
                epoch,
                kind: CompletionKind::Decoded(text),
            });
        });

        self.tasks.push(task.abort_handle());
        self.scan = Some(session);
        self.set_phase(LoggingPhase::Scanning);
        Ok(())
    }

    /// Give up on the current scan and go back to editing
    pub async fn stop_scan(&mut self) -> Result<()> {
        self.require(StateKind::Scanning, Action::StopScan)?;
        self.abort_tasks();
        self.release_scan().await;
        self.set_phase(LoggingPhase::Editing);
        Ok(())
    }

    /// Persist the draft and return to browsing
    ///
    /// A draft without an ISBN is dropped instead. When the store fails the
    /// controller is left exactly as it was.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let draft = match &self.state {
            CatalogState::Logging { buffer, .. } => buffer.draft().clone(),
            _ => return Err(self.invalid(Action::Save)),
        };

        let outcome = if draft.is_storable() {
            self.store.save(&draft).await?;
            SaveOutcome::Saved { isbn: draft.isbn }
        } else {
            tracing::warn!("draft has no ISBN, discarding instead of saving");
            SaveOutcome::Discarded
        };

        self.leave_logging().await;
        self.refresh_after_mutation().await;
        Ok(outcome)
    }

    /// Discard the draft and return to browsing
    pub async fn cancel(&mut self) -> Result<()> {
        if !matches!(self.state, CatalogState::Logging { .. }) {
            return Err(self.invalid(Action::Cancel));
        }
        self.leave_logging().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Background completions
    // ------------------------------------------------------------------

    /// Wait for the next background result that still applies
    ///
    /// Stale results are dropped without returning. A failed lookup comes
    /// back as an error with the controller already returned to editing.
    pub async fn next_progress(&mut self) -> Result<Progress> {
        loop {
            let completion = match self.completions_rx.recv().await {
                Some(completion) => completion,
                // The controller holds a sender, so the channel never closes
                None => std::future::pending().await,
            };
            if let Some(outcome) = self.apply(completion).await {
                return outcome;
            }
        }
    }

    async fn apply(&mut self, completion: Completion) -> Option<Result<Progress>> {
        if completion.epoch != self.epoch {
            tracing::debug!(
                issued = completion.epoch,
                current = self.epoch,
                "discarding result from a finished session"
            );
            return None;
        }

        match completion.kind {
            CompletionKind::Decoded(text) => {
                if self.kind() != StateKind::Scanning {
                    tracing::debug!(state = %self.kind(), "ignoring decode outside scanning");
                    return None;
                }
                self.release_scan().await;
                match text {
                    Some(isbn) => {
                        tracing::info!(%isbn, "barcode decoded");
                        if let Ok(buffer) = self.logging_buffer() {
                            buffer.set_isbn(isbn.clone());
                        }
                        self.begin_fetch(isbn.clone());
                        Some(Ok(Progress::Decoded { isbn }))
                    }
                    None => {
                        self.set_phase(LoggingPhase::Editing);
                        Some(Err(ScanError::Engine(
                            "capture ended without a decode".to_string(),
                        )
                        .into()))
                    }
                }
            }
            CompletionKind::Fetched { isbn, result } => {
                let current = match &self.state {
                    CatalogState::Logging {
                        buffer,
                        phase: LoggingPhase::Fetching,
                    } => buffer.isbn().to_string(),
                    _ => {
                        tracing::debug!(state = %self.kind(), "ignoring lookup outside fetching");
                        return None;
                    }
                };
                if current != isbn {
                    tracing::debug!(%isbn, %current, "ignoring lookup for a different ISBN");
                    return None;
                }

                self.set_phase(LoggingPhase::Editing);
                match result {
                    Ok(record) => {
                        if let Ok(buffer) = self.logging_buffer() {
                            buffer.apply_lookup(record);
                        }
                        tracing::info!(%isbn, "lookup applied to draft");
                        Some(Ok(Progress::Fetched { isbn }))
                    }
                    Err(e) => {
                        tracing::info!(%isbn, error = %e, "lookup failed");
                        Some(Err(e.into()))
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn invalid(&self, action: Action) -> CatalogError {
        CatalogError::InvalidTransition {
            state: self.kind(),
            action,
        }
    }

    fn require(&self, kind: StateKind, action: Action) -> Result<()> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn logging_buffer(&mut self) -> Result<&mut EditBuffer> {
        let kind = self.kind();
        match &mut self.state {
            CatalogState::Logging { buffer, .. } => Ok(buffer),
            _ => Err(CatalogError::InvalidTransition {
                state: kind,
                action: Action::Edit,
            }),
        }
    }

    /// The buffer, but only while in the editing phase
    fn editing_buffer(&mut self) -> Result<&mut EditBuffer> {
        self.require(StateKind::Editing, Action::Edit)?;
        self.logging_buffer()
    }

    fn set_phase(&mut self, next: LoggingPhase) {
        if let CatalogState::Logging { buffer, phase } = &mut self.state {
            let previous = *phase;
            tracing::debug!(from = ?previous, to = ?next, "logging phase change");
            buffer.set_fetching(next == LoggingPhase::Fetching);
            *phase = next;
        }
    }

    fn enter_logging(&mut self, buffer: EditBuffer) {
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, isbn = buffer.isbn(), "entering logging");
        self.state = CatalogState::Logging {
            buffer,
            phase: LoggingPhase::Editing,
        };
    }

    fn begin_fetch(&mut self, isbn: String) {
        let gateway = self.gateway.clone();
        let tx = self.completions_tx.clone();
        let epoch = self.epoch;
        let cover_timeout = self.cover_timeout;

        let task = tokio::spawn(async move {
            let result = lookup::resolve(gateway.as_ref(), &isbn, cover_timeout).await;
            let _ = tx.send(Completion {
                epoch,
                kind: CompletionKind::Fetched { isbn, result },
            });
        });

        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(task.abort_handle());
        self.set_phase(LoggingPhase::Fetching);
    }

    /// Re-read the catalog once a store write has landed
    ///
    /// The write is not undone by a failed read, so the old snapshot is kept
    /// and the failure is only logged.
    async fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "catalog refresh failed after a committed change");
        }
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Stop the scan session if one is held. Stop failures are logged only.
    async fn release_scan(&mut self) {
        if let Some(mut session) = self.scan.take() {
            if let Err(e) = session.release().await {
                tracing::warn!(error = %e, "scan session did not stop cleanly");
            }
        }
    }

    /// Tear down everything owned by the logging session
    async fn leave_logging(&mut self) {
        self.abort_tasks();
        self.release_scan().await;
        self.epoch += 1;
        self.state = CatalogState::Browsing;
        tracing::debug!(epoch = self.epoch, "back to browsing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{BookMetadata, MemoryGateway};
    use crate::scan::ManualScanEngine;
    use crate::storage::MemoryStorage;

    fn controller(gateway: MemoryGateway) -> CatalogController {
        let (engine, _feed) = ManualScanEngine::pair();
        CatalogController::new(
            RecordStore::new(Arc::new(MemoryStorage::new())),
            Arc::new(gateway),
            Arc::new(engine),
        )
    }

    #[tokio::test]
    async fn test_invalid_transitions_leave_state_alone() {
        let mut c = controller(MemoryGateway::new());

        assert!(matches!(
            c.open(),
            Err(CatalogError::InvalidTransition {
                state: StateKind::Browsing,
                action: Action::Open
            })
        ));
        assert!(c.save().await.is_err());
        assert!(c.start_scan().await.is_err());
        assert_eq!(c.kind(), StateKind::Browsing);

        c.new_entry().unwrap();
        assert!(c.new_entry().is_err());
        assert!(c.select("x").is_err());
        assert_eq!(c.kind(), StateKind::Editing);
    }

    #[tokio::test]
    async fn test_lookup_requires_isbn() {
        let mut c = controller(MemoryGateway::new());
        c.new_entry().unwrap();
        assert!(matches!(c.lookup(), Err(CatalogError::MissingIsbn)));
        assert_eq!(c.kind(), StateKind::Editing);
    }

    #[tokio::test]
    async fn test_second_lookup_while_fetching() {
        let mut c = controller(MemoryGateway::new());
        c.new_entry().unwrap();
        c.set_isbn("9780262033848").unwrap();
        c.lookup().unwrap();

        let err = c.lookup().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidTransition {
                state: StateKind::Fetching,
                action: Action::Lookup
            }
        ));
        assert_eq!(err.to_string(), "Cannot look up while fetching");
        assert_eq!(c.kind(), StateKind::Fetching);
    }

    #[tokio::test]
    async fn test_stale_completion_is_dropped() {
        let mut c = controller(MemoryGateway::new());
        c.new_entry().unwrap();
        c.set_isbn("111").unwrap();
        let stale_epoch = c.epoch;
        c.cancel().await.unwrap();

        let completion = Completion {
            epoch: stale_epoch,
            kind: CompletionKind::Fetched {
                isbn: "111".to_string(),
                result: Ok(Record::new("111").with_title("Ghost")),
            },
        };
        assert!(c.apply(completion).await.is_none());
        assert_eq!(c.kind(), StateKind::Browsing);
        assert!(c.draft().is_none());
    }

    #[tokio::test]
    async fn test_decode_after_leaving_scanning_is_noop() {
        let mut c = controller(MemoryGateway::new());
        c.new_entry().unwrap();
        let epoch = c.epoch;

        let completion = Completion {
            epoch,
            kind: CompletionKind::Decoded(Some("9780134190440".to_string())),
        };
        assert!(c.apply(completion).await.is_none());
        assert_eq!(c.kind(), StateKind::Editing);
        assert_eq!(c.draft().unwrap().isbn, "");
    }

    #[tokio::test]
    async fn test_manual_lookup_round() {
        let gateway = MemoryGateway::new().with_book(
            "9780262033848",
            BookMetadata {
                title: "Introduction to Algorithms".to_string(),
                authors: vec!["Thomas H. Cormen".to_string()],
                publisher: "MIT Press".to_string(),
                cover_ref: None,
            },
        );
        let mut c = controller(gateway);
        c.new_entry().unwrap();
        c.set_isbn("9780262033848").unwrap();
        c.lookup().unwrap();
        assert!(c.is_busy());
        assert!(c.edit(EditableField::Title, "typed").is_err());

        let progress = c.next_progress().await.unwrap();
        assert_eq!(
            progress,
            Progress::Fetched {
                isbn: "9780262033848".to_string()
            }
        );
        assert!(!c.is_busy());
        assert_eq!(c.draft().unwrap().publisher, "MIT Press");
    }
}
