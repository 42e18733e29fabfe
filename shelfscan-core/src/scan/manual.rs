//! Scan engine driven by injected text
//!
//! Stands in for a camera-backed engine: whatever feeds the [`ScanFeed`]
//! (a test, a stdin reader) plays the role of the frame analysis loop.

use super::{DecodeEvent, ScanEngine, ScanHandle, ScanSettings, Symbology};
use crate::error::ScanError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

#[derive(Default)]
struct Shared {
    active: Mutex<Option<ActiveCapture>>,
    denied: Mutex<Option<String>>,
    opened: AtomicUsize,
    stopped: AtomicUsize,
    next_id: AtomicU64,
}

struct ActiveCapture {
    id: u64,
    /// `None` once the feed has been closed
    sink: Option<mpsc::Sender<DecodeEvent>>,
    symbology: Symbology,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Engine whose decode events come from a paired [`ScanFeed`]
pub struct ManualScanEngine {
    shared: Arc<Shared>,
}

/// Injects decode events into whichever capture is currently running
#[derive(Clone)]
pub struct ScanFeed {
    shared: Arc<Shared>,
}

impl ManualScanEngine {
    pub fn pair() -> (Self, ScanFeed) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: shared.clone(),
            },
            ScanFeed { shared },
        )
    }
}

#[async_trait]
impl ScanEngine for ManualScanEngine {
    async fn open(
        &self,
        settings: &ScanSettings,
        sink: mpsc::Sender<DecodeEvent>,
    ) -> Result<Box<dyn ScanHandle>, ScanError> {
        if let Some(reason) = lock(&self.shared.denied).clone() {
            return Err(ScanError::PermissionDenied(reason));
        }

        let mut active = lock(&self.shared.active);
        if active.is_some() {
            return Err(ScanError::Unavailable(
                "a capture is already running".to_string(),
            ));
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        *active = Some(ActiveCapture {
            id,
            sink: Some(sink),
            symbology: settings.symbology,
        });
        self.shared.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ManualHandle {
            shared: self.shared.clone(),
            id,
        }))
    }
}

struct ManualHandle {
    shared: Arc<Shared>,
    /// The capture this handle opened
    id: u64,
}

#[async_trait]
impl ScanHandle for ManualHandle {
    async fn stop(&mut self) -> Result<(), ScanError> {
        let mut active = lock(&self.shared.active);
        // A later capture belongs to another handle
        if active.as_ref().is_some_and(|capture| capture.id == self.id) {
            *active = None;
            self.shared.stopped.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl ScanFeed {
    /// Make the next `open` fail as if camera access were refused
    pub fn deny(&self, reason: impl Into<String>) {
        *lock(&self.shared.denied) = Some(reason.into());
    }

    pub fn allow(&self) {
        *lock(&self.shared.denied) = None;
    }

    /// Present one barcode to the running capture
    ///
    /// Text the configured symbology does not accept is dropped, as the
    /// engine's own filter would. Returns whether an event was delivered.
    pub async fn emit(&self, text: &str) -> bool {
        let target = {
            let active = lock(&self.shared.active);
            active.as_ref().and_then(|capture| {
                let sink = capture.sink.clone()?;
                capture
                    .symbology
                    .accepts(text)
                    .then_some((sink, capture.symbology))
            })
        };
        match target {
            Some((sink, symbology)) => sink
                .send(DecodeEvent::single(text, symbology))
                .await
                .is_ok(),
            None => false,
        }
    }

    /// Deliver a raw event without filtering
    pub async fn emit_event(&self, event: DecodeEvent) -> bool {
        let sink = lock(&self.shared.active)
            .as_ref()
            .and_then(|capture| capture.sink.clone());
        match sink {
            Some(sink) => sink.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Signal that no more input will arrive for the running capture
    ///
    /// Events already delivered are still consumed; after them the session
    /// sees its event stream end.
    pub fn close(&self) {
        if let Some(capture) = lock(&self.shared.active).as_mut() {
            capture.sink = None;
        }
    }

    /// Whether a capture is running
    pub fn is_active(&self) -> bool {
        lock(&self.shared.active).is_some()
    }

    pub fn open_count(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.shared.stopped.load(Ordering::SeqCst)
    }
}
