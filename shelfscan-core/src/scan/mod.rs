//! Barcode scan sessions
//!
//! The decoding engine lives outside this crate. It is reached through
//! [`ScanEngine`], which starts capturing and pushes [`DecodeEvent`]s into a
//! channel until its [`ScanHandle`] is stopped. [`ScanSession`] scopes one
//! such capture: it is acquired on entering the scanning state and released
//! on every way out of it.

mod manual;

pub use manual::{ManualScanEngine, ScanFeed};

use crate::error::ScanError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Barcode symbologies the engine can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// EAN-13, the symbology printed on book covers
    #[default]
    Ean13,
}

impl Symbology {
    /// Whether `text` has the shape of this symbology's payload
    pub fn accepts(&self, text: &str) -> bool {
        match self {
            Symbology::Ean13 => text.len() == 13 && text.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

/// Engine configuration for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub symbology: Symbology,
    /// Buffered decode events before the engine has to wait
    pub channel_capacity: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            symbology: Symbology::Ean13,
            channel_capacity: 8,
        }
    }
}

/// One recognized barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedItem {
    pub text: String,
    pub symbology: Symbology,
}

/// One batch of barcodes recognized in a single frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeEvent {
    pub items: Vec<DecodedItem>,
}

impl DecodeEvent {
    pub fn single(text: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            items: vec![DecodedItem {
                text: text.into(),
                symbology,
            }],
        }
    }

    /// Text of the first recognized item, if any
    pub fn first_text(&self) -> Option<&str> {
        self.items.first().map(|item| item.text.as_str())
    }
}

/// Starts capture sessions on the external decoding engine
#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Begin capturing with `settings`, delivering events to `sink`
    async fn open(
        &self,
        settings: &ScanSettings,
        sink: mpsc::Sender<DecodeEvent>,
    ) -> Result<Box<dyn ScanHandle>, ScanError>;
}

/// Control over a running capture
#[async_trait]
pub trait ScanHandle: Send {
    /// Stop capturing and release the engine's resources
    async fn stop(&mut self) -> Result<(), ScanError>;
}

/// A running capture plus its event receiver
///
/// Dropping a session that was never released still schedules a stop on the
/// current runtime.
pub struct ScanSession {
    handle: Option<Box<dyn ScanHandle>>,
    events: Option<mpsc::Receiver<DecodeEvent>>,
}

impl ScanSession {
    /// Acquire the engine and start capturing
    pub async fn acquire(engine: &dyn ScanEngine, settings: &ScanSettings) -> Result<Self, ScanError> {
        let (sink, events) = mpsc::channel(settings.channel_capacity.max(1));
        let handle = engine.open(settings, sink).await?;
        tracing::debug!(symbology = ?settings.symbology, "scan session started");
        Ok(Self {
            handle: Some(handle),
            events: Some(events),
        })
    }

    /// Hand the event receiver to a consumer. Only the first call gets it.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DecodeEvent>> {
        self.events.take()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Detach the receiver and stop the engine. Safe to call more than once.
    pub async fn release(&mut self) -> Result<(), ScanError> {
        if let Some(mut events) = self.events.take() {
            events.close();
        }
        match self.handle.take() {
            Some(mut handle) => {
                let result = handle.stop().await;
                tracing::debug!(ok = result.is_ok(), "scan session stopped");
                result
            }
            None => Ok(()),
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        if let Err(e) = handle.stop().await {
                            tracing::warn!(error = %e, "stopping dropped scan session failed");
                        }
                    });
                }
                Err(_) => tracing::warn!("scan session dropped outside a runtime; engine not stopped"),
            }
        }
    }
}

/// Wait for the first non-empty decode event and return its first item
///
/// The receiver is closed before returning so later events are refused by
/// the channel rather than queued.
pub async fn first_decode(mut events: mpsc::Receiver<DecodeEvent>) -> Option<String> {
    while let Some(event) = events.recv().await {
        if let Some(text) = event.first_text() {
            let text = text.to_string();
            events.close();
            return Some(text);
        }
    }
    None
}
