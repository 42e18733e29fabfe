//! Controller states and the user actions that move between them

use crate::types::{EditBuffer, Record};
use std::fmt;

/// Where the catalog workflow currently is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogState {
    /// Showing the persisted catalog
    #[default]
    Browsing,

    /// A browsed record is selected; the user picks open or delete
    ActionMenu { selected: Record },

    /// Creating or editing one record
    Logging {
        buffer: EditBuffer,
        phase: LoggingPhase,
    },
}

/// Sub-states of [`CatalogState::Logging`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingPhase {
    Editing,
    /// A scan session is running to fill in the ISBN
    Scanning,
    /// A lookup is in flight
    Fetching,
}

impl CatalogState {
    pub fn kind(&self) -> StateKind {
        match self {
            CatalogState::Browsing => StateKind::Browsing,
            CatalogState::ActionMenu { .. } => StateKind::ActionMenu,
            CatalogState::Logging { phase, .. } => match phase {
                LoggingPhase::Editing => StateKind::Editing,
                LoggingPhase::Scanning => StateKind::Scanning,
                LoggingPhase::Fetching => StateKind::Fetching,
            },
        }
    }
}

/// Flattened state tag, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Browsing,
    ActionMenu,
    Editing,
    Scanning,
    Fetching,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Browsing => "browsing",
            StateKind::ActionMenu => "choosing an action",
            StateKind::Editing => "editing",
            StateKind::Scanning => "scanning",
            StateKind::Fetching => "fetching",
        };
        f.write_str(name)
    }
}

/// User-initiated events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NewEntry,
    Select,
    Open,
    Delete,
    Dismiss,
    Edit,
    Scan,
    StopScan,
    Lookup,
    Save,
    Cancel,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::NewEntry => "start a new entry",
            Action::Select => "select a record",
            Action::Open => "open a record",
            Action::Delete => "delete a record",
            Action::Dismiss => "dismiss the menu",
            Action::Edit => "edit",
            Action::Scan => "scan",
            Action::StopScan => "stop scanning",
            Action::Lookup => "look up",
            Action::Save => "save",
            Action::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Result of an asynchronous step the controller applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A barcode was taken from the scan session and a lookup started
    Decoded { isbn: String },

    /// Lookup finished and its metadata is now in the draft
    Fetched { isbn: String },
}

/// What happened on save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { isbn: String },
    /// The draft had no ISBN and was dropped without touching the store
    Discarded,
}
