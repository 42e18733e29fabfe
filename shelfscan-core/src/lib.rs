//! Shelfscan Core Library
//!
//! This crate provides the cataloging workflow for a personal book catalog:
//! scanning or typing an ISBN, resolving its metadata and cover, editing the
//! draft, and keeping the result in a local ISBN-keyed record store.

pub mod config;
pub mod controller;
pub mod error;
pub mod lookup;
pub mod scan;
pub mod storage;
pub mod types;

pub use config::CatalogConfig;
pub use controller::{CatalogController, CatalogState, LoggingPhase, Progress, SaveOutcome, StateKind};
pub use error::{CatalogError, ConfigError, CoverError, LookupError, Result, ScanError, StorageError};
pub use types::{EditBuffer, EditableField, Record};
