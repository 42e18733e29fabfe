//! In-memory draft backing the entry form

use super::{EditableField, Record};

/// A record being created or edited, plus the in-flight lookup flag
///
/// Every edit swaps in a new draft built from the previous one, so a
/// reference obtained from [`EditBuffer::draft`] never observes a half-applied
/// change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    draft: Record,
    is_fetching: bool,
}

impl EditBuffer {
    /// An all-empty draft
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start editing an existing record
    pub fn from_record(record: Record) -> Self {
        Self {
            draft: record,
            is_fetching: false,
        }
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn isbn(&self) -> &str {
        &self.draft.isbn
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub(crate) fn set_fetching(&mut self, fetching: bool) {
        self.is_fetching = fetching;
    }

    /// Replace one free-text field
    pub fn set_field(&mut self, field: EditableField, value: impl Into<String>) {
        self.draft = self.draft.with_field(field, value);
    }

    pub fn set_isbn(&mut self, isbn: impl Into<String>) {
        self.draft = Record {
            isbn: isbn.into(),
            ..self.draft.clone()
        };
    }

    /// Replace the cover with already-encoded text
    pub fn set_cover(&mut self, cover_image: impl Into<String>) {
        self.draft = Record {
            cover_image: cover_image.into(),
            ..self.draft.clone()
        };
    }

    /// Replace metadata with a lookup result, keeping the draft's ISBN
    pub fn apply_lookup(&mut self, fetched: Record) {
        self.draft = Record {
            isbn: self.draft.isbn.clone(),
            ..fetched
        };
    }
}
