//! The catalog entry

use serde::{Deserialize, Serialize};
use std::fmt;

/// One catalog entry, keyed by ISBN
///
/// The serialized layout is a flat object of five strings. Any stored value
/// with missing or extra keys is rejected on read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Record {
    /// Book identifier and storage key
    #[serde(rename = "ISBN")]
    pub isbn: String,

    pub title: String,

    /// Authors joined with `,`
    pub author: String,

    pub publisher: String,

    /// Base64 cover image, empty when absent
    #[serde(rename = "imageBase64")]
    pub cover_image: String,
}

impl Record {
    /// Create an empty draft
    pub fn draft() -> Self {
        Self::default()
    }

    /// Create a record with the given ISBN and no metadata
    pub fn new(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    /// Set the cover from raw image bytes
    pub fn with_cover_bytes(mut self, data: &[u8]) -> Self {
        self.cover_image = super::encode_cover(data);
        self
    }

    /// Whether this record may be persisted
    pub fn is_storable(&self) -> bool {
        !self.isbn.is_empty()
    }

    pub fn has_cover(&self) -> bool {
        !self.cover_image.is_empty()
    }

    /// Decoded cover bytes, empty when there is no cover
    pub fn cover_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        super::decode_cover(&self.cover_image)
    }

    /// Read one editable field
    pub fn field(&self, field: EditableField) -> &str {
        match field {
            EditableField::Title => &self.title,
            EditableField::Author => &self.author,
            EditableField::Publisher => &self.publisher,
        }
    }

    /// A copy of this record with one editable field replaced
    pub fn with_field(&self, field: EditableField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            EditableField::Title => next.title = value,
            EditableField::Author => next.author = value,
            EditableField::Publisher => next.publisher = value,
        }
        next
    }
}

/// The metadata fields a user edits as free text
///
/// ISBN and cover are edited through their own setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    Title,
    Author,
    Publisher,
}

impl EditableField {
    /// Every editable field, in form order
    pub const ALL: [EditableField; 3] = [
        EditableField::Title,
        EditableField::Author,
        EditableField::Publisher,
    ];

    /// Form label
    pub fn label(&self) -> &'static str {
        match self {
            EditableField::Title => "title",
            EditableField::Author => "author",
            EditableField::Publisher => "publisher",
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_is_not_storable() {
        let draft = Record::draft();
        assert!(!draft.is_storable());
        assert!(!draft.has_cover());
        assert!(Record::new("9780134190440").is_storable());
    }

    #[test]
    fn test_with_field_leaves_original_untouched() {
        let original = Record::new("123").with_title("Old");
        let edited = original.with_field(EditableField::Title, "New");
        assert_eq!(original.title, "Old");
        assert_eq!(edited.title, "New");
        assert_eq!(edited.isbn, "123");
    }

    #[test]
    fn test_field_access_covers_all() {
        let record = Record::new("1")
            .with_title("T")
            .with_author("A")
            .with_publisher("P");
        let values: Vec<&str> = EditableField::ALL.iter().map(|f| record.field(*f)).collect();
        assert_eq!(values, vec!["T", "A", "P"]);
    }

    #[test]
    fn test_serialized_keys() {
        let record = Record::new("1").with_title("T");
        let json = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["ISBN", "author", "imageBase64", "publisher", "title"]
        );
    }

    #[test]
    fn test_extra_keys_rejected() {
        let json = r#"{"ISBN":"1","title":"","author":"","publisher":"","imageBase64":"","x":1}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }

    #[test]
    fn test_missing_keys_rejected() {
        let json = r#"{"ISBN":"1","title":""}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }
}
