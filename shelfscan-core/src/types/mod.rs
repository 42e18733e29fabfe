//! Catalog data model

mod cover;
mod edit_buffer;
mod record;

pub use cover::{decode_cover, encode_cover};
pub use edit_buffer::EditBuffer;
pub use record::{EditableField, Record};
