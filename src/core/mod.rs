// Core types and primitives

pub mod document;
pub mod strong_types;

pub use document::{Document, CREATED_AT, ID_FIELD, UPDATED_AT};
pub use strong_types::{format_timestamp, EntityKind, ObjectId};
