//! Warden Store
//!
//! Durable state for the admission core lives in a handful of JSON documents
//! (risk config, risk state, transfer history). This crate owns how they are
//! read and written:
//!
//! - Writes are atomic (temp file, `sync_all`, rename)
//! - A missing document loads as `None`
//! - An unreadable document is a [`StoreError::Corrupt`]; callers that must not
//!   crash use [`JsonDocument::load_or_else`] to fall back to defaults

mod atomic;
mod document;
mod error;

pub use atomic::write_atomic;
pub use document::JsonDocument;
pub use error::{StoreError, StoreResult};
