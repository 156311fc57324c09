//! Storage abstractions for service layer
//!
//! The book collection lives in a single JSON document that is loaded once
//! and rewritten in full on each mutation.

pub mod document_store;

pub use document_store::{DocumentStore, DocumentStoreOptions, StoreState};
