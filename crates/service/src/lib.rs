//! Service layer for the library API.
//! - `storage`: the JSON document holding the collection and its load/persist lifecycle.
//! - `books`: the book record, id matching, and the repository used by HTTP handlers.

pub mod books;
pub mod errors;
pub mod storage;
