//! The book collection: record shape, id matching, and the repository
//! that applies list/get/create/replace/delete on top of the JSON document.

pub mod domain;
pub mod repository;
pub mod store;

pub use domain::{Book, BooksDocument, IdMatch};
pub use repository::BookRepository;
pub use store::{BookPolicy, FileBookRepository};
