use async_trait::async_trait;

use crate::books::domain::Book;
use crate::errors::ServiceError;
use crate::storage::StoreState;

/// Trait abstraction for book storage.
/// Ids arrive as raw path segments; how they compare is up to the implementation.
#[async_trait]
pub trait BookRepository: Send + Sync {
    fn status(&self) -> StoreState;
    async fn list(&self) -> Result<Vec<Book>, ServiceError>;
    /// First book whose id matches, in collection order.
    async fn get(&self, id: &str) -> Result<Option<Book>, ServiceError>;
    async fn create(&self, book: Book) -> Result<(), ServiceError>;
    /// Drop every book matching `id`, append `book`; returns how many were dropped.
    async fn replace(&self, id: &str, book: Book) -> Result<usize, ServiceError>;
    /// Drop every book matching `id`; returns how many were dropped.
    async fn delete(&self, id: &str) -> Result<usize, ServiceError>;
}
