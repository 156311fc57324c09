use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use crate::books::domain::{Book, IdMatch};
use crate::books::repository::BookRepository;
use crate::errors::ServiceError;
use crate::storage::{DocumentStore, DocumentStoreOptions, StoreState};

/// Behavior switches for the open questions around ids and missing records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookPolicy {
    pub id_match: IdMatch,
    /// When set, replace/delete that match nothing fail with `NotFound`
    /// instead of rewriting the file and reporting success.
    pub missing_is_not_found: bool,
}

/// Book repository backed by the JSON document store.
#[derive(Clone)]
pub struct FileBookRepository {
    store: Arc<DocumentStore>,
    policy: BookPolicy,
}

impl FileBookRepository {
    pub fn new(store: Arc<DocumentStore>, policy: BookPolicy) -> Arc<Self> {
        Arc::new(Self { store, policy })
    }

    /// Open the document at `path` and load it before returning.
    pub async fn open<P: Into<PathBuf>>(
        path: P,
        options: DocumentStoreOptions,
        policy: BookPolicy,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = DocumentStore::open(path, options).await?;
        Ok(Self::new(store, policy))
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub async fn list(&self) -> Result<Vec<Book>, ServiceError> {
        let books = self.store.read().await?;
        Ok(books.as_ref().clone())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Book>, ServiceError> {
        let books = self.store.read().await?;
        Ok(books.iter().find(|b| self.policy.id_match.matches(b.id(), id)).cloned())
    }

    pub async fn create(&self, book: Book) -> Result<(), ServiceError> {
        let id_match = self.policy.id_match;
        self.store
            .mutate(move |books| {
                if id_match == IdMatch::Strict {
                    if let Some(candidate) = book.id() {
                        if books.iter().any(|b| id_match.collides(b.id(), candidate)) {
                            return Err(ServiceError::Conflict(format!(
                                "book {} already exists",
                                book.id_label().unwrap_or_default()
                            )));
                        }
                    }
                }
                books.push(book);
                Ok(())
            })
            .await
    }

    pub async fn replace(&self, id: &str, book: Book) -> Result<usize, ServiceError> {
        let policy = self.policy;
        let removed = self
            .store
            .mutate(move |books| {
                let removed = remove_matching(books, id, policy.id_match);
                if removed == 0 && policy.missing_is_not_found {
                    return Err(ServiceError::not_found("book"));
                }
                books.push(book);
                Ok(removed)
            })
            .await?;
        debug!(%id, removed, "book replaced");
        Ok(removed)
    }

    pub async fn delete(&self, id: &str) -> Result<usize, ServiceError> {
        let policy = self.policy;
        let removed = self
            .store
            .mutate(move |books| {
                let removed = remove_matching(books, id, policy.id_match);
                if removed == 0 && policy.missing_is_not_found {
                    return Err(ServiceError::not_found("book"));
                }
                Ok(removed)
            })
            .await?;
        debug!(%id, removed, "book deleted");
        Ok(removed)
    }
}

fn remove_matching(books: &mut Vec<Book>, id: &str, id_match: IdMatch) -> usize {
    let before = books.len();
    books.retain(|b| !id_match.matches(b.id(), id));
    before - books.len()
}

#[async_trait]
impl BookRepository for FileBookRepository {
    fn status(&self) -> StoreState {
        self.store.state()
    }

    async fn list(&self) -> Result<Vec<Book>, ServiceError> {
        self.list().await
    }

    async fn get(&self, id: &str) -> Result<Option<Book>, ServiceError> {
        self.get(id).await
    }

    async fn create(&self, book: Book) -> Result<(), ServiceError> {
        self.create(book).await
    }

    async fn replace(&self, id: &str, book: Book) -> Result<usize, ServiceError> {
        self.replace(id, book).await
    }

    async fn delete(&self, id: &str) -> Result<usize, ServiceError> {
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    async fn setup(policy: BookPolicy) -> Result<(Arc<FileBookRepository>, PathBuf), ServiceError> {
        let tmp = std::env::temp_dir().join(format!("books_repo_{}.json", uuid::Uuid::new_v4()));
        let repo = FileBookRepository::open(&tmp, DocumentStoreOptions::default(), policy).await?;
        Ok((repo, tmp))
    }

    fn book(value: serde_json::Value) -> Book {
        serde_json::from_value(value).expect("book json")
    }

    #[tokio::test]
    async fn get_returns_first_loose_match() -> Result<(), anyhow::Error> {
        let (repo, tmp) = setup(BookPolicy::default()).await?;
        repo.create(book(json!({"id": 1, "title": "Numeric", "author": "A"}))).await?;
        repo.create(book(json!({"id": "1", "title": "Text", "author": "B"}))).await?;

        let found = repo.get("1").await?.expect("found");
        assert_eq!(found.title(), Some(&json!("Numeric")));
        assert!(repo.get("2").await?.is_none());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn loose_policy_keeps_duplicates() -> Result<(), anyhow::Error> {
        let (repo, tmp) = setup(BookPolicy::default()).await?;
        repo.create(Book::new("1", "A", "X")).await?;
        repo.create(Book::new("1", "B", "X")).await?;
        assert_eq!(repo.list().await?.len(), 2);

        // replace drops every duplicate and appends the body last
        repo.create(Book::new("2", "C", "X")).await?;
        let removed = repo.replace("1", Book::new("1", "D", "X")).await?;
        assert_eq!(removed, 2);
        let titles: Vec<Value> = repo
            .list()
            .await?
            .iter()
            .filter_map(|b| b.title().cloned())
            .collect();
        assert_eq!(titles, vec![json!("C"), json!("D")]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn strict_policy_rejects_duplicate_ids() -> Result<(), anyhow::Error> {
        let policy = BookPolicy { id_match: IdMatch::Strict, ..Default::default() };
        let (repo, tmp) = setup(policy).await?;
        repo.create(Book::new("1", "A", "X")).await?;
        let duplicate = repo.create(Book::new("1", "B", "X")).await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

        // books without ids never collide
        repo.create(book(json!({"title": "no id"}))).await?;
        repo.create(book(json!({"title": "no id either"}))).await?;
        assert_eq!(repo.list().await?.len(), 3);

        // a numeric id is distinct from the same digits as text
        repo.create(book(json!({"id": 1, "title": "N"}))).await?;
        let found = repo.get("1").await?.expect("string id");
        assert_eq!(found.title(), Some(&json!("A")));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_success_even_when_nothing_matched() -> Result<(), anyhow::Error> {
        let (repo, tmp) = setup(BookPolicy::default()).await?;
        repo.create(Book::new("1", "A", "X")).await?;
        assert_eq!(repo.delete("1").await?, 1);
        assert_eq!(repo.delete("1").await?, 0);
        assert!(repo.list().await?.is_empty());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_is_not_found_skips_the_write() -> Result<(), anyhow::Error> {
        let policy = BookPolicy { missing_is_not_found: true, ..Default::default() };
        let (repo, tmp) = setup(policy).await?;
        repo.create(Book::new("1", "A", "X")).await?;

        let replaced = repo.replace("9", Book::new("9", "B", "X")).await;
        assert!(matches!(replaced, Err(ServiceError::NotFound(_))));
        assert!(matches!(repo.delete("9").await, Err(ServiceError::NotFound(_))));
        assert_eq!(repo.list().await?.len(), 1);
        assert_eq!(repo.replace("1", Book::new("1", "B", "X")).await?, 1);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_are_not_lost() -> Result<(), anyhow::Error> {
        let (repo, tmp) = setup(BookPolicy::default()).await?;
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.create(Book::new(i.to_string(), format!("T{i}"), "A")).await
                })
            })
            .collect();
        for t in tasks {
            t.await??;
        }
        assert_eq!(repo.list().await?.len(), 32);

        let reloaded =
            FileBookRepository::open(&tmp, DocumentStoreOptions::default(), BookPolicy::default())
                .await?;
        assert_eq!(reloaded.list().await?.len(), 32);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
