use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use arc_swap::ArcSwap;
use tokio::{
    fs,
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info};

use crate::books::domain::{Book, BooksDocument, BooksDocumentRef};
use crate::errors::ServiceError;

/// Lifecycle of the in-memory collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl StoreState {
    pub fn name(&self) -> &'static str {
        match self {
            StoreState::Uninitialized => "uninitialized",
            StoreState::Loading => "loading",
            StoreState::Ready => "ready",
            StoreState::Failed(_) => "failed",
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, StoreState::Ready | StoreState::Failed(_))
    }
}

#[derive(Clone, Debug)]
pub struct DocumentStoreOptions {
    /// Indent the written document.
    pub pretty: bool,
    /// How long a request waits for an in-flight load before giving up.
    pub ready_timeout: Duration,
}

impl Default for DocumentStoreOptions {
    fn default() -> Self {
        Self { pretty: false, ready_timeout: Duration::from_secs(5) }
    }
}

/// JSON document holding the whole book collection.
///
/// The collection is read once into memory and every mutation rewrites the
/// file in full. Readers get a lock-free snapshot; writers are serialized
/// through one mutex and the new collection becomes visible only after the
/// file has been replaced, so a failed write leaves memory and disk as they were.
pub struct DocumentStore {
    books: ArcSwap<Vec<Book>>,
    write_lock: Mutex<()>,
    state: watch::Sender<StoreState>,
    file_path: PathBuf,
    options: DocumentStoreOptions,
}

impl DocumentStore {
    /// Build an unloaded store. Call [`load`](Self::load) or
    /// [`spawn_load`](Self::spawn_load) before serving.
    pub fn new<P: Into<PathBuf>>(path: P, options: DocumentStoreOptions) -> Arc<Self> {
        let (state, _) = watch::channel(StoreState::Uninitialized);
        Arc::new(Self {
            books: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
            state,
            file_path: path.into(),
            options,
        })
    }

    /// Build and load in one step; fails if the document cannot be read.
    pub async fn open<P: Into<PathBuf>>(
        path: P,
        options: DocumentStoreOptions,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = Self::new(path, options);
        store.load().await?;
        Ok(store)
    }

    /// Load in the background; requests arriving meanwhile wait in [`ready`](Self::ready).
    pub fn spawn_load(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            // failure is recorded in the state and logged by `load`
            let _ = store.load().await;
        })
    }

    /// Read the document into memory. A missing file is created empty; an
    /// unreadable or malformed one leaves the store `Failed`.
    pub async fn load(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.state.send_replace(StoreState::Loading);
        match self.read_document().await {
            Ok(books) => {
                info!(
                    path = %self.file_path.display(),
                    count = books.len(),
                    event = "store_loaded",
                    "book collection loaded"
                );
                self.books.store(Arc::new(books));
                self.state.send_replace(StoreState::Ready);
                Ok(())
            }
            Err(e) => {
                error!(
                    path = %self.file_path.display(),
                    error = %e,
                    event = "store_load_failed",
                    "failed to load book collection"
                );
                self.state.send_replace(StoreState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn read_document(&self) -> Result<Vec<Book>, ServiceError> {
        match fs::read(&self.file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => {
                let doc: BooksDocument = serde_json::from_slice(&bytes)?;
                Ok(doc.books)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.persist(&[]).await?;
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Wait until the store is usable. `Failed`, or still not settled after
    /// `ready_timeout`, yields [`ServiceError::Unavailable`].
    pub async fn ready(&self) -> Result<(), ServiceError> {
        let mut rx = self.state.subscribe();
        let settled =
            tokio::time::timeout(self.options.ready_timeout, rx.wait_for(StoreState::is_settled))
                .await;
        let state = match settled {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) => {
                return Err(ServiceError::Unavailable("store state channel closed".into()))
            }
            Err(_) => {
                return Err(ServiceError::Unavailable(format!(
                    "store still {} after {:?}",
                    self.state().name(),
                    self.options.ready_timeout
                )))
            }
        };
        match state {
            StoreState::Ready => Ok(()),
            StoreState::Failed(reason) => Err(ServiceError::Unavailable(reason)),
            other => Err(ServiceError::Unavailable(format!("store {}", other.name()))),
        }
    }

    /// Current collection, without waiting for readiness.
    pub fn snapshot(&self) -> Arc<Vec<Book>> {
        self.books.load_full()
    }

    /// Ready-checked snapshot for request handling.
    pub async fn read(&self) -> Result<Arc<Vec<Book>>, ServiceError> {
        self.ready().await?;
        Ok(self.snapshot())
    }

    /// Apply `f` to a copy of the collection, write the result, then publish it.
    /// An error from `f` aborts before anything is written.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Vec<Book>) -> Result<T, ServiceError>,
    {
        self.ready().await?;
        let _guard = self.write_lock.lock().await;
        let mut next = Vec::clone(&self.books.load());
        let out = f(&mut next)?;
        self.persist(&next).await?;
        self.books.store(Arc::new(next));
        Ok(out)
    }

    /// Serialize `books` as the canonical document and replace the file.
    pub async fn persist(&self, books: &[Book]) -> Result<(), ServiceError> {
        let doc = BooksDocumentRef { books };
        let bytes = if self.options.pretty {
            serde_json::to_vec_pretty(&doc)?
        } else {
            serde_json::to_vec(&doc)?
        };
        atomic_write(&self.file_path, &bytes).await.map_err(|e| {
            error!(
                path = %self.file_path.display(),
                error = %e,
                event = "persist_failed",
                "failed to write book collection"
            );
            e
        })?;
        debug!(
            path = %self.file_path.display(),
            count = books.len(),
            bytes = bytes.len(),
            "book collection written"
        );
        Ok(())
    }
}

/// Write `bytes` to `<path>.tmp` and rename it over `path`.
async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let tmp = path.with_extension(format!("{ext}.tmp"));
    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
