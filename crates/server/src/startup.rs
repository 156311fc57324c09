use std::{future::Future, net::SocketAddr, path::Path, sync::Arc, time::Duration};

use axum::Router;
use configs::{AppConfig, ServerConfig, StorageConfig};
use service::books::{BookPolicy, FileBookRepository, IdMatch};
use service::storage::{DocumentStore, DocumentStoreOptions};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", server.host, server.port).parse()?)
}

/// Repository over the configured document. The document is not read yet.
pub fn build_repository(storage: &StorageConfig) -> Arc<FileBookRepository> {
    let options = DocumentStoreOptions {
        pretty: storage.pretty,
        ready_timeout: Duration::from_millis(storage.ready_timeout_ms),
    };
    let policy = BookPolicy {
        id_match: if storage.strict_ids { IdMatch::Strict } else { IdMatch::Loose },
        missing_is_not_found: storage.missing_is_not_found,
    };
    FileBookRepository::new(DocumentStore::new(&storage.db_path, options), policy)
}

/// Router plus the repository behind it, loading started in the background.
pub fn build_app(cfg: &AppConfig) -> (Router, Arc<FileBookRepository>) {
    let repo = build_repository(&cfg.storage);
    let _ = repo.store().spawn_load();
    let state = ServerState::new(repo.clone());
    (routes::build_router(state, build_cors(), &cfg.http), repo)
}

/// Serve with `cfg` until `shutdown` resolves.
pub async fn run_until<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    common::env::ensure_env(&cfg.http.static_dir, Path::new(&cfg.storage.db_path)).await?;

    let (app, _repo) = build_app(&cfg);

    let addr = bind_addr(&cfg.server)?;
    info!(
        %addr,
        db_path = %cfg.storage.db_path,
        strict_ids = cfg.storage.strict_ids,
        "starting library api"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("library api stopped");
    Ok(())
}
