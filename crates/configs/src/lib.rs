use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 3000, worker_threads: Some(4) }
    }
}

/// Settings for the JSON document holding the book collection.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub pretty: bool,
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,
    /// Type-matched id comparison and duplicate-id rejection on create.
    #[serde(default)]
    pub strict_ids: bool,
    /// Report 404 from replace/delete when no book matched.
    #[serde(default)]
    pub missing_is_not_found: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            pretty: false,
            ready_timeout_ms: default_ready_timeout(),
            strict_ids: false,
            missing_is_not_found: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_docs")]
    pub docs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { static_dir: default_static_dir(), docs: default_docs() }
    }
}

fn default_db_path() -> String { "db.json".to_string() }
fn default_ready_timeout() -> u64 { 5000 }
fn default_static_dir() -> String { "public".to_string() }
fn default_docs() -> bool { true }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file first; when it is missing or unreadable, build from env vars.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_else(|_| Self::from_env());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("SERVER_PORT") {
            cfg.server.port = port;
        }
        if let Some(w) = env_parse::<usize>("TOKIO_WORKER_THREADS") {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(path) = std::env::var("BOOKS_DB_PATH") {
            cfg.storage.db_path = path;
        }
        if let Some(strict) = env_parse::<bool>("BOOKS_STRICT_IDS") {
            cfg.storage.strict_ids = strict;
        }
        if let Some(v) = env_parse::<bool>("BOOKS_MISSING_IS_NOT_FOUND") {
            cfg.storage.missing_is_not_found = v;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(anyhow!("storage.db_path is empty; set it in config.toml or BOOKS_DB_PATH"));
        }
        if self.ready_timeout_ms == 0 {
            return Err(anyhow!(
                "storage.ready_timeout_ms must be a positive number of milliseconds"
            ));
        }
        Ok(())
    }
}
