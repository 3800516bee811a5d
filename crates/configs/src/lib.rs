use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://coach.db?mode=rwc";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub static_files: StaticConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Maximum accepted JSON request body, in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            worker_threads: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_body_limit() -> usize { DEFAULT_BODY_LIMIT }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Upper bound for a single store call (read or upsert).
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            op_timeout_secs: default_op_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_database_url() -> String { DEFAULT_DATABASE_URL.into() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_op_timeout() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default = "default_static_dir")]
    pub dir: String,
    /// Serve `index.html` for unmatched non-API paths (client-side routing).
    #[serde(default)]
    pub spa_fallback: bool,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self { dir: default_static_dir(), spa_fallback: false }
    }
}

fn default_static_dir() -> String { "public".into() }

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), apply environment overrides, then
    /// validate. Only a missing file falls back to the defaults.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_and_validate_from(&path)
    }

    pub fn load_and_validate_from(path: &str) -> Result<Self> {
        let mut cfg = match load_from_file(path) {
            Ok(cfg) => cfg,
            // 仅在文件不存在时使用默认配置；解析错误必须上报
            Err(e) if is_not_found(&e) => {
                info!(%path, "config file not found; using defaults");
                AppConfig::default()
            }
            Err(e) => return Err(e.context(format!("failed to load config file {path}"))),
        };
        cfg.apply_env_overrides();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        // 环境变量优先于 TOML
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(e) => warn!(%port, error = %e, "invalid PORT value; keeping configured port"),
            }
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(dir) = std::env::var("STATIC_DIR") {
            self.static_files.dir = dir;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 校验 database（仅支持 sqlite）
        self.database.validate()?;
        if self.static_files.dir.trim().is_empty() {
            self.static_files.dir = default_static_dir();
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        if self.body_limit_bytes == 0 {
            return Err(anyhow!("server.body_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// In-memory database, used by tests.
    pub fn in_memory() -> Self {
        Self { url: "sqlite::memory:".into(), max_connections: 1, min_connections: 1, ..Self::default() }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Filesystem path of the SQLite file, if the URL points at one.
    pub fn sqlite_file(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or_default();
        if path.is_empty() { None } else { Some(PathBuf::from(path)) }
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        if !self.url.to_lowercase().starts_with("sqlite:") {
            return Err(anyhow!("database.url must start with sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 || self.op_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_server() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.body_limit_bytes, 1024 * 1024);
        assert_eq!(cfg.database.url, "sqlite://coach.db?mode=rwc");
        assert_eq!(cfg.static_files.dir, "public");
        assert!(!cfg.static_files.spa_fallback);
    }

    #[test]
    fn partial_toml_fills_defaults() -> Result<()> {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [static_files]
            spa_fallback = true
            "#,
        )?;
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.op_timeout_secs, 5);
        assert!(cfg.static_files.spa_fallback);
        Ok(())
    }

    #[test]
    fn rejects_non_sqlite_url() {
        let db = DatabaseConfig { url: "postgres://localhost/db".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_bad_pool_bounds() {
        let db = DatabaseConfig { min_connections: 4, max_connections: 2, ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { op_timeout_secs: 0, ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_zero_port_and_body_limit() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.server.body_limit_bytes = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn sqlite_file_path_extraction() {
        let db = DatabaseConfig::default();
        assert_eq!(db.sqlite_file(), Some(PathBuf::from("coach.db")));

        let db = DatabaseConfig { url: "sqlite:data/states.db".into(), ..DatabaseConfig::default() };
        assert_eq!(db.sqlite_file(), Some(PathBuf::from("data/states.db")));

        assert_eq!(DatabaseConfig::in_memory().sqlite_file(), None);
        assert!(DatabaseConfig::in_memory().validate().is_ok());
    }

    fn temp_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("configs_test_{}_{}.toml", std::process::id(), contents.len()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let path = temp_config("[server]\nport = \"not-a-port\"\n\n[database]\nurl = \"postgres://x\"\n");
        let res = AppConfig::load_and_validate_from(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        assert!(res.is_err());
    }

    #[test]
    fn invalid_values_in_config_file_are_an_error() {
        let path = temp_config("[database]\nurl = \"postgres://localhost/db\"\n");
        let res = AppConfig::load_and_validate_from(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        assert!(res.is_err());
    }

    #[test]
    fn missing_config_file_uses_defaults() -> Result<()> {
        let cfg = AppConfig::load_and_validate_from("/nonexistent-dir/config.toml")?;
        assert!(!cfg.static_files.spa_fallback);
        assert!(cfg.database.validate().is_ok());
        Ok(())
    }
}
