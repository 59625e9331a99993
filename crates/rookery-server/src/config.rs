use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use rookery_core::settings::DEFAULT_TOKEN_TTL_SECS;
use rookery_core::{Limits, Settings};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Server configuration, read from an optional TOML file. Every field has
/// a default, and command-line flags override what the file sets.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub database: PathBuf,
    pub token_ttl_secs: u64,
    /// Allowed CORS origins; `"*"` allows any.
    pub allow_origins: Vec<String>,
    pub limits: Limits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database: PathBuf::from("rookery.db"),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            allow_origins: vec!["http://localhost:3000".to_string()],
            limits: Limits::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            token_ttl_secs: self.token_ttl_secs,
            limits: self.limits.clone(),
        }
    }

    pub fn cors(&self) -> Result<CorsLayer> {
        let methods = [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ];
        if self.allow_origins.iter().any(|o| o == "*") {
            return Ok(CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(Any));
        }

        let mut origins = Vec::with_capacity(self.allow_origins.len());
        for origin in &self.allow_origins {
            origins.push(
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid allowed origin: {origin}"))?,
            );
        }
        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers(Any))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_crypto::Quota;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.limits.login, Quota::new(5, 60));
    }

    #[test]
    fn partial_limits_keep_other_defaults() {
        let config = ServerConfig::parse(
            r#"
            listen = "0.0.0.0:9000"
            token_ttl_secs = 120

            [limits.login]
            limit = 3
            window_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.settings().token_ttl_secs, 120);
        assert_eq!(config.limits.login, Quota::new(3, 30));
        assert_eq!(config.limits.send_message, Quota::new(60, 60));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(ServerConfig::parse("token_ttl_secs = \"soon\"").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rookery.toml");
        std::fs::write(&path, "database = \"/var/lib/rookery/db.sqlite\"\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/rookery/db.sqlite"));
        assert!(ServerConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn cors_accepts_wildcard_and_rejects_bad_origin() {
        let mut config = ServerConfig::default();
        assert!(config.cors().is_ok());
        config.allow_origins = vec!["*".to_string()];
        assert!(config.cors().is_ok());
        config.allow_origins = vec!["bad\norigin".to_string()];
        assert!(config.cors().is_err());
    }
}
