use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "CropAI";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DATA_DIR_ENV: &str = "CROPAI_DATA_DIR";
pub const WEB_DIR_ENV: &str = "CROPAI_WEB_DIR";
pub const BIND_ENV: &str = "CROPAI_BIND";
pub const MAX_UPLOAD_ENV: &str = "CROPAI_MAX_UPLOAD_MB";

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

const DATABASE_FILE: &str = "app.db";

/// Get the application data directory
/// ~/CropAI/ unless an override (`CROPAI_DATA_DIR`) is given
pub fn app_data_dir(override_dir: Option<String>) -> PathBuf {
    match override_dir.filter(|d| !d.trim().is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME),
    }
}

/// Default `tracing` filter, overridden by `RUST_LOG`.
pub fn default_log_filter() -> String {
    "cropai_lib=info,tower_http=info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address '{value}': {reason}")]
    InvalidBind { value: String, reason: String },
    #[error("Invalid upload limit '{0}': expected a positive number of megabytes")]
    InvalidUploadLimit(String),
}

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub web_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidBind {
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let data_dir = app_data_dir(lookup(DATA_DIR_ENV));
        let web_dir = lookup(WEB_DIR_ENV)
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("web"));

        let max_upload_mb = match lookup(MAX_UPLOAD_ENV) {
            None => DEFAULT_MAX_UPLOAD_MB,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(mb) if mb > 0 => mb,
                _ => return Err(ConfigError::InvalidUploadLimit(raw)),
            },
        };

        Ok(Self {
            bind,
            data_dir,
            web_dir,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }

    /// Settings rooted at `data_dir`, bound to an ephemeral localhost port.
    pub fn for_data_dir(data_dir: PathBuf) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            web_dir: data_dir.join("web"),
            data_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_defaults_under_home() {
        let dir = app_data_dir(None);
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("CropAI"));
    }

    #[test]
    fn blank_override_is_ignored() {
        assert!(app_data_dir(Some("  ".into())).ends_with("CropAI"));
        assert_eq!(app_data_dir(Some("/srv/cropai".into())), PathBuf::from("/srv/cropai"));
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert!(config.web_dir.starts_with(&config.data_dir));
    }

    #[test]
    fn environment_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (BIND_ENV, "0.0.0.0:9000"),
            (DATA_DIR_ENV, "/srv/cropai"),
            (WEB_DIR_ENV, "/srv/web"),
            (MAX_UPLOAD_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database_path(), PathBuf::from("/srv/cropai/app.db"));
        assert_eq!(config.storage_dir(), PathBuf::from("/srv/cropai/storage"));
        assert_eq!(config.web_dir, PathBuf::from("/srv/web"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn invalid_bind_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[(BIND_ENV, "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind { .. }));
    }

    #[test]
    fn zero_upload_limit_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[(MAX_UPLOAD_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUploadLimit(_)));
    }

    #[test]
    fn log_filter_names_crate() {
        assert!(default_log_filter().contains("cropai_lib=info"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
