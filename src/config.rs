use serde::Deserialize;

/// File extensions accepted into a session's image list (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Number of images requested when the client omits `limit`.
pub const DEFAULT_LIMIT: usize = 10;

/// Results per search page requested from the provider.
pub const SEARCH_PAGE_SIZE: usize = 35;

/// Per-request timeout for provider and image downloads, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 60;

/// Interval between expiry sweeps when a session TTL is configured, in seconds.
pub const EXPIRY_SWEEP_INTERVAL_SECS: u64 = 60;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind address for the HTTP server.
    pub host: String,
    /// Bind port for the HTTP server.
    pub port: u16,
    /// Directory that receives completed zip archives.
    pub archive_dir: String,
    /// Root directory holding one staging subdirectory per session.
    pub staging_dir: String,
    /// Optional session time-to-live in seconds. When set, a background
    /// sweeper removes sessions (and their staging directories) older than
    /// this. Off by default to match the manual-cleanup behavior.
    pub session_ttl_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            archive_dir: "downloads".to_string(),
            staging_dir: "temp_images".to_string(),
            session_ttl_secs: None,
        }
    }
}

impl AppConfig {
    /// Build a config from `PICBUNDLE_*` environment variables, falling back
    /// to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("PICBUNDLE_HOST") {
            if !host.trim().is_empty() {
                cfg.host = host;
            }
        }
        if let Some(port) = env_parse::<u16>("PICBUNDLE_PORT") {
            cfg.port = port;
        }
        if let Ok(dir) = std::env::var("PICBUNDLE_ARCHIVE_DIR") {
            if !dir.trim().is_empty() {
                cfg.archive_dir = dir;
            }
        }
        if let Ok(dir) = std::env::var("PICBUNDLE_STAGING_DIR") {
            if !dir.trim().is_empty() {
                cfg.staging_dir = dir;
            }
        }
        cfg.session_ttl_secs = env_parse::<u64>("PICBUNDLE_SESSION_TTL_SECS");
        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
