//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default model attached to agents created by the wizard.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default token limit attached to agents created by the wizard.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default per-file upload cap, in megabytes.
pub const DEFAULT_MAX_FILE_MB: u64 = 10;

/// Default idle time before an open wizard session is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Wizard configuration: defaults for fields the wizard does not collect.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Owner recorded on created agents and drafts.
    pub user_id: String,
    /// Model name sent with every create-agent request.
    pub model: String,
    /// Token limit sent with every create-agent request.
    pub max_tokens: u32,
    /// Per-file size cap for knowledge uploads.
    pub max_file_bytes: u64,
    /// Sessions untouched for longer than this are evicted from the registry.
    pub session_ttl: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            user_id: "default".to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_file_bytes: DEFAULT_MAX_FILE_MB * 1024 * 1024,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl WizardConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let user_id = std::env::var("AGENT_STUDIO_USER_ID").unwrap_or(defaults.user_id);
        let model = std::env::var("AGENT_STUDIO_MODEL").unwrap_or(defaults.model);
        let max_tokens = parse_env("AGENT_STUDIO_MAX_TOKENS")?.unwrap_or(defaults.max_tokens);
        let max_file_bytes = match parse_env::<u64>("AGENT_STUDIO_MAX_FILE_MB")? {
            Some(mb) => megabytes_to_bytes("AGENT_STUDIO_MAX_FILE_MB", mb)?,
            None => defaults.max_file_bytes,
        };
        let session_ttl = parse_env("AGENT_STUDIO_SESSION_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_ttl);

        if max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AGENT_STUDIO_MAX_TOKENS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            user_id,
            model,
            max_tokens,
            max_file_bytes,
            session_ttl,
        })
    }
}

/// Service configuration for the binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the REST surface.
    pub port: u16,
    /// libSQL database path. `None` selects the in-memory mock store.
    pub db_path: Option<PathBuf>,
    /// Simulated round-trip latency for the mock store.
    pub mock_latency: Duration,
    /// Directory for rolling log files (stderr only when unset).
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8090,
            db_path: None,
            mock_latency: Duration::from_millis(300),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_env("AGENT_STUDIO_PORT")?.unwrap_or(defaults.port);
        let db_path = std::env::var("AGENT_STUDIO_DB_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let mock_latency = parse_env("AGENT_STUDIO_MOCK_LATENCY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.mock_latency);
        let log_dir = std::env::var("AGENT_STUDIO_LOG_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            db_path,
            mock_latency,
            log_dir,
        })
    }
}

fn megabytes_to_bytes(key: &str, mb: u64) -> Result<u64, ConfigError> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{mb} MB does not fit in a byte count"),
        })
}

/// Read and parse an optional environment variable.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}
