//! Configuration module
//!
//! Runtime settings for the batch upload pipeline and the API client, read
//! from `ARTDROP_*` environment variables with sensible defaults. All
//! values are captured once at startup; components copy what they need at
//! construction time.

use std::env;
use std::time::Duration;

// Default limits
const MAX_FILES: usize = 50;
const UPLOAD_BATCH_SIZE: usize = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const UNDO_WINDOW_MS: u64 = 8_000;
const SLOW_LATENCY_MS: u64 = 1_000;
const MAX_FILE_SIZE_MB: u64 = 25;
const DEFAULT_API_URL: &str = "http://localhost:4000";
const DEFAULT_ALLOWED_CONTENT_TYPES: &str =
    "image/jpeg,image/png,image/gif,image/webp,video/mp4,video/webm";

/// Uploader configuration
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Hard cap on batch occupancy. Intake truncates beyond this.
    pub max_files: usize,
    /// Files per request in an upload run.
    pub upload_batch_size: usize,
    pub request_timeout_secs: u64,
    /// How long a removed file can be restored.
    pub undo_window_ms: u64,
    /// Round-trip latency above which the connection counts as slow.
    pub slow_latency_ms: u64,
    pub max_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    /// Third-party random name endpoint. Local fallback is used when unset
    /// or unreachable.
    pub name_service_url: Option<String>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            max_files: MAX_FILES,
            upload_batch_size: UPLOAD_BATCH_SIZE,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            undo_window_ms: UNDO_WINDOW_MS,
            slow_latency_ms: SLOW_LATENCY_MS,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            name_service_url: None,
        }
    }
}

impl UploaderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_url: env::var("ARTDROP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: env::var("ARTDROP_API_KEY").ok().filter(|s| !s.is_empty()),
            max_files: env::var("ARTDROP_MAX_FILES")
                .unwrap_or_else(|_| MAX_FILES.to_string())
                .parse()
                .unwrap_or(MAX_FILES),
            upload_batch_size: env::var("ARTDROP_UPLOAD_BATCH_SIZE")
                .unwrap_or_else(|_| UPLOAD_BATCH_SIZE.to_string())
                .parse()
                .unwrap_or(UPLOAD_BATCH_SIZE),
            request_timeout_secs: env::var("ARTDROP_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            undo_window_ms: env::var("ARTDROP_UNDO_WINDOW_MS")
                .unwrap_or_else(|_| UNDO_WINDOW_MS.to_string())
                .parse()
                .unwrap_or(UNDO_WINDOW_MS),
            slow_latency_ms: env::var("ARTDROP_SLOW_LATENCY_MS")
                .unwrap_or_else(|_| SLOW_LATENCY_MS.to_string())
                .parse()
                .unwrap_or(SLOW_LATENCY_MS),
            max_file_size_bytes: env::var("ARTDROP_MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_FILE_SIZE_MB)
                * 1024
                * 1024,
            allowed_content_types: env::var("ARTDROP_ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_CONTENT_TYPES.to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            name_service_url: env::var("ARTDROP_NAME_SERVICE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "ARTDROP_API_URL must be an http(s) URL, got '{}'",
                self.api_url
            ));
        }
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("ARTDROP_MAX_FILES must be at least 1"));
        }
        if self.upload_batch_size == 0 {
            return Err(anyhow::anyhow!(
                "ARTDROP_UPLOAD_BATCH_SIZE must be at least 1"
            ));
        }
        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ARTDROP_ALLOWED_CONTENT_TYPES must list at least one type"
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }

    pub fn slow_latency(&self) -> Duration {
        Duration::from_millis(self.slow_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UploaderConfig::default();
        assert_eq!(config.max_files, 50);
        assert_eq!(config.upload_batch_size, 10);
        assert_eq!(config.undo_window(), Duration::from_millis(8_000));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_file_size_bytes, 25 * 1024 * 1024);
        assert!(config
            .allowed_content_types
            .contains(&"image/png".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = UploaderConfig {
            upload_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = UploaderConfig {
            api_url: "localhost:4000".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = UploaderConfig {
            max_files: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
