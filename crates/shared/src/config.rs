//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
    /// Image analysis configuration.
    pub analysis: AnalysisSettings,
    /// Submission rate limiting.
    pub rate_limit: RateLimitSettings,
    /// Submission pipeline limits.
    pub submission: SubmissionSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace() -> u64 {
    10
}

/// Which object storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Local filesystem (development only).
    #[default]
    LocalFs,
    /// S3-compatible storage (GCS interoperability, R2, AWS S3).
    S3,
    /// In-process memory (tests and demos).
    Memory,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind.
    #[serde(default)]
    pub provider: StorageKind,
    /// Bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Root directory for the local filesystem backend.
    #[serde(default = "default_root")]
    pub root: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// S3 region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 access key ID.
    #[serde(default)]
    pub access_key_id: String,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// Lifetime of signed read URLs in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
    /// Public base URL used when the backend cannot presign.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageKind::default(),
            bucket: default_bucket(),
            root: default_root(),
            endpoint: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            signed_url_ttl_secs: default_signed_url_ttl(),
            public_base_url: None,
        }
    }
}

fn default_bucket() -> String {
    "holodeck-art-submissions".to_string()
}

fn default_root() -> String {
    "./storage".to_string()
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_signed_url_ttl() -> u64 {
    3600 // 1 hour
}

/// Image analysis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    /// API key for the analysis endpoint.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_analysis_base_url")]
    pub base_url: String,
    /// Vision model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Completion token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_analysis_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_analysis_timeout(),
        }
    }
}

fn default_analysis_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    100
}

fn default_analysis_timeout() -> u64 {
    30
}

/// Submission rate limiting.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Minimum seconds between two allowed submissions per client.
    #[serde(default = "default_window")]
    pub window_secs: u64,
    /// Seconds after which an idle client record is purged.
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
    /// Seconds between purge sweeps.
    #[serde(default = "default_retention")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: default_window(),
            retention_secs: default_retention(),
            sweep_interval_secs: default_retention(),
        }
    }
}

fn default_window() -> u64 {
    60
}

fn default_retention() -> u64 {
    300 // 5 minutes
}

/// Submission pipeline limits.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionSettings {
    /// Deadline for the storage and analysis branches to both finish.
    #[serde(default = "default_branch_timeout")]
    pub branch_timeout_secs: u64,
    /// Maximum accepted image size in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Maximum multipart body size in bytes.
    #[serde(default = "default_max_form_bytes")]
    pub max_form_bytes: usize,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            branch_timeout_secs: default_branch_timeout(),
            max_image_bytes: default_max_image_bytes(),
            max_form_bytes: default_max_form_bytes(),
        }
    }
}

fn default_branch_timeout() -> u64 {
    60
}

fn default_max_image_bytes() -> usize {
    5 << 20 // 5 MiB
}

fn default_max_form_bytes() -> usize {
    10 << 20 // 10 MiB
}

/// Flat environment variables honoured for deployment compatibility.
const LEGACY_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("BUCKET_NAME", "storage.bucket"),
    ("GCS_BUCKET_NAME", "storage.bucket"),
    ("OPENAI_API_KEY", "analysis.api_key"),
];

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("HOLODECK").separator("__"));

        for (var, key) in LEGACY_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEARED: [(&str, Option<&str>); 5] = [
        ("PORT", None),
        ("BUCKET_NAME", None),
        ("GCS_BUCKET_NAME", None),
        ("OPENAI_API_KEY", None),
        ("RUN_MODE", Some("test-nonexistent")),
    ];

    #[test]
    fn test_defaults() {
        temp_env::with_vars(CLEARED, || {
            let config = AppConfig::load().expect("defaults should load");
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.storage.bucket, "holodeck-art-submissions");
            assert_eq!(config.storage.provider, StorageKind::LocalFs);
            assert_eq!(config.storage.signed_url_ttl_secs, 3600);
            assert_eq!(config.rate_limit.window_secs, 60);
            assert_eq!(config.rate_limit.retention_secs, 300);
            assert_eq!(config.submission.max_image_bytes, 5 * 1024 * 1024);
            assert_eq!(config.submission.max_form_bytes, 10 * 1024 * 1024);
            assert!(config.analysis.api_key.is_empty());
        });
    }

    #[test]
    fn test_legacy_variables_override() {
        temp_env::with_vars(
            [
                ("PORT", Some("9090")),
                ("GCS_BUCKET_NAME", Some("gallery")),
                ("OPENAI_API_KEY", Some("sk-test")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.storage.bucket, "gallery");
                assert_eq!(config.analysis.api_key, "sk-test");
            },
        );
    }

    #[test]
    fn test_prefixed_variables() {
        temp_env::with_vars(
            [
                ("PORT", None),
                ("HOLODECK__RATE_LIMIT__WINDOW_SECS", Some("5")),
                ("HOLODECK__STORAGE__PROVIDER", Some("memory")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.rate_limit.window_secs, 5);
                assert_eq!(config.storage.provider, StorageKind::Memory);
            },
        );
    }

    #[test]
    fn test_empty_legacy_variable_is_ignored() {
        temp_env::with_vars(
            [("PORT", Some("")), ("RUN_MODE", Some("test-nonexistent"))],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 8080);
            },
        );
    }
}
