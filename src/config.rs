use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_STORE_BACKEND: &str = "in-memory";
const DEFAULT_STORAGE_API_URL: &str = "https://firebasestorage.googleapis.com/v0";
const DEFAULT_PLACEHOLDER_IMAGE: &str = "/static/placeholder.png";

pub const STORE_BACKEND_IN_MEMORY: &str = "in-memory";
pub const STORE_BACKEND_FIREBASE: &str = "firebase";

/// Remote document and blob store settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// "in-memory" or "firebase"
    #[serde(default = "default_store_backend")]
    #[validate(custom = "validate_store_backend")]
    pub backend: String,

    /// Realtime Database root, e.g. `https://project.firebaseio.com`
    #[serde(default)]
    pub database_url: Option<String>,

    /// Database secret or ID token, sent as `?auth=` and as a bearer token
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Storage REST endpoint
    #[serde(default = "default_storage_api_url")]
    pub storage_api_url: String,

    /// Storage bucket, e.g. `project.appspot.com`
    #[serde(default)]
    pub storage_bucket: Option<String>,

    /// HTTP client timeout for store calls
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// JSON document tree loaded into the in-memory backend at startup
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            database_url: None,
            auth_token: None,
            storage_api_url: default_storage_api_url(),
            storage_bucket: None,
            request_timeout_secs: default_request_timeout_secs(),
            seed_file: None,
        }
    }
}

impl StoreConfig {
    pub fn is_firebase(&self) -> bool {
        self.backend.eq_ignore_ascii_case(STORE_BACKEND_FIREBASE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Catalogue pipeline and snapshot cache settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1))]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    #[validate(range(min = 1))]
    pub max_page_size: usize,

    /// Lifetime of cached part and BoM snapshots; 0 disables caching
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Returned when a part has no image
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            placeholder_image_url: default_placeholder_image(),
        }
    }
}

impl CatalogConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.cache_ttl_secs))
    }
}

/// PDF export settings
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PdfConfig {
    /// TrueType font with CJK coverage, embedded in Chinese exports
    #[serde(default)]
    pub cjk_font_path: Option<String>,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    #[validate]
    pub store: StoreConfig,

    #[serde(default)]
    #[validate]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub pdf: PdfConfig,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Maximum request body size in bytes (default 10MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Directory with the browser bundle, served at `/`
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl AppConfig {
    /// Creates a configuration with every optional section at its default
    pub fn new(host: String, port: u16, environment: String) -> Self {
        Self {
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            store: StoreConfig::default(),
            catalog: CatalogConfig::default(),
            pdf: PdfConfig::default(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            max_body_size: default_max_body_size(),
            static_dir: None,
        }
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn cjk_font_path(&self) -> Option<PathBuf> {
        self.pdf.cjk_font_path.as_ref().map(PathBuf::from)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.store.is_firebase() {
            let blank = |value: &Option<String>| {
                value.as_deref().map(str::trim).unwrap_or("").is_empty()
            };
            if blank(&self.store.database_url) {
                let mut err = ValidationError::new("database_url_required");
                err.message = Some("Set APP__STORE__DATABASE_URL for the firebase backend".into());
                errors.add("store.database_url", err);
            }
            if blank(&self.store.storage_bucket) {
                let mut err = ValidationError::new("storage_bucket_required");
                err.message = Some("Set APP__STORE__STORAGE_BUCKET for the firebase backend".into());
                errors.add("store.storage_bucket", err);
            }
        }

        if self.catalog.default_page_size > self.catalog.max_page_size {
            let mut err = ValidationError::new("default_page_size");
            err.message = Some("default_page_size must not exceed max_page_size".into());
            errors.add("catalog.default_page_size", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_store_backend() -> String {
    DEFAULT_STORE_BACKEND.to_string()
}

fn default_storage_api_url() -> String {
    DEFAULT_STORAGE_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> usize {
    crate::catalog::DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_placeholder_image() -> String {
    DEFAULT_PLACEHOLDER_IMAGE.to_string()
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn validate_store_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        STORE_BACKEND_IN_MEMORY | STORE_BACKEND_FIREBASE => Ok(()),
        _ => {
            let mut err = ValidationError::new("backend");
            err.message = Some("Must be one of: in-memory, firebase".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("parts_catalog={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Same layering as [`load_config`] with an explicit config directory and profile
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration consistency validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn defaults_apply_without_files() {
        let dir = config_dir(&[]);
        let config = load_config_from(dir.path(), "development").unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.store.backend, STORE_BACKEND_IN_MEMORY);
        assert_eq!(config.catalog.default_page_size, 50);
        assert!(config.is_development());
    }

    #[test]
    fn profile_file_overrides_default_file() {
        let dir = config_dir(&[
            (
                "default.toml",
                r#"
                host = "127.0.0.1"
                port = 9000

                [catalog]
                max_page_size = 200
                "#,
            ),
            (
                "staging.toml",
                r#"
                port = 9100
                cors_allowed_origins = "https://parts.example.com"

                [pdf]
                cjk_font_path = "/fonts/NotoSansSC.ttf"
                "#,
            ),
        ]);
        let config = load_config_from(dir.path(), "staging").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9100);
        assert_eq!(config.environment, "staging");
        assert_eq!(config.catalog.max_page_size, 200);
        assert_eq!(
            config.cjk_font_path(),
            Some(PathBuf::from("/fonts/NotoSansSC.ttf"))
        );
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = config_dir(&[(
            "default.toml",
            r#"
            log_level = "loud"

            [store]
            backend = "postgres"
            "#,
        )]);
        let result = load_config_from(dir.path(), "development");
        assert!(matches!(result, Err(AppConfigError::Validation(_))));
    }
}
