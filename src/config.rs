//! Application configuration loaded from environment variables.
//!
//! Token secrets and media host credentials are read once at startup and
//! held in memory for the lifetime of the process.

use std::env;
use std::path::PathBuf;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Which credential store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Cloudinary account credentials.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Allowed browser origin for credentialed CORS requests
    pub cors_origin: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Credential store backend
    pub store_backend: StoreBackend,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: u64,
    /// Whether session cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    /// Directory where incoming files are staged before upload
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size (multipart uploads)
    pub max_upload_bytes: usize,

    // --- Secrets ---
    /// Signing secret for access tokens (raw bytes)
    pub access_token_secret: Vec<u8>,
    /// Signing secret for refresh tokens (raw bytes)
    pub refresh_token_secret: Vec<u8>,
    /// Media host credentials; `None` runs the media host offline
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8000,
            cors_origin: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            access_token_ttl_secs: 15 * SECS_PER_MINUTE,
            refresh_token_ttl_secs: 10 * SECS_PER_DAY,
            cookie_secure: true,
            upload_dir: env::temp_dir().join("streamhub-accounts-test"),
            max_upload_bytes: 10 * 1024 * 1024,
            access_token_secret: b"test_access_secret_32_bytes_min!".to_vec(),
            refresh_token_secret: b"test_refresh_secret_32_bytes_mn!".to_vec(),
            cloudinary: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("firestore") | Err(_) => StoreBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_API_KEY"),
            env::var("CLOUDINARY_API_SECRET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryConfig {
                cloud_name: cloud_name.trim().to_string(),
                api_key: api_key.trim().to_string(),
                api_secret: api_secret.trim().to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            port: parse_or("PORT", 8000)?,
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend,
            access_token_ttl_secs: lifetime_secs("ACCESS_TOKEN_EXPIRY_MINUTES", 15, SECS_PER_MINUTE)?,
            refresh_token_ttl_secs: lifetime_secs("REFRESH_TOKEN_EXPIRY_DAYS", 10, SECS_PER_DAY)?,
            cookie_secure: parse_or("COOKIE_SECURE", true)?,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./public/temp")),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
                .trim()
                .as_bytes()
                .to_vec(),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
                .trim()
                .as_bytes()
                .to_vec(),
            cloudinary,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Read a token lifetime given in `unit_secs` units and convert it to seconds.
///
/// Zero and lifetimes that do not fit a cookie `Max-Age` are rejected.
fn lifetime_secs(name: &'static str, default: u64, unit_secs: u64) -> Result<u64, ConfigError> {
    let count: u64 = parse_or(name, default)?;
    count
        .checked_mul(unit_secs)
        .filter(|&secs| secs > 0 && i64::try_from(secs).is_ok())
        .ok_or(ConfigError::Invalid(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
