use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub security: SecurityConfig,

    pub branding: BrandingConfig,

    pub verification: VerificationConfig,

    #[serde(default)]
    pub s3: S3Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    pub log_level: String,

    /// Anything other than "production" exposes password-reset tokens in the
    /// reset response for local testing.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            log_level: "info,sqlx=warn".to_string(),
            environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:corehr.db".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 signing secret. Override with `COREHR_JWT_SECRET` in production.
    pub jwt_secret: String,

    pub access_token_expire_minutes: i64,

    pub password_reset_expire_minutes: i64,

    /// Argon2 memory cost in KiB.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations).
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            access_token_expire_minutes: 480,
            password_reset_expire_minutes: 60,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    pub project_name: String,

    pub employer_legal_name: String,

    pub base_url: String,

    /// IANA zone used when stamping generated timestamps onto PDFs.
    pub time_zone: String,

    /// Short label appended to footer timestamps, e.g. "PT".
    pub time_zone_label: String,

    /// Leading token of generated filenames:
    /// `{prefix}_PAYSTUB_{SURNAME}_{YYYYMMDD}.pdf`.
    pub filename_prefix: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            project_name: "CoreHR".to_string(),
            employer_legal_name: "Example Employer LLC".to_string(),
            base_url: "https://corehr.example.com".to_string(),
            time_zone: "America/Los_Angeles".to_string(),
            time_zone_label: "PT".to_string(),
            filename_prefix: "EMPLOYER".to_string(),
        }
    }
}

/// Who signs employment-verification letters and how verifiers reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub signer_name: String,

    pub signer_title: String,

    /// Credentials shown after the signer name, e.g. "SPHR". Empty means none.
    pub signer_credentials: String,

    pub signer_email: String,

    pub phone: Option<String>,

    pub fax: Option<String>,

    /// Centered address line in the letter footer.
    pub footer_address: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            signer_name: "Jordan Reyes".to_string(),
            signer_title: "Director of People Operations".to_string(),
            signer_credentials: String::new(),
            signer_email: "hr@example.com".to_string(),
            phone: None,
            fax: None,
            footer_address: "100 Main Street, Suite 400, Portland, OR 97204".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Unset bucket means the blob store is unconfigured; endpoints that need
    /// it fail with a configuration error rather than a missing-object error.
    pub bucket: Option<String>,

    pub region: Option<String>,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    /// Custom endpoint for S3-compatible stores (MinIO etc.).
    pub endpoint_url: Option<String>,
}

impl S3Config {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.bucket.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            security: SecurityConfig::default(),
            branding: BrandingConfig::default(),
            verification: VerificationConfig::default(),
            s3: S3Config::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path).map(Self::with_env_overrides);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default().with_env_overrides())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets are taken from the environment when present so they never have
    /// to live in the config file.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("COREHR_DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("COREHR_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("COREHR_S3_BUCKET") {
            self.s3.bucket = Some(v);
        }
        if let Ok(v) = std::env::var("COREHR_S3_REGION") {
            self.s3.region = Some(v);
        }
        if let Ok(v) = std::env::var("COREHR_S3_ACCESS_KEY_ID") {
            self.s3.access_key_id = Some(v);
        }
        if let Ok(v) = std::env::var("COREHR_S3_SECRET_ACCESS_KEY") {
            self.s3.secret_access_key = Some(v);
        }
        if let Ok(v) = std::env::var("COREHR_S3_ENDPOINT_URL") {
            self.s3.endpoint_url = Some(v);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.environment == "production" && self.security.jwt_secret == "change-me" {
            anyhow::bail!("COREHR_JWT_SECRET must be set in production");
        }
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("corehr").join("config.toml"));
        }

        paths
    }
}
