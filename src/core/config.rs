use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Location of the SQLite database file
    pub path: PathBuf,
    pub acquire_timeout_secs: u64,
}

/// Local disk storage configuration for uploaded documents
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory the uploaded files are written to (created if absent)
    pub dir: PathBuf,
    /// Maximum accepted file size in bytes
    pub max_file_size: usize,
    /// Also require the payload to start with the `%PDF-` signature
    pub require_pdf_signature: bool,
    /// Offset applied to `created_at` when rendering responses
    pub display_utc_offset_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            upload: UploadConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_ALLOWED_ORIGINS: &'static str = "http://localhost:5173";

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| Self::DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        Ok(Self {
            host,
            port,
            allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

    pub fn from_env() -> Result<Self, String> {
        let path = env::var("DB_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "documents.db".to_string());

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            path: PathBuf::from(path),
            acquire_timeout_secs,
        })
    }
}

impl UploadConfig {
    pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB
    pub const DEFAULT_DISPLAY_UTC_OFFSET_MINUTES: i32 = 5 * 60 + 30; // +05:30

    pub fn from_env() -> Result<Self, String> {
        let dir = env::var("UPLOAD_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "uploads".to_string());

        let max_file_size = env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_FILE_SIZE must be a valid number".to_string())?;

        let require_pdf_signature = env::var("REQUIRE_PDF_SIGNATURE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let display_utc_offset_minutes = env::var("DISPLAY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| Self::DEFAULT_DISPLAY_UTC_OFFSET_MINUTES.to_string())
            .parse::<i32>()
            .map_err(|_| "DISPLAY_UTC_OFFSET_MINUTES must be a valid number".to_string())?;

        // chrono rejects offsets of a day or more
        if display_utc_offset_minutes.abs() >= 24 * 60 {
            return Err("DISPLAY_UTC_OFFSET_MINUTES must be within +/- 1439".to_string());
        }

        Ok(Self {
            dir: PathBuf::from(dir),
            max_file_size,
            require_pdf_signature,
            display_utc_offset_minutes,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Docvault API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "PDF document upload, listing, download and deletion".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

/// Split a comma-separated origin list, dropping blanks
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
