use std::{env, path::PathBuf};

use thiserror::Error;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9070;

const DEFAULT_TEMP_DIR: &str = "./public/temp";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),
    #[error("Environment variable {0} has an invalid value")]
    Invalid(&'static str),
}

/// Server configuration, read from the environment at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// Base url of the media service uploads are forwarded to
    pub media_url: String,
    /// Scratch directory where multipart uploads land before forwarding
    pub temp_dir: PathBuf,
    pub cors_origin: String,
    /// Enables Secure and SameSite=None on auth cookies
    pub production: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PLAYSYNC_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PLAYSYNC_PORT"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            database_url: require("DATABASE_URL")?,
            access_token_secret: require("PLAYSYNC_ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: require("PLAYSYNC_REFRESH_TOKEN_SECRET")?,
            media_url: require("PLAYSYNC_MEDIA_URL")?,
            temp_dir: env::var("PLAYSYNC_TEMP_DIR")
                .unwrap_or_else(|_| DEFAULT_TEMP_DIR.to_string())
                .into(),
            cors_origin: env::var("PLAYSYNC_CORS_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string()),
            production: env::var("PLAYSYNC_PRODUCTION")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}
