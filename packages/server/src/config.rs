use std::path::PathBuf;

use classifier::ClassifierConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Key used to sign OAuth `state` tokens.
    pub secret: String,
    pub session_ttl_hours: i64,
    /// Mark session and flash cookies `Secure`. Enable behind HTTPS.
    pub secure_cookies: bool,
}

/// OAuth identity provider endpoints and client credentials.
///
/// Defaults target GitHub.
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    /// Absolute URL of this app's `/login` route, registered with the provider.
    pub redirect_url: String,
    pub scope: String,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    /// Request body ceiling for uploads, in bytes.
    pub max_upload_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub oauth: OAuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PIXBOARD_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://pixboard.db?mode=rwc")?
            .set_default("auth.session_ttl_hours", 24 * 7)?
            .set_default("auth.secure_cookies", false)?
            .set_default("oauth.authorize_url", "https://github.com/login/oauth/authorize")?
            .set_default("oauth.token_url", "https://github.com/login/oauth/access_token")?
            .set_default("oauth.profile_url", "https://api.github.com/user")?
            .set_default("oauth.redirect_url", "http://127.0.0.1:3000/login")?
            .set_default("oauth.scope", "read:user")?
            .set_default("oauth.user_agent", "pixboard")?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("storage.max_upload_size", 16 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., PIXBOARD__OAUTH__CLIENT_SECRET)
            .add_source(Environment::with_prefix("PIXBOARD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
