//! Configuration management for the Barn Tracker server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BARN__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::GpsCoordinates;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Bearer token verification
    pub auth: AuthConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Location of the barn, used when a request carries no coordinates
    pub barn: BarnConfig,

    /// Hosted model APIs for journal analysis
    pub ai: AiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC secret the identity provider signs tokens with
    pub secret: String,

    /// Expected `iss` claim, unchecked when unset
    pub issuer: Option<String>,

    /// Expected `aud` claim, unchecked when unset
    pub audience: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BarnConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl BarnConfig {
    pub fn coordinates(&self) -> GpsCoordinates {
        GpsCoordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Gemini REST endpoint, e.g. https://generativelanguage.googleapis.com/v1beta
    pub gemini_endpoint: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    /// OpenAI-compatible transcription endpoint
    pub whisper_endpoint: String,
    pub whisper_api_key: Option<String>,
    pub whisper_model: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("BARN_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("weather.api_endpoint", "https://api.openweathermap.org/data/2.5")?
            .set_default("barn.latitude", 32.9427)?
            .set_default("barn.longitude", -117.1837)?
            .set_default(
                "ai.gemini_endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("ai.gemini_model", "gemini-1.5-flash")?
            .set_default("ai.whisper_endpoint", "https://api.openai.com/v1")?
            .set_default("ai.whisper_model", "whisper-1")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BARN__ prefix)
            .add_source(
                Environment::with_prefix("BARN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
