//! Configuration module for proxyrr.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::context::DEFAULT_API_PREFIX;
use crate::environment::VariableSpec;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    pub auth: AuthConfig,
    /// Environment variables handlers may read.
    #[serde(default)]
    pub environment: Vec<VariableSpec>,
}

/// Local server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Prefix preceding the resource segment in request paths.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

/// Authorizer emulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "default_token_duration_hours")]
    pub token_duration_hours: i64,
}

fn default_jwt_issuer() -> String {
    "proxyrr".to_string()
}

fn default_token_duration_hours() -> i64 {
    24
}

impl Settings {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`PROXYRR__*`, `__` between nested keys,
    ///    e.g. `PROXYRR__AUTH__JWT_SECRET`)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment_source())
            .build()?;

        config.try_deserialize()
    }
}

/// `PROXYRR__` variables. The separator also follows the prefix.
fn environment_source() -> Environment {
    Environment::with_prefix("PROXYRR")
        .separator("__")
        .try_parsing(true)
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
        }
    }
}
