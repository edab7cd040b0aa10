use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub token: TokenConfig,
    pub security: SecurityConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

/// Settings consumed by the token issuer: the symmetric signing key and how
/// long issued tokens stay valid.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: SecretString,
    pub lifetime_minutes: i64,
}

impl TokenConfig {
    /// HS256 keys shorter than the hash output size lose security margin.
    pub const MIN_SECRET_BYTES: usize = 32;
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

/// Seed account created at startup so a fresh deployment has one coordinator.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub coordinator_username: String,
    pub coordinator_password: SecretString,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = PortalConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("portal-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            token: TokenConfig {
                // No default: a deployment must supply its own signing key.
                secret: SecretString::new(get_env("PORTAL_TOKEN_SECRET", None, is_prod)?),
                lifetime_minutes: get_env("PORTAL_TOKEN_LIFETIME_MINUTES", Some("60"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            bootstrap: BootstrapConfig {
                coordinator_username: get_env(
                    "PORTAL_BOOTSTRAP_USERNAME",
                    Some("coordinator"),
                    is_prod,
                )?,
                coordinator_password: SecretString::new(get_env(
                    "PORTAL_BOOTSTRAP_PASSWORD",
                    None,
                    is_prod,
                )?),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject unusable configuration before the service starts serving.
    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        let secret = self.token.secret.expose_secret();
        if secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORTAL_TOKEN_SECRET must not be empty"
            )));
        }
        if secret.len() < TokenConfig::MIN_SECRET_BYTES {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORTAL_TOKEN_SECRET must be at least {} bytes",
                TokenConfig::MIN_SECRET_BYTES
            )));
        }

        if self.token.lifetime_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORTAL_TOKEN_LIFETIME_MINUTES must be positive"
            )));
        }

        if self.bootstrap.coordinator_username.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORTAL_BOOTSTRAP_USERNAME must not be empty"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
