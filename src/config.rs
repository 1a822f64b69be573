//! Runtime configuration read from the environment (and `.env`, if present)

use di::{inject, injectable};
use log::warn;
use std::env;
use std::str::FromStr;

pub const DEFAULT_MESSAGE_MAX_LENGTH: usize = 5000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
    /// Shared secret for `POST /api/webhooks/cms`. Unset means the webhook rejects everything.
    pub cms_webhook_secret: Option<String>,
    pub message_max_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite://portal.db?mode=rwc".to_owned(),
            database_max_connections: 5,
            bind_address: "0.0.0.0:3000".to_owned(),
            allowed_origins: vec![
                "http://localhost:3000".to_owned(),
                "http://localhost:5173".to_owned(),
            ],
            cms_webhook_secret: None,
            message_max_length: DEFAULT_MESSAGE_MAX_LENGTH,
        }
    }
}

#[injectable]
impl AppConfig {
    #[inject]
    pub fn create() -> AppConfig {
        dotenvy::dotenv().ok();
        AppConfig::from_env()
    }
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        let defaults = AppConfig::default();

        AppConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            cms_webhook_secret: env::var("CMS_WEBHOOK_SECRET")
                .ok()
                .filter(|secret| !secret.is_empty()),
            message_max_length: parse_var("MESSAGE_MAX_LENGTH")
                .unwrap_or(defaults.message_max_length),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}
