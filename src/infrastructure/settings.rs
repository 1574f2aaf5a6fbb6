//! Runtime settings, read from the environment (and `.env`)

use di::inject;
use di::injectable;
use log::{info, warn};
use sqlx::sqlite::SqliteConnectOptions;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::RwLock;

const DEV_JWT_SECRET: &str = "development-only-secret-change-me";

static TEST_SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub listen_addr: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_timeout_secs: u64,
    pub jwt_secret: String,
    /// Echo freshly generated reset tokens back to the caller of forgot-password.
    pub expose_reset_token: bool,
}

#[injectable]
impl Settings {
    #[inject]
    pub fn create() -> Settings {
        if let Some(settings) = TEST_SETTINGS.read().ok().and_then(|s| s.clone()) {
            return settings;
        }

        Settings::from_env()
    }
}

impl Settings {
    pub fn from_env() -> Settings {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, falling back to the development secret");
            DEV_JWT_SECRET.to_owned()
        });

        Settings {
            database_url: load("DATABASE_URL", "sqlite://chatbot.db?mode=rwc".to_owned()),
            listen_addr: load("LISTEN_ADDR", "0.0.0.0:3000".to_owned()),
            ollama_url: load("OLLAMA_URL", "http://localhost:11434".to_owned()),
            ollama_model: load("OLLAMA_MODEL", "llama-tcs".to_owned()),
            ollama_timeout_secs: load("OLLAMA_TIMEOUT_SECONDS", 30),
            jwt_secret,
            expose_reset_token: load("EXPOSE_RESET_TOKEN", true),
        }
    }

    /// Connect options parsed from `database_url`.
    pub fn database_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        SqliteConnectOptions::from_str(&self.database_url)
    }

    /// Makes every DI-created `Settings` a clone of `settings` until cleared.
    pub fn set_test_settings(settings: Settings) {
        if let Ok(mut slot) = TEST_SETTINGS.write() {
            *slot = Some(settings);
        }
    }

    pub fn clear_test_settings() {
        if let Ok(mut slot) = TEST_SETTINGS.write() {
            *slot = None;
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "sqlite::memory:".to_owned(),
            listen_addr: "127.0.0.1:3000".to_owned(),
            ollama_url: "http://localhost:11434".to_owned(),
            ollama_model: "llama-tcs".to_owned(),
            ollama_timeout_secs: 30,
            jwt_secret: DEV_JWT_SECRET.to_owned(),
            expose_reset_token: true,
        }
    }
}

fn load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value `{raw}`: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
