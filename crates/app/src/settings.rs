//! Handles settings for the application.
//!
//! Values are read from `config/settings.toml` when present, then from
//! environment variables named `EXPENSE__<SECTION>__<KEY>` (for example
//! `EXPENSE__TELEGRAM__TOKEN`). See `config/settings.example.toml`.

use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use engine::Mode;
use serde::Deserialize;
use server::ServerConfig;
use telegram_bot::{BotConfig, DEFAULT_TIMEOUT};

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    pub admin_chat_id: Option<i64>,
    pub webhook_secret: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub mode: Mode,
}

impl Telegram {
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Locale {
    pub timezone: Option<String>,
    pub currency: Option<String>,
    pub date_format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub database: Database,
    #[serde(default)]
    pub server: Server,
    pub telegram: Telegram,
    #[serde(default)]
    pub locale: Locale,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("EXPENSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn bot_config(&self) -> Result<BotConfig, ConfigError> {
        let defaults = BotConfig::default();
        let timezone = match &self.locale.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|err| ConfigError::Message(format!("locale.timezone: {err}")))?,
            None => defaults.timezone,
        };

        Ok(BotConfig {
            admin_chat_id: self.telegram.admin_chat_id,
            mode: self.telegram.mode,
            timezone,
            currency: self.locale.currency.clone().unwrap_or(defaults.currency),
            date_format: self
                .locale
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            bind: self.server.bind.clone().unwrap_or(defaults.bind),
            port: self.server.port.unwrap_or(defaults.port),
            path: self.server.path.clone().unwrap_or(defaults.path),
            secret: self.telegram.webhook_secret.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_settings_fill_defaults() {
        let settings = parse(
            r#"
            database = "memory"

            [telegram]
            token = "123:abc"
            "#,
        );

        assert!(matches!(settings.database, Database::Memory));
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.telegram.timeout(), Duration::from_secs(10));

        let bot = settings.bot_config().unwrap();
        assert_eq!(bot.mode, Mode::Explicit);
        assert_eq!(bot.currency, "€");

        let server = settings.server_config();
        assert_eq!(server.path, "/webhook");
        assert_eq!(server.secret, None);
    }

    #[test]
    fn full_settings_are_honoured() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [database]
            sqlite = "expenses.db"

            [server]
            bind = "0.0.0.0"
            port = 8443
            path = "/hook"

            [telegram]
            token = "123:abc"
            admin_chat_id = 875276202
            webhook_secret = "s3cret"
            timeout_secs = 3
            mode = "legacy"

            [locale]
            timezone = "America/New_York"
            currency = "$"
            date_format = "%m/%d/%Y"
            "#,
        );

        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "expenses.db"));
        let bot = settings.bot_config().unwrap();
        assert_eq!(bot.mode, Mode::Legacy);
        assert_eq!(bot.admin_chat_id, Some(875276202));
        assert_eq!(bot.timezone, chrono_tz::America::New_York);
        assert_eq!(settings.telegram.timeout(), Duration::from_secs(3));

        let server = settings.server_config();
        assert_eq!(server.port, 8443);
        assert_eq!(server.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let settings = parse(
            r#"
            database = "memory"
            [telegram]
            token = "t"
            [locale]
            timezone = "Mars/Olympus"
            "#,
        );
        assert!(settings.bot_config().is_err());
    }
}
