//! Restriction configuration loaded from the environment

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::ConfigError;
use crate::message::{MessageFormatter, DEFAULT_LOCALE};
use crate::translations::Translations;

pub const LOCALE_ENV: &str = "ELIF_RESTRICT_LOCALE";
pub const TRANSLATIONS_ENV: &str = "ELIF_RESTRICT_TRANSLATIONS";

/// Restriction message configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictConfig {
    /// Locale used for blocked-delete messages
    pub locale: String,
    /// Optional YAML or JSON translation catalog
    pub translations_path: Option<PathBuf>,
}

impl RestrictConfig {
    pub fn new() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            translations_path: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_translations(mut self, path: impl Into<PathBuf>) -> Self {
        self.translations_path = Some(path.into());
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(locale) = env::var(LOCALE_ENV) {
            config.locale = locale.trim().to_string();
        }

        if let Ok(path) = env::var(TRANSLATIONS_ENV) {
            if !path.trim().is_empty() {
                config.translations_path = Some(PathBuf::from(path.trim()));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_locale = !self.locale.is_empty()
            && self
                .locale
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid_locale {
            return Err(ConfigError::InvalidValue {
                field: LOCALE_ENV.to_string(),
                value: self.locale.clone(),
                expected: "a locale tag such as en, br or pt-BR".to_string(),
            });
        }

        Ok(())
    }

    /// Load the configured catalog, if any
    pub fn load_translations(&self) -> Result<Option<Translations>, ConfigError> {
        self.translations_path
            .as_ref()
            .map(Translations::from_path)
            .transpose()
    }

    /// Formatter for the configured locale and catalog
    pub fn build_formatter(&self) -> Result<MessageFormatter, ConfigError> {
        self.validate()?;

        let formatter = MessageFormatter::new().with_locale(self.locale.clone());
        let formatter = match self.load_translations()? {
            Some(translations) => formatter.with_provider(Arc::new(translations)),
            None => formatter,
        };

        info!(locale = %self.locale, catalog = ?self.translations_path, "Restriction messages configured");
        Ok(formatter)
    }
}

impl Default for RestrictConfig {
    fn default() -> Self {
        Self::new()
    }
}
