//! Translation catalog backed by YAML or JSON locale trees
//!
//! A catalog maps each locale to a nested tree; dotted keys walk the tree.
//! Leaves are strings, or plural maps keyed by `zero` / `one` / `other`
//! (`others` is read as `other`).
//!
//! Catalogs using the `dependent_restrict.*` and `activerecord.models.*`
//! layout are read too: a key missing under `restrict.` is looked up under
//! `dependent_restrict.`, and `models.` under `activerecord.models.`.
//!
//! ```yaml
//! br:
//!   restrict:
//!     basic_message:
//!       one: "Não pode ser excluído pois um(a) %{name} relacionado(a) foi encontrado(a)"
//!       other: "Não pode ser excluído pois %{count} %{name} relacionados(as) foram encontrados(as)"
//!   models:
//!     order:
//!       one: Pedido
//!       other: Pedidos
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;
use crate::message::{LocalizationProvider, TranslationParams};

/// In-memory translation catalog
#[derive(Debug, Clone, Default)]
pub struct Translations {
    locales: HashMap<String, Value>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document whose top-level keys are locales
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_yaml::from_str(source)?;
        Self::from_document(document)
    }

    /// Parse a JSON document whose top-level keys are locales
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_json::from_str(source)?;
        Self::from_document(document)
    }

    /// Load a catalog file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let translations = if is_json {
            Self::from_json_str(&source)?
        } else {
            Self::from_yaml_str(&source)?
        };

        debug!(
            path = %path.display(),
            locales = translations.locales.len(),
            "Loaded translation catalog"
        );
        Ok(translations)
    }

    fn from_document(document: Value) -> Result<Self, ConfigError> {
        let Value::Object(locales) = document else {
            return Err(ConfigError::Catalog {
                message: "top level must map locales to translation trees".to_string(),
            });
        };

        let mut translations = Self::new();
        for (locale, tree) in locales {
            if !tree.is_object() {
                return Err(ConfigError::Catalog {
                    message: format!("locale '{}' must be a map", locale),
                });
            }
            translations.store(&locale, tree);
        }
        Ok(translations)
    }

    /// Merge `tree` into the translations of `locale`; later values win
    pub fn store(&mut self, locale: &str, tree: Value) {
        let entry = self
            .locales
            .entry(locale.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        deep_merge(entry, tree);
    }

    /// Merge every locale of `other` into this catalog
    pub fn merge(&mut self, other: Translations) {
        for (locale, tree) in other.locales {
            self.store(&locale, tree);
        }
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    /// Raw node at dotted `key` for `locale`
    pub fn lookup(&self, locale: &str, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(self.locales.get(locale)?, |node, segment| node.get(segment))
    }
}

impl LocalizationProvider for Translations {
    fn translate(&self, key: &str, locale: &str, params: &TranslationParams) -> Option<String> {
        let node = self.lookup(locale, key).or_else(|| {
            let legacy = legacy_key(key)?;
            self.lookup(locale, &legacy)
        })?;

        let template = match node {
            Value::String(template) => template.as_str(),
            Value::Object(forms) => plural_form(forms, params.count)?,
            _ => return None,
        };
        Some(params.interpolate(template))
    }
}

/// Same key in the `dependent_restrict` / `activerecord.models` layout
fn legacy_key(key: &str) -> Option<String> {
    if let Some(rest) = key.strip_prefix("restrict.") {
        Some(format!("dependent_restrict.{}", rest))
    } else {
        key.strip_prefix("models.")
            .map(|rest| format!("activerecord.models.{}", rest))
    }
}

fn plural_form(forms: &Map<String, Value>, count: Option<u64>) -> Option<&str> {
    let form = match count {
        Some(0) if forms.contains_key("zero") => "zero",
        Some(1) => "one",
        _ => "other",
    };

    match forms.get(form) {
        Some(value) => value.as_str(),
        None if form == "other" => forms.get("others")?.as_str(),
        None => None,
    }
}

fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}
