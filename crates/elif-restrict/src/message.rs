//! Message formatting for blocked deletes
//!
//! Builds the one-line summary and the detailed listing carried by
//! [`BlockedDeletionError`]. Wording comes from an injectable
//! [`LocalizationProvider`]; without one (or when a key is missing) the
//! English fallback below is used.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::descriptor::AssociationDescriptor;
use crate::error::BlockedDeletionError;
use crate::evaluator::DependencyCheckResult;
use crate::host::{DependentRow, RecordKey};

/// Maximum number of entries in a blocked-delete sample
pub const SAMPLE_LIMIT: usize = 5;

/// Locale used when none is configured
pub const DEFAULT_LOCALE: &str = "en";

pub const BASIC_MESSAGE_KEY: &str = "restrict.basic_message";
pub const AND_MORE_KEY: &str = "restrict.detailed_message.and_more";
pub const INCLUDES_KEY: &str = "restrict.detailed_message.includes";
pub const MODELS_SCOPE: &str = "models";

/// One line of the blocked-record listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleEntry {
    Dependent { key: RecordKey, label: String },
    /// Stands in for the records not listed; `remaining` is `count - 4`
    More { remaining: u64 },
}

impl SampleEntry {
    /// Cap fetched rows to [`SAMPLE_LIMIT`] entries, replacing the last slot
    /// with a "more" marker when `count` exceeds the limit.
    pub fn from_rows(rows: Vec<DependentRow>, count: u64) -> Vec<SampleEntry> {
        let limit = SAMPLE_LIMIT as u64;
        let mut entries: Vec<SampleEntry> = rows
            .into_iter()
            .take(SAMPLE_LIMIT)
            .map(|row| SampleEntry::Dependent {
                key: row.key,
                label: row.label,
            })
            .collect();

        if count > limit {
            let marker = SampleEntry::More {
                remaining: count - (limit - 1),
            };
            if entries.len() == SAMPLE_LIMIT {
                entries[SAMPLE_LIMIT - 1] = marker;
            } else {
                entries.push(marker);
            }
        }

        entries
    }
}

/// Values interpolated into translated strings as `%{count}` / `%{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationParams {
    pub count: Option<u64>,
    pub name: Option<String>,
}

impl TranslationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace `%{count}` and `%{name}` placeholders in `template`
    pub fn interpolate(&self, template: &str) -> String {
        let mut out = template.to_string();
        if let Some(count) = self.count {
            out = out.replace("%{count}", &count.to_string());
        }
        if let Some(ref name) = self.name {
            out = out.replace("%{name}", name);
        }
        out
    }
}

/// Source of localized strings
pub trait LocalizationProvider: Send + Sync {
    /// Interpolated translation of `key` for `locale`, or `None` when no
    /// translation is configured. Plural forms are chosen from
    /// `params.count`.
    fn translate(&self, key: &str, locale: &str, params: &TranslationParams) -> Option<String>;
}

/// Renders blocked-delete messages for the active locale
pub struct MessageFormatter {
    provider: Option<Arc<dyn LocalizationProvider>>,
    locale: RwLock<String>,
}

impl MessageFormatter {
    /// English fallback formatter without a provider
    pub fn new() -> Self {
        Self {
            provider: None,
            locale: RwLock::new(DEFAULT_LOCALE.to_string()),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn LocalizationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_locale(self, locale: impl Into<String>) -> Self {
        self.set_locale(locale);
        self
    }

    pub fn locale(&self) -> String {
        match self.locale.read() {
            Ok(locale) => locale.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Switch the default locale for subsequent messages.
    ///
    /// Shared by every thread using this formatter; pass a locale to the
    /// `*_in` methods for a per-call choice.
    pub fn set_locale(&self, locale: impl Into<String>) {
        let locale = locale.into();
        match self.locale.write() {
            Ok(mut current) => *current = locale,
            Err(poisoned) => *poisoned.into_inner() = locale,
        }
    }

    fn translate(&self, locale: &str, key: &str, params: &TranslationParams) -> Option<String> {
        let provider = self.provider.as_ref()?;
        provider.translate(key, locale, params)
    }

    /// Count-aware display name of `target_type`, lower-cased for use
    /// inside a sentence.
    pub fn display_name(&self, target_type: &str, count: u64) -> String {
        self.display_name_in(&self.locale(), target_type, count)
    }

    /// [`display_name`](Self::display_name) for an explicit locale
    pub fn display_name_in(&self, locale: &str, target_type: &str, count: u64) -> String {
        let key = format!("{}.{}", MODELS_SCOPE, underscore(target_type));
        let params = TranslationParams::new().with_count(count);

        let name = self.translate(locale, &key, &params).unwrap_or_else(|| {
            let human = humanize(target_type);
            if count == 1 {
                human
            } else {
                pluralize(&human)
            }
        });

        name.to_lowercase()
    }

    /// One-line summary: singular wording for one dependent, counted plural
    /// wording otherwise.
    pub fn format_basic(&self, target_type: &str, count: u64) -> String {
        self.format_basic_in(&self.locale(), target_type, count)
    }

    pub fn format_basic_in(&self, locale: &str, target_type: &str, count: u64) -> String {
        let name = self.display_name_in(locale, target_type, count);
        let params = TranslationParams::new().with_count(count).with_name(&name);

        self.translate(locale, BASIC_MESSAGE_KEY, &params)
            .unwrap_or_else(|| fallback_basic_message(&name, count))
    }

    /// Summary, a two-blank-line separator, the includes header and one
    /// line per sample entry.
    pub fn format_detailed(&self, basic: &str, sample: &[SampleEntry]) -> String {
        self.format_detailed_in(&self.locale(), basic, sample)
    }

    pub fn format_detailed_in(&self, locale: &str, basic: &str, sample: &[SampleEntry]) -> String {
        let includes = self
            .translate(locale, INCLUDES_KEY, &TranslationParams::new())
            .unwrap_or_else(|| "These include".to_string());

        let lines: Vec<String> = sample
            .iter()
            .map(|entry| match entry {
                SampleEntry::Dependent { key, label } => format!("{}: {}", key, label),
                SampleEntry::More { remaining } => {
                    let params = TranslationParams::new().with_count(*remaining);
                    let more = self
                        .translate(locale, AND_MORE_KEY, &params)
                        .unwrap_or_else(|| format!("and {} more", remaining));
                    format!("...{}", more)
                }
            })
            .collect();

        format!("{}\n\n\n{}:\n{}", basic, includes, lines.join("\n"))
    }

    /// Build the error payload for a blocked association
    pub fn blocked_error(
        &self,
        descriptor: &AssociationDescriptor,
        result: DependencyCheckResult,
    ) -> BlockedDeletionError {
        self.blocked_error_in(&self.locale(), descriptor, result)
    }

    /// Build the error payload with messages in `locale`, leaving the
    /// formatter's own locale untouched
    pub fn blocked_error_in(
        &self,
        locale: &str,
        descriptor: &AssociationDescriptor,
        result: DependencyCheckResult,
    ) -> BlockedDeletionError {
        let display_name = self.display_name_in(locale, &descriptor.target_type, result.count);
        let basic = self.format_basic_in(locale, &descriptor.target_type, result.count);
        let detailed = self.format_detailed_in(locale, &basic, &result.sample);

        BlockedDeletionError::new(
            descriptor.association_name.clone(),
            descriptor.target_type.clone(),
            display_name,
            result.count,
            result.sample,
            basic,
            detailed,
        )
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageFormatter")
            .field("locale", &self.locale())
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

fn fallback_basic_message(name: &str, count: u64) -> String {
    if count == 1 {
        format!("Cannot delete record because dependent {} exists", name)
    } else {
        format!(
            "Cannot delete record because {} dependent {} exist",
            count, name
        )
    }
}

/// `OrderInvoice` / `order_invoice` -> `order_invoice`
pub fn underscore(type_name: &str) -> String {
    let chars: Vec<char> = type_name.chars().collect();
    let mut out = String::with_capacity(type_name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// `OrderInvoice` -> `order invoice`
pub fn humanize(type_name: &str) -> String {
    underscore(type_name)
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// English plural of the last word of `phrase`
pub fn pluralize(phrase: &str) -> String {
    let lower = phrase.to_lowercase();
    let consonant_y = lower.ends_with('y')
        && !matches!(
            lower.chars().rev().nth(1),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        );

    if consonant_y {
        format!("{}ies", &phrase[..phrase.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        format!("{}es", phrase)
    } else {
        format!("{}s", phrase)
    }
}
