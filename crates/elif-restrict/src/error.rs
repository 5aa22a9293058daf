//! Error types for delete restrictions
//!
//! Registration problems surface as [`RestrictError::Configuration`], data
//! access failures during a check as [`RestrictError::DependencyCheck`], and
//! an expected block as [`RestrictError::Blocked`].

use thiserror::Error;

use crate::host::SourceError;
use crate::message::SampleEntry;

/// Result type alias for restriction operations
pub type RestrictResult<T> = Result<T, RestrictError>;

/// Error types for dependency restriction
#[derive(Debug, Error)]
pub enum RestrictError {
    /// Invalid policy or identifier at declaration time
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The host data source failed while counting dependents
    #[error("Dependency check failed for '{owning_type}.{association}': {source}")]
    DependencyCheck {
        owning_type: String,
        association: String,
        source: SourceError,
    },

    /// Dependents exist under a restrict-with-exception policy
    #[error(transparent)]
    Blocked(#[from] BlockedDeletionError),
}

impl RestrictError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn dependency_check(
        owning_type: impl Into<String>,
        association: impl Into<String>,
        source: SourceError,
    ) -> Self {
        Self::DependencyCheck {
            owning_type: owning_type.into(),
            association: association.into(),
            source,
        }
    }

    /// Returns true if this error is an expected delete block
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    /// Borrow the block payload, if any
    pub fn as_blocked(&self) -> Option<&BlockedDeletionError> {
        match self {
            Self::Blocked(error) => Some(error),
            _ => None,
        }
    }
}

/// Raised when a parent record still has dependents and the association is
/// declared with [`DependentPolicy::RestrictWithException`].
///
/// Both messages are rendered when the error is built so the caller does not
/// need the localization provider to display them.
///
/// [`DependentPolicy::RestrictWithException`]: crate::policy::DependentPolicy::RestrictWithException
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{basic_message}")]
pub struct BlockedDeletionError {
    association_name: String,
    target_type: String,
    display_name: String,
    count: u64,
    sample: Vec<SampleEntry>,
    basic_message: String,
    detailed_message: String,
}

impl BlockedDeletionError {
    pub(crate) fn new(
        association_name: String,
        target_type: String,
        display_name: String,
        count: u64,
        sample: Vec<SampleEntry>,
        basic_message: String,
        detailed_message: String,
    ) -> Self {
        Self {
            association_name,
            target_type,
            display_name,
            count,
            sample,
            basic_message,
            detailed_message,
        }
    }

    pub fn association_name(&self) -> &str {
        &self.association_name
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Localized, count-aware name of the dependent type
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sample(&self) -> &[SampleEntry] {
        &self.sample
    }

    /// One-line summary, also used as the `Display` output
    pub fn basic_message(&self) -> &str {
        &self.basic_message
    }

    /// Summary followed by the listing of blocking records
    pub fn detailed_message(&self) -> &str {
        &self.detailed_message
    }
}

/// Error types for loading restriction configuration and catalogs
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid translation catalog: {message}")]
    Catalog { message: String },
}
