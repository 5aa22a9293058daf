//! Dependent policies and association cardinality

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RestrictError;

/// What happens to a delete when an association still has dependents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependentPolicy {
    /// No check is performed
    #[default]
    None,
    /// Fail the delete with a detailed [`BlockedDeletionError`](crate::BlockedDeletionError)
    #[serde(alias = "restrict", alias = "raise")]
    RestrictWithException,
    /// Abort the enclosing transaction without surfacing an error
    #[serde(alias = "rollback", alias = "restrict_with_error")]
    RestrictWithRollback,
}

impl DependentPolicy {
    /// Returns true if the policy requires a pre-delete check
    pub fn is_restricting(self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependentPolicy::None => "none",
            DependentPolicy::RestrictWithException => "restrict_with_exception",
            DependentPolicy::RestrictWithRollback => "restrict_with_rollback",
        }
    }
}

impl FromStr for DependentPolicy {
    type Err = RestrictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(DependentPolicy::None),
            "restrict" | "raise" | "restrict_with_exception" => {
                Ok(DependentPolicy::RestrictWithException)
            }
            "rollback" | "restrict_with_error" | "restrict_with_rollback" => {
                Ok(DependentPolicy::RestrictWithRollback)
            }
            other => Err(RestrictError::configuration(format!(
                "unknown dependent policy '{}', expected none, restrict_with_exception or restrict_with_rollback",
                other
            ))),
        }
    }
}

impl fmt::Display for DependentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of dependents an association can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one dependent (has-one)
    Singular,
    /// Zero or more dependents (has-many, has-and-belongs-to-many)
    Collection,
}

impl Cardinality {
    pub fn is_collection(self) -> bool {
        matches!(self, Self::Collection)
    }
}
