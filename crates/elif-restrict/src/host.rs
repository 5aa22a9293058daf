//! Host ORM boundary
//!
//! The guard never loads associations itself. It reads the parent's identity
//! through [`Record`] and asks a [`DependencySource`] bound to the caller's
//! transaction whether dependents exist.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::descriptor::ForeignKeyPath;

/// Boxed error returned by host data access
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Primary key value of a parent or dependent record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(id) => write!(f, "{}", id),
            RecordKey::Uuid(id) => write!(f, "{}", id),
            RecordKey::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(id: i64) -> Self {
        RecordKey::Int(id)
    }
}

impl From<i32> for RecordKey {
    fn from(id: i32) -> Self {
        RecordKey::Int(i64::from(id))
    }
}

impl From<Uuid> for RecordKey {
    fn from(id: Uuid) -> Self {
        RecordKey::Uuid(id)
    }
}

impl From<String> for RecordKey {
    fn from(id: String) -> Self {
        RecordKey::Text(id)
    }
}

impl From<&str> for RecordKey {
    fn from(id: &str) -> Self {
        RecordKey::Text(id.to_string())
    }
}

/// A persisted parent record about to be deleted
pub trait Record {
    /// Model type name the record's associations were declared on
    fn model_name(&self) -> &str;

    /// Primary key of the record
    fn key(&self) -> RecordKey;
}

/// One dependent row as returned by the host: its key and string form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentRow {
    pub key: RecordKey,
    pub label: String,
}

impl DependentRow {
    pub fn new(key: impl Into<RecordKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Selects the dependents of one parent through one association
#[derive(Debug, Clone, Copy)]
pub struct DependentFilter<'a> {
    pub target_type: &'a str,
    pub foreign_key: &'a ForeignKeyPath,
    pub parent_key: &'a RecordKey,
}

/// Query surface of the host's data-access layer.
///
/// Implementations must run inside the caller's current transaction so the
/// check and the delete that follows it are ordered by the same isolation
/// level.
pub trait DependencySource {
    fn exists(&self, filter: &DependentFilter<'_>) -> Result<bool, SourceError>;

    fn count(&self, filter: &DependentFilter<'_>) -> Result<u64, SourceError>;

    /// Dependents ordered by ascending primary key, at most `limit` rows
    fn fetch_ordered(
        &self,
        filter: &DependentFilter<'_>,
        limit: usize,
    ) -> Result<Vec<DependentRow>, SourceError>;
}
