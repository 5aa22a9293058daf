//! Association descriptors - what the guard knows about one declared association

use serde::{Deserialize, Serialize};

use crate::error::{RestrictError, RestrictResult};
use crate::host::{DependentFilter, RecordKey};
use crate::policy::{Cardinality, DependentPolicy};

/// Characters allowed in model, association and column identifiers
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

/// Longest identifier accepted (PostgreSQL limit)
const MAX_IDENTIFIER_LEN: usize = 63;

/// Validate that `identifier` is usable as a model, association or column name
///
/// `kind` names the identifier in the error message ("association name",
/// "foreign key", ...).
pub fn validate_identifier(kind: &str, identifier: &str) -> RestrictResult<()> {
    if identifier.is_empty() {
        return Err(RestrictError::configuration(format!(
            "{} cannot be empty",
            kind
        )));
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(RestrictError::configuration(format!(
            "{} '{}' is too long (max {} characters)",
            kind, identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = identifier
        .chars()
        .find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c))
    {
        return Err(RestrictError::configuration(format!(
            "{} '{}' contains invalid character '{}'",
            kind, identifier, c
        )));
    }

    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(RestrictError::configuration(format!(
            "{} '{}' cannot start with a number",
            kind, identifier
        )));
    }

    Ok(())
}

/// Join table used by has-and-belongs-to-many associations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotTable {
    /// Name of the join table
    pub table: String,
    /// Join-table column holding the dependent's key
    pub related_column: String,
}

/// How dependents point back at their parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyPath {
    /// Column holding the parent's key (on the dependent, or on the pivot)
    pub column: String,
    pub through: Option<PivotTable>,
}

impl ForeignKeyPath {
    /// Foreign key stored directly on the dependent
    pub fn column(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            through: None,
        }
    }

    /// Foreign key stored on a join table
    pub fn through(
        table: impl Into<String>,
        column: impl Into<String>,
        related_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            through: Some(PivotTable {
                table: table.into(),
                related_column: related_column.into(),
            }),
        }
    }

    pub fn validate(&self) -> RestrictResult<()> {
        validate_identifier("foreign key", &self.column)?;
        if let Some(ref pivot) = self.through {
            validate_identifier("pivot table", &pivot.table)?;
            validate_identifier("pivot column", &pivot.related_column)?;
        }
        Ok(())
    }
}

/// Association metadata reflected from the host at declaration time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationReflection {
    pub name: String,
    pub target_type: String,
    pub cardinality: Cardinality,
    pub foreign_key: ForeignKeyPath,
}

impl AssociationReflection {
    pub fn new(
        name: impl Into<String>,
        target_type: impl Into<String>,
        cardinality: Cardinality,
        foreign_key: ForeignKeyPath,
    ) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            cardinality,
            foreign_key,
        }
    }

    pub fn has_one(
        name: impl Into<String>,
        target_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target_type,
            Cardinality::Singular,
            ForeignKeyPath::column(foreign_key),
        )
    }

    pub fn has_many(
        name: impl Into<String>,
        target_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target_type,
            Cardinality::Collection,
            ForeignKeyPath::column(foreign_key),
        )
    }

    pub fn has_and_belongs_to_many(
        name: impl Into<String>,
        target_type: impl Into<String>,
        pivot_table: impl Into<String>,
        foreign_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target_type,
            Cardinality::Collection,
            ForeignKeyPath::through(pivot_table, foreign_key, related_key),
        )
    }
}

/// One registered association with its policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDescriptor {
    pub owning_type: String,
    pub association_name: String,
    pub target_type: String,
    pub cardinality: Cardinality,
    pub foreign_key: ForeignKeyPath,
    pub policy: DependentPolicy,
}

impl AssociationDescriptor {
    /// Build and validate a descriptor from reflected metadata
    pub fn new(
        owning_type: &str,
        reflection: AssociationReflection,
        policy: DependentPolicy,
    ) -> RestrictResult<Self> {
        validate_identifier("owning type", owning_type)?;
        validate_identifier("association name", &reflection.name)?;
        validate_identifier("target type", &reflection.target_type)?;
        reflection.foreign_key.validate()?;

        Ok(Self {
            owning_type: owning_type.to_string(),
            association_name: reflection.name,
            target_type: reflection.target_type,
            cardinality: reflection.cardinality,
            foreign_key: reflection.foreign_key,
            policy,
        })
    }

    pub fn is_restricting(&self) -> bool {
        self.policy.is_restricting()
    }

    /// Filter selecting this association's dependents of `parent_key`
    pub fn filter<'a>(&'a self, parent_key: &'a RecordKey) -> DependentFilter<'a> {
        DependentFilter {
            target_type: &self.target_type,
            foreign_key: &self.foreign_key,
            parent_key,
        }
    }
}
