//! Dependency evaluation - does a parent still have dependents?

use tracing::{debug, warn};

use crate::descriptor::AssociationDescriptor;
use crate::error::{RestrictError, RestrictResult};
use crate::host::{DependencySource, Record, SourceError};
use crate::message::{SampleEntry, SAMPLE_LIMIT};
use crate::policy::Cardinality;

/// Outcome of checking one association of one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyCheckResult {
    pub has_dependents: bool,
    /// Number of dependents; singular associations report 0 or 1
    pub count: u64,
    /// At most [`SAMPLE_LIMIT`] entries, ascending by key
    pub sample: Vec<SampleEntry>,
}

impl DependencyCheckResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Runs existence and count queries against the host data source
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyEvaluator;

impl DependencyEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Existence check only; stops at the first matching dependent
    pub fn probe(
        &self,
        record: &dyn Record,
        descriptor: &AssociationDescriptor,
        source: &dyn DependencySource,
    ) -> RestrictResult<bool> {
        let key = record.key();
        let filter = descriptor.filter(&key);

        let exists = source
            .exists(&filter)
            .map_err(|err| check_failed(descriptor, err))?;

        debug!(
            owning_type = %descriptor.owning_type,
            association = %descriptor.association_name,
            parent = %key,
            exists,
            "Probed dependents"
        );

        Ok(exists)
    }

    /// Existence check, then count and sample when dependents exist
    pub fn evaluate(
        &self,
        record: &dyn Record,
        descriptor: &AssociationDescriptor,
        source: &dyn DependencySource,
    ) -> RestrictResult<DependencyCheckResult> {
        if !self.probe(record, descriptor, source)? {
            return Ok(DependencyCheckResult::empty());
        }

        let key = record.key();
        let filter = descriptor.filter(&key);

        let (count, limit) = match descriptor.cardinality {
            Cardinality::Singular => (1, 1),
            Cardinality::Collection => {
                let count = source
                    .count(&filter)
                    .map_err(|err| check_failed(descriptor, err))?;
                // exists() already matched; a zero count here is a concurrent delete
                (count.max(1), SAMPLE_LIMIT)
            }
        };

        let rows = source
            .fetch_ordered(&filter, limit)
            .map_err(|err| check_failed(descriptor, err))?;

        debug!(
            owning_type = %descriptor.owning_type,
            association = %descriptor.association_name,
            parent = %key,
            count,
            fetched = rows.len(),
            "Evaluated dependents"
        );

        Ok(DependencyCheckResult {
            has_dependents: true,
            count,
            sample: SampleEntry::from_rows(rows, count),
        })
    }
}

fn check_failed(descriptor: &AssociationDescriptor, err: SourceError) -> RestrictError {
    warn!(
        owning_type = %descriptor.owning_type,
        association = %descriptor.association_name,
        error = %err,
        "Dependency check failed, refusing delete"
    );
    RestrictError::dependency_check(
        descriptor.owning_type.clone(),
        descriptor.association_name.clone(),
        err,
    )
}
