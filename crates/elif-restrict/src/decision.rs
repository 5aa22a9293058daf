//! Decision Engine - turns a dependency check and a policy into a verdict

use tracing::{debug, warn};

use crate::descriptor::AssociationDescriptor;
use crate::error::{BlockedDeletionError, RestrictError, RestrictResult};
use crate::evaluator::DependencyEvaluator;
use crate::hooks::HookHalt;
use crate::host::{DependencySource, Record};
use crate::message::MessageFormatter;
use crate::policy::DependentPolicy;
use crate::registry::PolicyRegistry;

/// Verdict for a pending delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionDecision {
    Allow,
    /// Silently roll back the enclosing transaction
    AbortTransaction,
    Block(BlockedDeletionError),
}

impl DeletionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, DeletionDecision::Allow)
    }

    /// Map onto the hook protocol: `Allow` continues the chain
    pub fn into_hook_result(self) -> Result<(), HookHalt> {
        match self {
            DeletionDecision::Allow => Ok(()),
            DeletionDecision::AbortTransaction => Err(HookHalt::Rollback),
            DeletionDecision::Block(error) => Err(HookHalt::Failed(RestrictError::Blocked(error))),
        }
    }
}

/// Applies declared policies to records about to be deleted
#[derive(Debug)]
pub struct DecisionEngine {
    registry: PolicyRegistry,
    evaluator: DependencyEvaluator,
    formatter: MessageFormatter,
}

impl DecisionEngine {
    pub fn new(registry: PolicyRegistry, formatter: MessageFormatter) -> Self {
        Self {
            registry,
            evaluator: DependencyEvaluator::new(),
            formatter,
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }

    /// Decide one association, messages in the formatter's locale
    pub fn decide(
        &self,
        record: &dyn Record,
        descriptor: &AssociationDescriptor,
        source: &dyn DependencySource,
    ) -> RestrictResult<DeletionDecision> {
        self.decide_in(&self.formatter.locale(), record, descriptor, source)
    }

    /// Decide one association, messages in `locale`
    pub fn decide_in(
        &self,
        locale: &str,
        record: &dyn Record,
        descriptor: &AssociationDescriptor,
        source: &dyn DependencySource,
    ) -> RestrictResult<DeletionDecision> {
        match descriptor.policy {
            DependentPolicy::None => Ok(DeletionDecision::Allow),
            DependentPolicy::RestrictWithRollback => {
                if self.evaluator.probe(record, descriptor, source)? {
                    warn!(
                        owning_type = %descriptor.owning_type,
                        association = %descriptor.association_name,
                        parent = %record.key(),
                        "Dependents exist, rolling back delete"
                    );
                    Ok(DeletionDecision::AbortTransaction)
                } else {
                    Ok(DeletionDecision::Allow)
                }
            }
            DependentPolicy::RestrictWithException => {
                let result = self.evaluator.evaluate(record, descriptor, source)?;
                if !result.has_dependents {
                    return Ok(DeletionDecision::Allow);
                }

                let error = self.formatter.blocked_error_in(locale, descriptor, result);
                warn!(
                    owning_type = %descriptor.owning_type,
                    association = %descriptor.association_name,
                    parent = %record.key(),
                    count = error.count(),
                    "Dependents exist, blocking delete"
                );
                Ok(DeletionDecision::Block(error))
            }
        }
    }

    /// Decide every association of the record's model in declaration
    /// order, stopping at the first non-`Allow` verdict.
    pub fn decide_all(
        &self,
        record: &dyn Record,
        source: &dyn DependencySource,
    ) -> RestrictResult<DeletionDecision> {
        let locale = self.formatter.locale();
        self.decide_all_in(&locale, record, source)
    }

    /// [`decide_all`](Self::decide_all) with messages in `locale`
    pub fn decide_all_in(
        &self,
        locale: &str,
        record: &dyn Record,
        source: &dyn DependencySource,
    ) -> RestrictResult<DeletionDecision> {
        for descriptor in self.registry.lookup(record.model_name()) {
            let decision = self.decide_in(locale, record, &descriptor, source)?;
            if !decision.is_allowed() {
                return Ok(decision);
            }
        }

        debug!(model = record.model_name(), parent = %record.key(), "Delete allowed");
        Ok(DeletionDecision::Allow)
    }
}
