//! Delete guard - declaration and enforcement facade
//!
//! ```ignore
//! let guard = DeleteGuard::new(PolicyRegistry::new(), MessageFormatter::new());
//! guard.declare(
//!     "Category",
//!     AssociationReflection::has_many("orders", "Order", "category_id"),
//!     DependentPolicy::RestrictWithException,
//! )?;
//! guard.install_hooks(Arc::new(hook_chain.clone()));
//! ```

use std::sync::{Arc, Weak};

use crate::config::RestrictConfig;
use crate::decision::{DecisionEngine, DeletionDecision};
use crate::descriptor::{AssociationDescriptor, AssociationReflection};
use crate::error::{ConfigError, RestrictError, RestrictResult};
use crate::hooks::{HookHalt, HookRegistrar, PreDeleteHook};
use crate::host::{DependencySource, Record};
use crate::message::MessageFormatter;
use crate::policy::DependentPolicy;
use crate::registry::PolicyRegistry;

/// Bundles the policy registry with the decision engine and wires the
/// engine into a host's pre-delete hooks.
#[derive(Debug, Clone)]
pub struct DeleteGuard {
    engine: Arc<DecisionEngine>,
}

impl DeleteGuard {
    pub fn new(registry: PolicyRegistry, formatter: MessageFormatter) -> Self {
        Self {
            engine: Arc::new(DecisionEngine::new(registry, formatter)),
        }
    }

    /// Guard with a fresh registry and a formatter built from `config`
    pub fn from_config(config: &RestrictConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(PolicyRegistry::new(), config.build_formatter()?))
    }

    pub fn registry(&self) -> &PolicyRegistry {
        self.engine.registry()
    }

    pub fn formatter(&self) -> &MessageFormatter {
        self.engine.formatter()
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Declare the dependent policy of one association
    pub fn declare(
        &self,
        owning_type: &str,
        reflection: AssociationReflection,
        policy: DependentPolicy,
    ) -> RestrictResult<AssociationDescriptor> {
        self.registry().register(owning_type, reflection, policy)
    }

    /// Check every restricted association of `record`
    pub fn check(
        &self,
        record: &dyn Record,
        source: &dyn DependencySource,
    ) -> RestrictResult<DeletionDecision> {
        self.engine.decide_all(record, source)
    }

    /// [`check`](Self::check) with messages in `locale`, for hosts that
    /// pick the locale per request
    pub fn check_in(
        &self,
        locale: &str,
        record: &dyn Record,
        source: &dyn DependencySource,
    ) -> RestrictResult<DeletionDecision> {
        self.engine.decide_all_in(locale, record, source)
    }

    /// Hook running [`DecisionEngine::decide_all`] for whichever record it
    /// receives. It holds the engine weakly and fails closed once the guard
    /// is gone.
    pub fn pre_delete_hook(&self) -> PreDeleteHook {
        let engine: Weak<DecisionEngine> = Arc::downgrade(&self.engine);

        Arc::new(
            move |record: &dyn Record, source: &dyn DependencySource| -> Result<(), HookHalt> {
                let Some(engine) = engine.upgrade() else {
                    return Err(HookHalt::Failed(RestrictError::configuration(format!(
                        "delete guard for '{}' was dropped",
                        record.model_name()
                    ))));
                };
                engine.decide_all(record, source)?.into_hook_result()
            },
        )
    }

    /// Install the pre-delete hook on `registrar` for every restricted type,
    /// now and on later declarations.
    pub fn install_hooks(&self, registrar: Arc<dyn HookRegistrar>) {
        self.registry().attach(registrar, self.pre_delete_hook());
    }
}
