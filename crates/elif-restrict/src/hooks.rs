//! Pre-delete hook chain - the host extension point the guard appends to

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::RestrictError;
use crate::host::{DependencySource, Record};

/// Why a pre-delete hook stopped the delete
#[derive(Debug)]
pub enum HookHalt {
    /// Roll back the enclosing unit of work; no error reaches the caller
    Rollback,
    /// Fail the delete with an error
    Failed(RestrictError),
}

impl HookHalt {
    pub fn is_rollback(&self) -> bool {
        matches!(self, HookHalt::Rollback)
    }

    /// The error to surface, `None` for a silent rollback
    pub fn into_error(self) -> Option<RestrictError> {
        match self {
            HookHalt::Rollback => None,
            HookHalt::Failed(error) => Some(error),
        }
    }
}

impl From<RestrictError> for HookHalt {
    fn from(error: RestrictError) -> Self {
        HookHalt::Failed(error)
    }
}

/// Callback run before the physical delete of a record
pub type PreDeleteHook =
    Arc<dyn Fn(&dyn Record, &dyn DependencySource) -> Result<(), HookHalt> + Send + Sync>;

/// Host side of hook registration.
///
/// Hosts must run a type's hooks in registration order before deleting a
/// record of that type, and must not delete when a hook halts.
pub trait HookRegistrar: Send + Sync {
    fn register_pre_delete_hook(&self, model_name: &str, hook: PreDeleteHook);
}

/// Ordered per-model hook lists, usable as a host's pre-delete extension point
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Arc<DashMap<String, Vec<PreDeleteHook>>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, model_name: &str, hook: PreDeleteHook) {
        self.hooks
            .entry(model_name.to_string())
            .or_default()
            .push(hook);
    }

    pub fn hook_count(&self, model_name: &str) -> usize {
        self.hooks
            .get(model_name)
            .map(|hooks| hooks.len())
            .unwrap_or(0)
    }

    pub fn has_hooks_for(&self, model_name: &str) -> bool {
        self.hook_count(model_name) > 0
    }

    /// Run every hook of the record's model in order; stops at the first halt
    pub fn run_pre_delete(
        &self,
        record: &dyn Record,
        source: &dyn DependencySource,
    ) -> Result<(), HookHalt> {
        // Clone the list so hooks can register further hooks without deadlocking
        let hooks = self
            .hooks
            .get(record.model_name())
            .map(|hooks| hooks.value().clone())
            .unwrap_or_default();

        for hook in hooks {
            hook(record, source)?;
        }
        Ok(())
    }
}

impl HookRegistrar for HookChain {
    fn register_pre_delete_hook(&self, model_name: &str, hook: PreDeleteHook) {
        self.register(model_name, hook);
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("models", &self.hooks.len())
            .finish()
    }
}
