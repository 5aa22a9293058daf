//! Policy Registry - declared association policies per owning type

use std::sync::{Arc, RwLock};

use dashmap::{DashMap, DashSet};
use tracing::{debug, info};

use crate::descriptor::{AssociationDescriptor, AssociationReflection};
use crate::error::RestrictResult;
use crate::hooks::{HookRegistrar, PreDeleteHook};
use crate::policy::DependentPolicy;

/// One attached host hook list and the types already hooked on it
struct HookTarget {
    registrar: Arc<dyn HookRegistrar>,
    hook: PreDeleteHook,
    hooked: DashSet<String>,
}

impl HookTarget {
    fn install(&self, owning_type: &str) {
        // insert() is false when another registration got there first
        if self.hooked.insert(owning_type.to_string()) {
            debug!(owning_type, "Installing pre-delete hook");
            self.registrar
                .register_pre_delete_hook(owning_type, self.hook.clone());
        }
    }
}

/// Thread-safe registry of association policies.
///
/// Written at declaration time, read on every guarded delete. Cloning is
/// cheap and clones share the same storage, including attached hook lists.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    /// Model name -> descriptors in declaration order
    descriptors: Arc<DashMap<String, Vec<AssociationDescriptor>>>,

    /// Every attached host hook list; restricted types are hooked on each
    hook_targets: Arc<RwLock<Vec<Arc<HookTarget>>>>,
}

impl PolicyRegistry {
    /// Create a new empty policy registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the policy of one association.
    ///
    /// Overwriting keeps the association's original position so evaluation
    /// order stays the declaration order.
    pub fn register(
        &self,
        owning_type: &str,
        reflection: AssociationReflection,
        policy: DependentPolicy,
    ) -> RestrictResult<AssociationDescriptor> {
        let descriptor = AssociationDescriptor::new(owning_type, reflection, policy)?;

        {
            let mut entries = self
                .descriptors
                .entry(owning_type.to_string())
                .or_default();

            match entries
                .iter()
                .position(|existing| existing.association_name == descriptor.association_name)
            {
                Some(index) => entries[index] = descriptor.clone(),
                None => entries.push(descriptor.clone()),
            }
        }

        info!(
            owning_type = %descriptor.owning_type,
            association = %descriptor.association_name,
            target = %descriptor.target_type,
            policy = %descriptor.policy,
            "Registered dependent policy"
        );

        if descriptor.is_restricting() {
            self.install_hook(owning_type);
        }

        Ok(descriptor)
    }

    /// Register with a policy given by name (`"restrict"`, `"rollback"`, ...)
    pub fn register_named(
        &self,
        owning_type: &str,
        reflection: AssociationReflection,
        policy: &str,
    ) -> RestrictResult<AssociationDescriptor> {
        let policy = policy.parse::<DependentPolicy>()?;
        self.register(owning_type, reflection, policy)
    }

    /// All descriptors of `owning_type` in declaration order
    pub fn lookup(&self, owning_type: &str) -> Vec<AssociationDescriptor> {
        self.descriptors
            .get(owning_type)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }

    /// Get one descriptor by owning type and association name
    pub fn get(&self, owning_type: &str, association_name: &str) -> Option<AssociationDescriptor> {
        self.descriptors
            .get(owning_type)?
            .iter()
            .find(|descriptor| descriptor.association_name == association_name)
            .cloned()
    }

    /// Returns true if any association of `owning_type` restricts deletes
    pub fn is_restricted(&self, owning_type: &str) -> bool {
        self.descriptors
            .get(owning_type)
            .map(|entries| entries.iter().any(AssociationDescriptor::is_restricting))
            .unwrap_or(false)
    }

    /// Returns true if a pre-delete hook was installed for `owning_type` on
    /// every attached hook list
    pub fn is_hooked(&self, owning_type: &str) -> bool {
        let targets = self.targets();
        !targets.is_empty() && targets.iter().all(|target| target.hooked.contains(owning_type))
    }

    /// Number of host hook lists attached so far
    pub fn attached_count(&self) -> usize {
        self.targets().len()
    }

    /// Attach a host hook list.
    ///
    /// `hook` is installed right away for every already restricted type and
    /// later for each type on its first restricting registration. Earlier
    /// attachments stay in place, so every attached host keeps enforcing.
    pub fn attach(&self, registrar: Arc<dyn HookRegistrar>, hook: PreDeleteHook) {
        let target = Arc::new(HookTarget {
            registrar,
            hook,
            hooked: DashSet::new(),
        });

        {
            let mut targets = match self.hook_targets.write() {
                Ok(targets) => targets,
                Err(poisoned) => poisoned.into_inner(),
            };
            targets.push(target.clone());
        }

        let restricted: Vec<String> = self
            .descriptors
            .iter()
            .filter(|entry| entry.value().iter().any(AssociationDescriptor::is_restricting))
            .map(|entry| entry.key().clone())
            .collect();

        for owning_type in restricted {
            target.install(&owning_type);
        }
    }

    /// Clear all registered policies (installed hooks stay with the host)
    pub fn clear(&self) {
        self.descriptors.clear();
    }

    fn targets(&self) -> Vec<Arc<HookTarget>> {
        match self.hook_targets.read() {
            Ok(targets) => targets.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn install_hook(&self, owning_type: &str) {
        for target in self.targets() {
            target.install(owning_type);
        }
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("models", &self.descriptors.len())
            .field("attached", &self.attached_count())
            .finish()
    }
}

/// Global registry instance for the application
static GLOBAL_REGISTRY: std::sync::OnceLock<PolicyRegistry> = std::sync::OnceLock::new();

/// Get the global policy registry
pub fn global_registry() -> &'static PolicyRegistry {
    GLOBAL_REGISTRY.get_or_init(PolicyRegistry::new)
}
