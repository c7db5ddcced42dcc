//! Decorator registry.
//!
//! Registration happens on a [`RegistryBuilder`] during startup. Freezing it
//! produces an immutable [`Registry`] that can be shared across threads and
//! answers which decorators are enabled for a scope, in order.
//!
//! Ordering contract of [`Registry::enabled_for`]:
//! - global-priority decorators first, ascending by priority, ties in
//!   registration order;
//! - then the scope's declared decorators, ascending by position.
//!
//! A class enabled both globally and in a scope only takes part in the global
//! part of the chain.

use crate::descriptor::{DecoratorDescriptor, DecoratorId, Enablement, ScopeId};
use crate::error::DeploymentError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::debug;

/// Mutable registry used during startup
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    global: Vec<Arc<DecoratorDescriptor>>,
    scoped: FxHashMap<ScopeId, Vec<Arc<DecoratorDescriptor>>>,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validated descriptor
    ///
    /// Enabling the same class twice in one scope, or twice globally, is a
    /// deployment error.
    pub fn register(&mut self, descriptor: DecoratorDescriptor) -> Result<(), DeploymentError> {
        let (entries, scope_name) = match &descriptor.enablement {
            Enablement::GlobalPriority(_) => (&mut self.global, "global".to_string()),
            Enablement::ScopeDeclared { scope, .. } => (
                self.scoped.entry(scope.clone()).or_default(),
                format!("scope {}", scope),
            ),
        };

        if entries.iter().any(|existing| existing.id == descriptor.id) {
            return Err(DeploymentError::DuplicateDecorator {
                scope: scope_name,
                decorator: descriptor.id,
            });
        }

        debug!(
            decorator = %descriptor.id,
            enablement = %descriptor.enablement,
            delegate = %descriptor.delegate_type,
            "registered decorator"
        );
        entries.push(Arc::new(descriptor));
        Ok(())
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.global.len() + self.scoped.values().map(Vec::len).sum::<usize>()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort and freeze the registry
    pub fn freeze(self) -> Registry {
        let RegistryBuilder {
            mut global,
            mut scoped,
        } = self;

        // Stable sorts keep registration order among equal keys
        global.sort_by_key(|d| match d.enablement {
            Enablement::GlobalPriority(priority) => priority,
            Enablement::ScopeDeclared { .. } => i32::MAX,
        });

        let global_ids: FxHashSet<DecoratorId> = global.iter().map(|d| d.id.clone()).collect();

        for (scope, entries) in scoped.iter_mut() {
            entries.retain(|d| {
                let shadowed = global_ids.contains(&d.id);
                if shadowed {
                    debug!(
                        decorator = %d.id,
                        scope = %scope,
                        "decorator is enabled globally, ignoring scope declaration"
                    );
                }
                !shadowed
            });
            entries.sort_by_key(|d| match d.enablement {
                Enablement::ScopeDeclared { position, .. } => position,
                Enablement::GlobalPriority(_) => u32::MAX,
            });
        }

        debug!(
            global = global.len(),
            scopes = scoped.len(),
            "froze decorator registry"
        );

        Registry { global, scoped }
    }
}

/// Frozen, read-only registry
#[derive(Debug, Default)]
pub struct Registry {
    global: Vec<Arc<DecoratorDescriptor>>,
    scoped: FxHashMap<ScopeId, Vec<Arc<DecoratorDescriptor>>>,
}

impl Registry {
    /// Enabled decorators for `scope`, in application order
    pub fn enabled_for(&self, scope: &ScopeId) -> Vec<Arc<DecoratorDescriptor>> {
        let declared = self.scoped.get(scope).map_or(&[][..], Vec::as_slice);
        self.global.iter().chain(declared).cloned().collect()
    }

    /// Global-priority decorators, ascending by priority
    pub fn global(&self) -> &[Arc<DecoratorDescriptor>] {
        &self.global
    }

    /// Scopes that declare at least one decorator
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeId> {
        self.scoped.keys()
    }
}
