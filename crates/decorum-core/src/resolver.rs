//! Decorator resolution.
//!
//! Computes, once per distinct target shape, the ordered chain of decorators
//! that apply to it. Chains are cached by the structural identity of the
//! target and never recomputed.

use crate::descriptor::{DecoratorDescriptor, ScopeId};
use crate::qualifier::{self, QualifierSet};
use crate::registry::Registry;
use dashmap::DashMap;
use decorum_types::{DelegateMatcher, TypeHierarchy, TypeRef};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Shape of a managed object that decorators are matched against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetDescriptor {
    /// All types of the managed object
    pub types: BTreeSet<TypeRef>,
    /// Declared qualifiers of the managed object
    pub qualifiers: QualifierSet,
    /// Deployment scope the managed object belongs to
    pub scope: ScopeId,
}

impl TargetDescriptor {
    /// A target with the given types, no qualifiers
    pub fn new<I>(scope: impl Into<ScopeId>, types: I) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        TargetDescriptor {
            types: types.into_iter().collect(),
            qualifiers: QualifierSet::new(),
            scope: scope.into(),
        }
    }

    /// Set the declared qualifiers
    pub fn with_qualifiers(mut self, qualifiers: QualifierSet) -> Self {
        self.qualifiers = qualifiers;
        self
    }
}

/// Ordered decorators bound to one target shape
#[derive(Debug, Clone)]
pub struct ResolvedChain {
    target: TargetDescriptor,
    decorators: Vec<Arc<DecoratorDescriptor>>,
}

impl ResolvedChain {
    /// Target this chain was resolved for
    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    /// Bound decorators, outermost first
    pub fn decorators(&self) -> &[Arc<DecoratorDescriptor>] {
        &self.decorators
    }

    /// Number of bound decorators
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// Whether no decorator is bound
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

/// Resolves and caches decorator chains
#[derive(Debug)]
pub struct Resolver {
    registry: Arc<Registry>,
    hierarchy: Arc<TypeHierarchy>,
    cache: DashMap<TargetDescriptor, Arc<ResolvedChain>>,
}

impl Resolver {
    /// Create a resolver over a frozen registry
    pub fn new(registry: Arc<Registry>, hierarchy: Arc<TypeHierarchy>) -> Self {
        Resolver {
            registry,
            hierarchy,
            cache: DashMap::new(),
        }
    }

    /// The registry decorators are taken from
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The type hierarchy used for bound checks
    pub fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }

    /// Decorator chain for `target`
    ///
    /// The first call for a target shape computes the chain; later calls,
    /// from any thread, return the same `Arc`.
    pub fn resolve(&self, target: &TargetDescriptor) -> Arc<ResolvedChain> {
        if let Some(chain) = self.cache.get(target) {
            trace!(scope = %target.scope, "decorator chain cache hit");
            return Arc::clone(chain.value());
        }

        let chain = self
            .cache
            .entry(target.clone())
            .or_insert_with(|| Arc::new(self.compute(target)));
        Arc::clone(chain.value())
    }

    /// Number of cached target shapes
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Whether `descriptor` binds to `target`
    pub fn binds(&self, descriptor: &DecoratorDescriptor, target: &TargetDescriptor) -> bool {
        let matcher = DelegateMatcher::new(&self.hierarchy);
        target
            .types
            .iter()
            .any(|ty| matcher.matches(ty, descriptor.delegate_type()))
            && qualifier::satisfies(descriptor.delegate_qualifiers(), &target.qualifiers)
    }

    fn compute(&self, target: &TargetDescriptor) -> ResolvedChain {
        let decorators: Vec<_> = self
            .registry
            .enabled_for(&target.scope)
            .into_iter()
            .filter(|descriptor| self.binds(descriptor, target))
            .collect();

        debug!(
            scope = %target.scope,
            types = target.types.len(),
            decorators = decorators.len(),
            "resolved decorator chain"
        );

        ResolvedChain {
            target: target.clone(),
            decorators,
        }
    }
}
