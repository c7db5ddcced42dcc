//! Decorator descriptors and their identifiers.

use crate::qualifier::QualifierSet;
use decorum_types::{MethodSignature, TypeRef};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// Class identifier of a decorator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecoratorId(Arc<str>);

/// Identifier of a deployment scope (a bean archive)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Arc<str>);

macro_rules! impl_identifier {
    ($name:ident) => {
        impl $name {
            /// Create an identifier
            pub fn new(id: impl Into<Arc<str>>) -> Self {
                $name(id.into())
            }

            /// The identifier as a string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name::new(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

impl_identifier!(DecoratorId);
impl_identifier!(ScopeId);

/// How a decorator is enabled
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Enablement {
    /// Enabled for every scope, ordered by ascending priority
    GlobalPriority(i32),

    /// Enabled for one scope only, at a declared position
    ScopeDeclared {
        /// Declaring scope
        scope: ScopeId,
        /// Position in the scope's declared list
        position: u32,
    },
}

impl fmt::Display for Enablement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Enablement::GlobalPriority(priority) => write!(f, "priority {}", priority),
            Enablement::ScopeDeclared { scope, position } => {
                write!(f, "position {} in {}", position, scope)
            }
        }
    }
}

/// Validated shape of one enabled decorator
///
/// Only [`Validator`](crate::validator::Validator) creates descriptors, so
/// every descriptor satisfies the definition rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorDescriptor {
    pub(crate) id: DecoratorId,
    pub(crate) delegate_type: TypeRef,
    pub(crate) delegate_qualifiers: QualifierSet,
    pub(crate) decorated_types: Vec<TypeRef>,
    pub(crate) implemented_methods: FxHashSet<MethodSignature>,
    pub(crate) abstract_methods: FxHashSet<MethodSignature>,
    pub(crate) enablement: Enablement,
}

impl DecoratorDescriptor {
    /// Decorator class identifier
    pub fn id(&self) -> &DecoratorId {
        &self.id
    }

    /// Type of the delegate injection point
    pub fn delegate_type(&self) -> &TypeRef {
        &self.delegate_type
    }

    /// Qualifiers of the delegate injection point
    pub fn delegate_qualifiers(&self) -> &QualifierSet {
        &self.delegate_qualifiers
    }

    /// Interfaces this decorator decorates
    pub fn decorated_types(&self) -> &[TypeRef] {
        &self.decorated_types
    }

    /// Methods the decorator has a body for
    pub fn implemented_methods(&self) -> &FxHashSet<MethodSignature> {
        &self.implemented_methods
    }

    /// Methods the decorator leaves to the delegate
    pub fn abstract_methods(&self) -> &FxHashSet<MethodSignature> {
        &self.abstract_methods
    }

    /// How this descriptor is enabled
    pub fn enablement(&self) -> &Enablement {
        &self.enablement
    }

    /// Whether the decorator has a body for `method`
    pub fn implements(&self, method: &MethodSignature) -> bool {
        self.implemented_methods.contains(method)
    }

    /// Whether the descriptor is enabled for every scope
    pub fn is_global(&self) -> bool {
        matches!(self.enablement, Enablement::GlobalPriority(_))
    }
}
