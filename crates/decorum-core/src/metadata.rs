//! Class metadata consumed by the engine.
//!
//! Scanning and class loading happen elsewhere; this module only defines the
//! shape of their result and a simple in-memory source.

use crate::descriptor::DecoratorId;
use crate::qualifier::QualifierSet;
use decorum_types::{MethodSignature, TypeRef};
use rustc_hash::{FxHashMap, FxHashSet};

/// A delegate injection point found on a decorator class
#[derive(Debug, Clone, PartialEq)]
pub struct DelegatePoint {
    /// Declared type of the injection point
    pub ty: TypeRef,
    /// Declared qualifiers of the injection point
    pub qualifiers: QualifierSet,
}

impl DelegatePoint {
    /// Unqualified delegate of type `ty`
    pub fn new(ty: TypeRef) -> Self {
        DelegatePoint {
            ty,
            qualifiers: QualifierSet::new(),
        }
    }

    /// Delegate with qualifiers
    pub fn qualified(ty: TypeRef, qualifiers: QualifierSet) -> Self {
        DelegatePoint { ty, qualifiers }
    }
}

/// Scanned metadata of one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    /// Class identifier
    pub id: DecoratorId,
    /// Whether the class is marked as a decorator
    pub is_decorator: bool,
    /// Interfaces the class decorates
    pub decorated_types: Vec<TypeRef>,
    /// All delegate injection points found on the class
    pub delegate_points: Vec<DelegatePoint>,
    /// Global priority, if the class declares one
    pub priority: Option<i32>,
    /// Methods with a body
    pub implemented_methods: FxHashSet<MethodSignature>,
    /// Methods declared abstract
    pub abstract_methods: FxHashSet<MethodSignature>,
}

impl ClassMetadata {
    /// A decorator class with no types, delegates or methods yet
    pub fn decorator(id: impl Into<DecoratorId>) -> Self {
        ClassMetadata {
            id: id.into(),
            is_decorator: true,
            decorated_types: Vec::new(),
            delegate_points: Vec::new(),
            priority: None,
            implemented_methods: FxHashSet::default(),
            abstract_methods: FxHashSet::default(),
        }
    }

    /// A class that is not a decorator
    pub fn plain(id: impl Into<DecoratorId>) -> Self {
        ClassMetadata {
            is_decorator: false,
            ..ClassMetadata::decorator(id)
        }
    }

    /// Add a decorated interface
    pub fn decorates(mut self, ty: TypeRef) -> Self {
        self.decorated_types.push(ty);
        self
    }

    /// Add a delegate injection point
    pub fn delegate(mut self, point: DelegatePoint) -> Self {
        self.delegate_points.push(point);
        self
    }

    /// Set the global priority
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Add an implemented method
    pub fn implements(mut self, method: MethodSignature) -> Self {
        self.implemented_methods.insert(method);
        self
    }

    /// Add an abstract method
    pub fn abstract_method(mut self, method: MethodSignature) -> Self {
        self.abstract_methods.insert(method);
        self
    }
}

/// Provider of scanned class metadata
pub trait MetadataSource {
    /// Metadata of one class
    fn class(&self, id: &DecoratorId) -> Option<&ClassMetadata>;

    /// All known classes, in a stable order
    fn classes(&self) -> Box<dyn Iterator<Item = &ClassMetadata> + '_>;
}

/// In-memory metadata source that keeps insertion order
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    classes: Vec<ClassMetadata>,
    index: FxHashMap<DecoratorId, usize>,
}

impl StaticMetadata {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a class
    pub fn insert(&mut self, class: ClassMetadata) {
        match self.index.get(&class.id) {
            Some(&slot) => self.classes[slot] = class,
            None => {
                self.index.insert(class.id.clone(), self.classes.len());
                self.classes.push(class);
            }
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, class: ClassMetadata) -> Self {
        self.insert(class);
        self
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the source is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl MetadataSource for StaticMetadata {
    fn class(&self, id: &DecoratorId) -> Option<&ClassMetadata> {
        self.index.get(id).map(|&slot| &self.classes[slot])
    }

    fn classes(&self) -> Box<dyn Iterator<Item = &ClassMetadata> + '_> {
        Box::new(self.classes.iter())
    }
}
