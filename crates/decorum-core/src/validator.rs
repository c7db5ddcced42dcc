//! Decorator definition validation.
//!
//! Rules are checked in a fixed order and the first violation is reported:
//! 1. at least one decorated type, all of them interfaces
//! 2. exactly one delegate injection point
//! 3. the delegate type implements every decorated type with identical
//!    type parameters
//! 4. every abstract method is declared by some decorated type

use crate::descriptor::{DecoratorDescriptor, Enablement};
use crate::error::DefinitionError;
use crate::metadata::ClassMetadata;
use decorum_types::{DelegateMatcher, TypeHierarchy, TypeKind};

/// Turns class metadata into validated descriptors
#[derive(Debug, Clone, Copy)]
pub struct Validator<'h> {
    hierarchy: &'h TypeHierarchy,
}

impl<'h> Validator<'h> {
    /// Create a validator over a hierarchy
    pub fn new(hierarchy: &'h TypeHierarchy) -> Self {
        Validator { hierarchy }
    }

    /// Validate `class` and build its descriptor with the given enablement
    pub fn validate(
        &self,
        class: &ClassMetadata,
        enablement: Enablement,
    ) -> Result<DecoratorDescriptor, DefinitionError> {
        let decorator = &class.id;

        if class.decorated_types.is_empty() {
            return Err(DefinitionError::EmptyDecoratedTypes {
                decorator: decorator.clone(),
            });
        }
        if let Some(class_type) = class
            .decorated_types
            .iter()
            .find(|ty| self.hierarchy.kind_of(&ty.raw) == Some(TypeKind::Class))
        {
            return Err(DefinitionError::NotAnInterface {
                decorator: decorator.clone(),
                ty: class_type.to_string(),
            });
        }

        let delegate = match class.delegate_points.as_slice() {
            [single] => single,
            [] => {
                return Err(DefinitionError::MissingDelegate {
                    decorator: decorator.clone(),
                })
            }
            points => {
                return Err(DefinitionError::MultipleDelegates {
                    decorator: decorator.clone(),
                    count: points.len(),
                })
            }
        };

        let matcher = DelegateMatcher::new(self.hierarchy);
        for decorated in &class.decorated_types {
            if !matcher.exact_assignable(&delegate.ty, decorated) {
                return Err(DefinitionError::DelegateNotAssignable {
                    decorator: decorator.clone(),
                    delegate: delegate.ty.to_string(),
                    decorated: decorated.to_string(),
                });
            }
        }

        // Sorted so the reported method does not depend on hash order
        let mut abstract_methods: Vec<_> = class.abstract_methods.iter().collect();
        abstract_methods.sort();
        for method in abstract_methods {
            let declared = class
                .decorated_types
                .iter()
                .any(|ty| self.hierarchy.declares_method(&ty.raw, method));
            if !declared {
                return Err(DefinitionError::UndeclaredAbstractMethod {
                    decorator: decorator.clone(),
                    method: method.clone(),
                });
            }
        }

        Ok(DecoratorDescriptor {
            id: decorator.clone(),
            delegate_type: delegate.ty.clone(),
            delegate_qualifiers: delegate.qualifiers.clone(),
            decorated_types: class.decorated_types.clone(),
            implemented_methods: class.implemented_methods.clone(),
            abstract_methods: class.abstract_methods.clone(),
            enablement,
        })
    }
}
