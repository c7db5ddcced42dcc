//! Engine error types.
//!
//! Three failure families: definition errors for a single malformed decorator,
//! deployment errors for a bad scope declaration or binding, and illegal state
//! errors for delegate misuse at call time. All of them are fatal; nothing is
//! retried.

use crate::descriptor::{DecoratorId, ScopeId};
use decorum_types::{MethodSignature, TypeError};
use std::error::Error as StdError;
use thiserror::Error;

/// A decorator class whose declared shape is invalid
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    /// No decorated types
    #[error("Decorator {decorator} does not decorate any type")]
    EmptyDecoratedTypes {
        /// Offending decorator
        decorator: DecoratorId,
    },

    /// A decorated type is a class
    #[error("Decorator {decorator} decorates {ty}, which is not an interface")]
    NotAnInterface {
        /// Offending decorator
        decorator: DecoratorId,
        /// The non-interface type
        ty: String,
    },

    /// No delegate injection point
    #[error("Decorator {decorator} has no delegate injection point")]
    MissingDelegate {
        /// Offending decorator
        decorator: DecoratorId,
    },

    /// More than one delegate injection point
    #[error("Decorator {decorator} has {count} delegate injection points, expected exactly one")]
    MultipleDelegates {
        /// Offending decorator
        decorator: DecoratorId,
        /// Number of delegate injection points found
        count: usize,
    },

    /// Delegate type does not implement a decorated type with identical parameters
    #[error("Delegate type {delegate} of decorator {decorator} is not assignable to decorated type {decorated}")]
    DelegateNotAssignable {
        /// Offending decorator
        decorator: DecoratorId,
        /// Delegate type
        delegate: String,
        /// Decorated type it fails to implement
        decorated: String,
    },

    /// Abstract method that no decorated type declares
    #[error("Abstract method {method} of decorator {decorator} is not declared by any decorated type")]
    UndeclaredAbstractMethod {
        /// Offending decorator
        decorator: DecoratorId,
        /// The abstract method
        method: MethodSignature,
    },
}

/// Invalid enablement, declaration or binding of decorators
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// Same decorator class enabled twice in one scope (or twice globally)
    #[error("Decorator {decorator} is enabled more than once in {scope}")]
    DuplicateDecorator {
        /// Scope name, or `global`
        scope: String,
        /// Duplicated decorator
        decorator: DecoratorId,
    },

    /// Scope declaration names a class the metadata source does not know
    #[error("Scope {scope} declares unknown class {class}")]
    UnknownClass {
        /// Declaring scope
        scope: ScopeId,
        /// Missing class
        class: DecoratorId,
    },

    /// Scope declaration names a class that is not a decorator
    #[error("Scope {scope} declares {class}, which is not a decorator")]
    NotADecorator {
        /// Declaring scope
        scope: ScopeId,
        /// Offending class
        class: DecoratorId,
    },

    /// A resolved decorator has no method bodies bound to it
    #[error("No decorator body bound for {decorator}")]
    UnboundDecorator {
        /// Decorator without a body
        decorator: DecoratorId,
    },

    /// Invalid manifest contents
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Decorator definition error
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// Type declaration error
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Failed to read the manifest file
    #[error("Failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Delegate used outside of the call it was created for
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IllegalStateError {
    /// The owning call has not started
    #[error("Delegate of {decorator} used before its invocation started")]
    FrameNotStarted {
        /// Decorator owning the handle
        decorator: DecoratorId,
    },

    /// The owning call already returned
    #[error("Delegate of {decorator} used after {method} returned")]
    FrameClosed {
        /// Decorator owning the handle
        decorator: DecoratorId,
        /// Method of the closed call
        method: MethodSignature,
    },

    /// The handle's decorator is not the one currently executing
    #[error("Delegate of {decorator} used while {active} is executing")]
    NotActive {
        /// Decorator owning the handle
        decorator: DecoratorId,
        /// What is executing instead
        active: String,
    },
}

/// Failure of a decorated call
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Delegate misuse
    #[error(transparent)]
    IllegalState(#[from] IllegalStateError),

    /// Error raised by a decorator body or the target
    #[error("{0}")]
    Failed(Box<dyn StdError + Send + Sync>),
}

impl InvocationError {
    /// Wrap a business failure
    pub fn failed(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        InvocationError::Failed(err.into())
    }

    /// The illegal state error, if this is one
    pub fn as_illegal_state(&self) -> Option<&IllegalStateError> {
        match self {
            InvocationError::IllegalState(err) => Some(err),
            InvocationError::Failed(_) => None,
        }
    }
}
