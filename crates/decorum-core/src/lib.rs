//! Decorum Engine
//!
//! Decides which decorators apply to a managed object, in what order they
//! run, and threads each business call through the resulting chain.
//!
//! This crate provides:
//! - Validation of decorator definitions
//! - A registry of enabled decorators with a build phase and a frozen phase
//! - Cached resolution of ordered decorator chains per target shape
//! - Dispatch through a chain with delegate forwarding
//! - A TOML deployment manifest and a bootstrap that ties it all together
//!
//! # Usage
//!
//! ```ignore
//! use decorum_core::{Deployment, DeploymentManifest, Dispatcher, TargetDescriptor};
//!
//! let manifest = DeploymentManifest::from_file(path)?;
//! let deployment = Deployment::bootstrap(&metadata, &manifest, hierarchy)?;
//!
//! let chain = deployment.resolver().resolve(&TargetDescriptor::new("app.jar", types));
//! let dispatcher = Dispatcher::bind(chain, &bodies, target)?;
//! let result = dispatcher.enter(&method, args)?;
//! ```

#![warn(missing_docs)]

pub mod deployment;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod qualifier;
pub mod registry;
pub mod resolver;
pub mod validator;

// Re-export main types
pub use deployment::Deployment;
pub use descriptor::{DecoratorDescriptor, DecoratorId, Enablement, ScopeId};
pub use dispatch::{
    decorator_body, target_invoker, DecoratorBody, Delegate, Dispatcher, FrameState,
    TargetInvoker,
};
pub use error::{DefinitionError, DeploymentError, IllegalStateError, InvocationError};
pub use manifest::{DeploymentManifest, EngineConfig, ScopeDeclaration};
pub use metadata::{ClassMetadata, DelegatePoint, MetadataSource, StaticMetadata};
pub use qualifier::{Qualifier, QualifierSet};
pub use registry::{Registry, RegistryBuilder};
pub use resolver::{ResolvedChain, Resolver, TargetDescriptor};
pub use validator::Validator;
