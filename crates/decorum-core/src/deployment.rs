//! Deployment bootstrap.
//!
//! Wires the metadata source, the manifest and the type hierarchy into a
//! frozen registry and a resolver. Any definition or deployment error aborts
//! the whole deployment.

use crate::descriptor::Enablement;
use crate::error::DeploymentError;
use crate::manifest::DeploymentManifest;
use crate::metadata::MetadataSource;
use crate::registry::{Registry, RegistryBuilder};
use crate::resolver::Resolver;
use crate::validator::Validator;
use decorum_types::TypeHierarchy;
use std::sync::Arc;
use tracing::{debug, info};

/// A validated, frozen deployment
#[derive(Debug)]
pub struct Deployment {
    registry: Arc<Registry>,
    resolver: Resolver,
}

impl Deployment {
    /// Register every enabled decorator and freeze the result
    ///
    /// Decorators declaring a priority are enabled globally, in metadata
    /// order. Each manifest scope then enables its listed classes at their
    /// list positions.
    pub fn bootstrap(
        metadata: &dyn MetadataSource,
        manifest: &DeploymentManifest,
        hierarchy: TypeHierarchy,
    ) -> Result<Self, DeploymentError> {
        manifest.validate()?;

        if hierarchy.top().as_str() != manifest.engine.top_type {
            return Err(DeploymentError::InvalidManifest(format!(
                "top-type {} does not match the hierarchy's top type {}",
                manifest.engine.top_type,
                hierarchy.top()
            )));
        }

        let validator = Validator::new(&hierarchy);
        let mut builder = RegistryBuilder::new();

        for class in metadata.classes().filter(|class| class.is_decorator) {
            match class.priority {
                Some(priority) => {
                    let descriptor =
                        validator.validate(class, Enablement::GlobalPriority(priority))?;
                    builder.register(descriptor)?;
                }
                None => debug!(decorator = %class.id, "decorator has no priority"),
            }
        }

        for scope in &manifest.scopes {
            let scope_id = scope.scope_id();
            for (position, class_id) in scope.positioned() {
                let class = metadata
                    .class(&class_id)
                    .ok_or_else(|| DeploymentError::UnknownClass {
                        scope: scope_id.clone(),
                        class: class_id.clone(),
                    })?;
                if !class.is_decorator {
                    return Err(DeploymentError::NotADecorator {
                        scope: scope_id.clone(),
                        class: class_id,
                    });
                }
                let descriptor = validator.validate(
                    class,
                    Enablement::ScopeDeclared {
                        scope: scope_id.clone(),
                        position,
                    },
                )?;
                builder.register(descriptor)?;
            }
        }

        info!(
            decorators = builder.len(),
            scopes = manifest.scopes.len(),
            "decorator deployment validated"
        );

        let registry = Arc::new(builder.freeze());
        let resolver = Resolver::new(Arc::clone(&registry), Arc::new(hierarchy));
        Ok(Deployment { registry, resolver })
    }

    /// The frozen registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The resolver over this deployment
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}
