//! Deployment manifest parsing (decorum.toml)
//!
//! The manifest carries the decoded form of per-scope decorator declarations:
//! for each scope, the ordered list of decorator classes enabled there.
//!
//! ```toml
//! [engine]
//! top-type = "java.lang.Object"
//!
//! [[scope]]
//! id = "orders.jar"
//! decorators = ["com.acme.AuditDecorator", "com.acme.TimingDecorator"]
//! ```

use crate::descriptor::{DecoratorId, ScopeId};
use crate::error::DeploymentError;
use decorum_types::{RawType, TypeHierarchy, TypeParser, DEFAULT_TOP_TYPE};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Deployment manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeploymentManifest {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Scope declarations, in file order
    #[serde(default, rename = "scope")]
    pub scopes: Vec<ScopeDeclaration>,
}

/// Engine-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Raw identity of the top type (default: "Object")
    #[serde(default = "default_top_type")]
    pub top_type: String,
}

fn default_top_type() -> String {
    DEFAULT_TOP_TYPE.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_type: default_top_type(),
        }
    }
}

impl EngineConfig {
    /// An empty type hierarchy rooted at the configured top type
    pub fn new_hierarchy(&self) -> TypeHierarchy {
        TypeHierarchy::new(RawType::new(self.top_type.as_str()))
    }

    /// A type parser bounding unbounded variables by the configured top type
    pub fn type_parser(&self) -> TypeParser {
        TypeParser::new(RawType::new(self.top_type.as_str()))
    }
}

/// Decorators declared by one scope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScopeDeclaration {
    /// Scope identifier
    pub id: String,

    /// Decorator classes, in application order
    #[serde(default)]
    pub decorators: Vec<String>,
}

impl ScopeDeclaration {
    /// Scope identifier
    pub fn scope_id(&self) -> ScopeId {
        ScopeId::new(self.id.as_str())
    }

    /// Declared classes with their positions
    pub fn positioned(&self) -> impl Iterator<Item = (u32, DecoratorId)> + '_ {
        (0u32..)
            .zip(&self.decorators)
            .map(|(position, class)| (position, DecoratorId::new(class.as_str())))
    }
}

impl DeploymentManifest {
    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, DeploymentError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Validate the manifest
    ///
    /// Scope identifiers must be non-empty and unique, and no scope may list
    /// the same class twice.
    pub fn validate(&self) -> Result<(), DeploymentError> {
        if self.engine.top_type.trim().is_empty() {
            return Err(DeploymentError::InvalidManifest(
                "top-type cannot be empty".to_string(),
            ));
        }

        let mut seen_scopes = FxHashSet::default();
        for scope in &self.scopes {
            if scope.id.trim().is_empty() {
                return Err(DeploymentError::InvalidManifest(
                    "Scope id cannot be empty".to_string(),
                ));
            }
            if !seen_scopes.insert(scope.id.as_str()) {
                return Err(DeploymentError::InvalidManifest(format!(
                    "Scope {} is declared more than once",
                    scope.id
                )));
            }

            let mut seen_classes = FxHashSet::default();
            for class in &scope.decorators {
                if !seen_classes.insert(class.as_str()) {
                    return Err(DeploymentError::DuplicateDecorator {
                        scope: format!("scope {}", scope.id),
                        decorator: DecoratorId::new(class.as_str()),
                    });
                }
            }
        }

        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, DeploymentError> {
        toml::to_string_pretty(self).map_err(|e| DeploymentError::InvalidManifest(e.to_string()))
    }
}

impl FromStr for DeploymentManifest {
    type Err = DeploymentError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let manifest: DeploymentManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest: DeploymentManifest = r#"
            [engine]
            top-type = "java.lang.Object"

            [[scope]]
            id = "orders.jar"
            decorators = ["Audit", "Timing"]

            [[scope]]
            id = "billing.jar"
        "#
        .parse()
        .unwrap();

        assert_eq!(manifest.engine.top_type, "java.lang.Object");
        assert_eq!(manifest.scopes.len(), 2);
        let positioned: Vec<_> = manifest.scopes[0].positioned().collect();
        assert_eq!(
            positioned,
            vec![(0, DecoratorId::new("Audit")), (1, DecoratorId::new("Timing"))]
        );
        assert!(manifest.scopes[1].decorators.is_empty());
    }

    #[test]
    fn test_defaults() {
        let manifest: DeploymentManifest = "".parse().unwrap();
        assert_eq!(manifest.engine.top_type, DEFAULT_TOP_TYPE);
        assert!(manifest.scopes.is_empty());
        assert_eq!(manifest.engine.new_hierarchy().top().as_str(), DEFAULT_TOP_TYPE);
    }

    #[test]
    fn test_duplicate_class_in_scope() {
        let result: Result<DeploymentManifest, _> = r#"
            [[scope]]
            id = "app"
            decorators = ["Audit", "Timing", "Audit"]
        "#
        .parse();
        assert!(matches!(
            result,
            Err(DeploymentError::DuplicateDecorator { .. })
        ));
    }

    #[test]
    fn test_duplicate_scope() {
        let result: Result<DeploymentManifest, _> = r#"
            [[scope]]
            id = "app"

            [[scope]]
            id = "app"
        "#
        .parse();
        assert!(matches!(result, Err(DeploymentError::InvalidManifest(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result: Result<DeploymentManifest, _> = "[[scope]\nid = ".parse();
        assert!(matches!(result, Err(DeploymentError::Parse(_))));
    }

    #[test]
    fn test_serialize_then_parse() {
        let manifest = DeploymentManifest {
            engine: EngineConfig::default(),
            scopes: vec![ScopeDeclaration {
                id: "app".to_string(),
                decorators: vec!["Audit".to_string()],
            }],
        };
        let text = manifest.to_toml_string().unwrap();
        let parsed: DeploymentManifest = text.parse().unwrap();
        assert_eq!(parsed, manifest);
    }
}
