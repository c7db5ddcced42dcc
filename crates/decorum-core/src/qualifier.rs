//! Qualifiers and qualifier resolution.
//!
//! A qualifier is an opaque, comparable token. Sets of qualifiers are kept in
//! `BTreeSet`s so that they are order-irrelevant and hashable.
//!
//! Two implicit qualifiers take part in resolution:
//! - a bean that declares no qualifier carries `Default`, and every bean
//!   carries `Any`;
//! - an injection point that declares no qualifier requires `Default`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Name of the implicit qualifier of unqualified beans and injection points
pub const DEFAULT_QUALIFIER: &str = "Default";

/// Name of the qualifier every bean carries
pub const ANY_QUALIFIER: &str = "Any";

/// A qualifier token with optional member values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    name: Arc<str>,
    members: BTreeMap<Arc<str>, Arc<str>>,
}

/// Order-irrelevant qualifier set
pub type QualifierSet = BTreeSet<Qualifier>;

impl Qualifier {
    /// A qualifier without members
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Qualifier {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    /// Add a member value
    pub fn with_member(mut self, key: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        self.members.insert(key.into(), value.into());
        self
    }

    /// `Default`
    pub fn default_qualifier() -> Self {
        Qualifier::new(DEFAULT_QUALIFIER)
    }

    /// `Any`
    pub fn any() -> Self {
        Qualifier::new(ANY_QUALIFIER)
    }

    /// Qualifier name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.members.is_empty() {
            write!(f, "(")?;
            for (i, (key, value)) in self.members.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Build a qualifier set from names
pub fn qualifiers<I, S>(names: I) -> QualifierSet
where
    I: IntoIterator<Item = S>,
    S: Into<Arc<str>>,
{
    names.into_iter().map(Qualifier::new).collect()
}

/// Qualifiers a bean effectively carries
pub fn bean_qualifiers(declared: &QualifierSet) -> QualifierSet {
    let mut effective = declared.clone();
    let only_any = declared.iter().all(|q| q.name() == ANY_QUALIFIER);
    if only_any {
        effective.insert(Qualifier::default_qualifier());
    }
    effective.insert(Qualifier::any());
    effective
}

/// Qualifiers an injection point effectively requires
pub fn required_qualifiers(declared: &QualifierSet) -> QualifierSet {
    if declared.is_empty() {
        QualifierSet::from([Qualifier::default_qualifier()])
    } else {
        declared.clone()
    }
}

/// Whether a bean declaring `available` satisfies an injection point
/// declaring `required`
pub fn satisfies(required: &QualifierSet, available: &QualifierSet) -> bool {
    let available = bean_qualifiers(available);
    required_qualifiers(required).is_subset(&available)
}
