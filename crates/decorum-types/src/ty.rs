//! Core type definitions for decorator matching
//!
//! A [`TypeRef`] is a structural, immutable description of a possibly generic
//! type: a raw identity plus an ordered list of [`TypeParam`]s.

use std::fmt;
use std::sync::Arc;

/// Raw identity of the type every unbounded type variable is bounded by
pub const DEFAULT_TOP_TYPE: &str = "Object";

/// Raw (erased) identity of a type, e.g. `List` for `List<String>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawType(Arc<str>);

impl RawType {
    /// Create a raw identity from a name
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        RawType(name.into())
    }

    /// The identity as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawType {
    fn from(name: &str) -> Self {
        RawType::new(name)
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (possibly parameterized) type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    /// Raw identity
    pub raw: RawType,
    /// Type parameters, empty for a raw or non-generic type
    pub params: Vec<TypeParam>,
}

/// One position in a type parameter list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeParam {
    /// Concrete type argument: `List<String>`
    Actual(TypeRef),

    /// Type variable: `List<T>`, `List<T extends Number>`
    Variable {
        /// Variable name, kept for display and substitution
        name: Arc<str>,
        /// Upper bound; the top type when unbounded
        upper_bound: Box<TypeRef>,
    },

    /// Wildcard: `?`, `? extends U`, `? super L`
    Wildcard {
        /// Upper bound, if any
        upper: Option<Box<TypeRef>>,
        /// Lower bound, if any
        lower: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    /// A type without parameters
    pub fn raw(name: impl Into<RawType>) -> Self {
        TypeRef {
            raw: name.into(),
            params: Vec::new(),
        }
    }

    /// A parameterized type
    pub fn parameterized(name: impl Into<RawType>, params: Vec<TypeParam>) -> Self {
        TypeRef {
            raw: name.into(),
            params,
        }
    }

    /// The default top type
    pub fn object() -> Self {
        TypeRef::raw(DEFAULT_TOP_TYPE)
    }

    /// Whether this type carries type parameters
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }

    /// This type with its parameters erased
    pub fn erased(&self) -> TypeRef {
        TypeRef::raw(self.raw.clone())
    }

    /// Structural identity: same raw identity and identical parameter lists
    pub fn is_identical(&self, other: &TypeRef) -> bool {
        self == other
    }

    /// Replace type variables by name, leaving unknown variables untouched
    pub fn substitute(&self, bindings: &[(Arc<str>, TypeParam)]) -> TypeRef {
        if bindings.is_empty() {
            return self.clone();
        }
        TypeRef {
            raw: self.raw.clone(),
            params: self
                .params
                .iter()
                .map(|param| param.substitute(bindings))
                .collect(),
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::raw(name)
    }
}

impl TypeParam {
    /// Concrete argument
    pub fn actual(ty: TypeRef) -> Self {
        TypeParam::Actual(ty)
    }

    /// Type variable with an explicit upper bound
    pub fn variable(name: impl Into<Arc<str>>, upper_bound: TypeRef) -> Self {
        TypeParam::Variable {
            name: name.into(),
            upper_bound: Box::new(upper_bound),
        }
    }

    /// Type variable bounded by the default top type
    pub fn unbounded(name: impl Into<Arc<str>>) -> Self {
        TypeParam::variable(name, TypeRef::object())
    }

    /// Unbounded wildcard `?`
    pub fn wildcard() -> Self {
        TypeParam::Wildcard {
            upper: None,
            lower: None,
        }
    }

    /// `? extends upper`
    pub fn extends(upper: TypeRef) -> Self {
        TypeParam::Wildcard {
            upper: Some(Box::new(upper)),
            lower: None,
        }
    }

    /// `? super lower`
    pub fn super_of(lower: TypeRef) -> Self {
        TypeParam::Wildcard {
            upper: None,
            lower: Some(Box::new(lower)),
        }
    }

    fn substitute(&self, bindings: &[(Arc<str>, TypeParam)]) -> TypeParam {
        match self {
            TypeParam::Actual(ty) => TypeParam::Actual(ty.substitute(bindings)),
            TypeParam::Variable { name, upper_bound } => bindings
                .iter()
                .find(|(bound_name, _)| bound_name == name)
                .map(|(_, param)| param.clone())
                .unwrap_or_else(|| TypeParam::Variable {
                    name: name.clone(),
                    upper_bound: Box::new(upper_bound.substitute(bindings)),
                }),
            TypeParam::Wildcard { upper, lower } => TypeParam::Wildcard {
                upper: upper.as_ref().map(|u| Box::new(u.substitute(bindings))),
                lower: lower.as_ref().map(|l| Box::new(l.substitute(bindings))),
            },
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if !self.params.is_empty() {
            write!(f, "<")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeParam::Actual(ty) => write!(f, "{}", ty),
            TypeParam::Variable { name, upper_bound } => {
                write!(f, "${}", name)?;
                if upper_bound.raw.as_str() != DEFAULT_TOP_TYPE || upper_bound.is_parameterized() {
                    write!(f, " extends {}", upper_bound)?;
                }
                Ok(())
            }
            TypeParam::Wildcard { upper, lower } => {
                write!(f, "?")?;
                if let Some(upper) = upper {
                    write!(f, " extends {}", upper)?;
                }
                if let Some(lower) = lower {
                    write!(f, " super {}", lower)?;
                }
                Ok(())
            }
        }
    }
}

/// Name and parameter types of a business method
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSignature {
    /// Method name
    pub name: Arc<str>,
    /// Erased parameter types
    pub params: Vec<RawType>,
}

impl MethodSignature {
    /// Create a signature
    pub fn new<I, P>(name: impl Into<Arc<str>>, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<RawType>,
    {
        MethodSignature {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// A signature without parameters
    pub fn nullary(name: impl Into<Arc<str>>) -> Self {
        MethodSignature {
            name: name.into(),
            params: Vec::new(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
