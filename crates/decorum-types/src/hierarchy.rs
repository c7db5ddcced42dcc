//! Declared type hierarchy and ordinary assignability
//!
//! The hierarchy records, per raw identity, whether the type is a class or an
//! interface, its type variables, its direct supertypes and the methods it
//! declares. It answers the "ordinary" subtype question used for wildcard and
//! variable bound checks, and the supertype walk used by exact-mode matching.
//!
//! Types the hierarchy does not know are treated as leaves: they are only
//! assignable to themselves and to the top type.

use crate::error::TypeError;
use crate::ty::{MethodSignature, RawType, TypeParam, TypeRef, DEFAULT_TOP_TYPE};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;

/// Whether a declared type is a class or an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Concrete or abstract class
    Class,
    /// Interface
    Interface,
}

/// Declaration of one raw type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Raw identity
    pub raw: RawType,
    /// Class or interface
    pub kind: TypeKind,
    /// Declared type variable names, in order
    pub type_vars: Vec<Arc<str>>,
    /// Direct supertypes, expressed in terms of `type_vars`
    pub supertypes: Vec<TypeRef>,
    /// Methods declared directly by this type
    pub methods: FxHashSet<MethodSignature>,
}

impl TypeDecl {
    /// Declare an interface
    pub fn interface(raw: impl Into<RawType>) -> Self {
        TypeDecl {
            raw: raw.into(),
            kind: TypeKind::Interface,
            type_vars: Vec::new(),
            supertypes: Vec::new(),
            methods: FxHashSet::default(),
        }
    }

    /// Declare a class
    pub fn class(raw: impl Into<RawType>) -> Self {
        TypeDecl {
            kind: TypeKind::Class,
            ..TypeDecl::interface(raw)
        }
    }

    /// Add type variables
    pub fn with_type_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.type_vars.extend(vars.into_iter().map(Into::into));
        self
    }

    /// Add a direct supertype
    pub fn extends(mut self, supertype: TypeRef) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// Add a declared method
    pub fn method(mut self, signature: MethodSignature) -> Self {
        self.methods.insert(signature);
        self
    }
}

/// Registry of declared types
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    top: RawType,
    types: FxHashMap<RawType, TypeDecl>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        TypeHierarchy::new(RawType::new(DEFAULT_TOP_TYPE))
    }
}

impl TypeHierarchy {
    /// Create an empty hierarchy rooted at `top`
    pub fn new(top: RawType) -> Self {
        TypeHierarchy {
            top,
            types: FxHashMap::default(),
        }
    }

    /// Raw identity of the top type
    pub fn top(&self) -> &RawType {
        &self.top
    }

    /// Whether `ty` is the top type
    pub fn is_top(&self, ty: &TypeRef) -> bool {
        ty.raw == self.top && !ty.is_parameterized()
    }

    /// Look up a declaration
    pub fn get(&self, raw: &RawType) -> Option<&TypeDecl> {
        self.types.get(raw)
    }

    /// Kind of a declared type, `None` if unknown
    pub fn kind_of(&self, raw: &RawType) -> Option<TypeKind> {
        self.types.get(raw).map(|decl| decl.kind)
    }

    /// Number of declared types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are declared
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declare a type
    ///
    /// Rejects duplicates, supertype arguments that disagree with a known
    /// supertype's declared variables, and declarations that would close a
    /// supertype cycle.
    pub fn declare(&mut self, decl: TypeDecl) -> Result<(), TypeError> {
        if self.types.contains_key(&decl.raw) {
            return Err(TypeError::DuplicateType {
                name: decl.raw.to_string(),
            });
        }

        for supertype in &decl.supertypes {
            if let Some(known) = self.types.get(&supertype.raw) {
                if supertype.is_parameterized() && supertype.params.len() != known.type_vars.len()
                {
                    return Err(TypeError::InvalidTypeArgCount {
                        name: supertype.raw.to_string(),
                        expected: known.type_vars.len(),
                        actual: supertype.params.len(),
                    });
                }
            }
        }

        let raw = decl.raw.clone();
        self.types.insert(raw.clone(), decl);

        if let Some(cycle) = self.find_cycle(&raw) {
            self.types.remove(&raw);
            return Err(TypeError::CircularReference { cycle });
        }

        Ok(())
    }

    fn find_cycle(&self, start: &RawType) -> Option<String> {
        let mut stack: Vec<(RawType, Vec<RawType>)> = vec![(start.clone(), vec![start.clone()])];
        let mut visited = FxHashSet::default();

        while let Some((current, path)) = stack.pop() {
            let Some(decl) = self.types.get(&current) else {
                continue;
            };
            for supertype in &decl.supertypes {
                if &supertype.raw == start {
                    let mut names: Vec<&str> = path.iter().map(RawType::as_str).collect();
                    names.push(start.as_str());
                    return Some(names.join(" -> "));
                }
                if visited.insert(supertype.raw.clone()) {
                    let mut next = path.clone();
                    next.push(supertype.raw.clone());
                    stack.push((supertype.raw.clone(), next));
                }
            }
        }

        None
    }

    /// Direct supertypes of `ty` with its type arguments substituted
    ///
    /// A raw use of a generic type yields erased supertypes.
    pub fn direct_supertypes(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let Some(decl) = self.types.get(&ty.raw) else {
            return Vec::new();
        };

        if !ty.is_parameterized() && !decl.type_vars.is_empty() {
            return decl.supertypes.iter().map(TypeRef::erased).collect();
        }

        let bindings: Vec<(Arc<str>, TypeParam)> = decl
            .type_vars
            .iter()
            .cloned()
            .zip(ty.params.iter().cloned())
            .collect();

        decl.supertypes
            .iter()
            .map(|supertype| supertype.substitute(&bindings))
            .collect()
    }

    /// Find `ty` or one of its supertypes whose raw identity is `raw`
    pub fn find_supertype(&self, ty: &TypeRef, raw: &RawType) -> Option<TypeRef> {
        let mut queue = VecDeque::from([ty.clone()]);
        let mut visited = FxHashSet::default();

        while let Some(current) = queue.pop_front() {
            if &current.raw == raw {
                return Some(current);
            }
            if !visited.insert(current.raw.clone()) {
                continue;
            }
            queue.extend(self.direct_supertypes(&current));
        }

        None
    }

    /// Ordinary subtype assignability: can a `sub` be used where `sup` is expected
    pub fn is_assignable(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        if self.is_top(sup) {
            return true;
        }

        let Some(found) = self.find_supertype(sub, &sup.raw) else {
            return false;
        };

        // Raw on either side erases the comparison
        if !found.is_parameterized() || !sup.is_parameterized() {
            return true;
        }

        found.params.len() == sup.params.len()
            && found
                .params
                .iter()
                .zip(&sup.params)
                .all(|(sub_param, sup_param)| self.contains(sub_param, sup_param))
    }

    /// Whether type argument `sub` is contained by type argument `sup`
    fn contains(&self, sub: &TypeParam, sup: &TypeParam) -> bool {
        match (sub, sup) {
            (TypeParam::Actual(t), TypeParam::Wildcard { upper, lower }) => {
                upper.as_deref().map_or(true, |u| self.is_assignable(t, u))
                    && lower.as_deref().map_or(true, |l| self.is_assignable(l, t))
            }
            (TypeParam::Variable { upper_bound, .. }, TypeParam::Wildcard { upper, lower }) => {
                upper
                    .as_deref()
                    .map_or(true, |u| self.is_assignable(upper_bound, u))
                    && lower.is_none()
            }
            (
                TypeParam::Wildcard {
                    upper: sub_upper,
                    lower: sub_lower,
                },
                TypeParam::Wildcard { upper, lower },
            ) => {
                let upper_ok = match (sub_upper.as_deref(), upper.as_deref()) {
                    (_, None) => true,
                    (_, Some(u)) if self.is_top(u) => true,
                    (Some(su), Some(u)) => self.is_assignable(su, u),
                    (None, Some(_)) => false,
                };
                let lower_ok = match (sub_lower.as_deref(), lower.as_deref()) {
                    (_, None) => true,
                    (Some(sl), Some(l)) => self.is_assignable(l, sl),
                    (None, Some(_)) => false,
                };
                upper_ok && lower_ok
            }
            _ => sub == sup,
        }
    }

    /// Whether `raw` or one of its supertypes declares `method`
    pub fn declares_method(&self, raw: &RawType, method: &MethodSignature) -> bool {
        let mut queue = VecDeque::from([raw.clone()]);
        let mut visited = FxHashSet::default();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(decl) = self.types.get(&current) else {
                continue;
            };
            if decl.methods.contains(method) {
                return true;
            }
            queue.extend(decl.supertypes.iter().map(|s| s.raw.clone()));
        }

        false
    }
}
