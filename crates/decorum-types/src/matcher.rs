//! Delegate injection point assignability
//!
//! Decides whether a decorator's delegate type accepts one of a target's
//! types. These rules apply only to delegate matching; ordinary subtype
//! checks go through [`TypeHierarchy::is_assignable`] and are used here for
//! wildcard and variable bounds.

use crate::hierarchy::TypeHierarchy;
use crate::ty::{TypeParam, TypeRef};

/// Matcher for delegate types against candidate target types
///
/// Pure and stateless apart from the borrowed hierarchy; no results are
/// memoized.
#[derive(Debug, Clone, Copy)]
pub struct DelegateMatcher<'h> {
    hierarchy: &'h TypeHierarchy,
}

impl<'h> DelegateMatcher<'h> {
    /// Create a matcher over a hierarchy
    pub fn new(hierarchy: &'h TypeHierarchy) -> Self {
        DelegateMatcher { hierarchy }
    }

    /// Whether a target of type `candidate` can be decorated through a
    /// delegate of type `delegate`
    pub fn matches(&self, candidate: &TypeRef, delegate: &TypeRef) -> bool {
        if candidate.raw != delegate.raw {
            return false;
        }

        match (candidate.is_parameterized(), delegate.is_parameterized()) {
            (false, false) => true,
            // Raw candidate: every delegate argument must be unbounded
            (false, true) => delegate
                .params
                .iter()
                .all(|param| self.is_unbounded(param)),
            (true, true) => {
                candidate.params.len() == delegate.params.len()
                    && candidate
                        .params
                        .iter()
                        .zip(&delegate.params)
                        .all(|(c, d)| self.params_match(c, d))
            }
            (true, false) => false,
        }
    }

    /// Exact mode: `delegate`, or one of its supertypes, is `decorated` with
    /// identical type parameters
    pub fn exact_assignable(&self, delegate: &TypeRef, decorated: &TypeRef) -> bool {
        self.hierarchy
            .find_supertype(delegate, &decorated.raw)
            .map_or(false, |found| found.is_identical(decorated))
    }

    fn is_unbounded(&self, param: &TypeParam) -> bool {
        match param {
            TypeParam::Variable { upper_bound, .. } => self.hierarchy.is_top(upper_bound),
            TypeParam::Actual(ty) => self.hierarchy.is_top(ty),
            TypeParam::Wildcard { .. } => false,
        }
    }

    fn params_match(&self, candidate: &TypeParam, delegate: &TypeParam) -> bool {
        let h = self.hierarchy;
        match (candidate, delegate) {
            (TypeParam::Actual(c), TypeParam::Actual(d)) => self.matches(c, d),

            (TypeParam::Actual(t), TypeParam::Wildcard { upper, lower }) => {
                self.within_bounds(t, upper.as_deref(), lower.as_deref())
            }

            (TypeParam::Variable { upper_bound, .. }, TypeParam::Wildcard { upper, lower }) => {
                self.within_bounds(upper_bound, upper.as_deref(), lower.as_deref())
            }

            (
                TypeParam::Variable {
                    upper_bound: candidate_bound,
                    ..
                },
                TypeParam::Variable {
                    upper_bound: delegate_bound,
                    ..
                },
            ) => h.is_top(delegate_bound) || h.is_assignable(candidate_bound, delegate_bound),

            (TypeParam::Actual(t), TypeParam::Variable { upper_bound, .. }) => {
                h.is_top(upper_bound) || h.is_assignable(t, upper_bound)
            }

            _ => false,
        }
    }

    fn within_bounds(&self, ty: &TypeRef, upper: Option<&TypeRef>, lower: Option<&TypeRef>) -> bool {
        upper.map_or(true, |u| self.hierarchy.is_assignable(ty, u))
            && lower.map_or(true, |l| self.hierarchy.is_assignable(l, ty))
    }
}
