//! Decorum Type Model
//!
//! Structural type references, the declared type hierarchy, and the
//! assignability rules used to bind decorators to the types they decorate.

#![warn(missing_docs)]

pub mod error;
pub mod hierarchy;
pub mod matcher;
pub mod parse;
pub mod ty;

pub use error::TypeError;
pub use hierarchy::{TypeDecl, TypeHierarchy, TypeKind};
pub use matcher::DelegateMatcher;
pub use parse::{parse_type_ref, TypeParser};
pub use ty::{MethodSignature, RawType, TypeParam, TypeRef, DEFAULT_TOP_TYPE};
