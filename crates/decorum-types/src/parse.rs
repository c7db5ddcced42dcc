//! Type text parsing
//!
//! Builds [`TypeRef`]s from their textual form so that metadata sources,
//! manifests and tests can spell types the way they are declared.
//!
//! Supported forms:
//! - Raw types: `Logger`, `java.util.List`
//! - Parameterized types: `Map<String, List<Integer>>`
//! - Type variables: `$T`, `$T extends Number`
//! - Wildcards: `?`, `? extends Number`, `? super Integer`

use crate::error::TypeError;
use crate::ty::{RawType, TypeParam, TypeRef, DEFAULT_TOP_TYPE};

/// Parser carrying the top type used to bound unbounded variables
#[derive(Debug, Clone)]
pub struct TypeParser {
    top: RawType,
}

impl Default for TypeParser {
    fn default() -> Self {
        TypeParser::new(RawType::new(DEFAULT_TOP_TYPE))
    }
}

impl TypeParser {
    /// Create a parser bounding unbounded variables by `top`
    pub fn new(top: RawType) -> Self {
        TypeParser { top }
    }

    /// Parse a type reference
    pub fn parse(&self, text: &str) -> Result<TypeRef, TypeError> {
        self.parse_type(text.trim(), text)
    }

    fn parse_type(&self, text: &str, input: &str) -> Result<TypeRef, TypeError> {
        let (base, args) = match text.find('<') {
            Some(angle_pos) => {
                let args = text[angle_pos..]
                    .strip_prefix('<')
                    .and_then(|s| s.strip_suffix('>'))
                    .ok_or_else(|| parse_error(input, "unbalanced '<' in type arguments"))?;
                (text[..angle_pos].trim(), Some(args))
            }
            None => (text, None),
        };

        if !is_valid_identifier(base) {
            return Err(parse_error(input, format!("invalid type name '{}'", base)));
        }

        let params = match args {
            Some(args) => {
                if args.trim().is_empty() {
                    return Err(parse_error(input, "empty type argument list"));
                }
                split_type_params(args, input)?
                    .into_iter()
                    .map(|arg| self.parse_param(arg, input))
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };

        Ok(TypeRef::parameterized(base, params))
    }

    fn parse_param(&self, text: &str, input: &str) -> Result<TypeParam, TypeError> {
        if let Some(rest) = text.strip_prefix('?') {
            let rest = rest.trim();
            if rest.is_empty() {
                return Ok(TypeParam::wildcard());
            }
            if let Some(upper) = rest.strip_prefix("extends ") {
                return Ok(TypeParam::extends(self.parse_type(upper.trim(), input)?));
            }
            if let Some(lower) = rest.strip_prefix("super ") {
                return Ok(TypeParam::super_of(self.parse_type(lower.trim(), input)?));
            }
            return Err(parse_error(input, format!("invalid wildcard '{}'", text)));
        }

        if let Some(rest) = text.strip_prefix('$') {
            let (name, bound) = match rest.split_once(" extends ") {
                Some((name, bound)) => (name.trim(), Some(bound.trim())),
                None => (rest.trim(), None),
            };
            if !is_valid_identifier(name) {
                return Err(parse_error(input, format!("invalid type variable '{}'", text)));
            }
            let upper_bound = match bound {
                Some(bound) => self.parse_type(bound, input)?,
                None => TypeRef::raw(self.top.clone()),
            };
            return Ok(TypeParam::variable(name, upper_bound));
        }

        Ok(TypeParam::Actual(self.parse_type(text, input)?))
    }
}

/// Parse a type reference with the default top type
///
/// # Examples
///
/// ```
/// use decorum_types::parse_type_ref;
///
/// let ty = parse_type_ref("List<? extends Number>").unwrap();
/// assert_eq!(ty.raw.as_str(), "List");
/// ```
pub fn parse_type_ref(text: &str) -> Result<TypeRef, TypeError> {
    TypeParser::default().parse(text)
}

/// Split type parameters respecting nested angle brackets.
///
/// Given "A, B<C, D>, E", returns ["A", "B<C, D>", "E"] by tracking bracket depth.
fn split_type_params<'t>(s: &'t str, input: &str) -> Result<Vec<&'t str>, TypeError> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| parse_error(input, "unbalanced '>' in type arguments"))?;
            }
            ',' if depth == 0 => {
                result.push(non_empty(s[start..i].trim(), input)?);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(parse_error(input, "unbalanced '<' in type arguments"));
    }
    result.push(non_empty(s[start..].trim(), input)?);

    Ok(result)
}

fn non_empty<'t>(arg: &'t str, input: &str) -> Result<&'t str, TypeError> {
    if arg.is_empty() {
        Err(parse_error(input, "empty type argument"))
    } else {
        Ok(arg)
    }
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == ':')
}

fn parse_error(input: &str, reason: impl Into<String>) -> TypeError {
    TypeError::Parse {
        input: input.to_string(),
        reason: reason.into(),
    }
}
