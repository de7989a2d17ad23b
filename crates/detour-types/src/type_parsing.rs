//! Type string parsing utilities.
//!
//! Parses the reflection form of a type name back into a [`TypeRef`]:
//!
//! - Named types: `System.String`, `Ns.Outer+Inner`, keywords such as `int`
//! - Generic instantiations: ``System.Nullable`1[T]``, ``IndirectionFunc`3[System.String,T,T]``
//! - Arrays: `T[]`, `T[,]`
//! - By-reference and pointer types: `System.Boolean&`, `System.Byte*`
//!
//! Bare names are looked up as generic parameters first (method parameters
//! shadow type parameters), then in the [`TypeUniverse`].
//!
//! # Examples
//!
//! ```
//! use detour_types::{parse_type, GenericScope, TypeUniverse};
//!
//! let universe = TypeUniverse::with_system_types();
//! let ty = parse_type("System.Nullable`1[System.Int32]&", &universe, &GenericScope::EMPTY).unwrap();
//! assert_eq!(ty.to_string(), "System.Nullable`1[System.Int32]&");
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::type_ref::{GenericParam, TypeRef};
use crate::universe::TypeUniverse;

/// Generic parameters visible while parsing a signature.
#[derive(Debug, Clone, Copy)]
pub struct GenericScope<'a> {
    pub type_params: &'a [Arc<GenericParam>],
    pub method_params: &'a [Arc<GenericParam>],
}

impl<'a> GenericScope<'a> {
    pub const EMPTY: GenericScope<'static> = GenericScope {
        type_params: &[],
        method_params: &[],
    };

    pub fn new(type_params: &'a [Arc<GenericParam>], method_params: &'a [Arc<GenericParam>]) -> Self {
        Self {
            type_params,
            method_params,
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a Arc<GenericParam>> {
        self.method_params
            .iter()
            .chain(self.type_params.iter())
            .find(|p| p.name() == name)
    }
}

/// Parse a reflection-form type string.
pub fn parse_type(type_str: &str, universe: &TypeUniverse, scope: &GenericScope<'_>) -> Result<TypeRef> {
    let type_str = type_str.trim();
    if type_str.is_empty() {
        return Err(anyhow!("empty type name"));
    }

    // Suffixes bind last, so peel them from the right.
    if let Some(inner) = type_str.strip_suffix('&') {
        return Ok(TypeRef::by_ref(parse_type(inner, universe, scope)?));
    }
    if let Some(inner) = type_str.strip_suffix('*') {
        return Ok(TypeRef::pointer(parse_type(inner, universe, scope)?));
    }

    if type_str.ends_with(']') {
        let open = matching_open_bracket(type_str)
            .ok_or_else(|| anyhow!("unbalanced brackets in type: {}", type_str))?;
        let prefix = &type_str[..open];
        let content = &type_str[open + 1..type_str.len() - 1];

        if content.chars().all(|c| c == ',' || c.is_whitespace()) {
            let rank = content.chars().filter(|&c| c == ',').count() as u32 + 1;
            return Ok(TypeRef::array(parse_type(prefix, universe, scope)?, rank));
        }

        let def = universe
            .get(prefix.trim())
            .ok_or_else(|| anyhow!("unknown generic type definition: {}", prefix.trim()))?;
        let args = split_type_args(content)
            .into_iter()
            .map(|arg| parse_type(arg, universe, scope))
            .collect::<Result<Vec<_>>>()?;
        if args.len() != def.arity() {
            return Err(anyhow!(
                "{} expects {} type argument(s), got {}",
                def.full_name(),
                def.arity(),
                args.len()
            ));
        }
        return Ok(TypeRef::generic(&def, args));
    }

    if let Some(param) = scope.lookup(type_str) {
        return Ok(TypeRef::param(param));
    }

    let def = universe
        .get(type_str)
        .ok_or_else(|| anyhow!("unknown type: {}", type_str))?;
    if def.arity() > 0 {
        return Err(anyhow!(
            "{} expects {} type argument(s), got none",
            def.full_name(),
            def.arity()
        ));
    }
    Ok(TypeRef::named(&def))
}

/// Index of the `[` matching the trailing `]`.
fn matching_open_bracket(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices().rev() {
        match c {
            ']' => depth += 1,
            '[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split type arguments respecting nested brackets.
///
/// Given "A,B`1[C],D[,]", returns ["A", "B`1[C]", "D[,]"] by tracking bracket depth.
pub fn split_type_args(s: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                result.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < s.len() {
        result.push(s[start..].trim());
    }

    result
}
