//! Name-indexed set of type definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::type_ref::{Primitive, TypeDef};
use crate::well_known;

/// Type definitions keyed by full name (``System.Nullable`1``, ``Ns.Outer+Inner``).
#[derive(Debug, Default, Clone)]
pub struct TypeUniverse {
    types: BTreeMap<String, Arc<TypeDef>>,
}

impl TypeUniverse {
    /// Create an empty universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a universe holding the well-known `System` types.
    pub fn with_system_types() -> Self {
        let mut universe = Self::new();
        for def in well_known::definitions() {
            universe.types.insert(def.full_name(), def);
        }
        universe
    }

    /// Add a definition. Fails if another definition already uses the name.
    pub fn register(&mut self, def: TypeDef) -> Result<Arc<TypeDef>> {
        let name = def.full_name();
        if self.types.contains_key(&name) {
            return Err(anyhow!("type {} is already defined", name));
        }
        let def = Arc::new(def);
        self.types.insert(name, Arc::clone(&def));
        Ok(def)
    }

    /// Look up by full name, or by a source-language keyword (`int`, `string`, ...).
    pub fn get(&self, name: &str) -> Option<Arc<TypeDef>> {
        if let Some(def) = self.types.get(name) {
            return Some(Arc::clone(def));
        }
        let p = Primitive::ALL
            .iter()
            .find(|p| p.keyword() == Some(name))?;
        self.types
            .get(&format!("{}.{}", well_known::SYSTEM, p.name()))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDef>> {
        self.types.values()
    }
}
