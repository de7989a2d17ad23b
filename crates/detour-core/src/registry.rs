//! Alias-keyed collection of stubs.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use detour_extractor::MetadataProvider;

use crate::errors::IndirectionError;
use crate::stub::IndirectionStub;

#[derive(Debug, Default)]
pub struct StubRegistry {
    stubs: RwLock<BTreeMap<String, Arc<IndirectionStub>>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One stub per method of `provider`, keyed by the provider's keys.
    pub fn from_provider<P>(provider: &P) -> Result<Self, IndirectionError>
    where
        P: MetadataProvider + ?Sized,
    {
        let registry = Self::new();
        for (key, _) in provider.methods() {
            registry.register(IndirectionStub::from_provider(provider, key)?)?;
        }
        debug!(stubs = registry.len(), "built stub registry from metadata");
        Ok(registry)
    }

    pub fn register(&self, stub: IndirectionStub) -> Result<Arc<IndirectionStub>, IndirectionError> {
        let mut stubs = self.stubs.write();
        if stubs.contains_key(stub.alias()) {
            return Err(IndirectionError::Metadata {
                target: stub.alias().to_string(),
                message: "alias is already registered".to_string(),
            });
        }
        let stub = Arc::new(stub);
        stubs.insert(stub.alias().to_string(), Arc::clone(&stub));
        Ok(stub)
    }

    pub fn get(&self, alias: &str) -> Option<Arc<IndirectionStub>> {
        self.stubs.read().get(alias).cloned()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.stubs.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.stubs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.read().is_empty()
    }

    /// Clear every stub's body.
    pub fn clear_bodies(&self) {
        let stubs = self.stubs.read();
        for stub in stubs.values() {
            stub.clear_body();
        }
        debug!(stubs = stubs.len(), "cleared indirection bodies");
    }
}
