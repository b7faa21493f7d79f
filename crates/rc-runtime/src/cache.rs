use std::collections::HashMap;
use std::sync::Arc;

use rc_compiler::CompiledArtifact;
use rc_core::{Diagnostic, DocumentIdentity};

#[derive(Debug, Clone)]
pub enum CacheEntry {
    Compiled(Arc<CompiledArtifact>),
    Failed(Arc<Vec<Diagnostic>>),
}

#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: HashMap<DocumentIdentity, CacheEntry>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &DocumentIdentity) -> Option<&CacheEntry> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &DocumentIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    // First write wins.
    pub fn insert(&mut self, identity: DocumentIdentity, entry: CacheEntry) -> &CacheEntry {
        self.entries.entry(identity).or_insert(entry)
    }

    pub fn insert_compiled(
        &mut self,
        identity: DocumentIdentity,
        artifact: CompiledArtifact,
    ) -> &CacheEntry {
        self.insert(identity, CacheEntry::Compiled(Arc::new(artifact)))
    }

    pub fn insert_failed(
        &mut self,
        identity: DocumentIdentity,
        diagnostics: Vec<Diagnostic>,
    ) -> &CacheEntry {
        self.insert(identity, CacheEntry::Failed(Arc::new(diagnostics)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
