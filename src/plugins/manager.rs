use std::sync::Arc;

use super::traits::ListingSource;

struct SourceEntry {
    source: Arc<dyn ListingSource>,
    cooldown: u32,
}

/// Registered listing sources, in registration order, with a per-source
/// cooldown after the source answered with an anti-automation response.
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
    cooldown_passes: u32,
}

impl SourceRegistry {
    pub fn new(cooldown_passes: u32) -> Self {
        Self {
            entries: Vec::new(),
            cooldown_passes,
        }
    }

    pub fn with_sources(sources: Vec<Arc<dyn ListingSource>>, cooldown_passes: u32) -> Self {
        let mut registry = Self::new(cooldown_passes);
        for source in sources {
            registry.register(source);
        }
        registry
    }

    /// Register a source; a later source with the same name replaces the earlier one
    pub fn register(&mut self, source: Arc<dyn ListingSource>) {
        let name = source.name().to_string();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.source.name() == name) {
            entry.source = source;
            entry.cooldown = 0;
        } else {
            self.entries.push(SourceEntry { source, cooldown: 0 });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.source.name().to_string()).collect()
    }

    /// Sources to query this pass. Sources still cooling down are skipped
    /// and their remaining cooldown shrinks by one pass.
    pub fn ready_sources(&mut self) -> Vec<Arc<dyn ListingSource>> {
        let mut ready = Vec::with_capacity(self.entries.len());
        for entry in &mut self.entries {
            if entry.cooldown > 0 {
                entry.cooldown -= 1;
                tracing::info!(
                    source = entry.source.name(),
                    remaining = entry.cooldown,
                    "Skipping blocked source"
                );
                continue;
            }
            ready.push(Arc::clone(&entry.source));
        }
        ready
    }

    pub fn mark_blocked(&mut self, name: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.source.name() == name) {
            entry.cooldown = self.cooldown_passes;
            tracing::warn!(source = name, passes = self.cooldown_passes, "Source blocked, cooling down");
        }
    }

    pub fn cooldown_remaining(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.source.name() == name)
            .map(|e| e.cooldown)
    }
}
