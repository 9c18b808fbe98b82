//! Shared, atomically replaceable graph snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use dialogue_core::GraphModel;

/// Holds the current graph generation.
///
/// Readers take an `Arc` snapshot and keep using it for as long as they
/// like; a reload swaps the pointer and never touches a snapshot in use.
#[derive(Debug)]
pub struct GraphStore {
    current: RwLock<Arc<GraphModel>>,
}

impl GraphStore {
    pub fn new(graph: GraphModel) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<GraphModel> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn generation(&self) -> u64 {
        self.load().generation()
    }

    /// Installs `graph` as the next generation and returns the new snapshot.
    pub fn replace(&self, graph: GraphModel) -> Arc<GraphModel> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = current.generation() + 1;
        let next = Arc::new(graph.with_generation(generation));
        *current = Arc::clone(&next);
        tracing::info!(generation, characters = next.characters().len(), "graph reloaded");
        next
    }
}

#[cfg(test)]
mod tests {
    use dialogue_core::fixtures;

    use super::*;

    #[test]
    fn replace_bumps_generation_and_keeps_old_snapshots() {
        let store = GraphStore::new(fixtures::tavern());
        let before = store.load();

        let after = store.replace(fixtures::tavern());
        assert_eq!(after.generation(), before.generation() + 1);
        assert_eq!(store.generation(), after.generation());
        assert!(!Arc::ptr_eq(&before, &store.load()));
        assert_eq!(before.generation(), 0);
    }
}
