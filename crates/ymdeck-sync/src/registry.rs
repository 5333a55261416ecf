//! Active button contexts per capability.

use std::collections::HashMap;

use ymdeck_types::{Capability, ContextId};

/// Insertion-ordered sets of button contexts, one per capability.
#[derive(Debug, Default)]
pub struct Registry {
    sets: HashMap<Capability, Vec<ContextId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context. Returns `true` when it was not registered yet.
    pub fn register(&mut self, capability: Capability, context: ContextId) -> bool {
        let set = self.sets.entry(capability).or_default();
        if set.contains(&context) {
            return false;
        }
        set.push(context);
        true
    }

    /// Remove a context. Unknown contexts are ignored.
    pub fn unregister(&mut self, capability: Capability, context: &ContextId) -> bool {
        let Some(set) = self.sets.get_mut(&capability) else {
            return false;
        };
        let before = set.len();
        set.retain(|c| c != context);
        set.len() != before
    }

    /// Contexts in registration order.
    pub fn contexts(&self, capability: Capability) -> Vec<ContextId> {
        self.sets.get(&capability).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self, capability: Capability) -> bool {
        self.sets.get(&capability).map_or(true, Vec::is_empty)
    }
}
