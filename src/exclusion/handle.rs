//! Process-wide rule set that can be reloaded without mutating in place

use std::sync::{Arc, RwLock};

use super::rules::ExclusionRuleSet;

/// Shared handle to the active rule set.
///
/// Readers take an `Arc` snapshot and keep it for the whole operation, so a
/// concurrent `replace` never changes rules under a running flatten.
#[derive(Debug, Clone, Default)]
pub struct RulesHandle {
    inner: Arc<RwLock<Arc<ExclusionRuleSet>>>,
}

impl RulesHandle {
    pub fn new(rules: ExclusionRuleSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(rules))),
        }
    }

    /// Snapshot of the current rules.
    pub fn current(&self) -> Arc<ExclusionRuleSet> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new rule set, returning the previous one.
    pub fn replace(&self, rules: ExclusionRuleSet) -> Arc<ExclusionRuleSet> {
        let new = Arc::new(rules);
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::info!("exclusion rules replaced");
        std::mem::replace(&mut *guard, new)
    }
}
