//! State store seam.
//!
//! The engine persists one aggregate record per learner. Production
//! deployments plug a database-backed implementation in behind [`StateStore`];
//! [`MemoryStore`] is the reference implementation used by tests and
//! single-node setups.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::als::types::PersistedLearnerState;

pub trait StateStore: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<PersistedLearnerState>, String>;
    fn save(&self, state: &PersistedLearnerState) -> Result<(), String>;
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, PersistedLearnerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, user_id: &str) -> Result<Option<PersistedLearnerState>, String> {
        Ok(self.inner.read().get(user_id).cloned())
    }

    fn save(&self, state: &PersistedLearnerState) -> Result<(), String> {
        self.inner
            .write()
            .insert(state.user_id.clone(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::als::agent::AgentState;
    use crate::als::config::AgentParams;
    use crate::als::types::LearningProfile;

    fn state(user_id: &str) -> PersistedLearnerState {
        PersistedLearnerState {
            user_id: user_id.to_string(),
            profile: LearningProfile::default(),
            topics: HashMap::new(),
            sessions: Vec::new(),
            agent: AgentState::new(&AgentParams::default()),
            recommendation_log: Vec::new(),
            last_action: None,
            interaction_count: 0,
            last_updated: 0,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let mut s = state("u1");
        s.interaction_count = 7;

        store.save(&s).expect("save");
        let loaded = store.load("u1").expect("load").expect("present");
        assert_eq!(loaded.interaction_count, 7);
        assert_eq!(loaded.user_id, "u1");
    }

    #[test]
    fn missing_user_loads_none() {
        let store = MemoryStore::new();
        assert!(store.load("ghost").expect("load").is_none());
    }

    #[test]
    fn save_overwrites_previous_state() {
        let store = MemoryStore::new();
        let mut s = state("u1");
        store.save(&s).expect("save");
        s.interaction_count = 3;
        store.save(&s).expect("save");

        let loaded = store.load("u1").expect("load").expect("present");
        assert_eq!(loaded.interaction_count, 3);
        assert_eq!(store.len(), 1);
    }
}
