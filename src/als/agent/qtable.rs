//! Per-user tabular action-value storage.
//!
//! Distinct discretized states grow with observation, so the table carries a
//! capacity bound; when full, the least-recently-touched state row is
//! evicted before a new one is admitted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::als::types::AdaptationAction;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateEntry {
    values: Vec<f64>,
    last_touched: u64,
}

impl StateEntry {
    fn new(clock: u64) -> Self {
        Self {
            values: vec![0.0; AdaptationAction::COUNT],
            last_touched: clock,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QTable {
    states: HashMap<String, StateEntry>,
    max_states: usize,
    clock: u64,
}

impl QTable {
    pub fn new(max_states: usize) -> Self {
        Self {
            states: HashMap::new(),
            max_states: max_states.max(1),
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, state: &str, action: AdaptationAction) -> f64 {
        self.states
            .get(state)
            .map(|entry| entry.values[action.index()])
            .unwrap_or(0.0)
    }

    /// Maximum action value for a state; 0 for unseen states.
    pub fn max_value(&self, state: &str) -> f64 {
        self.states
            .get(state)
            .map(|entry| entry.values.iter().cloned().fold(f64::MIN, f64::max))
            .unwrap_or(0.0)
    }

    /// Greedy action for a state; ties resolve to the earliest action in
    /// enumeration order. Unseen states fall back to the first action.
    pub fn best_action(&self, state: &str) -> AdaptationAction {
        let mut best = AdaptationAction::ALL[0];
        let mut best_value = self.get(state, best);
        for action in AdaptationAction::ALL.into_iter().skip(1) {
            let value = self.get(state, action);
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    pub fn set(&mut self, state: &str, action: AdaptationAction, value: f64) {
        self.clock += 1;
        let clock = self.clock;

        if !self.states.contains_key(state) && self.states.len() >= self.max_states {
            self.evict_oldest();
        }

        let entry = self
            .states
            .entry(state.to_string())
            .or_insert_with(|| StateEntry::new(clock));
        entry.values[action.index()] = value;
        entry.last_touched = clock;
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self
            .states
            .iter()
            .min_by_key(|(_, entry)| entry.last_touched)
            .map(|(key, _)| key.clone())
        {
            self.states.remove(&oldest);
        }
    }
}
