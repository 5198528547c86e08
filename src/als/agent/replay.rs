//! Bounded FIFO experience buffer for replay.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::als::types::AdaptationAction;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub state: String,
    pub action: AdaptationAction,
    pub reward: f64,
    pub next_state: String,
    pub terminal: bool,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceBuffer {
    entries: VecDeque<Experience>,
    capacity: usize,
}

impl ExperienceBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a transition, evicting the oldest entry once full.
    pub fn push(&mut self, experience: Experience) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(experience);
    }

    /// Uniform sample without replacement. Returns clones so callers can
    /// re-apply updates while the buffer keeps growing.
    pub fn sample<R: Rng>(&self, amount: usize, rng: &mut R) -> Vec<Experience> {
        if amount == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let amount = amount.min(self.entries.len());
        rand::seq::index::sample(rng, self.entries.len(), amount)
            .into_iter()
            .map(|i| self.entries[i].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experience(reward: f64) -> Experience {
        Experience {
            state: "s".to_string(),
            action: AdaptationAction::AddBreak,
            reward,
            next_state: "t".to_string(),
            terminal: false,
            ts: 0,
        }
    }

    #[test]
    fn buffer_is_bounded_fifo() {
        let mut buffer = ExperienceBuffer::new(3);
        for i in 0..5 {
            buffer.push(experience(i as f64));
        }
        assert_eq!(buffer.len(), 3);
        // Oldest entries were evicted first.
        let rewards: Vec<f64> = buffer.entries.iter().map(|e| e.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sample_is_without_replacement() {
        let mut buffer = ExperienceBuffer::new(16);
        for i in 0..10 {
            buffer.push(experience(i as f64));
        }

        let mut rng = rand::rng();
        let batch = buffer.sample(10, &mut rng);
        assert_eq!(batch.len(), 10);

        let mut rewards: Vec<i64> = batch.iter().map(|e| e.reward as i64).collect();
        rewards.sort_unstable();
        rewards.dedup();
        assert_eq!(rewards.len(), 10);
    }

    #[test]
    fn sample_caps_at_buffer_len() {
        let mut buffer = ExperienceBuffer::new(16);
        buffer.push(experience(1.0));
        let mut rng = rand::rng();
        assert_eq!(buffer.sample(32, &mut rng).len(), 1);
        assert!(buffer.sample(0, &mut rng).is_empty());
    }
}
