//! Tabular Q-learning adaptation agent.
//!
//! Picks a pedagogical action for the current discretized state with an
//! epsilon-greedy policy, scores the outcome with a sigmoid-bounded
//! multi-component reward, and updates value estimates with the one-step
//! Q-learning rule plus bounded experience replay.

#![allow(dead_code)]

pub mod qtable;
pub mod replay;
pub mod state;

pub use qtable::QTable;
pub use replay::{Experience, ExperienceBuffer};
pub use state::{discretize, StateFeatures};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::als::config::AgentParams;
use crate::als::types::{
    AdaptationAction, AdaptationRecommendation, LearningStyle, SessionFeedback, SessionKind,
    SessionRecord,
};

const EPISODE_REWARD_CAP: usize = 100;

fn sigmoid(delta: f64, scale: f64) -> f64 {
    1.0 / (1.0 + (-delta * scale).exp())
}

/// Serializable agent state, persisted alongside the learner profile and
/// restored through [`AdaptationAgent::from_state`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub qtable: QTable,
    pub buffer: ExperienceBuffer,
    pub epsilon: f64,
    pub learning_rate: f64,
    pub episode_rewards: Vec<f64>,
    pub episodes: i64,
}

impl AgentState {
    pub fn new(params: &AgentParams) -> Self {
        Self {
            qtable: QTable::new(params.max_states),
            buffer: ExperienceBuffer::new(params.buffer_capacity),
            epsilon: params.epsilon,
            learning_rate: params.learning_rate,
            episode_rewards: Vec::new(),
            episodes: 0,
        }
    }
}

pub struct AdaptationAgent {
    params: AgentParams,
    state: AgentState,
}

impl AdaptationAgent {
    pub fn new(params: AgentParams) -> Self {
        let state = AgentState::new(&params);
        Self { params, state }
    }

    pub fn from_state(params: AgentParams, state: AgentState) -> Self {
        Self { params, state }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn epsilon(&self) -> f64 {
        self.state.epsilon
    }

    pub fn learning_rate(&self) -> f64 {
        self.state.learning_rate
    }

    /// Epsilon-greedy selection over the fixed action set. Exploitation ties
    /// resolve to the earliest action in enumeration order.
    pub fn select_action(&self, state_key: &str) -> AdaptationAction {
        let mut rng = rand::rng();
        if rng.random::<f64>() < self.state.epsilon {
            AdaptationAction::ALL[rng.random_range(0..AdaptationAction::COUNT)]
        } else {
            self.state.qtable.best_action(state_key)
        }
    }

    /// Purely greedy selection, used when exploration is undesirable.
    pub fn select_greedy(&self, state_key: &str) -> AdaptationAction {
        self.state.qtable.best_action(state_key)
    }

    /// Weighted sum of five sigmoid-bounded outcome signals plus an
    /// action-specific bonus or penalty.
    pub fn compute_reward(
        &self,
        previous: &SessionRecord,
        current: &SessionRecord,
        action: AdaptationAction,
        feedback: Option<&SessionFeedback>,
    ) -> f64 {
        let weights = &self.params.reward;

        let performance_delta = current.performance - previous.performance;
        let engagement_delta = current.engagement - previous.engagement;
        let efficiency_delta = current.efficiency() - previous.efficiency();

        let retention = if current.kind == SessionKind::Review {
            current.performance * 1.2
        } else {
            0.5
        };

        let satisfaction = match feedback {
            Some(f) => f.rating as f64 / 5.0,
            None => (current.engagement + current.performance) / 2.0,
        };

        let total = sigmoid(performance_delta, 2.0) * weights.performance
            + sigmoid(engagement_delta, 2.0) * weights.engagement
            + sigmoid(efficiency_delta, 1.0) * weights.efficiency
            + retention * weights.retention
            + satisfaction * weights.satisfaction;

        total + self.action_bonus(action, current)
    }

    fn action_bonus(&self, action: AdaptationAction, session: &SessionRecord) -> f64 {
        match action {
            AdaptationAction::IncreaseDifficulty => {
                if session.performance > 0.8 {
                    0.1
                } else {
                    -0.1
                }
            }
            AdaptationAction::DecreaseDifficulty => {
                if session.performance < 0.4 {
                    0.1
                } else {
                    -0.1
                }
            }
            AdaptationAction::AddBreak => {
                if session.duration_secs > 1800.0 {
                    0.05
                } else {
                    0.0
                }
            }
            AdaptationAction::ProvideHint => {
                if session.performance < 0.6 {
                    0.05
                } else {
                    0.0
                }
            }
            AdaptationAction::GamifyContent => {
                if session.engagement < 0.5 {
                    0.1
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// One-step Q-learning update, recording the transition for replay.
    pub fn update(
        &mut self,
        state_key: &str,
        action: AdaptationAction,
        reward: f64,
        next_state: &str,
        terminal: bool,
    ) {
        self.apply_q_update(
            state_key,
            action,
            reward,
            next_state,
            terminal,
            self.state.learning_rate,
        );

        self.state.buffer.push(Experience {
            state: state_key.to_string(),
            action,
            reward,
            next_state: next_state.to_string(),
            terminal,
            ts: chrono::Utc::now().timestamp_millis(),
        });
    }

    fn apply_q_update(
        &mut self,
        state_key: &str,
        action: AdaptationAction,
        reward: f64,
        next_state: &str,
        terminal: bool,
        learning_rate: f64,
    ) {
        let current_q = self.state.qtable.get(state_key, action);
        let max_next = if terminal {
            0.0
        } else {
            self.state.qtable.max_value(next_state)
        };

        let new_q = current_q + learning_rate * (reward + self.params.gamma * max_next - current_q);
        self.state.qtable.set(state_key, action, new_q);
    }

    /// Re-apply a uniformly sampled batch of past transitions at half the
    /// learning rate. No-op until the buffer holds a full batch.
    pub fn replay(&mut self) {
        let batch_size = self.params.replay_batch;
        if self.state.buffer.len() < batch_size {
            return;
        }

        let mut rng = rand::rng();
        let batch = self.state.buffer.sample(batch_size, &mut rng);
        let replay_lr = self.state.learning_rate * 0.5;

        for experience in batch {
            self.apply_q_update(
                &experience.state,
                experience.action,
                experience.reward,
                &experience.next_state,
                experience.terminal,
                replay_lr,
            );
        }
    }

    /// Close out an episode: decay exploration and adapt the learning rate
    /// from the trailing reward window.
    pub fn finish_episode(&mut self, episode_reward: f64) {
        self.state.episode_rewards.push(episode_reward);
        if self.state.episode_rewards.len() > EPISODE_REWARD_CAP {
            let overflow = self.state.episode_rewards.len() - EPISODE_REWARD_CAP;
            self.state.episode_rewards.drain(0..overflow);
        }
        self.state.episodes += 1;

        self.state.epsilon =
            (self.state.epsilon * self.params.epsilon_decay).max(self.params.epsilon_min);

        let window = self.params.reward_window;
        if self.state.episode_rewards.len() >= window {
            let recent = &self.state.episode_rewards[self.state.episode_rewards.len() - window..];
            let avg = recent.iter().sum::<f64>() / window as f64;

            if avg > 0.7 {
                self.state.learning_rate *= 0.99;
            } else if avg < 0.3 {
                self.state.learning_rate *= 1.01;
            }
            self.state.learning_rate = self
                .state
                .learning_rate
                .clamp(self.params.lr_min, self.params.lr_max);
        }
    }

    /// Top-`n` actions for a state ranked by value estimate, with
    /// explanation and implementation parameters attached.
    pub fn recommendations(
        &self,
        state_key: &str,
        style: LearningStyle,
        n: usize,
    ) -> Vec<AdaptationRecommendation> {
        let mut ranked: Vec<(AdaptationAction, f64)> = AdaptationAction::ALL
            .into_iter()
            .map(|action| (action, self.state.qtable.get(state_key, action)))
            .collect();
        // Stable sort keeps enumeration order on ties.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranked
            .into_iter()
            .take(n)
            .map(|(action, q)| AdaptationRecommendation {
                action,
                confidence: ((q + 1.0) / 2.0).clamp(0.0, 1.0),
                expected_benefit: q,
                explanation: action.explanation(style),
                plan: action.plan(style),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> AdaptationAgent {
        AdaptationAgent::new(AgentParams::default())
    }

    fn session(performance: f64, engagement: f64) -> SessionRecord {
        SessionRecord {
            performance,
            engagement,
            ..SessionRecord::default()
        }
    }

    #[test]
    fn q_update_is_noop_at_fixed_point() {
        let mut a = agent();
        // Seed Q(s, add_break) so that r + gamma * maxNext == Q(s, a).
        a.state.qtable.set("s", AdaptationAction::AddBreak, 0.0);
        a.state.qtable.set("t", AdaptationAction::AddBreak, 0.0);

        a.update("s", AdaptationAction::AddBreak, 0.0, "t", false);
        assert!((a.state.qtable.get("s", AdaptationAction::AddBreak) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn q_update_moves_toward_target() {
        let mut a = agent();
        a.update("s", AdaptationAction::ProvideHint, 1.0, "t", false);
        // lr * (r + gamma * 0 - 0) = 0.1
        let q = a.state.qtable.get("s", AdaptationAction::ProvideHint);
        assert!((q - 0.1).abs() < 1e-12);
    }

    #[test]
    fn terminal_transitions_ignore_next_state() {
        let mut a = agent();
        a.state.qtable.set("t", AdaptationAction::AddBreak, 10.0);

        a.update("s", AdaptationAction::AddBreak, 1.0, "t", true);
        let q = a.state.qtable.get("s", AdaptationAction::AddBreak);
        assert!((q - 0.1).abs() < 1e-12);
    }

    #[test]
    fn epsilon_follows_decay_schedule() {
        let mut a = agent();
        let episodes = 50;
        for _ in 0..episodes {
            a.finish_episode(0.5);
        }
        let expected = (0.1f64 * 0.995f64.powi(episodes)).max(0.01);
        assert!((a.epsilon() - expected).abs() < 1e-9);
    }

    #[test]
    fn epsilon_never_drops_below_floor() {
        let mut a = agent();
        for _ in 0..5000 {
            a.finish_episode(0.5);
        }
        assert!((a.epsilon() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn learning_rate_adapts_to_reward_trend() {
        let mut a = agent();
        for _ in 0..10 {
            a.finish_episode(0.9);
        }
        assert!(a.learning_rate() < 0.1);

        let mut b = agent();
        for _ in 0..10 {
            b.finish_episode(0.1);
        }
        assert!(b.learning_rate() > 0.1);
        assert!(b.learning_rate() <= 0.3);
    }

    #[test]
    fn zero_epsilon_always_exploits() {
        let mut params = AgentParams::default();
        params.epsilon = 0.0;
        let mut a = AdaptationAgent::new(params);
        a.state.qtable.set("s", AdaptationAction::RepeatContent, 0.9);

        for _ in 0..50 {
            assert_eq!(a.select_action("s"), AdaptationAction::RepeatContent);
        }
    }

    #[test]
    fn full_epsilon_still_picks_a_valid_action() {
        let mut params = AgentParams::default();
        params.epsilon = 1.0;
        let a = AdaptationAgent::new(params);

        for _ in 0..50 {
            let action = a.select_action("s");
            assert!(AdaptationAction::ALL.contains(&action));
        }
    }

    #[test]
    fn review_sessions_earn_performance_scaled_retention() {
        let a = agent();
        let prev = session(0.5, 0.5);
        let learning = session(0.9, 0.5);
        let mut review = session(0.9, 0.5);
        review.kind = SessionKind::Review;

        let learning_reward =
            a.compute_reward(&prev, &learning, AdaptationAction::ShowExample, None);
        let review_reward = a.compute_reward(&prev, &review, AdaptationAction::ShowExample, None);

        // Retention component moves from the neutral 0.5 to 0.9 * 1.2.
        assert!((review_reward - learning_reward - (0.9 * 1.2 - 0.5) * 0.2).abs() < 1e-9);
    }

    #[test]
    fn reward_prefers_improvement() {
        let a = agent();
        let prev = session(0.4, 0.4);
        let improved = session(0.8, 0.8);
        let regressed = session(0.2, 0.2);

        let up = a.compute_reward(&prev, &improved, AdaptationAction::ShowExample, None);
        let down = a.compute_reward(&prev, &regressed, AdaptationAction::ShowExample, None);
        assert!(up > down);
    }

    #[test]
    fn explicit_feedback_overrides_estimated_satisfaction() {
        let a = agent();
        let prev = session(0.5, 0.5);
        let curr = session(0.5, 0.5);

        let low = a.compute_reward(
            &prev,
            &curr,
            AdaptationAction::ShowExample,
            Some(&SessionFeedback { rating: 1 }),
        );
        let high = a.compute_reward(
            &prev,
            &curr,
            AdaptationAction::ShowExample,
            Some(&SessionFeedback { rating: 5 }),
        );
        assert!(high > low);
        assert!((high - low - (0.8 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn raising_difficulty_on_strong_performance_earns_a_bonus() {
        let a = agent();
        let prev = session(0.8, 0.6);
        let strong = session(0.9, 0.6);
        let weak = session(0.5, 0.6);

        let rewarded =
            a.compute_reward(&prev, &strong, AdaptationAction::IncreaseDifficulty, None);
        let penalized =
            a.compute_reward(&prev, &weak, AdaptationAction::IncreaseDifficulty, None);
        let neutral = a.compute_reward(&prev, &strong, AdaptationAction::ShowExample, None);

        assert!((rewarded - neutral - 0.1).abs() < 1e-9);
        assert!(penalized < rewarded);
    }

    #[test]
    fn replay_waits_for_a_full_batch() {
        let mut a = agent();
        a.update("s", AdaptationAction::AddBreak, 1.0, "t", false);
        let before = a.state.qtable.get("s", AdaptationAction::AddBreak);

        a.replay();
        let after = a.state.qtable.get("s", AdaptationAction::AddBreak);
        assert!((before - after).abs() < 1e-12);
    }

    #[test]
    fn replay_reapplies_at_half_learning_rate() {
        let mut params = AgentParams::default();
        params.replay_batch = 1;
        let mut a = AdaptationAgent::new(params);

        a.update("s", AdaptationAction::AddBreak, 1.0, "t", false);
        let before = a.state.qtable.get("s", AdaptationAction::AddBreak);

        a.replay();
        let after = a.state.qtable.get("s", AdaptationAction::AddBreak);
        // One buffered transition, re-applied once with lr/2.
        let expected = before + 0.05 * (1.0 - before);
        assert!((after - expected).abs() < 1e-12);
    }

    #[test]
    fn recommendations_rank_by_value() {
        let mut a = agent();
        a.state.qtable.set("s", AdaptationAction::GamifyContent, 0.9);
        a.state.qtable.set("s", AdaptationAction::AddBreak, 0.4);

        let recs = a.recommendations("s", LearningStyle::Visual, 5);
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0].action, AdaptationAction::GamifyContent);
        assert_eq!(recs[1].action, AdaptationAction::AddBreak);
        assert!(recs[0].confidence >= recs[1].confidence);
        for rec in &recs {
            assert!((0.0..=1.0).contains(&rec.confidence));
            assert!(!rec.explanation.is_empty());
        }
    }

    #[test]
    fn state_round_trips_through_serde() {
        let mut a = agent();
        a.update("s", AdaptationAction::AddBreak, 0.7, "t", false);
        a.finish_episode(0.7);

        let json = serde_json::to_string(a.state()).expect("serialize agent state");
        let restored: AgentState = serde_json::from_str(&json).expect("deserialize agent state");
        let b = AdaptationAgent::from_state(AgentParams::default(), restored);

        assert!(
            (b.state.qtable.get("s", AdaptationAction::AddBreak)
                - a.state.qtable.get("s", AdaptationAction::AddBreak))
            .abs()
                < 1e-12
        );
        assert_eq!(b.state.episodes, 1);
    }
}
