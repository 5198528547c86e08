use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerParams {
    pub ema_alpha: f64,
    pub confidence_increment: f64,
    pub confidence_saturation_sessions: f64,
    pub performance_weight: f64,
    pub behavior_weight: f64,
    pub engagement_bonus_threshold: f64,
    pub short_passive_secs: f64,
    pub short_session_secs: f64,
    pub performance_stdev_threshold: f64,
    pub extra_time_ratio: f64,
    pub repetition_threshold: i32,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            ema_alpha: 0.1,
            confidence_increment: 0.05,
            confidence_saturation_sessions: 20.0,
            performance_weight: 0.7,
            behavior_weight: 0.3,
            engagement_bonus_threshold: 0.7,
            short_passive_secs: 300.0,
            short_session_secs: 600.0,
            performance_stdev_threshold: 0.3,
            extra_time_ratio: 1.5,
            repetition_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub style_match: f64,
    pub difficulty_fit: f64,
    pub gap_relevance: f64,
    pub engagement: f64,
    pub novelty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            style_match: 0.30,
            difficulty_fit: 0.25,
            gap_relevance: 0.20,
            engagement: 0.15,
            novelty: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.style_match + self.difficulty_fit + self.gap_relevance + self.engagement + self.novelty
    }

    /// Renormalize so the weights sum to 1. Required after any online
    /// adjustment.
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total > 1e-9 {
            self.style_match /= total;
            self.difficulty_fit /= total;
            self.gap_relevance /= total;
            self.engagement /= total;
            self.novelty /= total;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgettingParams {
    pub half_life_days: f64,
    pub mastery_damping: f64,
    pub review_threshold: f64,
    pub moderate_threshold: f64,
    pub intensive_threshold: f64,
    pub base_review_minutes: f64,
}

impl Default for ForgettingParams {
    fn default() -> Self {
        Self {
            half_life_days: 7.0,
            mastery_damping: 0.5,
            review_threshold: 0.3,
            moderate_threshold: 0.5,
            intensive_threshold: 0.7,
            base_review_minutes: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardWeights {
    pub performance: f64,
    pub engagement: f64,
    pub retention: f64,
    pub efficiency: f64,
    pub satisfaction: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            performance: 0.30,
            engagement: 0.25,
            retention: 0.20,
            efficiency: 0.15,
            satisfaction: 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentParams {
    pub learning_rate: f64,
    pub lr_min: f64,
    pub lr_max: f64,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    pub gamma: f64,
    pub buffer_capacity: usize,
    pub replay_batch: usize,
    pub replay_interval: i32,
    pub max_states: usize,
    pub reward_window: usize,
    pub reward: RewardWeights,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            lr_min: 0.01,
            lr_max: 0.3,
            epsilon: 0.1,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            gamma: 0.95,
            buffer_capacity: 10_000,
            replay_batch: 32,
            replay_interval: 10,
            max_states: 4096,
            reward_window: 10,
            reward: RewardWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlsConfig {
    pub analyzer: AnalyzerParams,
    pub scorer: ScoreWeights,
    pub forgetting: ForgettingParams,
    pub agent: AgentParams,
    /// Sessions kept per user for profile aggregation and analytics.
    pub session_history_cap: usize,
    pub recent_performance_cap: usize,
    pub recommendation_log_cap: usize,
    pub skill_alpha: f64,
    /// Candidate pool for the diversity filter is `k * pool_factor`.
    pub recommendation_pool_factor: usize,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerParams::default(),
            scorer: ScoreWeights::default(),
            forgetting: ForgettingParams::default(),
            agent: AgentParams::default(),
            session_history_cap: 50,
            recent_performance_cap: 10,
            recommendation_log_cap: 100,
            skill_alpha: 0.2,
            recommendation_pool_factor: 2,
        }
    }
}

impl AlsConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ALS_EPSILON") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.agent.epsilon = parsed.clamp(0.0, 1.0);
            }
        }
        if let Ok(val) = std::env::var("ALS_LEARNING_RATE") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.agent.learning_rate = parsed.clamp(config.agent.lr_min, config.agent.lr_max);
            }
        }
        if let Ok(val) = std::env::var("ALS_REPLAY_BATCH") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.agent.replay_batch = parsed.max(1);
            }
        }
        if let Ok(val) = std::env::var("ALS_MAX_STATES") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.agent.max_states = parsed.max(16);
            }
        }
        if let Ok(val) = std::env::var("ALS_SESSION_HISTORY_CAP") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.session_history_cap = parsed.max(1);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);

        let reward = RewardWeights::default();
        let total = reward.performance
            + reward.engagement
            + reward.retention
            + reward.efficiency
            + reward.satisfaction;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_restores_unit_sum() {
        let mut weights = ScoreWeights::default();
        weights.style_match += 0.05;
        weights.novelty += 0.05;
        weights.normalize();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }
}
