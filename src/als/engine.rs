//! Learning orchestration engine.
//!
//! Composes the style analyzer, content scorer, forgetting model, and
//! adaptation agent per user, caches learner state in memory, and writes it
//! back through the state store. Mutations for one user are funneled through
//! the engine's state map, which serializes concurrent updates; the store
//! itself is last-writer-wins.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::als::agent::{AdaptationAgent, AgentState, StateFeatures};
use crate::als::analytics::{self, LearningAnalytics};
use crate::als::analyzer::StyleSignalAnalyzer;
use crate::als::config::AlsConfig;
use crate::als::error::AlsError;
use crate::als::forgetting::ForgettingModel;
use crate::als::persistence::StateStore;
use crate::als::recommend::{rank, ContentScorer};
use crate::als::types::*;

const STRENGTH_SKILL_THRESHOLD: f64 = 0.7;
const GAP_SKILL_THRESHOLD: f64 = 0.4;
const TOPIC_SCORE_CAP: usize = 20;
const SKILL_HISTORY_CAP: usize = 20;
const ADAPTATION_CANDIDATES: usize = 5;

/// Result of recording one learning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub profile: LearningProfile,
    pub topic_skill: f64,
    /// Reward granted to the adaptation agent; absent for the first session.
    pub reward: Option<f64>,
    pub interaction_count: i32,
}

/// Result of a real-time adaptation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationOutcome {
    pub applied: AdaptationRecommendation,
    pub alternatives: Vec<AdaptationRecommendation>,
    /// Difficulty after applying the action, when it adjusts difficulty.
    pub new_difficulty: Option<f64>,
    pub state_key: String,
}

pub struct AlsEngine {
    config: Arc<RwLock<AlsConfig>>,
    scorer: Arc<RwLock<ContentScorer>>,
    store: Option<Arc<dyn StateStore>>,
    states: Arc<RwLock<HashMap<String, PersistedLearnerState>>>,
}

impl AlsEngine {
    pub fn new(config: AlsConfig, store: Option<Arc<dyn StateStore>>) -> Self {
        let scorer = ContentScorer::new(config.scorer);
        Self {
            config: Arc::new(RwLock::new(config)),
            scorer: Arc::new(RwLock::new(scorer)),
            store,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn reload_config(&self) {
        let new_config = AlsConfig::from_env();
        {
            let mut scorer = self.scorer.write().await;
            *scorer = ContentScorer::new(new_config.scorer);
        }
        {
            let mut config = self.config.write().await;
            *config = new_config;
        }
        tracing::info!("ALS config reloaded");
    }

    pub async fn get_config(&self) -> AlsConfig {
        self.config.read().await.clone()
    }

    /// Record a completed session: update the profile, topic progress, and
    /// the adaptation agent, then persist. Creates the learner state on the
    /// first session.
    pub async fn record_session(
        &self,
        user_id: &str,
        session: SessionRecord,
    ) -> Result<SessionOutcome, AlsError> {
        Self::validate_session(&session)?;

        let config = self.config.read().await.clone();
        let analyzer = StyleSignalAnalyzer::new(config.analyzer.clone());
        let mut state = self.load_or_init_state(user_id, &config).await;

        let previous_session = state.sessions.last().cloned();

        state.sessions.push(session.clone());
        if state.sessions.len() > config.session_history_cap {
            let overflow = state.sessions.len() - config.session_history_cap;
            state.sessions.drain(0..overflow);
        }

        analyzer.update_profile(&mut state.profile, &session);
        state.profile.accommodations = analyzer.detect_accommodations(&state.sessions);
        state.profile.session_count += 1;

        state.profile.recent_performance.push(session.performance);
        if state.profile.recent_performance.len() > config.recent_performance_cap {
            let overflow = state.profile.recent_performance.len() - config.recent_performance_cap;
            state.profile.recent_performance.drain(0..overflow);
        }
        state.profile.avg_performance = state.profile.recent_performance.iter().sum::<f64>()
            / state.profile.recent_performance.len() as f64;

        if !session.content_id.is_empty()
            && !state.profile.completed_content.contains(&session.content_id)
        {
            state.profile.completed_content.push(session.content_id.clone());
        }
        if !state.profile.completed_topics.contains(&session.topic) {
            state.profile.completed_topics.push(session.topic.clone());
        }

        let topic_skill = Self::update_topic_progress(&mut state, &session, config.skill_alpha);
        Self::update_knowledge_sets(&mut state.profile, &session.topic, topic_skill);

        state.profile.skill_level = if state.topics.is_empty() {
            state.profile.skill_level
        } else {
            state.topics.values().map(|t| t.skill_level).sum::<f64>() / state.topics.len() as f64
        };
        state.profile.skill_history.push(state.profile.skill_level);
        if state.profile.skill_history.len() > SKILL_HISTORY_CAP {
            let overflow = state.profile.skill_history.len() - SKILL_HISTORY_CAP;
            state.profile.skill_history.drain(0..overflow);
        }

        let reward = self.train_agent(&mut state, previous_session.as_ref(), &session, &config);

        state.interaction_count += 1;
        state.last_updated = chrono::Utc::now().timestamp_millis();

        self.commit(state.clone()).await;

        tracing::debug!(
            user_id,
            topic = %session.topic,
            interaction_count = state.interaction_count,
            reward = ?reward,
            "session recorded"
        );

        Ok(SessionOutcome {
            profile: state.profile,
            topic_skill,
            reward,
            interaction_count: state.interaction_count,
        })
    }

    /// Rank candidate content for a user. Fails with `NotFound` when the
    /// user has no recorded state.
    pub async fn recommend(
        &self,
        user_id: &str,
        items: &[ContentItem],
        context: Option<&SessionContext>,
        k: usize,
    ) -> Result<Vec<Recommendation>, AlsError> {
        let config = self.config.read().await.clone();
        let mut state = self.require_state(user_id).await?;

        let recommendations = {
            let scorer = self.scorer.read().await;
            rank(
                &scorer,
                &state.profile,
                items,
                context,
                k,
                config.recommendation_pool_factor,
            )
        };

        let now = chrono::Utc::now().timestamp_millis();
        for rec in &recommendations {
            state.recommendation_log.push(RecommendationLogEntry {
                id: uuid::Uuid::new_v4().to_string(),
                content_id: rec.content_id.clone(),
                score: rec.score,
                confidence: rec.confidence,
                ts: now,
            });
        }
        if state.recommendation_log.len() > config.recommendation_log_cap {
            let overflow = state.recommendation_log.len() - config.recommendation_log_cap;
            state.recommendation_log.drain(0..overflow);
        }

        self.commit(state).await;
        Ok(recommendations)
    }

    /// Route explicit recommendation feedback into the scorer's online
    /// weight adjustment.
    pub async fn record_feedback(&self, rating: i32) {
        let mut scorer = self.scorer.write().await;
        scorer.apply_feedback(rating);
        tracing::debug!(rating, "recommendation feedback applied");
    }

    /// Review plan over `topic -> days since last review`, prioritized by
    /// forgetting probability.
    pub async fn review_plan(
        &self,
        user_id: &str,
        days_since_review: &HashMap<String, f64>,
    ) -> Result<Vec<ReviewItem>, AlsError> {
        let config = self.config.read().await.clone();
        let state = self.require_state(user_id).await?;
        let forgetting = ForgettingModel::new(config.forgetting.clone());

        let topics: Vec<(String, f64, Vec<f64>)> = days_since_review
            .iter()
            .map(|(topic, days)| {
                let scores = state
                    .topics
                    .get(topic)
                    .map(|t| t.scores.clone())
                    .unwrap_or_default();
                (topic.clone(), *days, scores)
            })
            .collect();

        Ok(forgetting.plan_reviews(state.profile.primary_style, &topics))
    }

    /// Pick and apply the best adaptation action for the live session.
    pub async fn adapt(
        &self,
        user_id: &str,
        live_session: &SessionRecord,
    ) -> Result<AdaptationOutcome, AlsError> {
        let config = self.config.read().await.clone();
        let mut state = self.require_state(user_id).await?;

        let state_key = StateFeatures::from_session(live_session, &state.profile).key();
        let agent = AdaptationAgent::from_state(config.agent.clone(), state.agent.clone());

        let mut recommendations = agent.recommendations(
            &state_key,
            state.profile.primary_style,
            ADAPTATION_CANDIDATES,
        );
        if recommendations.is_empty() {
            return Err(AlsError::InvalidInput("no adaptation candidates".to_string()));
        }
        let applied = recommendations.remove(0);

        let new_difficulty = match applied.plan {
            ActionPlan::DifficultyAdjustment { delta } => {
                Some((live_session.difficulty + delta).clamp(0.1, 1.0))
            }
            _ => None,
        };

        state.last_action = Some(applied.action);
        state.last_updated = chrono::Utc::now().timestamp_millis();
        self.commit(state).await;

        tracing::debug!(
            user_id,
            action = applied.action.as_str(),
            state_key = %state_key,
            "adaptation applied"
        );

        Ok(AdaptationOutcome {
            applied,
            alternatives: recommendations,
            new_difficulty,
            state_key,
        })
    }

    /// Analytics over the recent session window.
    pub async fn analytics(
        &self,
        user_id: &str,
        window_days: i64,
    ) -> Result<LearningAnalytics, AlsError> {
        let state = self.require_state(user_id).await?;
        let cutoff =
            chrono::Utc::now().timestamp_millis() - window_days * 24 * 3600 * 1000;
        let sessions: Vec<SessionRecord> = state
            .sessions
            .iter()
            .filter(|s| s.ts >= cutoff)
            .cloned()
            .collect();

        Ok(analytics::build(
            &sessions,
            &state.topics,
            &state.profile,
            window_days,
        ))
    }

    pub async fn get_profile(&self, user_id: &str) -> Option<LearningProfile> {
        self.load_state(user_id).await.map(|s| s.profile)
    }

    pub async fn invalidate_cache(&self, user_id: &str) {
        let mut states = self.states.write().await;
        states.remove(user_id);
    }

    /// Drop cached users whose state has been idle longer than `max_age_ms`.
    pub async fn cleanup_stale_users(&self, max_age_ms: i64) -> usize {
        let now = chrono::Utc::now().timestamp_millis();
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, state| now - state.last_updated <= max_age_ms);
        before - states.len()
    }

    pub async fn cache_stats(&self) -> usize {
        self.states.read().await.len()
    }

    fn validate_session(session: &SessionRecord) -> Result<(), AlsError> {
        if session.duration_secs < 0.0 {
            return Err(AlsError::InvalidInput("negative duration".to_string()));
        }
        if let Some(est) = session.estimated_duration_secs {
            if est < 0.0 {
                return Err(AlsError::InvalidInput(
                    "negative estimated duration".to_string(),
                ));
            }
        }
        for (name, value) in [
            ("performanceScore", session.performance),
            ("engagementScore", session.engagement),
            ("difficultyLevel", session.difficulty),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(AlsError::InvalidInput(format!(
                    "{name} out of range: {value}"
                )));
            }
        }
        if session.interactions.audio_replays < 0 || session.interactions.interactive_elements < 0
        {
            return Err(AlsError::InvalidInput(
                "negative interaction counter".to_string(),
            ));
        }
        Ok(())
    }

    fn update_topic_progress(
        state: &mut PersistedLearnerState,
        session: &SessionRecord,
        skill_alpha: f64,
    ) -> f64 {
        let topic = state.topics.entry(session.topic.clone()).or_default();

        topic.skill_level = ((1.0 - skill_alpha) * topic.skill_level
            + skill_alpha * session.performance)
            .clamp(0.0, 1.0);
        topic.completion_rate = (topic.completion_rate + 0.1).min(1.0);
        topic.time_spent_min += session.duration_secs / 60.0;
        topic.scores.push(session.performance);
        if topic.scores.len() > TOPIC_SCORE_CAP {
            let overflow = topic.scores.len() - TOPIC_SCORE_CAP;
            topic.scores.drain(0..overflow);
        }
        topic.last_reviewed_ts = Some(session.ts);

        topic.skill_level
    }

    fn update_knowledge_sets(profile: &mut LearningProfile, topic: &str, skill: f64) {
        if skill > STRENGTH_SKILL_THRESHOLD {
            profile.knowledge_gaps.retain(|t| t != topic);
            if !profile.strengths.iter().any(|t| t == topic) {
                profile.strengths.push(topic.to_string());
            }
        } else if skill < GAP_SKILL_THRESHOLD {
            profile.strengths.retain(|t| t != topic);
            if !profile.knowledge_gaps.iter().any(|t| t == topic) {
                profile.knowledge_gaps.push(topic.to_string());
            }
        }
    }

    fn train_agent(
        &self,
        state: &mut PersistedLearnerState,
        previous: Option<&SessionRecord>,
        current: &SessionRecord,
        config: &AlsConfig,
    ) -> Option<f64> {
        let previous = previous?;

        let mut agent = AdaptationAgent::from_state(config.agent.clone(), state.agent.clone());

        let prev_key = StateFeatures::from_session(previous, &state.profile).key();
        let curr_key = StateFeatures::from_session(current, &state.profile).key();

        // Prefer the action the engine actually applied; fall back to the
        // greedy choice when no adaptation ran between the two sessions.
        let action = state
            .last_action
            .take()
            .unwrap_or_else(|| agent.select_greedy(&prev_key));

        let reward = agent.compute_reward(previous, current, action, current.feedback.as_ref());
        // Transitions are non-terminal: learning has no modeled episode end.
        agent.update(&prev_key, action, reward, &curr_key, false);

        if state.interaction_count > 0
            && state.interaction_count % config.agent.replay_interval == 0
        {
            agent.replay();
        }
        agent.finish_episode(reward);

        state.agent = agent.state().clone();
        Some(reward)
    }

    async fn load_or_init_state(&self, user_id: &str, config: &AlsConfig) -> PersistedLearnerState {
        if let Some(state) = self.load_state(user_id).await {
            return state;
        }

        let state = PersistedLearnerState {
            user_id: user_id.to_string(),
            profile: LearningProfile::default(),
            topics: HashMap::new(),
            sessions: Vec::new(),
            agent: AgentState::new(&config.agent),
            recommendation_log: Vec::new(),
            last_action: None,
            interaction_count: 0,
            last_updated: chrono::Utc::now().timestamp_millis(),
        };

        let mut states = self.states.write().await;
        states
            .entry(user_id.to_string())
            .or_insert_with(|| state.clone())
            .clone()
    }

    async fn load_state(&self, user_id: &str) -> Option<PersistedLearnerState> {
        {
            let states = self.states.read().await;
            if let Some(state) = states.get(user_id) {
                return Some(state.clone());
            }
        }

        if let Some(ref store) = self.store {
            match store.load(user_id) {
                Ok(Some(state)) => {
                    let mut states = self.states.write().await;
                    states.insert(user_id.to_string(), state.clone());
                    return Some(state);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, user_id, "failed to load learner state");
                }
            }
        }

        None
    }

    async fn require_state(&self, user_id: &str) -> Result<PersistedLearnerState, AlsError> {
        self.load_state(user_id)
            .await
            .ok_or_else(|| AlsError::NotFound(format!("user {user_id}")))
    }

    async fn commit(&self, state: PersistedLearnerState) {
        {
            let mut states = self.states.write().await;
            states.insert(state.user_id.clone(), state.clone());
        }

        if let Some(ref store) = self.store {
            if let Err(e) = store.save(&state) {
                tracing::warn!(error = %e, user_id = %state.user_id, "failed to save learner state");
            }
        }
    }
}

impl Default for AlsEngine {
    fn default() -> Self {
        Self::new(AlsConfig::default(), None)
    }
}
