//! Discretized state representation for the adaptation agent.
//!
//! Eight continuous features are bucketed into fixed-width bins and joined
//! into a state key. The mapping is a lossy many-to-one hash; collisions
//! across similar sessions are what lets the table generalize.

use serde::{Deserialize, Serialize};

use crate::als::types::{LearningProfile, SessionRecord};

const DEFAULT_ESTIMATED_SECS: f64 = 600.0;
const MAX_TIME_RATIO: f64 = 2.0;
const FULL_FATIGUE_MINUTES: f64 = 60.0;
const DEFAULT_RETENTION: f64 = 0.7;
const DEFAULT_VELOCITY: f64 = 0.5;
const RECENT_WINDOW: usize = 5;

/// Bin counts per feature, in key order.
const BINS: [usize; 8] = [5, 5, 4, 5, 3, 3, 4, 4];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFeatures {
    pub performance: f64,
    pub engagement: f64,
    pub time_ratio: f64,
    pub difficulty: f64,
    pub style_match: f64,
    pub fatigue: f64,
    pub retention: f64,
    pub velocity: f64,
}

impl StateFeatures {
    pub fn from_session(session: &SessionRecord, profile: &LearningProfile) -> Self {
        let estimated = session
            .estimated_duration_secs
            .filter(|&v| v > 0.0)
            .unwrap_or(DEFAULT_ESTIMATED_SECS);
        let time_ratio = (session.duration_secs / estimated).min(MAX_TIME_RATIO);

        Self {
            performance: session.performance,
            engagement: session.engagement,
            time_ratio,
            difficulty: session.difficulty,
            style_match: profile
                .primary_style
                .content_affinity(&session.content_type),
            fatigue: estimate_fatigue(session, profile),
            retention: estimate_retention(profile),
            velocity: estimate_velocity(profile),
        }
    }

    /// Discretized key: bin indices joined with `_` in fixed feature order.
    pub fn key(&self) -> String {
        let values = [
            self.performance,
            self.engagement,
            self.time_ratio,
            self.difficulty,
            self.style_match,
            self.fatigue,
            self.retention,
            self.velocity,
        ];

        values
            .iter()
            .zip(BINS.iter())
            .map(|(&v, &bins)| discretize(v, bins).to_string())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// `floor(value * bins)` clamped to `[0, bins - 1]`.
pub fn discretize(value: f64, bins: usize) -> usize {
    let idx = (value * bins as f64).floor();
    if idx < 0.0 {
        0
    } else {
        (idx as usize).min(bins - 1)
    }
}

/// Session-length fatigue heuristic, amplified for learners flagged as
/// needing breaks.
fn estimate_fatigue(session: &SessionRecord, profile: &LearningProfile) -> f64 {
    let minutes = session.duration_secs / 60.0;
    let mut fatigue = (minutes / FULL_FATIGUE_MINUTES).min(1.0);
    if profile.accommodations.needs_breaks {
        fatigue *= 1.5;
    }
    fatigue.min(1.0)
}

fn estimate_retention(profile: &LearningProfile) -> f64 {
    let recent = &profile.recent_performance;
    if recent.is_empty() {
        return DEFAULT_RETENTION;
    }
    let window = &recent[recent.len().saturating_sub(RECENT_WINDOW)..];
    window.iter().sum::<f64>() / window.len() as f64
}

fn estimate_velocity(profile: &LearningProfile) -> f64 {
    let history = &profile.skill_history;
    if history.len() < 2 {
        return DEFAULT_VELOCITY;
    }
    let window = &history[history.len().saturating_sub(RECENT_WINDOW)..];
    let velocity = (window[window.len() - 1] - window[0]) / window.len() as f64;
    (velocity + 0.5).clamp(0.0, 1.0)
}
