//! Behavioral learning-style analysis.
//!
//! Converts raw session telemetry into per-style affinity signals, aggregates
//! session history into a profile, and applies the per-session EMA update.

use crate::als::config::AnalyzerParams;
use crate::als::types::{
    Accommodations, LearningProfile, LearningStyle, SessionRecord, StyleScores,
};
use std::collections::HashMap;

pub struct StyleSignalAnalyzer {
    params: AnalyzerParams,
}

impl StyleSignalAnalyzer {
    pub fn new(params: AnalyzerParams) -> Self {
        Self { params }
    }

    /// Per-session style affinity signals. Additive contributions, each style
    /// lands in [0, ~0.6]. Pure function of the session.
    pub fn score_session(&self, session: &SessionRecord) -> StyleScores {
        let mut signals = StyleScores::zero();
        let content_type = session.content_type.as_str();

        if let Some(style) = LearningStyle::category_of(content_type) {
            signals.set(style, signals.get(style) + 0.3);
        }

        // Visual learners engage strongly with visual material.
        if matches!(content_type, "video" | "diagram")
            && session.engagement > self.params.engagement_bonus_threshold
        {
            signals.visual += 0.2;
        }

        // Short attention span on passive content hints at kinesthetic needs.
        if matches!(content_type, "text" | "lecture")
            && session.duration_secs < self.params.short_passive_secs
        {
            signals.kinesthetic += 0.1;
        }

        if session.interactions.note_taking {
            signals.visual += 0.1;
        }
        if session.interactions.audio_replays > 1 {
            signals.auditory += 0.1;
        }
        if session.interactions.interactive_elements > 3 {
            signals.kinesthetic += 0.1;
        }

        signals
    }

    /// Build a profile from session history. Zero sessions yields the fixed
    /// default profile.
    pub fn aggregate_profile(&self, sessions: &[SessionRecord]) -> LearningProfile {
        let mut profile = LearningProfile::default();
        self.aggregate_into(&mut profile, sessions);
        profile
    }

    /// Recompute the style-derived portion of a profile (scores, primary
    /// style, confidence, accommodations) from session history, leaving
    /// knowledge tracking fields untouched.
    pub fn aggregate_into(&self, profile: &mut LearningProfile, sessions: &[SessionRecord]) {
        if sessions.is_empty() {
            let default = LearningProfile::default();
            profile.primary_style = default.primary_style;
            profile.style_scores = default.style_scores;
            profile.confidence = default.confidence;
            profile.accommodations = default.accommodations;
            profile.session_count = 0;
            return;
        }

        let performance = self.performance_by_style(sessions);

        let mut behavior = StyleScores::zero();
        for session in sessions {
            let signals = self.score_session(session);
            behavior.visual += signals.visual;
            behavior.auditory += signals.auditory;
            behavior.kinesthetic += signals.kinesthetic;
        }
        let n = sessions.len() as f64;
        behavior.visual /= n;
        behavior.auditory /= n;
        behavior.kinesthetic /= n;

        let mut combined = StyleScores::zero();
        for style in LearningStyle::ALL {
            let score = performance.get(style) * self.params.performance_weight
                + behavior.get(style) * self.params.behavior_weight;
            combined.set(style, score);
        }
        combined.clamp_unit();

        profile.style_scores = combined;
        profile.primary_style = combined.primary();
        profile.confidence = (n / self.params.confidence_saturation_sessions).min(1.0);
        profile.accommodations = self.detect_accommodations(sessions);
        profile.session_count = sessions.len() as i32;
        profile.last_updated = chrono::Utc::now().timestamp_millis();
    }

    /// Exponential-moving-average update from one new session. Confidence
    /// grows by a fixed increment and saturates at 1.
    pub fn update_profile(&self, profile: &mut LearningProfile, session: &SessionRecord) {
        let alpha = self.params.ema_alpha;
        let signals = self.score_session(session);

        for style in LearningStyle::ALL {
            let updated =
                (1.0 - alpha) * profile.style_scores.get(style) + alpha * signals.get(style);
            profile.style_scores.set(style, updated.clamp(0.0, 1.0));
        }

        profile.primary_style = profile.style_scores.primary();
        profile.confidence = (profile.confidence + self.params.confidence_increment).min(1.0);
        profile.last_updated = chrono::Utc::now().timestamp_millis();
    }

    /// Accommodation flags inferred from session history patterns.
    pub fn detect_accommodations(&self, sessions: &[SessionRecord]) -> Accommodations {
        let mut accommodations = Accommodations::default();
        if sessions.is_empty() {
            return accommodations;
        }

        let n = sessions.len() as f64;
        let mean_duration = sessions.iter().map(|s| s.duration_secs).sum::<f64>() / n;
        if mean_duration < self.params.short_session_secs {
            accommodations.needs_breaks = true;
        }

        let mean_perf = sessions.iter().map(|s| s.performance).sum::<f64>() / n;
        let variance = sessions
            .iter()
            .map(|s| (s.performance - mean_perf).powi(2))
            .sum::<f64>()
            / n;
        if variance.sqrt() > self.params.performance_stdev_threshold {
            accommodations.sensitive_to_distractions = true;
        }

        let ratios: Vec<f64> = sessions
            .iter()
            .filter_map(|s| {
                s.estimated_duration_secs
                    .filter(|&est| est > 0.0)
                    .map(|est| s.duration_secs / est)
            })
            .collect();
        if !ratios.is_empty() {
            let mean_ratio = ratios.iter().sum::<f64>() / ratios.len() as f64;
            if mean_ratio > self.params.extra_time_ratio {
                accommodations.needs_extra_time = true;
            }
        }

        let mut repeats: HashMap<&str, i32> = HashMap::new();
        for session in sessions {
            if !session.content_id.is_empty() {
                *repeats.entry(session.content_id.as_str()).or_insert(0) += 1;
            }
        }
        if repeats.values().any(|&c| c > self.params.repetition_threshold) {
            accommodations.benefits_from_repetition = true;
        }

        accommodations
    }

    fn performance_by_style(&self, sessions: &[SessionRecord]) -> StyleScores {
        let mut sums = StyleScores::zero();
        let mut counts = [0usize; 3];

        for session in sessions {
            if let Some(style) = LearningStyle::category_of(&session.content_type) {
                sums.set(style, sums.get(style) + session.performance);
                counts[style as usize] += 1;
            }
        }

        let mut averages = StyleScores::zero();
        for style in LearningStyle::ALL {
            let count = counts[style as usize];
            if count > 0 {
                averages.set(style, sums.get(style) / count as f64);
            }
        }
        averages
    }
}

impl Default for StyleSignalAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::als::types::{InteractionCounts, SessionRecord};

    fn analyzer() -> StyleSignalAnalyzer {
        StyleSignalAnalyzer::default()
    }

    fn session(content_type: &str, engagement: f64, duration_secs: f64) -> SessionRecord {
        SessionRecord {
            content_id: "c1".to_string(),
            content_type: content_type.to_string(),
            engagement,
            duration_secs,
            ..SessionRecord::default()
        }
    }

    #[test]
    fn engaged_diagram_session_scores_half_visual() {
        let s = session("diagram", 0.8, 900.0);
        let signals = analyzer().score_session(&s);
        assert!(signals.visual >= 0.5 - 1e-9, "got {}", signals.visual);
    }

    #[test]
    fn interaction_counters_add_fixed_bonuses() {
        let mut s = session("text", 0.5, 900.0);
        s.interactions = InteractionCounts {
            note_taking: true,
            audio_replays: 2,
            interactive_elements: 4,
        };
        let signals = analyzer().score_session(&s);
        assert!((signals.visual - 0.1).abs() < 1e-9);
        assert!((signals.auditory - 0.1).abs() < 1e-9);
        assert!((signals.kinesthetic - 0.1).abs() < 1e-9);
    }

    #[test]
    fn short_passive_session_hints_kinesthetic() {
        let s = session("lecture", 0.5, 200.0);
        let signals = analyzer().score_session(&s);
        // 0.3 category (auditory) plus 0.1 short-passive kinesthetic hint.
        assert!((signals.auditory - 0.3).abs() < 1e-9);
        assert!((signals.kinesthetic - 0.1).abs() < 1e-9);
    }

    #[test]
    fn empty_history_yields_default_profile() {
        let profile = analyzer().aggregate_profile(&[]);
        let default = LearningProfile::default();
        assert_eq!(profile.primary_style, default.primary_style);
        assert!((profile.confidence - 0.1).abs() < 1e-9);
        assert!(profile.accommodations.prefers_structure);
    }

    #[test]
    fn aggregate_confidence_saturates_at_twenty_sessions() {
        let a = analyzer();
        let five: Vec<SessionRecord> = (0..5).map(|_| session("video", 0.6, 900.0)).collect();
        let profile = a.aggregate_profile(&five);
        assert!((profile.confidence - 0.25).abs() < 1e-9);

        let forty: Vec<SessionRecord> = (0..40).map(|_| session("video", 0.6, 900.0)).collect();
        let profile = a.aggregate_profile(&forty);
        assert!((profile.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_prefers_high_performance_style() {
        let a = analyzer();
        let mut sessions = Vec::new();
        for _ in 0..6 {
            let mut s = session("audio", 0.6, 900.0);
            s.performance = 0.9;
            sessions.push(s);
        }
        for _ in 0..6 {
            let mut s = session("diagram", 0.3, 900.0);
            s.performance = 0.3;
            sessions.push(s);
        }
        let profile = a.aggregate_profile(&sessions);
        assert_eq!(profile.primary_style, LearningStyle::Auditory);
    }

    #[test]
    fn ema_update_is_convex_and_bumps_confidence() {
        let a = analyzer();
        let mut profile = LearningProfile::default();
        let before = profile.style_scores.visual;
        let s = session("diagram", 0.9, 900.0);

        a.update_profile(&mut profile, &s);

        // 0.9 * 0.4 + 0.1 * 0.5 = 0.41
        assert!((profile.style_scores.visual - (0.9 * before + 0.1 * 0.5)).abs() < 1e-9);
        assert!((profile.confidence - 0.15).abs() < 1e-9);
    }

    #[test]
    fn accommodations_follow_history_patterns() {
        let a = analyzer();
        let mut sessions = Vec::new();
        for i in 0..6 {
            let mut s = session("text", 0.5, 300.0);
            s.performance = if i % 2 == 0 { 0.1 } else { 0.9 };
            s.estimated_duration_secs = Some(150.0);
            sessions.push(s);
        }
        let acc = a.detect_accommodations(&sessions);
        assert!(acc.needs_breaks);
        assert!(acc.sensitive_to_distractions);
        assert!(acc.needs_extra_time);
        // Same content id repeated more than three times.
        assert!(acc.benefits_from_repetition);
    }
}
