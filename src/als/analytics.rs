//! Session-history analytics.
//!
//! Aggregate views over the recent session window: summary means, engagement
//! bucketed along several axes, an efficiency trend, and derived advice.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::als::types::{LearningProfile, SessionRecord, TopicProgress};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_sessions: usize,
    pub total_minutes: f64,
    pub avg_performance: f64,
    pub avg_engagement: f64,
    pub window_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketStat {
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngagementPatterns {
    pub by_content_type: HashMap<String, BucketStat>,
    pub by_difficulty: HashMap<String, BucketStat>,
    pub by_session_length: HashMap<String, BucketStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyPoint {
    pub ts: i64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LearningAnalytics {
    pub summary: AnalyticsSummary,
    pub patterns: EngagementPatterns,
    #[serde(default)]
    pub efficiency_trend: Vec<EfficiencyPoint>,
    pub progress_by_topic: HashMap<String, TopicProgress>,
    pub advice: Vec<String>,
}

fn difficulty_band(difficulty: f64) -> &'static str {
    if difficulty < 0.4 {
        "easy"
    } else if difficulty < 0.7 {
        "medium"
    } else {
        "hard"
    }
}

fn length_band(duration_secs: f64) -> &'static str {
    let minutes = duration_secs / 60.0;
    if minutes < 15.0 {
        "short"
    } else if minutes < 45.0 {
        "medium"
    } else {
        "long"
    }
}

pub fn build(
    sessions: &[SessionRecord],
    topics: &HashMap<String, TopicProgress>,
    profile: &LearningProfile,
    window_days: i64,
) -> LearningAnalytics {
    let mut analytics = LearningAnalytics {
        progress_by_topic: topics.clone(),
        ..LearningAnalytics::default()
    };
    analytics.summary.window_days = window_days;

    if sessions.is_empty() {
        return analytics;
    }

    let n = sessions.len() as f64;
    analytics.summary = AnalyticsSummary {
        total_sessions: sessions.len(),
        total_minutes: sessions.iter().map(|s| s.duration_secs).sum::<f64>() / 60.0,
        avg_performance: sessions.iter().map(|s| s.performance).sum::<f64>() / n,
        avg_engagement: sessions.iter().map(|s| s.engagement).sum::<f64>() / n,
        window_days,
    };

    let mut by_type: HashMap<String, Vec<f64>> = HashMap::new();
    let mut by_difficulty: HashMap<String, Vec<f64>> = HashMap::new();
    let mut by_length: HashMap<String, Vec<f64>> = HashMap::new();

    for session in sessions {
        by_type
            .entry(session.content_type.clone())
            .or_default()
            .push(session.engagement);
        by_difficulty
            .entry(difficulty_band(session.difficulty).to_string())
            .or_default()
            .push(session.engagement);
        by_length
            .entry(length_band(session.duration_secs).to_string())
            .or_default()
            .push(session.engagement);

        analytics.efficiency_trend.push(EfficiencyPoint {
            ts: session.ts,
            efficiency: session.efficiency(),
        });
    }

    analytics.patterns.by_content_type = bucketize(by_type);
    analytics.patterns.by_difficulty = bucketize(by_difficulty);
    analytics.patterns.by_session_length = bucketize(by_length);
    analytics.advice = derive_advice(&analytics, profile);

    analytics
}

fn bucketize(raw: HashMap<String, Vec<f64>>) -> HashMap<String, BucketStat> {
    raw.into_iter()
        .map(|(key, values)| {
            let count = values.len();
            let average = values.iter().sum::<f64>() / count as f64;
            (key, BucketStat { average, count })
        })
        .collect()
}

fn derive_advice(analytics: &LearningAnalytics, profile: &LearningProfile) -> Vec<String> {
    let mut advice = Vec::new();

    if let Some((best_type, _)) = analytics
        .patterns
        .by_content_type
        .iter()
        .max_by(|a, b| a.1.average.total_cmp(&b.1.average))
    {
        advice.push(format!(
            "You perform best with {best_type} content. Consider focusing on this format."
        ));
    }

    if let Some((best_band, _)) = analytics
        .patterns
        .by_difficulty
        .iter()
        .max_by(|a, b| a.1.average.total_cmp(&b.1.average))
    {
        advice.push(format!(
            "You're most engaged with {best_band} difficulty content."
        ));
    }

    if let Some(gap) = profile.knowledge_gaps.first() {
        advice.push(format!(
            "Focus on closing the '{gap}' knowledge gap before advancing."
        ));
    }

    let trend = &analytics.efficiency_trend;
    if trend.len() >= 5 {
        let recent = &trend[trend.len() - 5..];
        let avg = recent.iter().map(|p| p.efficiency).sum::<f64>() / recent.len() as f64;
        if avg < 0.5 {
            advice.push(
                "Your learning efficiency has decreased recently. Consider taking breaks or changing your study environment."
                    .to_string(),
            );
        }
    }

    advice.truncate(5);
    advice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(content_type: &str, difficulty: f64, duration_secs: f64, engagement: f64) -> SessionRecord {
        SessionRecord {
            content_type: content_type.to_string(),
            difficulty,
            duration_secs,
            engagement,
            ..SessionRecord::default()
        }
    }

    #[test]
    fn empty_history_yields_empty_analytics() {
        let analytics = build(&[], &HashMap::new(), &LearningProfile::default(), 30);
        assert_eq!(analytics.summary.total_sessions, 0);
        assert!(analytics.advice.is_empty());
        assert_eq!(analytics.summary.window_days, 30);
    }

    #[test]
    fn buckets_group_sessions_along_each_axis() {
        let sessions = vec![
            session("video", 0.3, 600.0, 0.9),
            session("video", 0.5, 1200.0, 0.7),
            session("text", 0.8, 3000.0, 0.2),
        ];
        let analytics = build(&sessions, &HashMap::new(), &LearningProfile::default(), 30);

        assert_eq!(analytics.patterns.by_content_type["video"].count, 2);
        assert!((analytics.patterns.by_content_type["video"].average - 0.8).abs() < 1e-9);
        assert_eq!(analytics.patterns.by_difficulty["easy"].count, 1);
        assert_eq!(analytics.patterns.by_difficulty["hard"].count, 1);
        assert_eq!(analytics.patterns.by_session_length["long"].count, 1);
        assert_eq!(analytics.summary.total_sessions, 3);
    }

    #[test]
    fn advice_names_the_strongest_content_type() {
        let sessions = vec![
            session("diagram", 0.5, 900.0, 0.9),
            session("text", 0.5, 900.0, 0.3),
        ];
        let analytics = build(&sessions, &HashMap::new(), &LearningProfile::default(), 30);
        assert!(analytics.advice.iter().any(|a| a.contains("diagram")));
    }

    #[test]
    fn low_recent_efficiency_triggers_a_warning() {
        // Long sessions with weak performance drive efficiency down.
        let sessions: Vec<SessionRecord> = (0..6)
            .map(|_| {
                let mut s = session("text", 0.5, 5400.0, 0.5);
                s.performance = 0.4;
                s
            })
            .collect();
        let analytics = build(&sessions, &HashMap::new(), &LearningProfile::default(), 30);
        assert!(analytics.advice.iter().any(|a| a.contains("efficiency")));
    }
}
