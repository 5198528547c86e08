//! Forgetting-curve review model.
//!
//! Ebbinghaus-style exponential decay with a 7-day half-life, damped by the
//! learner's historical mastery of the topic, feeding review planning.

use crate::als::config::ForgettingParams;
use crate::als::types::{LearningStyle, ReviewItem};

#[derive(Debug, Clone)]
pub struct ForgettingModel {
    params: ForgettingParams,
}

impl ForgettingModel {
    pub fn new(params: ForgettingParams) -> Self {
        Self { params }
    }

    /// Probability the topic has been forgotten after `days_since_review`.
    /// Stronger historical mastery slows forgetting. Always in [0, 1], and
    /// exactly 0 at zero elapsed days.
    pub fn probability(&self, days_since_review: f64, topic_scores: &[f64]) -> f64 {
        let days = days_since_review.max(0.0);
        let base = 1.0 - (-days / self.params.half_life_days).exp();

        let adjusted = if topic_scores.is_empty() {
            base
        } else {
            let mean = topic_scores.iter().sum::<f64>() / topic_scores.len() as f64;
            base * (1.0 - mean * self.params.mastery_damping)
        };

        adjusted.clamp(0.0, 1.0)
    }

    /// Review plan for one topic, or None when the forgetting probability is
    /// below the recommendation threshold.
    pub fn review_plan(
        &self,
        style: LearningStyle,
        topic: &str,
        probability: f64,
    ) -> Option<ReviewItem> {
        if probability <= self.params.review_threshold {
            return None;
        }

        Some(ReviewItem {
            topic: topic.to_string(),
            urgency: probability,
            method: self.review_method(style, probability).to_string(),
            estimated_minutes: self.estimate_minutes(probability),
            reason: format!(
                "Review recommended due to {:.1}% forgetting probability",
                probability * 100.0
            ),
        })
    }

    /// Plan reviews across topics, sorted by descending urgency.
    pub fn plan_reviews(
        &self,
        style: LearningStyle,
        topics: &[(String, f64, Vec<f64>)],
    ) -> Vec<ReviewItem> {
        let mut items: Vec<ReviewItem> = topics
            .iter()
            .filter_map(|(topic, days, scores)| {
                let prob = self.probability(*days, scores);
                self.review_plan(style, topic, prob)
            })
            .collect();

        items.sort_by(|a, b| b.urgency.partial_cmp(&a.urgency).unwrap_or(std::cmp::Ordering::Equal));
        items
    }

    fn review_method(&self, style: LearningStyle, probability: f64) -> &'static str {
        if probability > self.params.intensive_threshold {
            match style {
                LearningStyle::Visual => "interactive_recap",
                LearningStyle::Auditory => "audio_summary",
                LearningStyle::Kinesthetic => "hands_on_practice",
            }
        } else {
            match style {
                LearningStyle::Visual => "visual_summary",
                LearningStyle::Auditory => "brief_audio",
                LearningStyle::Kinesthetic => "quick_exercise",
            }
        }
    }

    fn estimate_minutes(&self, probability: f64) -> i32 {
        let base = self.params.base_review_minutes;
        let minutes = if probability > self.params.intensive_threshold {
            base * 2.0
        } else if probability > self.params.moderate_threshold {
            base * 1.5
        } else {
            base
        };
        minutes.round() as i32
    }
}

impl Default for ForgettingModel {
    fn default() -> Self {
        Self::new(ForgettingParams::default())
    }
}
