#![allow(dead_code)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LearningStyle {
    #[default]
    Visual,
    Auditory,
    Kinesthetic,
}

impl LearningStyle {
    /// Fixed ordering used for deterministic argmax tie-breaks.
    pub const ALL: [LearningStyle; 3] = [Self::Visual, Self::Auditory, Self::Kinesthetic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::Kinesthetic => "kinesthetic",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "auditory" => Self::Auditory,
            "kinesthetic" => Self::Kinesthetic,
            _ => Self::Visual,
        }
    }

    /// Which style a content-type tag primarily serves, if any.
    pub fn category_of(content_type: &str) -> Option<Self> {
        match content_type {
            "video" | "diagram" | "chart" | "infographic" | "image" => Some(Self::Visual),
            "audio" | "podcast" | "lecture" | "discussion" => Some(Self::Auditory),
            "interactive" | "simulation" | "hands_on" | "exercise" => Some(Self::Kinesthetic),
            _ => None,
        }
    }

    /// Affinity of this style for a content-type tag. Unknown pairs score 0.5.
    pub fn content_affinity(&self, content_type: &str) -> f64 {
        match self {
            Self::Visual => match content_type {
                "diagram" => 1.0,
                "infographic" => 0.95,
                "video" => 0.9,
                "chart" => 0.85,
                "image" => 0.8,
                "text" => 0.3,
                "audio" => 0.1,
                _ => 0.5,
            },
            Self::Auditory => match content_type {
                "audio" => 1.0,
                "podcast" => 0.95,
                "lecture" => 0.9,
                "discussion" => 0.85,
                "video" => 0.6,
                "text" => 0.4,
                "diagram" => 0.2,
                _ => 0.5,
            },
            Self::Kinesthetic => match content_type {
                "interactive" => 1.0,
                "simulation" => 0.95,
                "hands_on" => 0.9,
                "exercise" => 0.85,
                "video" => 0.5,
                "audio" => 0.3,
                "text" => 0.2,
                _ => 0.5,
            },
        }
    }

    /// Content type that best serves this style when generating material.
    pub fn optimal_content_type(&self) -> &'static str {
        match self {
            Self::Visual => "infographic",
            Self::Auditory => "audio",
            Self::Kinesthetic => "interactive",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleScores {
    pub visual: f64,
    pub auditory: f64,
    pub kinesthetic: f64,
}

impl Default for StyleScores {
    fn default() -> Self {
        Self {
            visual: 0.4,
            auditory: 0.3,
            kinesthetic: 0.3,
        }
    }
}

impl StyleScores {
    pub fn zero() -> Self {
        Self {
            visual: 0.0,
            auditory: 0.0,
            kinesthetic: 0.0,
        }
    }

    pub fn get(&self, style: LearningStyle) -> f64 {
        match style {
            LearningStyle::Visual => self.visual,
            LearningStyle::Auditory => self.auditory,
            LearningStyle::Kinesthetic => self.kinesthetic,
        }
    }

    pub fn set(&mut self, style: LearningStyle, value: f64) {
        match style {
            LearningStyle::Visual => self.visual = value,
            LearningStyle::Auditory => self.auditory = value,
            LearningStyle::Kinesthetic => self.kinesthetic = value,
        }
    }

    /// Argmax over the fixed style ordering; a strict comparison keeps the
    /// earlier style on ties.
    pub fn primary(&self) -> LearningStyle {
        let mut best = LearningStyle::ALL[0];
        for style in LearningStyle::ALL.into_iter().skip(1) {
            if self.get(style) > self.get(best) {
                best = style;
            }
        }
        best
    }

    pub fn clamp_unit(&mut self) {
        self.visual = self.visual.clamp(0.0, 1.0);
        self.auditory = self.auditory.clamp(0.0, 1.0);
        self.kinesthetic = self.kinesthetic.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Accommodations {
    pub needs_breaks: bool,
    pub prefers_structure: bool,
    pub sensitive_to_distractions: bool,
    pub needs_extra_time: bool,
    pub benefits_from_repetition: bool,
    pub prefers_clear_instructions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SessionKind {
    #[default]
    Learning,
    Review,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InteractionCounts {
    pub note_taking: bool,
    pub audio_replays: i32,
    pub interactive_elements: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFeedback {
    /// Explicit satisfaction rating on a 1-5 scale.
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub content_id: String,
    pub content_type: String,
    pub topic: String,
    #[serde(default)]
    pub kind: SessionKind,
    pub duration_secs: f64,
    pub estimated_duration_secs: Option<f64>,
    pub performance: f64,
    pub engagement: f64,
    pub difficulty: f64,
    #[serde(default)]
    pub interactions: InteractionCounts,
    #[serde(default)]
    pub feedback: Option<SessionFeedback>,
    pub ts: i64,
}

impl SessionRecord {
    /// Learning efficiency: performance per unit time against a 30-minute
    /// baseline session.
    pub fn efficiency(&self) -> f64 {
        let minutes = self.duration_secs / 60.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        (self.performance / (minutes / 30.0).max(1.0)).min(1.0)
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            content_id: String::new(),
            content_type: "text".to_string(),
            topic: "general".to_string(),
            kind: SessionKind::Learning,
            duration_secs: 600.0,
            estimated_duration_secs: None,
            performance: 0.5,
            engagement: 0.5,
            difficulty: 0.5,
            interactions: InteractionCounts::default(),
            feedback: None,
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProfile {
    pub primary_style: LearningStyle,
    pub style_scores: StyleScores,
    pub confidence: f64,
    pub accommodations: Accommodations,
    pub knowledge_gaps: Vec<String>,
    pub strengths: Vec<String>,
    pub skill_level: f64,
    pub completed_content: Vec<String>,
    pub completed_topics: Vec<String>,
    /// Performance scores of the most recent sessions, newest last.
    pub recent_performance: Vec<f64>,
    /// Skill-level snapshots taken after each session, newest last.
    pub skill_history: Vec<f64>,
    pub session_count: i32,
    pub avg_performance: f64,
    pub last_updated: i64,
}

impl Default for LearningProfile {
    fn default() -> Self {
        Self {
            primary_style: LearningStyle::Visual,
            style_scores: StyleScores::default(),
            confidence: 0.1,
            accommodations: Accommodations {
                prefers_structure: true,
                prefers_clear_instructions: true,
                ..Accommodations::default()
            },
            knowledge_gaps: Vec::new(),
            strengths: Vec::new(),
            skill_level: 0.5,
            completed_content: Vec::new(),
            completed_topics: Vec::new(),
            recent_performance: Vec::new(),
            skill_history: Vec::new(),
            session_count: 0,
            avg_performance: 0.7,
            last_updated: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub topics: Vec<String>,
    pub content_type: String,
    pub difficulty: f64,
    pub estimated_duration_min: f64,
    pub interactive_elements: i32,
    pub media_types: Vec<String>,
    pub personalization: f64,
    pub social_features: i32,
    pub gamification_elements: i32,
    pub structured: bool,
}

impl Default for ContentItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            topics: Vec::new(),
            content_type: "text".to_string(),
            difficulty: 0.5,
            estimated_duration_min: 30.0,
            interactive_elements: 0,
            media_types: Vec::new(),
            personalization: 0.5,
            social_features: 0,
            gamification_elements: 0,
            structured: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    High,
    Normal,
    Low,
}

impl EnergyLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(Self::High),
            "normal" | "medium" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub time_available_min: f64,
    pub current_performance: Option<f64>,
    pub energy: Option<EnergyLevel>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            time_available_min: 60.0,
            current_performance: None,
            energy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Self::High
        } else if score > 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reasoning {
    pub primary_reason: String,
    pub supporting_factors: Vec<String>,
    pub confidence_level: ConfidenceBucket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub content_id: String,
    pub score: f64,
    pub reasoning: Reasoning,
    pub estimated_benefit: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub topic: String,
    pub urgency: f64,
    pub method: String,
    pub estimated_minutes: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationAction {
    IncreaseDifficulty,
    DecreaseDifficulty,
    ChangeContentType,
    AddBreak,
    ProvideHint,
    ShowExample,
    RepeatContent,
    AdvanceTopic,
    ReviewPrevious,
    GamifyContent,
}

impl AdaptationAction {
    /// Enumeration order doubles as the tie-break order for greedy selection.
    pub const ALL: [AdaptationAction; 10] = [
        Self::IncreaseDifficulty,
        Self::DecreaseDifficulty,
        Self::ChangeContentType,
        Self::AddBreak,
        Self::ProvideHint,
        Self::ShowExample,
        Self::RepeatContent,
        Self::AdvanceTopic,
        Self::ReviewPrevious,
        Self::GamifyContent,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|a| a == self).unwrap_or(0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncreaseDifficulty => "increase_difficulty",
            Self::DecreaseDifficulty => "decrease_difficulty",
            Self::ChangeContentType => "change_content_type",
            Self::AddBreak => "add_break",
            Self::ProvideHint => "provide_hint",
            Self::ShowExample => "show_example",
            Self::RepeatContent => "repeat_content",
            Self::AdvanceTopic => "advance_topic",
            Self::ReviewPrevious => "review_previous",
            Self::GamifyContent => "gamify_content",
        }
    }

    pub fn explanation(&self, style: LearningStyle) -> String {
        match self {
            Self::IncreaseDifficulty => {
                "User is performing well and ready for more challenge".to_string()
            }
            Self::DecreaseDifficulty => {
                "User is struggling and needs easier content".to_string()
            }
            Self::ChangeContentType => {
                format!("Switch to {} content", style.as_str())
            }
            Self::AddBreak => "User may be experiencing fatigue".to_string(),
            Self::ProvideHint => "User needs additional guidance".to_string(),
            Self::ShowExample => "Concrete examples will help understanding".to_string(),
            Self::RepeatContent => "Repetition will improve retention".to_string(),
            Self::AdvanceTopic => "User has mastered current topic".to_string(),
            Self::ReviewPrevious => "Previous concepts need reinforcement".to_string(),
            Self::GamifyContent => "Gamification will increase engagement".to_string(),
        }
    }

    pub fn plan(&self, style: LearningStyle) -> ActionPlan {
        match self {
            Self::IncreaseDifficulty => ActionPlan::DifficultyAdjustment { delta: 0.1 },
            Self::DecreaseDifficulty => ActionPlan::DifficultyAdjustment { delta: -0.1 },
            Self::ChangeContentType => ActionPlan::ContentAdaptation {
                new_type: style.optimal_content_type().to_string(),
            },
            Self::AddBreak => ActionPlan::SessionManagement { break_secs: 300 },
            Self::ProvideHint => ActionPlan::Assistance {
                hint_level: "moderate".to_string(),
            },
            Self::GamifyContent => ActionPlan::EngagementBoost {
                elements: vec!["points".to_string(), "progress_bar".to_string()],
            },
            _ => ActionPlan::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPlan {
    DifficultyAdjustment { delta: f64 },
    ContentAdaptation { new_type: String },
    SessionManagement { break_secs: i64 },
    Assistance { hint_level: String },
    EngagementBoost { elements: Vec<String> },
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationRecommendation {
    pub action: AdaptationAction,
    pub confidence: f64,
    pub expected_benefit: f64,
    pub explanation: String,
    pub plan: ActionPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub skill_level: f64,
    pub completion_rate: f64,
    pub time_spent_min: f64,
    /// Performance scores recorded against this topic, newest last.
    pub scores: Vec<f64>,
    pub last_reviewed_ts: Option<i64>,
}

impl Default for TopicProgress {
    fn default() -> Self {
        Self {
            skill_level: 0.3,
            completion_rate: 0.0,
            time_spent_min: 0.0,
            scores: Vec::new(),
            last_reviewed_ts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationLogEntry {
    pub id: String,
    pub content_id: String,
    pub score: f64,
    pub confidence: f64,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLearnerState {
    pub user_id: String,
    pub profile: LearningProfile,
    pub topics: HashMap<String, TopicProgress>,
    /// Recent session history, newest last, capped by the engine.
    pub sessions: Vec<SessionRecord>,
    pub agent: crate::als::agent::AgentState,
    #[serde(default)]
    pub recommendation_log: Vec<RecommendationLogEntry>,
    /// Last adaptation action applied for this user, consumed by the next
    /// training step.
    #[serde(default)]
    pub last_action: Option<AdaptationAction>,
    pub interaction_count: i32,
    pub last_updated: i64,
}
