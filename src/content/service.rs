//! Content generation service.
//!
//! Tries the remote LLM collaborator first when one is configured, and falls
//! back silently to the local template path on any failure. Every payload is
//! tagged with the path that produced it.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::content::llm::LlmClient;
use crate::content::templates::{
    Exercise, ExerciseRequest, Lesson, LessonRequest, Quiz, QuizRequest, TemplateGenerator,
};

const TARGET_PERFORMANCE: f64 = 0.7;
const DIFFICULTY_STEP: f64 = 0.1;
const DIFFICULTY_FLOOR: f64 = 0.1;
const DIFFICULTY_CEILING: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Remote,
    Local,
}

/// A generated payload plus the path that served it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated<T> {
    pub source: GenerationSource,
    pub payload: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAdaptation {
    pub new_difficulty: f64,
    pub delta: f64,
    pub note: String,
}

pub struct ContentService {
    llm: Option<LlmClient>,
}

impl ContentService {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self { llm }
    }

    pub fn from_env() -> Self {
        let client = LlmClient::from_env();
        Self {
            llm: client.is_available().then_some(client),
        }
    }

    /// Local-only service, used by tests and offline deployments.
    pub fn local_only() -> Self {
        Self { llm: None }
    }

    pub async fn generate_quiz(&self, request: &QuizRequest) -> Generated<Quiz> {
        let user_prompt = format!(
            "Create a quiz as JSON about '{}' with {} questions at difficulty {:.1} \
             for a {} learner. Knowledge gaps: {:?}. Strengths: {:?}.",
            request.topic,
            request.num_questions,
            request.difficulty,
            request.style.as_str(),
            request.knowledge_gaps,
            request.strengths,
        );

        if let Some(quiz) = self
            .try_remote::<Quiz>("quiz", QUIZ_SCHEMA_PROMPT, &user_prompt)
            .await
            .filter(|q| !q.questions.is_empty())
        {
            return Generated {
                source: GenerationSource::Remote,
                payload: quiz,
            };
        }

        Generated {
            source: GenerationSource::Local,
            payload: TemplateGenerator::generate_quiz(request),
        }
    }

    pub async fn generate_exercise(&self, request: &ExerciseRequest) -> Generated<Exercise> {
        let user_prompt = format!(
            "Create an exercise as JSON about '{}' at difficulty {:.1} for a {} learner \
             with {} minutes available.",
            request.topic,
            request.difficulty,
            request.style.as_str(),
            request.time_available_min,
        );

        if let Some(exercise) = self
            .try_remote::<Exercise>("exercise", EXERCISE_SCHEMA_PROMPT, &user_prompt)
            .await
            .filter(|e| !e.elements.is_empty())
        {
            return Generated {
                source: GenerationSource::Remote,
                payload: exercise,
            };
        }

        Generated {
            source: GenerationSource::Local,
            payload: TemplateGenerator::generate_exercise(request),
        }
    }

    pub async fn generate_lesson(&self, request: &LessonRequest) -> Generated<Lesson> {
        let user_prompt = format!(
            "Create lesson content as JSON about '{}' at difficulty {:.1} for a {} learner. \
             Objectives: {:?}.",
            request.topic,
            request.difficulty,
            request.style.as_str(),
            request.objectives,
        );

        if let Some(lesson) = self
            .try_remote::<Lesson>("lesson", LESSON_SCHEMA_PROMPT, &user_prompt)
            .await
            .filter(|l| !l.sections.is_empty())
        {
            return Generated {
                source: GenerationSource::Remote,
                payload: lesson,
            };
        }

        Generated {
            source: GenerationSource::Local,
            payload: TemplateGenerator::generate_lesson(request),
        }
    }

    /// Closed-form difficulty nudge toward the target performance band.
    pub fn adapt_difficulty(current_difficulty: f64, performance: f64) -> DifficultyAdaptation {
        let deviation = performance - TARGET_PERFORMANCE;

        let (delta, note) = if deviation > 0.2 {
            (
                DIFFICULTY_STEP,
                "Increased difficulty due to strong performance",
            )
        } else if deviation < -0.2 {
            (
                -DIFFICULTY_STEP,
                "Decreased difficulty to support learning",
            )
        } else {
            (0.0, "Maintained current difficulty level")
        };

        DifficultyAdaptation {
            new_difficulty: (current_difficulty + delta).clamp(DIFFICULTY_FLOOR, DIFFICULTY_CEILING),
            delta,
            note: note.to_string(),
        }
    }

    /// Remote generation attempt. Any failure logs a warning and yields
    /// None, so callers always land on the local path.
    async fn try_remote<T: DeserializeOwned>(
        &self,
        kind: &str,
        system: &str,
        user: &str,
    ) -> Option<T> {
        let llm = self.llm.as_ref()?;
        if !llm.is_available() {
            return None;
        }

        match llm.complete_json(system, user).await {
            Ok(value) => match serde_json::from_value::<T>(value) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(kind, error = %e, "remote payload did not match schema, falling back");
                    None
                }
            },
            Err(e) => {
                warn!(kind, error = %e, "remote generation failed, falling back");
                None
            }
        }
    }
}

impl Default for ContentService {
    fn default() -> Self {
        Self::from_env()
    }
}

const QUIZ_SCHEMA_PROMPT: &str = "You generate quizzes for an adaptive learning platform. \
Respond with JSON only, matching: {\"title\": string, \"topic\": string, \"difficulty\": number, \
\"style\": \"visual\"|\"auditory\"|\"kinesthetic\", \"questions\": [{\"id\": string, \"kind\": string, \
\"topic\": string, \"difficulty\": number, \"text\": string, \"options\": [string], \
\"correctIndex\": number|null, \"explanation\": string, \"styleFeatures\": [string], \
\"estimatedSecs\": number}], \"estimatedMinutes\": number}";

const EXERCISE_SCHEMA_PROMPT: &str = "You generate exercises for an adaptive learning platform. \
Respond with JSON only, matching: {\"title\": string, \"topic\": string, \
\"style\": \"visual\"|\"auditory\"|\"kinesthetic\", \"difficulty\": number, \"estimatedMinutes\": number, \
\"elements\": [{\"kind\": string, \"title\": string, \"task\": string}], \"features\": [string], \
\"completionCriteria\": string, \"accommodationsApplied\": [string], \"instructions\": [string]}";

const LESSON_SCHEMA_PROMPT: &str = "You generate lesson content for an adaptive learning platform. \
Respond with JSON only, matching: {\"title\": string, \"topic\": string, \"objectives\": [string], \
\"difficulty\": number, \"style\": \"visual\"|\"auditory\"|\"kinesthetic\", \
\"sections\": [{\"objective\": string, \"contentType\": string, \"difficulty\": number, \
\"estimatedMinutes\": number, \"introduction\": string, \"body\": string, \"examples\": [string], \
\"summary\": string, \"adaptations\": [string]}], \"checkpoints\": [{\"position\": number, \
\"objective\": string, \"questions\": [], \"passingScore\": number}], \
\"interactiveElements\": [{\"kind\": string, \"topic\": string}]}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::als::types::{Accommodations, LearningStyle};

    #[tokio::test]
    async fn unconfigured_service_serves_local_quiz() {
        let service = ContentService::local_only();
        let request = QuizRequest {
            topic: "loops".to_string(),
            difficulty: 0.5,
            style: LearningStyle::Visual,
            knowledge_gaps: Vec::new(),
            strengths: Vec::new(),
            num_questions: 4,
        };

        let generated = service.generate_quiz(&request).await;
        assert_eq!(generated.source, GenerationSource::Local);
        assert_eq!(generated.payload.questions.len(), 4);
    }

    #[tokio::test]
    async fn unconfigured_service_serves_local_exercise_and_lesson() {
        let service = ContentService::local_only();

        let exercise = service
            .generate_exercise(&ExerciseRequest {
                topic: "loops".to_string(),
                style: LearningStyle::Auditory,
                difficulty: 0.5,
                time_available_min: 30,
                accommodations: Accommodations::default(),
            })
            .await;
        assert_eq!(exercise.source, GenerationSource::Local);

        let lesson = service
            .generate_lesson(&LessonRequest {
                topic: "loops".to_string(),
                objectives: Vec::new(),
                style: LearningStyle::Visual,
                difficulty: 0.4,
            })
            .await;
        assert_eq!(lesson.source, GenerationSource::Local);
        assert!(!lesson.payload.sections.is_empty());
    }

    #[test]
    fn difficulty_adaptation_steps_and_clamps() {
        let up = ContentService::adapt_difficulty(0.5, 0.95);
        assert!((up.new_difficulty - 0.6).abs() < 1e-9);
        assert!((up.delta - 0.1).abs() < 1e-9);

        let down = ContentService::adapt_difficulty(0.5, 0.4);
        assert!((down.new_difficulty - 0.4).abs() < 1e-9);

        let hold = ContentService::adapt_difficulty(0.5, 0.7);
        assert!((hold.new_difficulty - 0.5).abs() < 1e-9);
        assert!((hold.delta - 0.0).abs() < 1e-12);

        let floor = ContentService::adapt_difficulty(0.12, 0.1);
        assert!((floor.new_difficulty - 0.1).abs() < 1e-9);

        let ceiling = ContentService::adapt_difficulty(0.98, 1.0);
        assert!((ceiling.new_difficulty - 1.0).abs() < 1e-9);
    }
}
