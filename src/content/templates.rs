//! Local template-based content generation.
//!
//! The always-available fallback path: quizzes, exercises, and lessons are
//! assembled from fixed templates keyed by learning style, then adjusted for
//! difficulty and accommodations.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::als::types::{Accommodations, LearningStyle};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub kind: String,
    pub topic: String,
    pub difficulty: f64,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: Option<usize>,
    pub explanation: String,
    pub style_features: Vec<String>,
    pub estimated_secs: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub title: String,
    pub topic: String,
    pub difficulty: f64,
    pub style: LearningStyle,
    pub questions: Vec<QuizQuestion>,
    pub estimated_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseElement {
    pub kind: String,
    pub title: String,
    pub task: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub title: String,
    pub topic: String,
    pub style: LearningStyle,
    pub difficulty: f64,
    pub estimated_minutes: i32,
    pub elements: Vec<ExerciseElement>,
    pub features: Vec<String>,
    pub completion_criteria: String,
    pub accommodations_applied: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSection {
    pub objective: String,
    pub content_type: String,
    pub difficulty: f64,
    pub estimated_minutes: i32,
    pub introduction: String,
    pub body: String,
    pub examples: Vec<String>,
    pub summary: String,
    pub adaptations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub position: usize,
    pub objective: String,
    pub questions: Vec<QuizQuestion>,
    pub passing_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveElement {
    pub kind: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub title: String,
    pub topic: String,
    pub objectives: Vec<String>,
    pub difficulty: f64,
    pub style: LearningStyle,
    pub sections: Vec<LessonSection>,
    pub checkpoints: Vec<Checkpoint>,
    pub interactive_elements: Vec<InteractiveElement>,
}

#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub topic: String,
    pub difficulty: f64,
    pub style: LearningStyle,
    pub knowledge_gaps: Vec<String>,
    pub strengths: Vec<String>,
    pub num_questions: usize,
}

#[derive(Debug, Clone)]
pub struct ExerciseRequest {
    pub topic: String,
    pub style: LearningStyle,
    pub difficulty: f64,
    pub time_available_min: i32,
    pub accommodations: Accommodations,
}

#[derive(Debug, Clone)]
pub struct LessonRequest {
    pub topic: String,
    pub objectives: Vec<String>,
    pub style: LearningStyle,
    pub difficulty: f64,
}

/// Share of quiz questions aimed at knowledge gaps; the rest reinforce.
const GAP_QUESTION_RATIO: f64 = 0.6;
const MINUTES_PER_QUESTION: i32 = 2;
const SECTION_MINUTES: i32 = 10;

pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn generate_quiz(request: &QuizRequest) -> Quiz {
        let mut rng = rand::rng();
        let num_questions = request.num_questions.max(1);
        let gap_count = (num_questions as f64 * GAP_QUESTION_RATIO) as usize;
        let review_count = num_questions - gap_count;

        let mut questions = Vec::with_capacity(num_questions);

        for _ in 0..gap_count {
            let topic = request
                .knowledge_gaps
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| request.topic.clone());
            questions.push(Self::question(
                &mut rng,
                &topic,
                request.difficulty,
                request.style,
                QuestionPurpose::Gap,
            ));
        }

        for _ in 0..review_count {
            let topic = request
                .strengths
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| request.topic.clone());
            questions.push(Self::question(
                &mut rng,
                &topic,
                request.difficulty * 0.8,
                request.style,
                QuestionPurpose::Review,
            ));
        }

        questions.shuffle(&mut rng);

        Quiz {
            title: format!("Personalized {} Quiz", request.topic),
            topic: request.topic.clone(),
            difficulty: request.difficulty,
            style: request.style,
            estimated_minutes: num_questions as i32 * MINUTES_PER_QUESTION,
            questions,
        }
    }

    pub fn generate_exercise(request: &ExerciseRequest) -> Exercise {
        let (elements, features, completion_criteria) = Self::exercise_elements(request);

        let mut accommodations_applied = vec![match request.style {
            LearningStyle::Visual => "visual_elements".to_string(),
            LearningStyle::Auditory => "audio_elements".to_string(),
            LearningStyle::Kinesthetic => "interactive_elements".to_string(),
        }];
        let mut estimated_minutes = request.time_available_min;
        let mut instructions = Vec::new();

        if request.accommodations.needs_breaks {
            accommodations_applied.push("break_reminders".to_string());
        }
        if request.accommodations.needs_extra_time {
            estimated_minutes = (estimated_minutes as f64 * 1.5) as i32;
            accommodations_applied.push("extended_time".to_string());
        }
        if request.accommodations.prefers_clear_instructions {
            instructions = vec![
                "Step 1: Read through the content carefully".to_string(),
                "Step 2: Complete each interactive element".to_string(),
                "Step 3: Check your understanding with the quiz".to_string(),
                "Step 4: Review any areas where you need more practice".to_string(),
            ];
            accommodations_applied.push("clear_instructions".to_string());
        }
        if request.accommodations.benefits_from_repetition {
            accommodations_applied.push("repetition_support".to_string());
        }

        Exercise {
            title: format!("Adaptive {} Exercise", request.topic),
            topic: request.topic.clone(),
            style: request.style,
            difficulty: request.difficulty,
            estimated_minutes,
            elements,
            features,
            completion_criteria,
            accommodations_applied,
            instructions,
        }
    }

    pub fn generate_lesson(request: &LessonRequest) -> Lesson {
        let objectives = if request.objectives.is_empty() {
            Self::default_objectives(&request.topic, request.difficulty)
        } else {
            request.objectives.clone()
        };

        let mut sections = Vec::with_capacity(objectives.len());
        let mut checkpoints = Vec::new();
        let mut rng = rand::rng();

        for (i, objective) in objectives.iter().enumerate() {
            sections.push(Self::section(objective, request.style, request.difficulty));

            // Checkpoint after every second section.
            if (i + 1) % 2 == 0 {
                checkpoints.push(Checkpoint {
                    position: i + 1,
                    objective: objective.clone(),
                    questions: vec![Self::question(
                        &mut rng,
                        objective,
                        request.difficulty,
                        request.style,
                        QuestionPurpose::Review,
                    )],
                    passing_score: 0.7,
                });
            }
        }

        Lesson {
            title: format!("Personalized {} Content", request.topic),
            topic: request.topic.clone(),
            objectives,
            difficulty: request.difficulty,
            style: request.style,
            sections,
            checkpoints,
            interactive_elements: Self::interactive_elements(&request.topic, request.style),
        }
    }

    fn question<R: Rng>(
        rng: &mut R,
        topic: &str,
        difficulty: f64,
        style: LearningStyle,
        purpose: QuestionPurpose,
    ) -> QuizQuestion {
        let templates = question_templates(style, purpose);
        let (kind, text) = templates.choose(rng).copied().unwrap_or(templates[0]);

        let options = if kind == "multiple_choice" {
            vec![
                format!("Correct answer about {topic}"),
                "Plausible but incorrect option 1".to_string(),
                "Plausible but incorrect option 2".to_string(),
                "Obviously incorrect option".to_string(),
            ]
        } else {
            Vec::new()
        };
        let correct_index = if kind == "multiple_choice" { Some(0) } else { None };

        QuizQuestion {
            id: format!("q_{}", rng.random_range(1000..10000)),
            kind: kind.to_string(),
            topic: topic.to_string(),
            difficulty,
            text: text.replace("{topic}", topic),
            options,
            correct_index,
            explanation: format!("This question tests your understanding of {topic}."),
            style_features: style_features(style),
            estimated_secs: 120,
        }
    }

    fn exercise_elements(
        request: &ExerciseRequest,
    ) -> (Vec<ExerciseElement>, Vec<String>, String) {
        let topic = &request.topic;
        match request.style {
            LearningStyle::Visual => (
                vec![
                    ExerciseElement {
                        kind: "diagram".to_string(),
                        title: format!("{topic} Concept Map"),
                        task: format!("Complete the concept map for {topic}"),
                    },
                    ExerciseElement {
                        kind: "chart_analysis".to_string(),
                        title: format!("{topic} Data Visualization"),
                        task: "Analyze the chart and answer questions".to_string(),
                    },
                    ExerciseElement {
                        kind: "visual_matching".to_string(),
                        title: "Match Concepts".to_string(),
                        task: format!("Match {topic} concepts with their visual representations"),
                    },
                ],
                vec![
                    "colors".to_string(),
                    "icons".to_string(),
                    "spatial_organization".to_string(),
                ],
                "All visual elements correctly identified and connected".to_string(),
            ),
            LearningStyle::Auditory => (
                vec![
                    ExerciseElement {
                        kind: "audio_lecture".to_string(),
                        title: format!("{topic} Audio Explanation"),
                        task: format!("Listen to the full explanation of {topic}"),
                    },
                    ExerciseElement {
                        kind: "discussion_prompt".to_string(),
                        title: "Explain Your Understanding".to_string(),
                        task: format!("Record yourself explaining {topic} concepts"),
                    },
                    ExerciseElement {
                        kind: "audio_quiz".to_string(),
                        title: "Listen and Respond".to_string(),
                        task: "Answer questions based on audio content".to_string(),
                    },
                ],
                vec![
                    "narration".to_string(),
                    "sound_effects".to_string(),
                    "music".to_string(),
                ],
                "All audio content reviewed and responses recorded".to_string(),
            ),
            LearningStyle::Kinesthetic => (
                vec![
                    ExerciseElement {
                        kind: "simulation".to_string(),
                        title: format!("{topic} Interactive Simulation"),
                        task: format!("Manipulate variables to understand {topic}"),
                    },
                    ExerciseElement {
                        kind: "building_activity".to_string(),
                        title: "Construct Your Understanding".to_string(),
                        task: format!("Build a model or representation of {topic} concepts"),
                    },
                    ExerciseElement {
                        kind: "movement_based".to_string(),
                        title: "Physical Learning Activity".to_string(),
                        task: "Use physical movements to demonstrate concepts".to_string(),
                    },
                ],
                vec![
                    "drag_drop".to_string(),
                    "manipulation".to_string(),
                    "construction".to_string(),
                ],
                "All interactive elements successfully completed".to_string(),
            ),
        }
    }

    fn section(objective: &str, style: LearningStyle, difficulty: f64) -> LessonSection {
        let num_examples = if difficulty < 0.5 { 2 } else { 3 };
        LessonSection {
            objective: objective.to_string(),
            content_type: section_content_type(style).to_string(),
            difficulty,
            estimated_minutes: SECTION_MINUTES,
            introduction: format!("In this section, you will learn about {objective}."),
            body: format!(
                "Detailed explanation of {objective} optimized for {} learners.",
                style.as_str()
            ),
            examples: (1..=num_examples)
                .map(|i| format!("Example {i} for {objective}"))
                .collect(),
            summary: format!("Key takeaways about {objective}."),
            adaptations: style_adaptations(style),
        }
    }

    fn interactive_elements(topic: &str, style: LearningStyle) -> Vec<InteractiveElement> {
        let kinds: [&str; 2] = match style {
            LearningStyle::Visual => ["interactive_diagram", "visual_quiz"],
            LearningStyle::Auditory => ["audio_explanation", "discussion_forum"],
            LearningStyle::Kinesthetic => ["simulation", "hands_on_exercise"],
        };
        kinds
            .iter()
            .map(|kind| InteractiveElement {
                kind: kind.to_string(),
                topic: topic.to_string(),
            })
            .collect()
    }

    fn default_objectives(topic: &str, difficulty: f64) -> Vec<String> {
        let mut objectives = vec![
            format!("Understand the fundamentals of {topic}"),
            format!("Apply {topic} concepts in practical scenarios"),
        ];
        if difficulty > 0.6 {
            objectives.push(format!("Analyze complex {topic} problems"));
            objectives.push(format!("Evaluate different approaches to {topic}"));
            objectives.push(format!("Create original solutions using {topic}"));
        }
        objectives
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionPurpose {
    Gap,
    Review,
}

fn question_templates(
    style: LearningStyle,
    purpose: QuestionPurpose,
) -> &'static [(&'static str, &'static str)] {
    match (style, purpose) {
        (LearningStyle::Visual, QuestionPurpose::Gap) => &[
            (
                "multiple_choice",
                "Looking at this diagram about {topic}, what is the missing component?",
            ),
            (
                "image_analysis",
                "Analyze this visual representation of {topic} and identify the key elements.",
            ),
        ],
        (LearningStyle::Visual, QuestionPurpose::Review) => &[(
            "multiple_choice",
            "Which visual best represents the concept of {topic}?",
        )],
        (LearningStyle::Auditory, QuestionPurpose::Gap) => &[(
            "multiple_choice",
            "Listen to this explanation of {topic}. What is the main point?",
        )],
        (LearningStyle::Auditory, QuestionPurpose::Review) => &[(
            "audio_response",
            "Explain {topic} in your own words.",
        )],
        (LearningStyle::Kinesthetic, QuestionPurpose::Gap) => &[(
            "interactive",
            "Use this simulation to demonstrate your understanding of {topic}.",
        )],
        (LearningStyle::Kinesthetic, QuestionPurpose::Review) => &[(
            "hands_on",
            "Complete this hands-on activity related to {topic}.",
        )],
    }
}

fn style_features(style: LearningStyle) -> Vec<String> {
    let features: [&str; 3] = match style {
        LearningStyle::Visual => ["diagram", "color_coding", "visual_cues"],
        LearningStyle::Auditory => ["audio_narration", "sound_effects", "verbal_cues"],
        LearningStyle::Kinesthetic => ["interactive_elements", "drag_drop", "manipulation"],
    };
    features.iter().map(|f| f.to_string()).collect()
}

fn style_adaptations(style: LearningStyle) -> Vec<String> {
    let adaptations: [&str; 3] = match style {
        LearningStyle::Visual => ["visual_organizers", "color_coding", "diagrams"],
        LearningStyle::Auditory => ["audio_narration", "discussion_prompts", "verbal_summaries"],
        LearningStyle::Kinesthetic => {
            ["interactive_elements", "hands_on_activities", "movement"]
        }
    };
    adaptations.iter().map(|a| a.to_string()).collect()
}

fn section_content_type(style: LearningStyle) -> &'static str {
    match style {
        LearningStyle::Visual => "interactive_infographic",
        LearningStyle::Auditory => "narrated_presentation",
        LearningStyle::Kinesthetic => "hands_on_simulation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz_request() -> QuizRequest {
        QuizRequest {
            topic: "loops".to_string(),
            difficulty: 0.5,
            style: LearningStyle::Visual,
            knowledge_gaps: vec!["recursion".to_string()],
            strengths: vec!["variables".to_string()],
            num_questions: 10,
        }
    }

    #[test]
    fn quiz_has_requested_question_count_and_timing() {
        let quiz = TemplateGenerator::generate_quiz(&quiz_request());
        assert_eq!(quiz.questions.len(), 10);
        assert_eq!(quiz.estimated_minutes, 20);
        assert_eq!(quiz.topic, "loops");
    }

    #[test]
    fn quiz_questions_target_gaps_and_strengths() {
        let quiz = TemplateGenerator::generate_quiz(&quiz_request());
        let gap_questions = quiz
            .questions
            .iter()
            .filter(|q| q.topic == "recursion")
            .count();
        let review_questions = quiz
            .questions
            .iter()
            .filter(|q| q.topic == "variables")
            .count();
        assert_eq!(gap_questions, 6);
        assert_eq!(review_questions, 4);
    }

    #[test]
    fn multiple_choice_questions_carry_options() {
        let quiz = TemplateGenerator::generate_quiz(&quiz_request());
        for question in &quiz.questions {
            if question.kind == "multiple_choice" {
                assert_eq!(question.options.len(), 4);
                assert_eq!(question.correct_index, Some(0));
            } else {
                assert!(question.options.is_empty());
            }
            assert!(question.text.contains(&question.topic));
        }
    }

    #[test]
    fn exercise_applies_accommodations() {
        let request = ExerciseRequest {
            topic: "loops".to_string(),
            style: LearningStyle::Kinesthetic,
            difficulty: 0.5,
            time_available_min: 30,
            accommodations: Accommodations {
                needs_extra_time: true,
                prefers_clear_instructions: true,
                ..Accommodations::default()
            },
        };
        let exercise = TemplateGenerator::generate_exercise(&request);

        assert_eq!(exercise.estimated_minutes, 45);
        assert!(exercise
            .accommodations_applied
            .contains(&"extended_time".to_string()));
        assert!(!exercise.instructions.is_empty());
        assert_eq!(exercise.elements.len(), 3);
        assert_eq!(exercise.elements[0].kind, "simulation");
    }

    #[test]
    fn lesson_checkpoints_land_after_every_second_section() {
        let request = LessonRequest {
            topic: "ownership".to_string(),
            objectives: Vec::new(),
            style: LearningStyle::Visual,
            difficulty: 0.7,
        };
        let lesson = TemplateGenerator::generate_lesson(&request);

        // Difficulty above 0.6 expands to five objectives.
        assert_eq!(lesson.sections.len(), 5);
        assert_eq!(lesson.checkpoints.len(), 2);
        assert_eq!(lesson.checkpoints[0].position, 2);
        assert_eq!(lesson.checkpoints[1].position, 4);
        assert_eq!(lesson.interactive_elements.len(), 2);
    }

    #[test]
    fn easy_lessons_stay_short() {
        let request = LessonRequest {
            topic: "variables".to_string(),
            objectives: Vec::new(),
            style: LearningStyle::Auditory,
            difficulty: 0.3,
        };
        let lesson = TemplateGenerator::generate_lesson(&request);
        assert_eq!(lesson.sections.len(), 2);
        assert_eq!(lesson.sections[0].examples.len(), 2);
    }
}
