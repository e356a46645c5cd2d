//! Question records as produced by the question generator, and their quiz form

use serde::{Deserialize, Serialize};

/// A multiple-choice question from a lesson's `questions.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Question text; also the identity used for de-duplication
    pub question: String,

    pub correct_answer: String,

    pub wrong_answer_1: String,

    pub wrong_answer_2: String,

    pub wrong_answer_3: String,

    /// Why the correct answer is correct
    #[serde(default)]
    pub explanation: String,

    /// Position in the lesson video where the answer is covered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_timestamp: Option<String>,
}

impl QuestionRecord {
    /// A record is usable when it carries a non-blank question text
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty()
    }

    /// Attach quiz provenance and answer placement
    pub fn into_quiz_question(self, lesson: &str, correct_position: u8) -> QuizQuestion {
        QuizQuestion {
            record: self,
            lesson: lesson.to_string(),
            correct_position,
        }
    }
}

/// A question placed in a quiz, tagged with its source lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(flatten)]
    pub record: QuestionRecord,

    /// Directory name of the lesson the question came from
    pub lesson: String,

    /// Slot (1-4) the correct answer is rendered in
    pub correct_position: u8,
}

impl QuizQuestion {
    pub fn question(&self) -> &str {
        &self.record.question
    }
}
