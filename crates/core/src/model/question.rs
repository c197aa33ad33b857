use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id must be positive")]
    ZeroId,

    #[error("question {id} has {count} options, at least 2 are required")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id} marks option {index} as correct but only has {count} options")]
    CorrectIndexOutOfRange {
        id: QuestionId,
        index: usize,
        count: usize,
    },

    #[error("question {id} explains {provided} wrong options, expected {expected}")]
    WrongRationaleCount {
        id: QuestionId,
        provided: usize,
        expected: usize,
    },
}

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

/// The four reasoning domains questions and performance are bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Scientific,
    Mathematical,
    Verbal,
    Flexibility,
}

impl Category {
    /// Every category, in dashboard order.
    pub const ALL: [Category; 4] = [
        Category::Scientific,
        Category::Mathematical,
        Category::Verbal,
        Category::Flexibility,
    ];

    /// Label shown to the learner.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Scientific => "الاستدلال العلمي والميكانيكي",
            Category::Mathematical => "الاستدلال الرياضي والمكاني",
            Category::Verbal => "الاستدلال اللغوي وفهم المقروء",
            Category::Flexibility => "المرونة العقلية",
        }
    }
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "سهل",
            Difficulty::Medium => "متوسط",
            Difficulty::Hard => "صعب",
        }
    }
}

//
// ─── EXPLANATION ──────────────────────────────────────────────────────────────
//

/// Worked explanation shown after a question is answered.
///
/// - `method1`: the intuitive shortcut
/// - `method2`: the analytical or scientific route
/// - `method3`: solving by elimination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub method1: String,
    pub method2: String,
    pub method3: String,
    pub why_correct: String,
    /// One rationale per incorrect option, in option order with the correct one skipped.
    pub why_others_wrong: Vec<String>,
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: u32,
    pub text: String,
    pub category: Category,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub difficulty: Difficulty,
    pub explanation: Explanation,
}

impl QuestionDraft {
    /// Check the structural invariants and produce an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id is zero, there are fewer than two
    /// options, the correct index is out of range, or the wrong-option
    /// rationales do not line up with the incorrect options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.id == 0 {
            return Err(QuestionError::ZeroId);
        }
        let id = QuestionId::new(self.id);
        let count = self.options.len();

        if count < 2 {
            return Err(QuestionError::TooFewOptions { id, count });
        }
        if self.correct_answer_index >= count {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id,
                index: self.correct_answer_index,
                count,
            });
        }
        let provided = self.explanation.why_others_wrong.len();
        if provided != count - 1 {
            return Err(QuestionError::WrongRationaleCount {
                id,
                provided,
                expected: count - 1,
            });
        }

        Ok(Question {
            id,
            text: self.text,
            category: self.category,
            options: self.options,
            correct_answer_index: self.correct_answer_index,
            difficulty: self.difficulty,
            explanation: self.explanation,
        })
    }
}

/// A validated, read-only multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    category: Category,
    options: Vec<String>,
    correct_answer_index: usize,
    difficulty: Difficulty,
    explanation: Explanation,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn explanation(&self) -> &Explanation {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_answer_index
    }

    /// Letter label for an option (`A`, `B`, ...), `None` if out of range.
    #[must_use]
    pub fn option_label(&self, index: usize) -> Option<char> {
        if index >= self.options.len() {
            return None;
        }
        u8::try_from(index)
            .ok()
            .and_then(|i| b'A'.checked_add(i))
            .map(char::from)
    }

    /// Rationale for why the option at `index` is wrong.
    ///
    /// Returns `None` for the correct option or an out-of-range index.
    #[must_use]
    pub fn why_wrong(&self, index: usize) -> Option<&str> {
        if index >= self.options.len() || index == self.correct_answer_index {
            return None;
        }
        let slot = if index > self.correct_answer_index {
            index - 1
        } else {
            index
        };
        self.explanation
            .why_others_wrong
            .get(slot)
            .map(String::as_str)
    }
}
