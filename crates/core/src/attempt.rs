use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::{Question, QuestionId};

/// How many wrong options the "delete two" helper removes.
pub const ELIMINATED_OPTIONS: usize = 2;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("question already answered")]
    AlreadyAnswered,
    #[error("option {0} was eliminated")]
    Eliminated(usize),
    #[error("option {index} does not exist, question has {count} options")]
    NoSuchOption { index: usize, count: usize },
}

/// Pick up to two wrong options uniformly at random, never the correct one.
///
/// Questions with only one wrong option lose just that one.
#[must_use]
pub fn eliminate_two<R: Rng + ?Sized>(
    option_count: usize,
    correct_index: usize,
    rng: &mut R,
) -> BTreeSet<usize> {
    let mut wrong: Vec<usize> = (0..option_count).filter(|i| *i != correct_index).collect();
    wrong.shuffle(rng);
    wrong.into_iter().take(ELIMINATED_OPTIONS).collect()
}

/// Per-question interaction state: the chosen option, the cached
/// elimination and any tutor text fetched for this question.
///
/// A new attempt is created whenever the displayed question changes, which is
/// what resets everything here.
#[derive(Debug, Clone)]
pub struct QuestionAttempt {
    question_id: QuestionId,
    option_count: usize,
    correct_index: usize,
    selected: Option<usize>,
    eliminated: Option<BTreeSet<usize>>,
    hint: Option<String>,
    explanation: Option<String>,
}

impl QuestionAttempt {
    #[must_use]
    pub fn new(question: &Question) -> Self {
        Self {
            question_id: question.id(),
            option_count: question.options().len(),
            correct_index: question.correct_answer_index(),
            selected: None,
            eliminated: None,
            hint: None,
            explanation: None,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    /// Lock in an answer. Returns whether it was correct.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if an answer was already given, the option was
    /// eliminated, or the index is out of range.
    pub fn select(&mut self, index: usize) -> Result<bool, AttemptError> {
        if self.selected.is_some() {
            return Err(AttemptError::AlreadyAnswered);
        }
        if index >= self.option_count {
            return Err(AttemptError::NoSuchOption {
                index,
                count: self.option_count,
            });
        }
        if self.is_eliminated(index) {
            return Err(AttemptError::Eliminated(index));
        }
        self.selected = Some(index);
        Ok(index == self.correct_index)
    }

    /// Eliminate two wrong options, once per question.
    ///
    /// Later calls return the cached set. Returns `None` once answered and
    /// nothing had been eliminated before.
    pub fn eliminate_two<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&BTreeSet<usize>> {
        if self.eliminated.is_none() && self.selected.is_none() {
            self.eliminated = Some(eliminate_two(self.option_count, self.correct_index, rng));
        }
        self.eliminated.as_ref()
    }

    #[must_use]
    pub fn is_eliminated(&self, index: usize) -> bool {
        self.eliminated
            .as_ref()
            .is_some_and(|set| set.contains(&index))
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn answered_correctly(&self) -> Option<bool> {
        self.selected.map(|i| i == self.correct_index)
    }

    /// Store a hint fetched for `question_id`, discarding it if the learner
    /// has moved on. The first accepted hint sticks.
    pub fn accept_hint(&mut self, question_id: QuestionId, hint: String) -> bool {
        if question_id != self.question_id || self.hint.is_some() {
            return false;
        }
        self.hint = Some(hint);
        true
    }

    /// Same contract as [`accept_hint`](Self::accept_hint) for tutor explanations.
    pub fn accept_explanation(&mut self, question_id: QuestionId, text: String) -> bool {
        if question_id != self.question_id || self.explanation.is_some() {
            return false;
        }
        self.explanation = Some(text);
        true
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}
