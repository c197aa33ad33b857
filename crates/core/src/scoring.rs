//! Pure scoring rules: experience, streaks, levels and the events they raise.

use crate::events::ProgressEvent;
use crate::mistakes::MistakeQueue;
use crate::model::{Category, QuestionId, UserStats, level_for_xp};

/// Experience for a correct answer.
pub const CORRECT_XP: u32 = 10;
/// Extra experience once the streak is above [`STREAK_BONUS_THRESHOLD`].
pub const STREAK_BONUS_XP: u32 = 5;
pub const STREAK_BONUS_THRESHOLD: u32 = 5;
/// Participation experience for a wrong answer.
pub const PARTICIPATION_XP: u32 = 2;
/// A streak milestone is announced every this many correct answers in a row.
pub const STREAK_MILESTONE_EVERY: u32 = 5;

/// A just-answered question in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerEvent {
    pub question_id: QuestionId,
    pub category: Category,
    pub is_correct: bool,
}

/// New stats plus whatever should be announced, in announcement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub stats: UserStats,
    pub events: Vec<ProgressEvent>,
}

impl ScoreOutcome {
    /// Whether the answered question should join the mistake queue.
    #[must_use]
    pub fn adds_mistake(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ProgressEvent::MistakeAdded { .. }))
    }
}

/// Experience awarded for an answer given the streak *after* this answer
/// was counted.
#[must_use]
pub fn xp_for_answer(is_correct: bool, streak_after: u32) -> u32 {
    if !is_correct {
        return PARTICIPATION_XP;
    }
    if streak_after > STREAK_BONUS_THRESHOLD {
        CORRECT_XP + STREAK_BONUS_XP
    } else {
        CORRECT_XP
    }
}

/// Apply one answer to a stats snapshot.
///
/// `queue` is only read, to decide whether a wrong answer is a new mistake;
/// applying the enqueue is the caller's job.
#[must_use]
pub fn record_answer(stats: &UserStats, answer: AnswerEvent, queue: &MistakeQueue) -> ScoreOutcome {
    let mut next = stats.clone();
    let mut events = Vec::new();

    next.total_answered = next.total_answered.saturating_add(1);
    let score = next.category_performance.get_mut(answer.category);
    score.total = score.total.saturating_add(1);

    if answer.is_correct {
        next.correct_answers = next.correct_answers.saturating_add(1);
        score.correct = score.correct.saturating_add(1);
        next.streak = next.streak.saturating_add(1);
        next.xp = next.xp.saturating_add(xp_for_answer(true, next.streak));

        if next.streak % STREAK_MILESTONE_EVERY == 0 {
            events.push(ProgressEvent::StreakMilestone {
                streak: next.streak,
            });
        }
    } else {
        next.wrong_answers = next.wrong_answers.saturating_add(1);
        next.streak = 0;
        next.xp = next.xp.saturating_add(xp_for_answer(false, 0));

        if !queue.contains(answer.question_id) {
            events.push(ProgressEvent::MistakeAdded {
                question_id: answer.question_id,
            });
        }
    }

    let derived = level_for_xp(next.xp);
    if derived > stats.level {
        events.push(ProgressEvent::LevelUp { level: derived });
    }
    next.level = derived.max(stats.level);

    ScoreOutcome {
        stats: next,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correct(id: u32, category: Category) -> AnswerEvent {
        AnswerEvent {
            question_id: QuestionId::new(id),
            category,
            is_correct: true,
        }
    }

    fn wrong(id: u32, category: Category) -> AnswerEvent {
        AnswerEvent {
            question_id: QuestionId::new(id),
            category,
            is_correct: false,
        }
    }

    fn stats_with_xp(xp: u32) -> UserStats {
        UserStats {
            xp,
            level: level_for_xp(xp),
            ..UserStats::default()
        }
    }

    #[test]
    fn five_correct_in_a_row() {
        let queue = MistakeQueue::new();
        let mut stats = UserStats::default();
        let mut last_events = Vec::new();
        for id in 1..=5 {
            let outcome = record_answer(&stats, correct(id, Category::Verbal), &queue);
            stats = outcome.stats;
            last_events = outcome.events;
        }

        assert_eq!(stats.streak(), 5);
        assert_eq!(stats.xp(), 50);
        assert_eq!(stats.category(Category::Verbal).correct, 5);
        assert_eq!(stats.category(Category::Verbal).total, 5);
        assert_eq!(last_events, vec![ProgressEvent::StreakMilestone { streak: 5 }]);
    }

    #[test]
    fn bonus_starts_on_sixth_consecutive_answer() {
        let queue = MistakeQueue::new();
        let mut stats = UserStats::default();
        for id in 1..=6 {
            stats = record_answer(&stats, correct(id, Category::Scientific), &queue).stats;
        }
        assert_eq!(stats.xp(), 50 + CORRECT_XP + STREAK_BONUS_XP);
    }

    #[test]
    fn crossing_one_hundred_xp_levels_up_once() {
        let queue = MistakeQueue::new();
        let stats = stats_with_xp(95);
        let outcome = record_answer(&stats, correct(1, Category::Mathematical), &queue);

        assert_eq!(outcome.stats.xp(), 105);
        assert_eq!(outcome.stats.level(), 2);
        let level_ups: Vec<_> = outcome
            .events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::LevelUp { .. }))
            .collect();
        assert_eq!(level_ups, vec![&ProgressEvent::LevelUp { level: 2 }]);

        let again = record_answer(&outcome.stats, correct(2, Category::Mathematical), &queue);
        assert!(!again.events.iter().any(|e| matches!(e, ProgressEvent::LevelUp { .. })));
    }

    #[test]
    fn wrong_answer_resets_streak_and_flags_new_mistake() {
        let mut queue = MistakeQueue::new();
        let mut stats = UserStats::default();
        stats = record_answer(&stats, correct(1, Category::Verbal), &queue).stats;
        let outcome = record_answer(&stats, wrong(7, Category::Verbal), &queue);

        assert_eq!(outcome.stats.streak(), 0);
        assert_eq!(outcome.stats.wrong_answers(), 1);
        assert_eq!(outcome.stats.xp(), CORRECT_XP + PARTICIPATION_XP);
        assert!(outcome.adds_mistake());
        assert_eq!(
            outcome.events,
            vec![ProgressEvent::MistakeAdded {
                question_id: QuestionId::new(7)
            }]
        );

        queue.enqueue(QuestionId::new(7));
        let repeat = record_answer(&outcome.stats, wrong(7, Category::Verbal), &queue);
        assert!(!repeat.adds_mistake());
        assert!(repeat.events.is_empty());
    }

    #[test]
    fn counters_stay_consistent() {
        let queue = MistakeQueue::new();
        let mut stats = UserStats::default();
        let answers = [
            correct(1, Category::Verbal),
            wrong(2, Category::Mathematical),
            correct(3, Category::Flexibility),
            wrong(4, Category::Scientific),
            correct(5, Category::Scientific),
        ];
        for answer in answers {
            let before = stats.level();
            stats = record_answer(&stats, answer, &queue).stats;

            assert_eq!(stats.total_answered(), stats.correct_answers() + stats.wrong_answers());
            let category_total: u32 = stats.category_performance().iter().map(|(_, s)| s.total).sum();
            assert_eq!(category_total, stats.total_answered());
            assert!(stats.category_performance().iter().all(|(_, s)| s.correct <= s.total));
            assert_eq!(stats.level(), level_for_xp(stats.xp()));
            assert!(stats.level() >= before);
        }
    }

    #[test]
    fn xp_rules() {
        assert_eq!(xp_for_answer(false, 0), PARTICIPATION_XP);
        assert_eq!(xp_for_answer(true, 5), CORRECT_XP);
        assert_eq!(xp_for_answer(true, 6), CORRECT_XP + STREAK_BONUS_XP);
    }
}
