use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::Category;

/// Experience points needed per level.
pub const XP_PER_LEVEL: u32 = 100;

/// Level derived from total experience: `floor(xp / 100) + 1`.
#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a persisted stats record is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("total answered ({total}) does not match correct + wrong ({sum})")]
    AnswerCountMismatch { total: u32, sum: u64 },

    #[error("category totals ({sum}) do not match total answered ({total})")]
    CategoryTotalMismatch { total: u32, sum: u64 },

    #[error("{category:?} has more correct answers ({correct}) than attempts ({total})")]
    CategoryOverflow {
        category: Category,
        correct: u32,
        total: u32,
    },
}

//
// ─── CATEGORY PERFORMANCE ─────────────────────────────────────────────────────
//

/// Correct/total counters for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub correct: u32,
    pub total: u32,
}

impl CategoryScore {
    /// Rounded percentage of correct answers, 0 when nothing was attempted.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        rounded_percent(self.correct, self.total)
    }
}

/// Per-category counters with exactly one slot per [`Category`].
///
/// Missing keys in stored data load as zeroed counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPerformance {
    scientific: CategoryScore,
    mathematical: CategoryScore,
    verbal: CategoryScore,
    flexibility: CategoryScore,
}

impl CategoryPerformance {
    #[must_use]
    pub fn get(&self, category: Category) -> CategoryScore {
        match category {
            Category::Scientific => self.scientific,
            Category::Mathematical => self.mathematical,
            Category::Verbal => self.verbal,
            Category::Flexibility => self.flexibility,
        }
    }

    pub(crate) fn get_mut(&mut self, category: Category) -> &mut CategoryScore {
        match category {
            Category::Scientific => &mut self.scientific,
            Category::Mathematical => &mut self.mathematical,
            Category::Verbal => &mut self.verbal,
            Category::Flexibility => &mut self.flexibility,
        }
    }

    /// Iterate `(category, score)` pairs in [`Category::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, CategoryScore)> + '_ {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    fn total_attempts(&self) -> u64 {
        self.iter().map(|(_, s)| u64::from(s.total)).sum()
    }
}

//
// ─── USER STATS ───────────────────────────────────────────────────────────────
//

/// Learner progress: answer counters, streak, experience and level.
///
/// Only the scoring engine mutates these values. Deserialization validates the
/// counter invariants and re-derives `level` from `xp`, so a loaded record is
/// always internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UserStatsRecord")]
pub struct UserStats {
    pub(crate) total_answered: u32,
    pub(crate) correct_answers: u32,
    pub(crate) wrong_answers: u32,
    pub(crate) category_performance: CategoryPerformance,
    pub(crate) streak: u32,
    pub(crate) xp: u32,
    pub(crate) level: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            total_answered: 0,
            correct_answers: 0,
            wrong_answers: 0,
            category_performance: CategoryPerformance::default(),
            streak: 0,
            xp: 0,
            level: 1,
        }
    }
}

impl UserStats {
    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.total_answered
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    #[must_use]
    pub fn category_performance(&self) -> &CategoryPerformance {
        &self.category_performance
    }

    #[must_use]
    pub fn category(&self, category: Category) -> CategoryScore {
        self.category_performance.get(category)
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Rounded overall accuracy, 0 before the first answer.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        rounded_percent(self.correct_answers, self.total_answered)
    }

    /// Experience earned inside the current level (0..100).
    #[must_use]
    pub fn xp_into_level(&self) -> u32 {
        self.xp % XP_PER_LEVEL
    }

    #[must_use]
    pub fn xp_to_next_level(&self) -> u32 {
        XP_PER_LEVEL - self.xp_into_level()
    }
}

/// Wire shape of stored stats. Older records may lack `xp` and `level`;
/// a stored `level` is ignored in favour of the one derived from `xp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserStatsRecord {
    total_answered: u32,
    correct_answers: u32,
    wrong_answers: u32,
    #[serde(default)]
    category_performance: CategoryPerformance,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    xp: u32,
}

impl TryFrom<UserStatsRecord> for UserStats {
    type Error = StatsError;

    fn try_from(record: UserStatsRecord) -> Result<Self, Self::Error> {
        let sum = u64::from(record.correct_answers) + u64::from(record.wrong_answers);
        if sum != u64::from(record.total_answered) {
            return Err(StatsError::AnswerCountMismatch {
                total: record.total_answered,
                sum,
            });
        }

        let category_sum = record.category_performance.total_attempts();
        if category_sum != u64::from(record.total_answered) {
            return Err(StatsError::CategoryTotalMismatch {
                total: record.total_answered,
                sum: category_sum,
            });
        }

        for (category, score) in record.category_performance.iter() {
            if score.correct > score.total {
                return Err(StatsError::CategoryOverflow {
                    category,
                    correct: score.correct,
                    total: score.total,
                });
            }
        }

        Ok(Self {
            total_answered: record.total_answered,
            correct_answers: record.correct_answers,
            wrong_answers: record.wrong_answers,
            category_performance: record.category_performance,
            streak: record.streak,
            xp: record.xp,
            level: level_for_xp(record.xp),
        })
    }
}

fn rounded_percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    u32::try_from((part * 100 + whole / 2) / whole).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_derived_from_xp() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(105), 2);
        assert_eq!(level_for_xp(250), 3);
    }

    #[test]
    fn default_stats_have_all_categories_zeroed() {
        let stats = UserStats::default();
        assert_eq!(stats.level(), 1);
        assert_eq!(stats.category_performance().iter().count(), 4);
        assert!(
            stats
                .category_performance()
                .iter()
                .all(|(_, s)| s == CategoryScore::default())
        );
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(UserStats::default()).unwrap();
        assert_eq!(json["totalAnswered"], 0);
        assert_eq!(json["level"], 1);
        assert_eq!(json["categoryPerformance"]["verbal"]["total"], 0);
    }

    #[test]
    fn legacy_record_without_xp_loads_at_level_one() {
        let raw = r#"{
            "totalAnswered": 3, "correctAnswers": 2, "wrongAnswers": 1,
            "categoryPerformance": {"verbal": {"correct": 2, "total": 3}},
            "streak": 0
        }"#;
        let stats: UserStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.xp(), 0);
        assert_eq!(stats.level(), 1);
        assert_eq!(stats.category(Category::Scientific), CategoryScore::default());
        assert_eq!(stats.category(Category::Verbal).correct, 2);
    }

    #[test]
    fn stored_level_is_reconciled_with_xp() {
        let raw = r#"{
            "totalAnswered": 0, "correctAnswers": 0, "wrongAnswers": 0,
            "streak": 0, "xp": 230, "level": 1
        }"#;
        let stats: UserStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.level(), 3);
    }

    #[test]
    fn inconsistent_counters_are_rejected() {
        let raw = r#"{"totalAnswered": 5, "correctAnswers": 1, "wrongAnswers": 1}"#;
        assert!(serde_json::from_str::<UserStats>(raw).is_err());

        let raw = r#"{
            "totalAnswered": 1, "correctAnswers": 1, "wrongAnswers": 0,
            "categoryPerformance": {"verbal": {"correct": 2, "total": 1}}
        }"#;
        assert!(serde_json::from_str::<UserStats>(raw).is_err());
    }

    #[test]
    fn accuracy_rounds_like_the_dashboard() {
        let stats = UserStats {
            total_answered: 3,
            correct_answers: 2,
            wrong_answers: 1,
            ..UserStats::default()
        };
        assert_eq!(stats.accuracy_percent(), 67);
        assert_eq!(UserStats::default().accuracy_percent(), 0);
    }

    #[test]
    fn xp_progress_within_level() {
        let stats = UserStats {
            xp: 142,
            level: 2,
            ..UserStats::default()
        };
        assert_eq!(stats.xp_into_level(), 42);
        assert_eq!(stats.xp_to_next_level(), 58);
    }
}
