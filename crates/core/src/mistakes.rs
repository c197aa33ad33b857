use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::QuestionId;
use crate::navigation::{clamp_index, step_cyclic};

/// Delay between a correct review answer and the removal it triggers.
pub const REMOVAL_GRACE_MS: i64 = 1_500;

//
// ─── MISTAKE QUEUE ────────────────────────────────────────────────────────────
//

/// Insertion-ordered set of question ids answered wrong in normal mode.
///
/// Stored as a plain JSON array. Duplicates in stored data are dropped on
/// load, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<QuestionId>", into = "Vec<QuestionId>")]
pub struct MistakeQueue {
    ids: Vec<QuestionId>,
}

impl MistakeQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already queued. Returns whether it was added.
    pub fn enqueue(&mut self, id: QuestionId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove `id` if present. Returns whether anything changed.
    pub fn remove(&mut self, id: QuestionId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|queued| *queued != id);
        self.ids.len() != before
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<QuestionId> {
        self.ids.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[QuestionId] {
        &self.ids
    }
}

impl From<Vec<QuestionId>> for MistakeQueue {
    fn from(ids: Vec<QuestionId>) -> Self {
        let mut queue = Self::new();
        for id in ids {
            queue.enqueue(id);
        }
        queue
    }
}

impl From<MistakeQueue> for Vec<QuestionId> {
    fn from(queue: MistakeQueue) -> Self {
        queue.ids
    }
}

//
// ─── REVIEW CONTROLLER ────────────────────────────────────────────────────────
//

/// Where review mode currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPosition {
    /// Queue is empty: every mistake has been eliminated.
    AllClear,
    At { index: usize, question_id: QuestionId },
}

/// A removal committed once its grace period has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRemoval {
    pub question_id: QuestionId,
    pub due_at: DateTime<Utc>,
}

/// Mistake queue plus the review-mode cursor and scheduled removals.
///
/// Scheduled removals are never cancelled. When one fires for an id that is
/// no longer queued it does nothing.
#[derive(Debug, Clone, Default)]
pub struct MistakeReview {
    queue: MistakeQueue,
    cursor: usize,
    pending: Vec<PendingRemoval>,
}

impl MistakeReview {
    #[must_use]
    pub fn new(queue: MistakeQueue) -> Self {
        Self {
            queue,
            cursor: 0,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn queue(&self) -> &MistakeQueue {
        &self.queue
    }

    pub fn enqueue(&mut self, id: QuestionId) -> bool {
        self.queue.enqueue(id)
    }

    #[must_use]
    pub fn position(&self) -> ReviewPosition {
        if self.queue.is_empty() {
            return ReviewPosition::AllClear;
        }
        let index = clamp_index(self.cursor, self.queue.len());
        match self.queue.get(index) {
            Some(question_id) => ReviewPosition::At { index, question_id },
            None => ReviewPosition::AllClear,
        }
    }

    /// Advance cyclically: `(cursor + 1) mod len`.
    pub fn review_next(&mut self) -> ReviewPosition {
        let len = self.queue.len();
        self.cursor = step_cyclic(clamp_index(self.cursor, len), len);
        self.position()
    }

    /// Schedule removal of the question under the cursor.
    ///
    /// Returns `None` in the all-clear state.
    pub fn schedule_removal(&mut self, now: DateTime<Utc>) -> Option<PendingRemoval> {
        let ReviewPosition::At { question_id, .. } = self.position() else {
            return None;
        };
        let removal = PendingRemoval {
            question_id,
            due_at: now + Duration::milliseconds(REMOVAL_GRACE_MS),
        };
        self.pending.push(removal);
        Some(removal)
    }

    /// Remove `id` and rewind the cursor to the head of the queue.
    ///
    /// Returns `false`, leaving queue and cursor untouched, if `id` was not queued.
    pub fn dequeue_if_correct(&mut self, id: QuestionId) -> bool {
        if !self.queue.remove(id) {
            return false;
        }
        self.cursor = 0;
        true
    }

    /// Commit every scheduled removal due at `now`, returning the ids that
    /// actually left the queue.
    pub fn commit_due(&mut self, now: DateTime<Utc>) -> Vec<QuestionId> {
        let (due, waiting): (Vec<PendingRemoval>, Vec<PendingRemoval>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|p| p.due_at <= now);
        self.pending = waiting;

        due.into_iter()
            .filter(|p| self.dequeue_if_correct(p.question_id))
            .map(|p| p.question_id)
            .collect()
    }

    #[must_use]
    pub fn pending(&self) -> &[PendingRemoval] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn ids(raw: &[u32]) -> Vec<QuestionId> {
        raw.iter().copied().map(QuestionId::new).collect()
    }

    fn review_of(raw: &[u32]) -> MistakeReview {
        MistakeReview::new(MistakeQueue::from(ids(raw)))
    }

    #[test]
    fn enqueue_is_idempotent() {
        let mut queue = MistakeQueue::new();
        assert!(queue.enqueue(QuestionId::new(7)));
        assert!(!queue.enqueue(QuestionId::new(7)));
        assert_eq!(queue.as_slice(), ids(&[7]).as_slice());
    }

    #[test]
    fn remove_then_reenqueue_restores_membership() {
        let mut queue = MistakeQueue::from(ids(&[3, 7]));
        assert!(queue.remove(QuestionId::new(3)));
        assert!(!queue.remove(QuestionId::new(3)));
        assert_eq!(queue.as_slice(), ids(&[7]).as_slice());

        assert!(queue.enqueue(QuestionId::new(3)));
        assert_eq!(queue.as_slice(), ids(&[7, 3]).as_slice());
    }

    #[test]
    fn deserializing_drops_duplicates_in_order() {
        let queue: MistakeQueue = serde_json::from_str("[9, 3, 9, 1, 3]").unwrap();
        assert_eq!(queue.as_slice(), ids(&[9, 3, 1]).as_slice());
        assert_eq!(serde_json::to_string(&queue).unwrap(), "[9,3,1]");
    }

    #[test]
    fn review_cycles_back_to_start() {
        let mut review = review_of(&[3, 7, 9]);
        let start = review.position();
        for _ in 0..3 {
            review.review_next();
        }
        assert_eq!(review.position(), start);
    }

    #[test]
    fn empty_queue_is_all_clear() {
        let mut review = MistakeReview::default();
        assert_eq!(review.position(), ReviewPosition::AllClear);
        assert_eq!(review.review_next(), ReviewPosition::AllClear);
        assert!(review.schedule_removal(fixed_now()).is_none());
    }

    #[test]
    fn removal_waits_for_grace_period() {
        let now = fixed_now();
        let mut review = review_of(&[3, 7, 9]);
        review.review_next();
        assert_eq!(
            review.position(),
            ReviewPosition::At {
                index: 1,
                question_id: QuestionId::new(7)
            }
        );

        let removal = review.schedule_removal(now).unwrap();
        assert_eq!(removal.question_id, QuestionId::new(7));

        assert!(review.commit_due(now + Duration::milliseconds(1_499)).is_empty());
        assert_eq!(review.queue().len(), 3);

        let removed = review.commit_due(now + Duration::milliseconds(REMOVAL_GRACE_MS));
        assert_eq!(removed, ids(&[7]));
        assert_eq!(review.queue().as_slice(), ids(&[3, 9]).as_slice());
        assert_eq!(
            review.position(),
            ReviewPosition::At {
                index: 0,
                question_id: QuestionId::new(3)
            }
        );
        assert!(review.pending().is_empty());
    }

    #[test]
    fn stale_removal_is_a_no_op() {
        let now = fixed_now();
        let mut review = review_of(&[3, 7]);
        review.review_next();
        review.schedule_removal(now);

        // removed through another path before the timer fires
        assert!(review.dequeue_if_correct(QuestionId::new(7)));
        review.review_next();

        let removed = review.commit_due(now + Duration::seconds(2));
        assert!(removed.is_empty());
        assert_eq!(review.queue().as_slice(), ids(&[3]).as_slice());
    }

    #[test]
    fn removal_fires_even_after_navigating_away() {
        let now = fixed_now();
        let mut review = review_of(&[3, 7, 9]);
        review.schedule_removal(now);
        review.review_next();
        review.review_next();

        let removed = review.commit_due(now + Duration::seconds(5));
        assert_eq!(removed, ids(&[3]));
        assert_eq!(review.queue().as_slice(), ids(&[7, 9]).as_slice());
    }

    #[test]
    fn last_removal_reaches_all_clear() {
        let now = fixed_now();
        let mut review = review_of(&[5]);
        review.schedule_removal(now);
        review.commit_due(now + Duration::seconds(2));
        assert_eq!(review.position(), ReviewPosition::AllClear);
    }
}
