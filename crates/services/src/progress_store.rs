use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use prep_core::model::{Category, QuestionId, UserStats};
use prep_core::navigation::{clamp_index, step_clamped};
use prep_core::{
    AnswerEvent, Clock, Direction, MistakeQueue, MistakeReview, PendingRemoval, ProgressEvent,
    ReviewPosition, record_answer,
};
use storage::repository::{ProgressKey, ProgressRepository};

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Read-only copy of everything the store owns, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub stats: UserStats,
    pub current_question_index: usize,
    pub mistakes: MistakeQueue,
    pub review_position: ReviewPosition,
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Single owner of the learner's stats, the normal-mode cursor and the
/// mistake queue.
///
/// Every mutation is written back through the repository straight away.
/// Write failures are logged and ignored: the in-memory state stays
/// authoritative for the session.
pub struct ProgressStore {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    catalog_len: usize,
    stats: UserStats,
    cursor: usize,
    review: MistakeReview,
}

impl ProgressStore {
    /// Load the three stored values, falling back per key to its default
    /// when a value is missing, malformed or unreadable.
    ///
    /// A stored cursor past the end of the catalog is clamped.
    pub async fn initialize(
        clock: Clock,
        repo: Arc<dyn ProgressRepository>,
        catalog_len: usize,
    ) -> Self {
        let stats: UserStats = load_or_default(repo.as_ref(), ProgressKey::UserStats).await;
        let cursor: usize =
            load_or_default(repo.as_ref(), ProgressKey::CurrentQuestionIndex).await;
        let queue: MistakeQueue =
            load_or_default(repo.as_ref(), ProgressKey::WrongQuestionIds).await;

        Self {
            clock,
            repo,
            catalog_len,
            stats,
            cursor: clamp_index(cursor, catalog_len),
            review: MistakeReview::new(queue),
        }
    }

    /// Override the clock (usually for deterministic testing).
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn mistakes(&self) -> &MistakeQueue {
        self.review.queue()
    }

    #[must_use]
    pub fn review_position(&self) -> ReviewPosition {
        self.review.position()
    }

    #[must_use]
    pub fn pending_removals(&self) -> &[PendingRemoval] {
        self.review.pending()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            stats: self.stats.clone(),
            current_question_index: self.cursor,
            mistakes: self.review.queue().clone(),
            review_position: self.review.position(),
        }
    }

    //
    // ─── NORMAL MODE ───────────────────────────────────────────────────────────
    //

    /// Score an answer, queue the question if it was a new mistake and
    /// persist everything. Returns the events to announce, in order.
    pub async fn submit_answer(
        &mut self,
        question_id: QuestionId,
        category: Category,
        is_correct: bool,
    ) -> Vec<ProgressEvent> {
        let answer = AnswerEvent {
            question_id,
            category,
            is_correct,
        };
        let outcome = record_answer(&self.stats, answer, self.review.queue());

        if outcome.adds_mistake() && self.review.enqueue(question_id) {
            debug!("question {question_id} added to mistake queue");
        }
        for event in &outcome.events {
            if let ProgressEvent::LevelUp { level } = event {
                debug!("level up to {level}");
            }
        }
        self.stats = outcome.stats;

        self.persist_all().await;
        outcome.events
    }

    /// Move the normal-mode cursor one step, clamped to the catalog.
    pub async fn advance_cursor(&mut self, direction: Direction) -> usize {
        let next = step_clamped(self.cursor, self.catalog_len, direction);
        if next != self.cursor {
            self.cursor = next;
            self.persist_cursor().await;
        }
        self.cursor
    }

    //
    // ─── REVIEW MODE ───────────────────────────────────────────────────────────
    //

    /// Step to the next queued mistake, wrapping around.
    pub fn review_next(&mut self) -> ReviewPosition {
        self.review.review_next()
    }

    /// Handle an answer to the question under the review cursor.
    ///
    /// A correct answer schedules the removal after the grace period and
    /// returns nothing yet; see [`commit_due_removals`](Self::commit_due_removals).
    /// A wrong answer leaves the queue alone and asks the learner to retry.
    /// Review answers never touch the stats.
    pub fn submit_review_answer(&mut self, is_correct: bool) -> Vec<ProgressEvent> {
        let ReviewPosition::At { question_id, .. } = self.review.position() else {
            return Vec::new();
        };
        if is_correct {
            if let Some(removal) = self.review.schedule_removal(self.clock.now()) {
                debug!(
                    "removal of question {} scheduled for {}",
                    removal.question_id, removal.due_at
                );
            }
            Vec::new()
        } else {
            vec![ProgressEvent::ReviewRetry { question_id }]
        }
    }

    /// Commit every scheduled removal whose grace period has elapsed.
    ///
    /// Removals whose target already left the queue are dropped silently.
    pub async fn commit_due_removals(&mut self) -> Vec<ProgressEvent> {
        let removed = self.review.commit_due(self.clock.now());
        if removed.is_empty() {
            return Vec::new();
        }
        self.persist_mistakes().await;
        removed
            .into_iter()
            .map(|question_id| ProgressEvent::MistakeEliminated { question_id })
            .collect()
    }

    /// Remove `id` from the queue right away and rewind the review cursor.
    /// Returns `false` if it was not queued.
    pub async fn dequeue_if_correct(&mut self, id: QuestionId) -> bool {
        if !self.review.dequeue_if_correct(id) {
            return false;
        }
        self.persist_mistakes().await;
        true
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    /// Write all three values. Failures are logged and swallowed.
    async fn persist_all(&self) {
        self.persist_cursor().await;
        save_json(self.repo.as_ref(), ProgressKey::UserStats, &self.stats).await;
        self.persist_mistakes().await;
    }

    async fn persist_cursor(&self) {
        save_json(
            self.repo.as_ref(),
            ProgressKey::CurrentQuestionIndex,
            &self.cursor,
        )
        .await;
    }

    async fn persist_mistakes(&self) {
        save_json(
            self.repo.as_ref(),
            ProgressKey::WrongQuestionIds,
            self.review.queue(),
        )
        .await;
    }
}

async fn load_or_default<T>(repo: &dyn ProgressRepository, key: ProgressKey) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match repo.load(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!("could not read {key}, using default: {err}");
            return T::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!("stored {key} is malformed, using default: {err}");
        T::default()
    })
}

async fn save_json<T: Serialize + ?Sized>(repo: &dyn ProgressRepository, key: ProgressKey, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("could not encode {key}: {err}");
            return;
        }
    };
    if let Err(err) = repo.save(key, &raw).await {
        warn!("could not persist {key}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prep_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    async fn store_over(repo: InMemoryRepository, catalog_len: usize) -> ProgressStore {
        ProgressStore::initialize(fixed_clock(), Arc::new(repo), catalog_len).await
    }

    #[tokio::test]
    async fn empty_storage_yields_defaults() {
        let store = store_over(InMemoryRepository::new(), 19).await;
        assert_eq!(store.stats(), &UserStats::default());
        assert_eq!(store.current_question_index(), 0);
        assert!(store.mistakes().is_empty());
        assert_eq!(store.review_position(), ReviewPosition::AllClear);
    }

    #[tokio::test]
    async fn corrupt_key_does_not_poison_the_others() {
        let repo = InMemoryRepository::new()
            .with_raw(ProgressKey::UserStats, "{not json")
            .with_raw(ProgressKey::CurrentQuestionIndex, "4")
            .with_raw(ProgressKey::WrongQuestionIds, "[3,7]");
        let store = store_over(repo, 19).await;

        assert_eq!(store.stats(), &UserStats::default());
        assert_eq!(store.current_question_index(), 4);
        assert_eq!(
            store.mistakes().as_slice(),
            &[QuestionId::new(3), QuestionId::new(7)]
        );
    }

    #[tokio::test]
    async fn negative_or_oversized_cursor_is_recovered() {
        let repo = InMemoryRepository::new().with_raw(ProgressKey::CurrentQuestionIndex, "-2");
        assert_eq!(store_over(repo, 19).await.current_question_index(), 0);

        let repo = InMemoryRepository::new().with_raw(ProgressKey::CurrentQuestionIndex, "40");
        assert_eq!(store_over(repo, 19).await.current_question_index(), 18);
    }

    #[tokio::test]
    async fn cursor_is_clamped_and_persisted() {
        let repo = InMemoryRepository::new();
        let mut store = store_over(repo.clone(), 3).await;

        assert_eq!(store.advance_cursor(Direction::Previous).await, 0);
        assert_eq!(store.advance_cursor(Direction::Next).await, 1);
        assert_eq!(store.advance_cursor(Direction::Next).await, 2);
        assert_eq!(store.advance_cursor(Direction::Next).await, 2);
        assert_eq!(
            repo.raw(ProgressKey::CurrentQuestionIndex).as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn wrong_answer_queues_once_and_persists() {
        let repo = InMemoryRepository::new();
        let mut store = store_over(repo.clone(), 19).await;
        let id = QuestionId::new(7);

        let events = store.submit_answer(id, Category::Verbal, false).await;
        assert_eq!(events, vec![ProgressEvent::MistakeAdded { question_id: id }]);

        let events = store.submit_answer(id, Category::Verbal, false).await;
        assert!(events.is_empty());
        assert_eq!(store.mistakes().as_slice(), &[id]);
        assert_eq!(repo.raw(ProgressKey::WrongQuestionIds).as_deref(), Some("[7]"));
        assert_eq!(store.stats().wrong_answers(), 2);
    }

    #[tokio::test]
    async fn review_removal_waits_for_the_clock() {
        let repo = InMemoryRepository::new().with_raw(ProgressKey::WrongQuestionIds, "[3,7,9]");
        let mut store = store_over(repo.clone(), 19).await;

        store.review_next();
        assert!(store.submit_review_answer(true).is_empty());
        assert_eq!(store.pending_removals().len(), 1);
        assert!(store.commit_due_removals().await.is_empty());

        let mut clock = store.clock();
        clock.advance(Duration::milliseconds(1_500));
        store.set_clock(clock);

        let events = store.commit_due_removals().await;
        assert_eq!(
            events,
            vec![ProgressEvent::MistakeEliminated {
                question_id: QuestionId::new(7)
            }]
        );
        assert_eq!(
            store.review_position(),
            ReviewPosition::At {
                index: 0,
                question_id: QuestionId::new(3)
            }
        );
        assert_eq!(repo.raw(ProgressKey::WrongQuestionIds).as_deref(), Some("[3,9]"));
    }

    #[tokio::test]
    async fn wrong_review_answer_only_asks_for_retry() {
        let repo = InMemoryRepository::new().with_raw(ProgressKey::WrongQuestionIds, "[5]");
        let mut store = store_over(repo, 19).await;
        let before = store.stats().clone();

        let events = store.submit_review_answer(false);
        assert_eq!(
            events,
            vec![ProgressEvent::ReviewRetry {
                question_id: QuestionId::new(5)
            }]
        );
        assert_eq!(store.mistakes().len(), 1);
        assert_eq!(store.stats(), &before);
    }

    #[tokio::test]
    async fn dequeue_of_absent_id_is_a_no_op() {
        let repo = InMemoryRepository::new().with_raw(ProgressKey::WrongQuestionIds, "[1,2]");
        let mut store = store_over(repo, 19).await;
        assert!(!store.dequeue_if_correct(QuestionId::new(9)).await);
        assert_eq!(store.mistakes().len(), 2);
        assert!(store.dequeue_if_correct(QuestionId::new(2)).await);
        assert_eq!(store.mistakes().as_slice(), &[QuestionId::new(1)]);
    }
}
