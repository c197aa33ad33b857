use chrono::{DateTime, Duration, Utc};

use crate::model::QuestionId;

/// How long a notification stays visible.
pub const NOTIFICATION_TTL_MS: i64 = 3_000;

/// Something worth telling the learner about, produced by a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Streak reached a positive multiple of five.
    StreakMilestone { streak: u32 },
    /// A wrongly answered question entered the mistake queue.
    MistakeAdded { question_id: QuestionId },
    LevelUp { level: u32 },
    /// A reviewed question left the mistake queue after its grace period.
    MistakeEliminated { question_id: QuestionId },
    /// A review answer was wrong; the question stays queued.
    ReviewRetry { question_id: QuestionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    LevelUp,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl ProgressEvent {
    /// Learner-facing toast for this event.
    #[must_use]
    pub fn notification(&self) -> Notification {
        match *self {
            ProgressEvent::StreakMilestone { streak } => Notification {
                kind: NotificationKind::Generic,
                message: format!("رائع! {streak} إجابات صحيحة متتالية! 🔥"),
            },
            ProgressEvent::MistakeAdded { .. } => Notification {
                kind: NotificationKind::Generic,
                message: "تمت إضافة السؤال لقائمة المراجعة (Kill Mistakes) 🎯".into(),
            },
            ProgressEvent::LevelUp { level } => Notification {
                kind: NotificationKind::LevelUp,
                message: format!("🎉 مبروك! انتقلتِ للمستوى {level}!"),
            },
            ProgressEvent::MistakeEliminated { .. } => Notification {
                kind: NotificationKind::Generic,
                message: "أحسنت! تم القضاء على الخطأ وحذفه من القائمة! 🎉".into(),
            },
            ProgressEvent::ReviewRetry { .. } => Notification {
                kind: NotificationKind::Generic,
                message: "حاولي مرة أخرى، لا تستسلمي! 💪".into(),
            },
        }
    }
}

/// Holds the single visible notification.
///
/// Showing a new notification replaces the current one; a notification
/// disappears on its own [`NOTIFICATION_TTL_MS`] after it was shown.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    current: Option<(Notification, DateTime<Utc>)>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, notification: Notification, now: DateTime<Utc>) {
        self.current = Some((notification, now));
    }

    /// Surface a batch of events; the last one wins.
    pub fn show_events(&mut self, events: &[ProgressEvent], now: DateTime<Utc>) {
        for event in events {
            self.show(event.notification(), now);
        }
    }

    /// The notification still on screen at `now`, if any.
    #[must_use]
    pub fn visible(&self, now: DateTime<Utc>) -> Option<&Notification> {
        let (notification, shown_at) = self.current.as_ref()?;
        if now < *shown_at + Duration::milliseconds(NOTIFICATION_TTL_MS) {
            Some(notification)
        } else {
            None
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn level_up_is_tagged_explicitly() {
        let n = ProgressEvent::LevelUp { level: 2 }.notification();
        assert_eq!(n.kind, NotificationKind::LevelUp);
        assert!(n.message.contains('2'));

        let n = ProgressEvent::StreakMilestone { streak: 10 }.notification();
        assert_eq!(n.kind, NotificationKind::Generic);
        assert!(n.message.contains("10"));
    }

    #[test]
    fn notification_expires_after_ttl() {
        let now = fixed_now();
        let mut center = NotificationCenter::new();
        center.show(ProgressEvent::LevelUp { level: 3 }.notification(), now);

        assert!(center.visible(now + Duration::milliseconds(2_999)).is_some());
        assert!(center.visible(now + Duration::milliseconds(3_000)).is_none());
    }

    #[test]
    fn newer_notification_supersedes_current() {
        let now = fixed_now();
        let mut center = NotificationCenter::new();
        center.show_events(
            &[
                ProgressEvent::StreakMilestone { streak: 5 },
                ProgressEvent::LevelUp { level: 2 },
            ],
            now,
        );
        let visible = center.visible(now).unwrap();
        assert_eq!(visible.kind, NotificationKind::LevelUp);

        let later = now + Duration::seconds(2);
        center.show(
            ProgressEvent::ReviewRetry {
                question_id: QuestionId::new(1),
            }
            .notification(),
            later,
        );
        // the replacement gets its own full display window
        assert!(center.visible(later + Duration::milliseconds(2_500)).is_some());

        center.dismiss();
        assert!(center.visible(later).is_none());
    }
}
