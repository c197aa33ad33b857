use chrono::{DateTime, Duration, Utc};

/// Where progress services read "now" from.
///
/// Notifications expire and queued mistake removals come due against this
/// clock, so tests pin it and step it forward instead of sleeping. A clock
/// with no pinned instant follows the wall clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    pinned: Option<DateTime<Utc>>,
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self { pinned: None }
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self { pinned: Some(at) }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.pinned.unwrap_or_else(Utc::now)
    }

    /// Steps a pinned clock forward; the wall clock moves on its own.
    pub fn advance(&mut self, delta: Duration) {
        if let Some(at) = self.pinned.as_mut() {
            *at += delta;
        }
    }
}

/// Seconds after the Unix epoch that [`fixed_now`] reports
/// (2023-11-14T22:13:20Z).
pub const TEST_EPOCH_SECS: i64 = 1_700_000_000;

/// Stable instant for tests.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(TEST_EPOCH_SECS)
}

/// Clock pinned at [`fixed_now`].
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
