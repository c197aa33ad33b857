#![forbid(unsafe_code)]

pub mod attempt;
pub mod catalog;
pub mod events;
pub mod mistakes;
pub mod model;
pub mod navigation;
pub mod scoring;
pub mod time;

pub use attempt::{AttemptError, QuestionAttempt};
pub use catalog::{CatalogError, QuestionCatalog};
pub use events::{Notification, NotificationCenter, NotificationKind, ProgressEvent};
pub use mistakes::{MistakeQueue, MistakeReview, PendingRemoval, ReviewPosition};
pub use navigation::Direction;
pub use scoring::{AnswerEvent, ScoreOutcome, record_answer};
pub use time::Clock;
