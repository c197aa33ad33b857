mod chat;
mod ids;
mod question;
mod stats;
mod tutor_settings;

pub use ids::QuestionId;

pub use chat::{ChatMessage, ChatRole};
pub use question::{Category, Difficulty, Explanation, Question, QuestionDraft, QuestionError};
pub use stats::{
    CategoryPerformance, CategoryScore, StatsError, UserStats, XP_PER_LEVEL, level_for_xp,
};
pub use tutor_settings::{
    DEFAULT_TUTOR_BASE_URL, DEFAULT_TUTOR_MODEL, TutorSettings, TutorSettingsDraft,
    TutorSettingsError,
};
