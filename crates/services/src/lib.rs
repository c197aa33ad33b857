#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_store;
pub mod tutor_chat;
pub mod tutor_service;

pub use prep_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, TutorError};
pub use progress_store::{ProgressSnapshot, ProgressStore};
pub use tutor_chat::TutorChat;
pub use tutor_service::TutorService;
