use prep_core::Clock;
use prep_core::model::ChatMessage;

use crate::tutor_service::TutorService;

pub const GREETING: &str = "أهلاً يا لين! 🌟 لا تترددي في طرح أي سؤال. أنا هنا لمساعدتكِ في أي وقت! سواء كان سؤالاً صعباً أو استفساراً بسيطاً، نحن فريق واحد نحو الإبداع! 🤖";

/// Running conversation with the tutor, opened by a fixed greeting.
pub struct TutorChat {
    clock: Clock,
    messages: Vec<ChatMessage>,
}

impl TutorChat {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            messages: vec![ChatMessage::model(GREETING, clock.now())],
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a learner message and append the tutor's reply.
    ///
    /// Blank input is ignored and returns `None`.
    pub async fn send(&mut self, tutor: &TutorService, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let reply = tutor.chat(&self.messages, text).await;
        self.messages.push(ChatMessage::user(text, self.clock.now()));
        self.messages.push(ChatMessage::model(reply, self.clock.now()));
        self.messages.last()
    }

    /// Drop everything but the greeting.
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }
}
