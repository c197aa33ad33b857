use std::env;

use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use prep_core::model::{
    ChatMessage, ChatRole, Question, TutorSettings, TutorSettingsDraft, TutorSettingsError,
    UserStats,
};

use crate::error::TutorError;

// Replies used when the tutor answers with nothing.
pub const EXPLAIN_EMPTY: &str = "عذراً، لم أستطع الاتصال بالمعلم الذكي حالياً.";
pub const HINT_EMPTY: &str = "فكري في العلاقة بين الكلمات...";
pub const REPORT_EMPTY: &str = "لم يتمكن النظام من توليد التقرير.";
pub const ANALYZE_EMPTY: &str = "لم يتمكن المعلم من قراءة الملف.";

// Replies used when the tutor cannot be reached at all.
pub const EXPLAIN_FALLBACK: &str = "حدث خطأ في الاتصال بالمعلم الذكي. يرجى المحاولة لاحقاً.";
pub const HINT_FALLBACK: &str = "حاولي استبعاد الإجابات غير المنطقية.";
pub const CHAT_FALLBACK: &str = "أواجه مشكلة بسيطة في الاتصال، هل يمكننا المحاولة مرة أخرى؟ 🤖";
pub const REPORT_FALLBACK: &str = "حدث خطأ أثناء توليد التقرير.";
pub const ANALYZE_FALLBACK: &str = "حدث خطأ أثناء تحليل الملف.";

const TUTOR_PERSONA: &str = "أنت \"المعلم الذكي\" في منصة \"مبدعتي لين\".
دورك: مساعدة الطالبة لين في الاستعداد لاختبار موهبة.
صفاتك: مرح، ذكي، مشجع، وتستخدم الرموز التعبيرية.
مهمتك: الإجابة على الأسئلة العلمية، اللغوية، والرياضية، وتقديم نصائح دراسية.";

const ANALYZE_PROMPT: &str = "حلل هذا الملف واستخرج منه 3 أسئلة تدريبية لاختبار موهبة (استدلال لغوي أو رياضي) مع الإجابات والشرح.";

/// Read tutor settings from `PREP_AI_API_KEY`, `PREP_AI_BASE_URL` and
/// `PREP_AI_MODEL`.
///
/// # Errors
///
/// Returns `TutorSettingsError` if the base URL does not parse.
pub fn settings_from_env() -> Result<TutorSettings, TutorSettingsError> {
    TutorSettingsDraft {
        api_key: env::var("PREP_AI_API_KEY").ok(),
        model: env::var("PREP_AI_MODEL").ok(),
        base_url: env::var("PREP_AI_BASE_URL").ok(),
    }
    .validate()
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Every public operation resolves to text: failures are logged and turned
/// into a fixed fallback reply.
#[derive(Clone)]
pub struct TutorService {
    client: Client,
    settings: TutorSettings,
}

impl TutorService {
    #[must_use]
    pub fn new(settings: TutorSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// A tutor with no API key; every call returns its fallback.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TutorSettings::default())
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings.is_enabled()
    }

    #[must_use]
    pub fn settings(&self) -> &TutorSettings {
        &self.settings
    }

    /// Answer a learner's `question` about `context`, nudging rather than
    /// revealing the answer.
    pub async fn explain(&self, question: &str, context: &str) -> String {
        let prompt = format!(
            "أنت معلم ذكي ومرح للطالبة الموهوبة \"لين\" (عمرها 13-15 سنة).
السياق: {context}
السؤال من الطالبة: {question}

التعليمات:
1. اشرح بأسلوب مبسط ومشجع.
2. استخدم أمثلة واقعية.
3. لا تعطِ الإجابة النهائية فوراً، بل قدّم تلميحات ذكية.
4. اختم بجملة تحفيزية لطيفة مثل \"أنتِ رائعة يا مبدعتي!\"."
        );
        let result = self.complete(vec![WireMessage::text("user", prompt)]).await;
        resolve("explain", result, EXPLAIN_EMPTY, EXPLAIN_FALLBACK)
    }

    /// Ask for a detailed explanation of a catalog question.
    pub async fn explain_question(&self, question: &Question) -> String {
        let context = format!("{} {}", question.text(), question.options().join(", "));
        self.explain("اشرح لي هذا السؤال بالتفصيل", &context).await
    }

    /// One-sentence hint that does not give the answer away.
    pub async fn hint(&self, question_text: &str, options: &[String]) -> String {
        let prompt = format!(
            "أعط تلميحاً ذكياً وصغيراً جداً (جملة واحدة) يساعد الطالبة على حل هذا السؤال دون كشف الإجابة:
السؤال: {question_text}
الخيارات: {}",
            options.join(", ")
        );
        let result = self.complete(vec![WireMessage::text("user", prompt)]).await;
        resolve("hint", result, HINT_EMPTY, HINT_FALLBACK)
    }

    /// Continue a conversation. The caller supplies every prior turn.
    pub async fn chat(&self, history: &[ChatMessage], new_message: &str) -> String {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage::text("system", TUTOR_PERSONA.to_string()));
        messages.extend(history.iter().map(|msg| {
            let role = match msg.role {
                ChatRole::User => "user",
                ChatRole::Model => "assistant",
            };
            WireMessage::text(role, msg.text.clone())
        }));
        messages.push(WireMessage::text("user", new_message.to_string()));

        resolve("chat", self.complete(messages).await, CHAT_FALLBACK, CHAT_FALLBACK)
    }

    /// Markdown progress report built from the learner's stats.
    pub async fn generate_report(&self, stats: &UserStats) -> String {
        let categories = serde_json::to_string(stats.category_performance())
            .unwrap_or_else(|_| "{}".to_string());
        let prompt = format!(
            "بصفتك المعلم الذكي للموهبة \"لين\"، قم بإعداد تقرير إنجاز شامل وجذاب بناءً على البيانات التالية:
- الأسئلة المنجزة: {}
- الإجابات الصحيحة: {}
- سلسلة الحماس (Streak): {}
- الأداء حسب الأقسام: {categories}

المطلوب في التقرير (استخدم تنسيق Markdown):
1. **ملخص الأداء**: كلمة تشجيعية قوية.
2. **نقاط القوة**: تحليل المجالات التي أبدعت فيها.
3. **نقاط التحسين**: المجالات التي تحتاج تركيز (حيث نسبة الخطأ عالية).
4. **خريطة ذهنية مقترحة**: قائمة بالمفاهيم الرئيسية التي يجب مراجعتها (مثل قوانين الحركة، التناظر اللفظي..).
5. **خطة العمل**: 3 خطوات عملية للأسبوع القادم.",
            stats.total_answered(),
            stats.correct_answers(),
            stats.streak(),
        );
        let result = self.complete(vec![WireMessage::text("user", prompt)]).await;
        resolve("report", result, REPORT_EMPTY, REPORT_FALLBACK)
    }

    /// Extract practice questions from an uploaded file, given as base64.
    pub async fn analyze_file(&self, file_base64: &str, mime_type: &str) -> String {
        let message = WireMessage {
            role: "user",
            content: WireContent::Parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{mime_type};base64,{file_base64}"),
                    },
                },
                ContentPart::Text {
                    text: ANALYZE_PROMPT.to_string(),
                },
            ]),
        };
        let result = self.complete(vec![message]).await;
        resolve("analyze_file", result, ANALYZE_EMPTY, ANALYZE_FALLBACK)
    }

    async fn complete(&self, messages: Vec<WireMessage>) -> Result<String, TutorError> {
        let api_key = self.settings.api_key().ok_or(TutorError::Disabled)?;

        let url = format!("{}/chat/completions", self.settings.base_url());
        let payload = ChatRequest {
            model: self.settings.model(),
            messages,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TutorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(TutorError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

fn resolve(
    operation: &str,
    result: Result<String, TutorError>,
    empty: &str,
    failed: &str,
) -> String {
    match result {
        Ok(text) => text,
        Err(TutorError::EmptyResponse) => {
            warn!("tutor {operation} returned no text");
            empty.to_string()
        }
        Err(TutorError::Disabled) => {
            debug!("tutor {operation} skipped, no API key configured");
            failed.to_string()
        }
        Err(err) => {
            warn!("tutor {operation} failed: {err}");
            failed.to_string()
        }
    }
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

impl WireMessage {
    fn text(role: &'static str, text: String) -> Self {
        Self {
            role,
            content: WireContent::Text(text),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn disabled_tutor_falls_back_everywhere() {
        let tutor = TutorService::disabled();
        assert!(!tutor.enabled());

        assert_eq!(tutor.explain("why?", "ctx").await, EXPLAIN_FALLBACK);
        assert_eq!(tutor.hint("q", &["a".to_string(), "b".to_string()]).await, HINT_FALLBACK);
        let history = [ChatMessage::model("hello", Utc::now())];
        assert_eq!(tutor.chat(&history, "hi").await, CHAT_FALLBACK);
        assert_eq!(tutor.generate_report(&UserStats::default()).await, REPORT_FALLBACK);
        assert_eq!(tutor.analyze_file("AAAA", "image/png").await, ANALYZE_FALLBACK);
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back() {
        let settings = TutorSettingsDraft {
            api_key: Some("test-key".into()),
            model: None,
            base_url: Some("http://127.0.0.1:9".into()),
        }
        .validate()
        .unwrap();
        let tutor = TutorService::new(settings);
        assert!(tutor.enabled());
        assert_eq!(tutor.hint("q", &[]).await, HINT_FALLBACK);
    }

    #[test]
    fn empty_reply_uses_the_softer_fallback() {
        let empty = resolve("hint", Err(TutorError::EmptyResponse), HINT_EMPTY, HINT_FALLBACK);
        assert_eq!(empty, HINT_EMPTY);
        let ok = resolve("hint", Ok("think".into()), HINT_EMPTY, HINT_FALLBACK);
        assert_eq!(ok, "think");
    }

    #[test]
    fn file_part_is_sent_as_data_url() {
        let message = WireMessage {
            role: "user",
            content: WireContent::Parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AAAA".into(),
                    },
                },
                ContentPart::Text { text: "go".into() },
            ]),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"][0]["type"], "image_url");
        assert_eq!(json["content"][0]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(json["content"][1]["type"], "text");

        let plain = serde_json::to_value(WireMessage::text("user", "hi".into())).unwrap();
        assert_eq!(plain["content"], "hi");
    }
}
