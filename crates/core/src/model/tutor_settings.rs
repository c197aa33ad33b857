use thiserror::Error;
use url::Url;

pub const DEFAULT_TUTOR_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TUTOR_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the remote tutor.
///
/// A missing API key means the tutor is disabled and every request falls back
/// to its canned reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorSettings {
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Clone, Debug, Default)]
pub struct TutorSettingsDraft {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TutorSettingsError {
    #[error("invalid tutor base URL: {0}")]
    InvalidBaseUrl(String),
}

impl TutorSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize the draft: trim values, drop blanks, fill defaults.
    ///
    /// # Errors
    ///
    /// Returns `TutorSettingsError::InvalidBaseUrl` if a base URL is given but
    /// does not parse.
    pub fn validate(self) -> Result<TutorSettings, TutorSettingsError> {
        let api_key = normalize_optional(self.api_key);
        let model = normalize_optional(self.model).unwrap_or_else(|| DEFAULT_TUTOR_MODEL.into());
        let base_url =
            normalize_optional(self.base_url).unwrap_or_else(|| DEFAULT_TUTOR_BASE_URL.into());

        if Url::parse(&base_url).is_err() {
            return Err(TutorSettingsError::InvalidBaseUrl(base_url));
        }

        Ok(TutorSettings {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl TutorSettings {
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_TUTOR_MODEL.into(),
            base_url: DEFAULT_TUTOR_BASE_URL.into(),
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
