//! AI doctor chat
//!
//! Builds a medical-only system prompt, pulls the user's latest heart and
//! brain results out of the prediction log as context, and forwards the
//! conversation to a hosted LLM over its OpenAI-compatible chat API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{ModelType, PredictionLog};

/// Questions must touch one of these to reach the model at all
const MEDICAL_KEYWORDS: &[&str] = &[
    "heart", "brain", "tumor", "disease", "symptom", "symptoms",
    "doctor", "hospital", "medicine", "medical", "mri", "scan",
    "blood", "pressure", "cholesterol", "pain", "treatment",
    "health", "healthy", "diet",
];

/// Canned refusal for out-of-domain questions
pub const NON_MEDICAL_REPLY: &str =
    "I'm designed only for medical and health-related questions. Please ask \
     me about symptoms, tests, heart or brain results, or other health topics.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat API key is not configured")]
    NotConfigured,

    #[error("chat request failed: {0}")]
    Network(String),

    #[error("chat API returned status {0}")]
    UpstreamStatus(u16),

    #[error("unexpected chat API response: {0}")]
    Parse(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => AppError::ChatNotConfigured,
            other => AppError::ChatUpstreamError(other.to_string()),
        }
    }
}

// Request/Response types (OpenAI-compatible wire format)

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat API client
pub struct ChatClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.chat_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key: config.chat_api_key.clone(),
            api_base: config.chat_api_base.clone(),
            model: config.chat_model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Handle one user message: guard, gather context, call the LLM.
    pub async fn send_message(
        &self,
        pool: &PgPool,
        user_id: Uuid,
        user_message: &str,
    ) -> Result<String, ChatError> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Ok("Please enter a message so I can help you.".to_string());
        }

        // Clearly non-medical questions are refused without an upstream call
        if !is_medical_question(user_message) {
            return Ok(NON_MEDICAL_REPLY.to_string());
        }

        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let heart = latest_or_none(pool, user_id, ModelType::HeartDisease).await;
        let brain = latest_or_none(pool, user_id, ModelType::BrainTumorMulticlass).await;
        let medical_context = build_medical_context(heart.as_ref(), brain.as_ref());

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt().to_string(),
                },
                ChatMessage {
                    role: "system",
                    content: format!(
                        "Here is the latest structured context about this user's \
                         heart-disease and brain-tumor model results:\n{}",
                        medical_context
                    ),
                },
                ChatMessage {
                    role: "user",
                    content: user_message.to_string(),
                },
            ],
            temperature: 0.3,
            max_tokens: 600,
        };

        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::UpstreamStatus(response.status().as_u16()));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::Parse("response contained no choices".to_string()))
    }
}

/// System-level instructions for the assistant: medical topics only, model
/// outputs are estimates, never a diagnosis.
fn system_prompt() -> &'static str {
    "You are an AI medical assistant. You ONLY answer questions related to \
     human health, medicine, symptoms, test results, prevention, lifestyle \
     for health, treatment for disease, or understanding the outputs of \
     medical or health-related models. If the user asks about anything \
     outside medicine or health (for example: programming, movies, games, \
     math, politics, general chit-chat), you MUST politely refuse and say \
     that you are limited to medical and health topics only.\n\n\
     You never give real diagnoses, prescriptions, or treatment plans. \
     Clearly say things like: \"this is not a diagnosis\" and recommend that \
     the user consult a qualified healthcare professional for personal \
     decisions.\n\n\
     If the user refers to heart-disease or brain-tumor model outputs, treat \
     these as approximate machine-learning estimates that can be wrong. \
     Explain them in simple language, avoid alarming terms, and keep answers \
     summarized."
}

/// Simple keyword guard over the lowercased message
pub fn is_medical_question(message: &str) -> bool {
    let lower = message.to_lowercase();
    MEDICAL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Short text summary of the user's latest heart and brain results
pub fn build_medical_context(
    heart: Option<&PredictionLog>,
    brain: Option<&PredictionLog>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    match heart {
        Some(log) => parts.push(format!(
            "Heart model (latest): result = {} (probability ~ {:.2}). Input summary: {}.",
            log.prediction_result, log.probability, log.input_summary
        )),
        None => parts.push("Heart model: no previous predictions found for this user.".to_string()),
    }

    match brain {
        Some(log) => parts.push(format!(
            "Brain model (latest): predicted class = {} (probability ~ {:.2}).",
            log.prediction_result, log.probability
        )),
        None => parts.push("Brain model: no previous predictions found for this user.".to_string()),
    }

    parts.push("These model outputs are approximate and are NOT a medical diagnosis.".to_string());

    parts.join("\n")
}

/// Context fetch failures degrade to "no prediction" rather than failing
/// the whole chat turn
async fn latest_or_none(
    pool: &PgPool,
    user_id: Uuid,
    model_type: ModelType,
) -> Option<PredictionLog> {
    match PredictionLog::latest(pool, user_id, model_type).await {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!(
                "Failed to fetch latest {} prediction for {}: {}",
                model_type.as_str(),
                user_id,
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn log(model_type: ModelType, result: &str, probability: f32) -> PredictionLog {
        PredictionLog {
            id: 1,
            user_id: Uuid::new_v4(),
            model_type: model_type.as_str().to_string(),
            input_summary: "age=63, sex=1".to_string(),
            prediction_result: result.to_string(),
            probability,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_keyword_guard_accepts_medical() {
        assert!(is_medical_question("What does my heart result mean?"));
        assert!(is_medical_question("Is my CHOLESTEROL too high?"));
        assert!(is_medical_question("explain the MRI scan"));
    }

    #[test]
    fn test_keyword_guard_refuses_non_medical() {
        assert!(!is_medical_question("Write me a poem about rust"));
        assert!(!is_medical_question("What's 2+2?"));
    }

    #[test]
    fn test_medical_context_with_both_results() {
        let heart = log(ModelType::HeartDisease, "High", 0.82);
        let brain = log(ModelType::BrainTumorMulticlass, "glioma", 0.91);

        let context = build_medical_context(Some(&heart), Some(&brain));
        assert!(context.contains("result = High (probability ~ 0.82)"));
        assert!(context.contains("predicted class = glioma (probability ~ 0.91)"));
        assert!(context.contains("NOT a medical diagnosis"));
    }

    #[test]
    fn test_medical_context_without_results() {
        let context = build_medical_context(None, None);
        assert!(context.contains("Heart model: no previous predictions"));
        assert!(context.contains("Brain model: no previous predictions"));
    }
}
