use serde::Deserialize;
use serde_json::json;

use crate::models::{EraFilter, SuggestionList};

/// Request-level LLM failures, classified so the caller can tell a retryable
/// condition from a malformed reply.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model rate limited")]
    RateLimited,

    #[error("model returned malformed output: {0}")]
    Malformed(String),

    #[error("model unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),
}

#[async_trait::async_trait]
pub trait SuggestionModel: Send + Sync {
    async fn suggest(
        &self,
        narrative: &str,
        era: EraFilter,
        catalog: &[String],
        seen: &[String],
    ) -> Result<SuggestionList, LlmError>;
}

/// Groq chat-completions client with forced JSON response mode.
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, model: String) -> Self {
        Self { client, api_key, base_url, model }
    }
}

#[async_trait::async_trait]
impl SuggestionModel for GroqClient {
    async fn suggest(
        &self,
        narrative: &str,
        era: EraFilter,
        catalog: &[String],
        seen: &[String],
    ) -> Result<SuggestionList, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": build_prompt(narrative, era, catalog, seen)},
                {"role": "user", "content": "Genera recomendaciones JSON."}
            ],
            "temperature": 0.6,
            "max_tokens": 1024,
            "response_format": {"type": "json_object"}
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        let completion: ChatCompletion = resp.error_for_status()?.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Malformed("no choices in completion".to_string()))?;

        parse_suggestions(&content)
    }
}

fn build_prompt(narrative: &str, era: EraFilter, catalog: &[String], seen: &[String]) -> String {
    let local_instruction = if catalog.is_empty() {
        "CATÁLOGO VACÍO.".to_string()
    } else {
        format!("CATÁLOGO LOCAL: [{}]", catalog.join(", "))
    };
    let seen_instruction = if seen.is_empty() {
        String::new()
    } else {
        format!("\nYA VISTAS (no las repitas): [{}]", seen.join(", "))
    };

    format!(
        "Eres experto en cine.\n\
         {local_instruction}{seen_instruction}\n\
         INSTRUCCIONES:\n\
         1. Usuario quiere: \"{narrative}\" (Época: {era}).\n\
         2. Prioriza catálogo local. Si no, sugiere externos.\n\
         3. Devuelve JSON con 3 \"top_picks\" y 5 \"also_like\".\n\
         REGLA DE ORO: Responde ÚNICAMENTE en formato JSON. \
         Usa estrictamente estas llaves en minúsculas y sin tildes: \
         \"title\" para el nombre de la película y \"reason\" para el motivo.",
        era = era.as_str(),
    )
}

/// Decodes the model reply, tolerating prose wrapped around the JSON object
/// when the model ignores the JSON-only instruction.
pub fn parse_suggestions(content: &str) -> Result<SuggestionList, LlmError> {
    let payload = extract_json_object(content)
        .ok_or_else(|| LlmError::Malformed(format!("no JSON object in reply: {content:.120}")))?;
    serde_json::from_str(payload).map_err(|err| LlmError::Malformed(err.to_string()))
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}
