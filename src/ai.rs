//! AI-backed disambiguation over an OpenAI-compatible chat-completions API.
//!
//! The model gets a strict-JSON instruction with an indexed candidate
//! roster. Anything that does not parse back to an in-range index is
//! treated as "no selection": a hedging model must never pick a person.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::{DisambiguationOracle, OracleSelection};
use crate::types::{Confidence, Identity};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct ChatOracleConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ChatOracleConfig {
    fn default() -> Self {
        ChatOracleConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Production `DisambiguationOracle` speaking the chat-completions dialect.
pub struct ChatOracle {
    http: reqwest::Client,
    api_key: String,
    config: ChatOracleConfig,
}

impl ChatOracle {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, ChatOracleConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: ChatOracleConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|err| {
                log::warn!("falling back to default HTTP client: {err}");
                reqwest::Client::new()
            });
        ChatOracle {
            http,
            api_key: api_key.into(),
            config,
        }
    }
}

fn roster(candidates: &[Identity]) -> serde_json::Value {
    serde_json::Value::Array(
        candidates
            .iter()
            .enumerate()
            .map(|(index, user)| {
                json!({
                    "index": index,
                    "displayName": user.display_name,
                    "givenName": user.given_name.clone().unwrap_or_default(),
                    "surname": user.surname.clone().unwrap_or_default(),
                    "mail": user.email().unwrap_or_default(),
                })
            })
            .collect(),
    )
}

fn instructions(term: &str, candidates: &[Identity]) -> String {
    format!(
        "You are a user matching assistant. The user searched for: \"{term}\"\n\n\
         Here are the found users:\n{}\n\n\
         Select the BEST matching user. Consider name similarity (first name, \
         last name, full name), spelling variations, and Ukrainian-to-English \
         transliteration.\n\n\
         Return ONLY a JSON object with this structure:\n\
         {{\"index\": <0-based number>, \"confidence\": \"high\" | \"medium\" | \"low\", \"reason\": \"<brief explanation>\"}}\n\n\
         If no user matches well, return: {{\"error\": \"No good match found\"}}\n\
         Do NOT write conversational text. Do NOT use markdown formatting. Just the raw JSON string.",
        roster(candidates)
    )
}

/// The model's answer, as instructed.
#[derive(Debug, Deserialize)]
struct OracleReply {
    index: Option<i64>,
    confidence: Option<Confidence>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse the model's reply into a selection. Fenced output is tolerated;
/// everything else that deviates from the contract yields `None`.
fn parse_reply(content: &str, candidates: &[Identity]) -> Option<OracleSelection> {
    let clean = content.replace("```json", "").replace("```", "");
    let clean = clean.trim();

    let reply: OracleReply = match serde_json::from_str(clean) {
        Ok(reply) => reply,
        Err(err) => {
            log::debug!("oracle reply did not parse: {err}");
            return None;
        }
    };
    if reply.error.is_some() {
        return None;
    }

    let index = usize::try_from(reply.index?).ok()?;
    let identity = candidates.get(index)?.clone();
    Some(OracleSelection {
        identity,
        confidence: reply.confidence.unwrap_or(Confidence::Medium),
    })
}

#[async_trait]
impl DisambiguationOracle for ChatOracle {
    async fn select_best_match(
        &self,
        term: &str,
        candidates: &[Identity],
    ) -> Result<Option<OracleSelection>, GatewayError> {
        if candidates.is_empty() {
            return Ok(None);
        }
        if candidates.len() == 1 {
            return Ok(Some(OracleSelection {
                identity: candidates[0].clone(),
                confidence: Confidence::High,
            }));
        }

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": instructions(term, candidates) },
                { "role": "user", "content": term },
            ],
            "temperature": 0,
        });

        let response = self
            .http
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        #[derive(Debug, Deserialize)]
        struct Completion {
            #[serde(default)]
            choices: Vec<Choice>,
        }
        #[derive(Debug, Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Debug, Deserialize)]
        struct Message {
            #[serde(default)]
            content: String,
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or("");

        Ok(parse_reply(content, candidates))
    }
}
