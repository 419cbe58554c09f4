//! OpenAI chat-completions backend for health advice.

use crate::advice::generator::{AdviceGenerator, AdviceRequest};
use crate::clients::http;
use crate::error::MonitorError;
use crate::fallback::credential_list::CredentialList;
use crate::fallback::fetcher::FallbackFetcher;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PROVIDER: &str = "OpenAI";

const SYSTEM_PROMPT: &str = "You are an environmental health assistant. Give short, practical \
air-quality health advice for the requested group as 3 to 5 bullet points. No preamble.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct OpenAiAdviceGenerator {
    http: Client,
    base_url: String,
    model: String,
    credentials: CredentialList,
    fetcher: FallbackFetcher,
    timeout: Duration,
}

impl OpenAiAdviceGenerator {
    pub fn new(
        http: Client,
        base_url: &str,
        model: &str,
        credentials: CredentialList,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            credentials,
            fetcher: FallbackFetcher::new(PROVIDER),
            timeout,
        }
    }
}

fn user_prompt(request: &AdviceRequest) -> String {
    let mut prompt = format!(
        "Air quality index: {} on a 1-5 scale.\nGroup: {}.",
        request.aqi, request.subject_label
    );
    if let Some(levels) = request.pollutant_levels.as_ref().filter(|l| !l.is_empty()) {
        let levels: Vec<String> = levels
            .iter()
            .map(|(pollutant, value)| format!("{pollutant}: {value} μg/m³"))
            .collect();
        prompt.push_str("\nPollutant levels: ");
        prompt.push_str(&levels.join(", "));
    }
    prompt
}

#[async_trait]
impl AdviceGenerator for OpenAiAdviceGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &AdviceRequest) -> Result<String, MonitorError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(request),
                },
            ],
            max_tokens: 400,
            temperature: 0.7,
        };

        let fetched = self
            .fetcher
            .fetch(&self.credentials, |key| {
                let request = self
                    .http
                    .post(&url)
                    .bearer_auth(key)
                    .json(&body)
                    .timeout(self.timeout);
                http::text(request)
            })
            .await
            .into_result()?;

        let response: ChatResponse = http::decode(PROVIDER, &fetched.value)?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
