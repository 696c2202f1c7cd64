use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// OpenAI-compatible chat completions endpoint hosted by Groq.
const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model when none is selected.
const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Configuration for the Groq API
#[derive(Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub chat_url: String,
    pub model: String,
}

impl GroqConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GROQ_API_KEY")?;
        let chat_url = env::var("GROQ_CHAT_URL").unwrap_or_else(|_| DEFAULT_CHAT_URL.to_string());
        let model = env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(GroqConfig {
            api_key,
            chat_url,
            model,
        })
    }
}

/// Client for the Groq chat completions API
#[derive(Clone)]
pub struct GroqClient {
    config: GroqConfig,
    client: reqwest::Client,
}

impl GroqClient {
    /// Create a new Groq client
    pub fn new(config: GroqConfig) -> Self {
        let client = reqwest::Client::new();
        GroqClient { config, client }
    }

    /// The model this client sends completions to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the first choice
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.config.chat_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Chat request failed: {} {}",
                status,
                error_text
            ));
        }

        let response_data: ChatResponse = response.json().await?;

        response_data
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("No completion returned"))
    }

    /// Answer a question grounded in retrieved scheme context
    pub async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        const SYSTEM: &str = "You are a research assistant for government scheme documents. \
            Answer using only the provided context. If the context does not contain \
            the answer, say that the information is not available.";

        let user = format!("Context:\n{}\n\nQuestion: {}", context, question);

        self.chat(SYSTEM, &user, 0.2, 1024).await
    }
}

// Request/response structures for the chat completions API

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: String,
}
