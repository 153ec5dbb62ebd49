//! OpenAI-compatible chat completions client with JSON-schema output.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol with
//! `response_format: {type: "json_schema"}`: OpenAI itself and OpenRouter.
//! See: <https://platform.openai.com/docs/guides/structured-outputs>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::handle_response_errors;
use super::traits::StructuredGenerator;
use crate::telemetry;
use crate::types::{ContentPart, GenerateOptions, Message, MessageContent, OutputSchema, Role};
use crate::{PlatewiseError, Result};

/// Base URL for the OpenAI API
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Base URL for the OpenRouter API
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model id on OpenAI.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// Default model id on OpenRouter, which namespaces models by vendor.
pub const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-4o";

/// Client for OpenAI-compatible chat completion endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    name: String,
    api_key: String,
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Client for the OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("openai", api_key, OPENAI_BASE_URL)
    }

    /// Client for the OpenRouter API.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::with_base_url("openrouter", api_key, OPENROUTER_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Share an existing connection pool.
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip_all, fields(provider = %self.name, model = %options.model, schema = %schema.name))]
    async fn complete(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
        options: &GenerateOptions,
    ) -> Result<serde_json::Value> {
        if options.model.is_empty() {
            return Err(PlatewiseError::InvalidInput("model must be set".into()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &options.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &schema.name,
                    schema: &schema.schema,
                    strict: true,
                },
            },
            temperature: options.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| PlatewiseError::Http(e.to_string()))?;

        let response = handle_response_errors(response, &self.name).await?;

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| PlatewiseError::MalformedResponse(e.to_string()))?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(PlatewiseError::EmptyResponse)?;

        match message.content.as_deref().map(str::trim) {
            Some(content) if !content.is_empty() => Ok(serde_json::from_str(content)?),
            _ => match message.refusal {
                Some(refusal) => Err(PlatewiseError::MalformedResponse(format!(
                    "model refused: {refusal}"
                ))),
                None => Err(PlatewiseError::EmptyResponse),
            },
        }
    }
}

#[async_trait]
impl StructuredGenerator for OpenAiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
        options: &GenerateOptions,
    ) -> Result<serde_json::Value> {
        let start = Instant::now();
        let result = self.complete(messages, schema, options).await;
        telemetry::record_request(&self.name, "generate_structured", start, result.is_ok());
        result
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    response_format: ResponseFormat<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<WirePart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: WireImageUrl<'a> },
}

#[derive(Serialize)]
struct WireImageUrl<'a> {
    url: &'a str,
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(message: &'a Message) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
        };
        let content = match &message.content {
            MessageContent::Text(text) => WireContent::Text(text),
            MessageContent::Parts(parts) => WireContent::Parts(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => WirePart::Text { text },
                        ContentPart::Image { url } => WirePart::ImageUrl {
                            image_url: WireImageUrl { url },
                        },
                    })
                    .collect(),
            ),
        };
        Self { role, content }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageInput;

    #[test]
    fn image_message_serializes_as_image_url_part() {
        let image = ImageInput::from_bytes(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
            .unwrap();
        let message = Message::user_with_image(&image, "what is this?");
        let wire = serde_json::to_value(WireMessage::from(&message)).unwrap();

        assert_eq!(wire["role"], "user");
        assert_eq!(wire["content"][0]["type"], "image_url");
        assert!(
            wire["content"][0]["image_url"]["url"]
                .as_str()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
        assert_eq!(wire["content"][1]["type"], "text");
        assert_eq!(wire["content"][1]["text"], "what is this?");
    }

    #[test]
    fn text_message_serializes_as_string() {
        let message = Message::system("be terse");
        let wire = serde_json::to_value(WireMessage::from(&message)).unwrap();
        assert_eq!(wire, serde_json::json!({"role": "system", "content": "be terse"}));
    }

    #[tokio::test]
    async fn empty_model_is_rejected() {
        let client = OpenAiClient::with_base_url("test", "key", "http://127.0.0.1:9");
        let schema = OutputSchema::new("x", serde_json::json!({"type": "object"}));
        let err = client
            .generate_structured(&[Message::user("hi")], &schema, &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlatewiseError::InvalidInput(_)));
    }
}
