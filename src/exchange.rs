//! Wire contract for `POST /chat` and the HTTP client that speaks it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;

use crate::artifact::Artifact;
use crate::error::ChatError;

/// Reply text shown when the server answers without a `response`
pub const NO_RESPONSE_PLACEHOLDER: &str = "[응답 없음]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub user_id: String,
    pub message: String,
    pub artifact_id: String,
}

impl OutgoingRequest {
    pub fn new(user_id: &str, message: String, artifact: Artifact) -> Self {
        Self {
            user_id: user_id.to_string(),
            message,
            artifact_id: artifact.as_str().to_string(),
        }
    }

    /// Form fields in the order they are sent
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("user_id", self.user_id.as_str()),
            ("message", self.message.as_str()),
            ("artifact_id", self.artifact_id.as_str()),
        ]
    }

    fn to_form(&self) -> Form {
        self.fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Set by the server when speech synthesis failed
    #[serde(default)]
    pub error: Option<String>,
}

impl IncomingResponse {
    pub fn parse(body: &str) -> Result<Self, ChatError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn reply_text(&self) -> &str {
        self.response
            .as_deref()
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_RESPONSE_PLACEHOLDER)
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref().filter(|url| !url.is_empty())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pull the `error` field out of a failure body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    async fn send(&self, request: &OutgoingRequest) -> Result<IncomingResponse, ChatError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

#[async_trait]
impl ChatEndpoint for ChatClient {
    async fn send(&self, request: &OutgoingRequest) -> Result<IncomingResponse, ChatError> {
        let response = self
            .client
            .post(self.endpoint_url())
            .multipart(request.to_form())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        IncomingResponse::parse(&body)
    }
}
