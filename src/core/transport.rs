use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::api::{ChatMessage, ChatRequest};
use crate::core::config::ChatConfig;
use crate::core::credential::{CredentialSummary, MIN_CREDENTIAL_LEN};
use crate::core::error::CompletionError;
use crate::utils::auth::{add_auth_headers, strip_bearer_prefix};
use crate::utils::url::{construct_api_url, CHAT_COMPLETIONS_ENDPOINT};

/// Raw response body, chunked however the network delivered it.
pub type ByteStream = BoxStream<'static, Result<Bytes, CompletionError>>;

/// Issues streaming chat-completion requests against one endpoint.
#[derive(Clone, Debug)]
pub struct TransportClient {
    client: reqwest::Client,
    base_url: String,
}

impl TransportClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the conversation with `stream: true` and hand back the body as a
    /// byte stream. Nothing is retried here.
    pub async fn request(
        &self,
        messages: Vec<ChatMessage>,
        config: &ChatConfig,
        credential: &str,
    ) -> Result<ByteStream, CompletionError> {
        let key = strip_bearer_prefix(credential);
        if key.is_empty() {
            return Err(CompletionError::auth("no API key configured"));
        }
        if key.chars().count() < MIN_CREDENTIAL_LEN {
            return Err(CompletionError::auth(format!(
                "API key is too short ({} chars)",
                key.chars().count()
            )));
        }

        let request = ChatRequest {
            model: config.model.clone(),
            messages,
            temperature: config.temperature,
            stream: true,
        };

        let chat_url = construct_api_url(&self.base_url, CHAT_COMPLETIONS_ENDPOINT);
        debug!(
            url = %chat_url,
            model = %request.model,
            messages = request.messages.len(),
            credential = %CredentialSummary::of(credential),
            "sending chat completion request"
        );

        let http_request = self
            .client
            .post(&chat_url)
            .header("Content-Type", "application/json");
        let http_request = add_auth_headers(http_request, credential);

        let response = http_request.json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(status = status.as_u16(), "chat completion request failed");
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CompletionError::from))
            .boxed())
    }
}
