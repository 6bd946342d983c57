//! OpenAI-compatible completion and embeddings client

use super::{ChatMessage, CompletionClient, CompletionOptions, EmbeddingClient, USER_AGENT};
use crate::config::RecConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const COMPLETION_SERVICE: &str = "completion";
const EMBEDDINGS_SERVICE: &str = "embeddings";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for `/chat/completions` and `/embeddings`
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    completion_model: String,
    embedding_model: String,
    completion_timeout: Duration,
    embedding_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &RecConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::upstream(COMPLETION_SERVICE, format!("client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.endpoints.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            completion_model: config.models.completion.clone(),
            embedding_model: config.models.embedding.clone(),
            completion_timeout: config.pipeline.completion_timeout(),
            embedding_timeout: config.pipeline.embedding_timeout(),
        })
    }

    async fn post_json<B, R>(
        &self,
        service: &'static str,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(service, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(service, status, &body));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ClientError::from_reqwest(service, timeout, e))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> ClientResult<String> {
        let request = ChatCompletionRequest {
            model: &self.completion_model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response: ChatCompletionResponse = self
            .post_json(
                COMPLETION_SERVICE,
                "chat/completions",
                &request,
                self.completion_timeout,
            )
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::upstream(COMPLETION_SERVICE, "response contained no message content"))?;

        debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> ClientResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let mut response: EmbeddingResponse = self
            .post_json(EMBEDDINGS_SERVICE, "embeddings", &request, self.embedding_timeout)
            .await?;

        if response.data.len() != texts.len() {
            return Err(ClientError::upstream(
                EMBEDDINGS_SERVICE,
                format!(
                    "expected {} embeddings, received {}",
                    texts.len(),
                    response.data.len()
                ),
            ));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}
