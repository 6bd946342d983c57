//! Collaborator fakes shared by unit tests in several modules

use crate::clients::{ChatMessage, CompletionClient, CompletionOptions, EmbeddingClient};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Completion fake keyed by the system prompt; `None` scripts a failure
#[derive(Default)]
pub(crate) struct FakeCompletion {
    responses: HashMap<&'static str, Option<String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeCompletion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, system_prompt: &'static str, text: &str) -> Self {
        self.responses.insert(system_prompt, Some(text.to_string()));
        self
    }

    pub(crate) fn fail(mut self, system_prompt: &'static str) -> Self {
        self.responses.insert(system_prompt, None);
        self
    }

    pub(crate) fn call_count(&self, system_prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| **p == system_prompt)
            .count()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: CompletionOptions,
    ) -> ClientResult<String> {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        let Some((prompt, response)) = self.responses.iter().find(|(p, _)| **p == system) else {
            return Err(ClientError::upstream("completion", "no scripted response"));
        };
        self.calls.lock().unwrap().push(*prompt);
        response
            .clone()
            .ok_or_else(|| ClientError::upstream("completion", "scripted failure"))
    }
}

/// Embedding fake
pub(crate) enum FakeEmbeddings {
    Constant(Vec<f32>),
    /// First keyword contained in the text picks the vector
    ByKeyword(Vec<(&'static str, Vec<f32>)>, Vec<f32>),
    Failing,
}

#[async_trait]
impl EmbeddingClient for FakeEmbeddings {
    async fn embed(&self, texts: &[String]) -> ClientResult<Vec<Vec<f32>>> {
        match self {
            FakeEmbeddings::Failing => Err(ClientError::Timeout {
                service: "embeddings",
                after: std::time::Duration::from_secs(15),
            }),
            FakeEmbeddings::Constant(v) => Ok(texts.iter().map(|_| v.clone()).collect()),
            FakeEmbeddings::ByKeyword(rules, default) => Ok(texts
                .iter()
                .map(|text| {
                    rules
                        .iter()
                        .find(|(kw, _)| text.contains(kw))
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| default.clone())
                })
                .collect()),
        }
    }
}
