use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use super::{AssistantRequest, ChatMessage, Conversation, StreamDecoder};
use crate::config::AssistantConfig;
use crate::error::{Error, Result};
use crate::task::Task;

const FALLBACK_ERROR: &str = "Failed to get response";

/// Result of one assistant turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Blank input; nothing was sent
    Ignored,
    /// Full streamed reply
    Answered(String),
    /// The turn failed; carries the error message added to the conversation
    Failed(String),
}

/// HTTP client for the streaming assistant endpoint
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AssistantClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Build a client from config; `None` when no endpoint is configured.
    pub fn from_config(config: &AssistantConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Ok(None);
        };
        crate::config::validate_endpoint(endpoint)?;
        Self::new(
            endpoint.trim(),
            config.api_key(),
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one turn: record the question, stream the reply into the
    /// conversation and report each fragment through `on_fragment`.
    ///
    /// Errors never escape; they are recorded in the conversation.
    pub async fn ask<F>(
        &self,
        conversation: &mut Conversation,
        input: &str,
        tasks: &[Task],
        mut on_fragment: F,
    ) -> AskOutcome
    where
        F: FnMut(&str),
    {
        let Some(history) = conversation.begin_turn(input) else {
            return AskOutcome::Ignored;
        };

        match self
            .stream_reply(&history, tasks, conversation, &mut on_fragment)
            .await
        {
            Ok(reply) => AskOutcome::Answered(reply),
            Err(err) => {
                warn!(error = %err, endpoint = %self.endpoint, "assistant request failed");
                let detail = match err {
                    Error::Assistant(message) => message,
                    other => other.to_string(),
                };
                AskOutcome::Failed(conversation.fail(&detail))
            }
        }
    }

    async fn stream_reply<F>(
        &self,
        history: &[ChatMessage],
        tasks: &[Task],
        conversation: &mut Conversation,
        on_fragment: &mut F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let body = AssistantRequest {
            messages: history,
            tasks,
        };
        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        debug!(messages = history.len(), tasks = tasks.len(), "sending assistant request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(error_message(&text)));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = StreamDecoder::new();
        let mut reply = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            deliver(decoder.push(&chunk), &mut reply, conversation, on_fragment);
            if decoder.is_done() {
                break;
            }
        }
        deliver(decoder.finish(), &mut reply, conversation, on_fragment);

        debug!(chars = reply.len(), malformed = decoder.malformed(), "assistant reply complete");
        Ok(reply)
    }
}

fn deliver<F>(
    fragments: Vec<String>,
    reply: &mut String,
    conversation: &mut Conversation,
    on_fragment: &mut F,
) where
    F: FnMut(&str),
{
    for fragment in fragments {
        reply.push_str(&fragment);
        conversation.append_fragment(&fragment);
        on_fragment(&fragment);
    }
}

/// Pull `error` out of a JSON error body, falling back to a generic message.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(|error| error.as_str()).map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR.to_string())
}
