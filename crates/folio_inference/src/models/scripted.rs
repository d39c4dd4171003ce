use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use folio_core::{CompletionRequest, Error, InferenceModel, Result};
use tokio::sync::Mutex;

/// One canned backend behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Text(String),
    Error { status: u16, message: String },
    /// Never answers; only a timeout or cancellation ends the call.
    Stall,
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }

    pub fn unavailable() -> Self {
        ScriptedReply::Error {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }
}

/// Replays a queue of replies and records every request it receives.
/// Once the queue is drained the last reply repeats.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ScriptedReply>>,
    last: Mutex<Option<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("calls", &self.calls())
            .field("delay", &self.delay)
            .finish()
    }
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every call gets the same reply.
    pub fn always(reply: ScriptedReply) -> Self {
        Self::new([reply])
    }

    /// Waits `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl InferenceModel for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        let reply = {
            let mut last = self.last.lock().await;
            match self.replies.lock().await.pop_front() {
                Some(reply) => {
                    *last = Some(reply.clone());
                    Some(reply)
                }
                None => last.clone(),
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Error { status, message }) => Err(Error::Backend { status, message }),
            Some(ScriptedReply::Stall) => {
                futures::future::pending::<()>().await;
                Err(Error::Cancelled)
            }
            None => Err(Error::Backend {
                status: 500,
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: String::new(),
            user: "hello".to_string(),
            json_response: true,
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_repeats_last() {
        let model = ScriptedModel::new([ScriptedReply::unavailable(), ScriptedReply::text("{}")]);

        assert!(model.complete(&request()).await.is_err());
        assert_eq!(model.complete(&request()).await.unwrap(), "{}");
        assert_eq!(model.complete(&request()).await.unwrap(), "{}");
        assert_eq!(model.calls(), 3);
        assert_eq!(model.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn test_stall_never_answers() {
        let model = ScriptedModel::always(ScriptedReply::Stall);
        let result = tokio::time::timeout(Duration::from_millis(50), model.complete(&request())).await;
        assert!(result.is_err());
    }
}
