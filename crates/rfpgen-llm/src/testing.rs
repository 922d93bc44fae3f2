//! Scripted backend for tests.
//!
//! Plays back a fixed sequence of outcomes without touching the network. The
//! last step repeats once the script runs out.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rfpgen_utils::error::LlmError;

use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// One scripted outcome
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Reply(String),
    /// Reply after sleeping, to exercise deadlines and concurrency
    ReplyAfter(Duration, String),
    ModelUnavailable,
    AuthFailure,
    QuotaExceeded,
    Outage,
    /// The provider's own request timeout fired
    TimedOut,
    /// Provider answered with no text
    Empty,
    /// Never answers within any reasonable deadline
    Hang,
}

/// What the backend saw on one call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub invocation: LlmInvocation,
}

pub struct ScriptedBackend {
    name: String,
    steps: Vec<ScriptStep>,
    cursor: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        Self {
            name: name.into(),
            steps,
            cursor: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `text`
    #[must_use]
    pub fn replying(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, vec![ScriptStep::Reply(text.into())])
    }

    /// Always fail with the given step
    #[must_use]
    pub fn failing(name: impl Into<String>, step: ScriptStep) -> Self {
        Self::new(name, vec![step])
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn next_step(&self) -> ScriptStep {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.steps
            .get(index)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or(ScriptStep::Empty)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.clone(),
                invocation: inv,
            });
        }

        match self.next_step() {
            ScriptStep::Reply(text) => Ok(LlmResult::new(text, &self.name, model)),
            ScriptStep::ReplyAfter(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(LlmResult::new(text, &self.name, model))
            }
            ScriptStep::ModelUnavailable => Err(LlmError::ModelUnavailable(format!(
                "{} returned 404 Not Found: model {model} does not exist",
                self.name
            ))),
            ScriptStep::AuthFailure => Err(LlmError::ProviderAuth(format!(
                "{} authentication failed: 401 Unauthorized",
                self.name
            ))),
            ScriptStep::QuotaExceeded => Err(LlmError::ProviderQuota(format!(
                "{} rate limit exceeded: 429 Too Many Requests",
                self.name
            ))),
            ScriptStep::Outage => Err(LlmError::ProviderOutage(format!(
                "{} returned server error: 503 Service Unavailable",
                self.name
            ))),
            ScriptStep::TimedOut => Err(LlmError::Timeout {
                duration: Duration::from_secs(30),
            }),
            ScriptStep::Empty => Ok(LlmResult::new("", &self.name, model)),
            ScriptStep::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Transport(format!("{} never answered", self.name)))
            }
        }
    }
}
