//! A scripted generator for tests.

use crate::core::ArtifactKind;
use crate::errors::GenerationError;
use crate::generator::{GenerationRequest, Generator};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

type Scripted = Result<Value, GenerationError>;

/// A generator that answers from per-kind scripts and records every request.
///
/// Scripted answers for a kind are consumed in order; the last one is
/// repeated for any further calls. A kind with no script fails with a
/// non-retryable error.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<ArtifactKind, VecDeque<Scripted>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    /// Creates a generator with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful answer for `kind`.
    #[must_use]
    pub fn respond(self, kind: ArtifactKind, value: Value) -> Self {
        self.push(kind, Ok(value));
        self
    }

    /// Queues a failure for `kind`.
    #[must_use]
    pub fn fail(self, kind: ArtifactKind, error: GenerationError) -> Self {
        self.push(kind, Err(error));
        self
    }

    /// Queues a rate-limit failure for `kind`.
    #[must_use]
    pub fn rate_limit(self, kind: ArtifactKind) -> Self {
        self.fail(
            kind,
            GenerationError::http(429, "Resource has been exhausted (e.g. check quota)."),
        )
    }

    fn push(&self, kind: ArtifactKind, answer: Scripted) {
        self.scripts.lock().entry(kind).or_default().push_back(answer);
    }

    /// Number of calls made for `kind`.
    #[must_use]
    pub fn calls(&self, kind: ArtifactKind) -> usize {
        self.requests.lock().iter().filter(|r| r.kind == kind).count()
    }

    /// Number of calls made for any kind.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Kinds requested, in call order.
    #[must_use]
    pub fn call_order(&self) -> Vec<ArtifactKind> {
        self.requests.lock().iter().map(|r| r.kind).collect()
    }

    /// The most recent request for `kind`.
    #[must_use]
    pub fn last_request(&self, kind: ArtifactKind) -> Option<GenerationRequest> {
        self.requests
            .lock()
            .iter()
            .rev()
            .find(|r| r.kind == kind)
            .cloned()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        self.requests.lock().push(request.clone());

        let mut scripts = self.scripts.lock();
        let Some(queue) = scripts.get_mut(&request.kind) else {
            return Err(GenerationError::new(format!(
                "no scripted answer for {}",
                request.kind
            )));
        };
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::new("script exhausted")))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(GenerationError::new("script exhausted")))
        }
    }
}
