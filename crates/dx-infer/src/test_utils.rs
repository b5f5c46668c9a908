//! Test doubles for the inference boundary

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::clock::Clock;
use crate::error::{InferenceError, InferenceResult};
use crate::retry::Sleeper;
use crate::service::{CompletionRequest, InferenceService};

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|p| p.into_inner());
        self.origin + offset
    }
}

/// Records requested delays and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(duration);
    }
}

/// Replays queued responses in order and records every prompt.
///
/// Once the queue is empty the default response is returned, or a service
/// error when there is none.
#[derive(Debug, Default)]
pub struct ScriptedService {
    script: Mutex<VecDeque<InferenceResult<String>>>,
    default: Option<String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response used after the script runs out
    pub fn with_default(mut self, response: &str) -> Self {
        self.default = Some(response.to_string());
        self
    }

    /// Queue a successful response
    pub fn respond(self, response: &str) -> Self {
        self.push(Ok(response.to_string()))
    }

    /// Queue a failure
    pub fn fail(self, error: InferenceError) -> Self {
        self.push(Err(error))
    }

    fn push(self, item: InferenceResult<String>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(item);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl InferenceService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> InferenceResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.prompt.clone());
        let next = self
            .script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match next {
            Some(item) => item,
            None => self
                .default
                .clone()
                .ok_or_else(|| InferenceError::Service("script exhausted".to_string())),
        }
    }
}
