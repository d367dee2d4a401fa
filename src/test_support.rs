//! Test doubles for the fetcher and completion seams.

use crate::api::ExchangeFetcher;
use crate::completion::TextCompletion;
use crate::error::PluginError;
use crate::models::ResourceKind;
use crate::Result;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

enum Canned {
    Body(Value),
    Status(u16),
}

/// In-memory fetcher that counts calls per path.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Canned>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Canned::Body(body));
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Canned::Status(status));
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait::async_trait]
impl ExchangeFetcher for StubFetcher {
    async fn get_json(&self, path: &str, kind: ResourceKind) -> Result<Value> {
        *self.calls.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;

        match self.responses.lock().unwrap().get(path) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(PluginError::upstream(
                kind,
                Some(*status),
                format!("stub status {}", status),
            )),
            None => Err(PluginError::upstream(kind, Some(404), format!("no stub for {}", path))),
        }
    }
}

/// Completion double that replays scripted replies, then fails.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn replying(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PluginError::Completion("scripted completion exhausted".into())))
    }
}
