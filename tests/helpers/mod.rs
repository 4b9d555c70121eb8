#![allow(dead_code)]

//! Shared fixtures: isolated stores and scripted completion clients.

use async_trait::async_trait;
use rapport::{ChatMessage, CompletionApi, CompletionError, SqliteStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn test_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().expect("in-memory store"))
}

/// Completion stub that always reports the upstream as busy.
#[derive(Default)]
pub struct BusyClient {
    calls: AtomicUsize,
}

impl BusyClient {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionApi for BusyClient {
    async fn complete(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CompletionError::from_status(503, "System is too busy".into()))
    }
}

/// Completion stub that always fails with a permanent error.
#[derive(Default)]
pub struct PermanentFailureClient {
    calls: AtomicUsize,
}

impl PermanentFailureClient {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionApi for PermanentFailureClient {
    async fn complete(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CompletionError::from_status(401, "invalid api key".into()))
    }
}

/// Completion stub that replays a scripted sequence of responses, then keeps
/// repeating the final one.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    last: Result<String, CompletionError>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        let last = responses
            .last()
            .cloned()
            .unwrap_or_else(|| Err(CompletionError::from_status(400, "script exhausted".into())));
        Self {
            responses: Mutex::new(responses.into()),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionApi for ScriptedClient {
    async fn complete(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone())
    }
}

/// A short conversation with enough turns to clear the extraction gate.
pub fn sample_conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("你平时喜欢做什么？"),
        ChatMessage::assistant("我喜欢在海边散步，小时候在渔村长大。"),
        ChatMessage::user("真好，那你怕什么吗？"),
        ChatMessage::assistant("说实话，我有点怕打雷，每次都会躲起来。"),
    ]
}
