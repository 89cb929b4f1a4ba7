use super::{ChatRequest, ChatResponse, ChatTransport};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub type Scripted = (Duration, Result<ChatResponse>);

/// Replays canned responses in order, each after its delay
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        ScriptedTransport {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.messages[0].content.clone());
        let (delay, result) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request");
        tokio::time::sleep(delay).await;
        result
    }
}

/// A successful completion carrying `content`
pub fn reply(content: &str) -> Result<ChatResponse> {
    Ok(serde_json::from_value(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"total_tokens": 42}
    }))
    .unwrap())
}
