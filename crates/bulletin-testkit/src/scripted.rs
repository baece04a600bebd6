//! Scripted transport for ordering-sensitive tests.
//!
//! Each path has a FIFO of replies. A reply is either ready, or deferred
//! until the test resolves it, which lets a test hold one request open while
//! another completes.

use async_trait::async_trait;
use bulletin_app::{Transport, TransportError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{oneshot, watch};

type Reply = Result<Value, TransportError>;

enum Scripted {
    Ready(Reply),
    Deferred(oneshot::Receiver<Reply>),
}

/// Handle completing a deferred reply.
#[derive(Debug)]
pub struct DeferredReply {
    sender: oneshot::Sender<Reply>,
}

impl DeferredReply {
    /// Complete the request with `reply`.
    pub fn resolve(self, reply: Reply) {
        // The request may have been dropped; nothing to deliver then.
        let _ = self.sender.send(reply);
    }
}

/// Transport answering from per-path scripts.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    call_count: watch::Sender<usize>,
}

impl ScriptedTransport {
    /// Transport with no scripts.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            call_count: watch::channel(0).0,
        }
    }

    /// Queue an immediate reply for `path`.
    pub fn respond(&self, path: &str, reply: Reply) {
        self.push(path, Scripted::Ready(reply));
    }

    /// Queue a reply for `path` that completes when the handle is resolved.
    pub fn defer(&self, path: &str) -> DeferredReply {
        let (sender, receiver) = oneshot::channel();
        self.push(path, Scripted::Deferred(receiver));
        DeferredReply { sender }
    }

    /// Paths requested so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Wait until at least `n` requests have been issued.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut count = self.call_count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = count.wait_for(|issued| *issued >= n).await;
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.scripts
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    async fn answer(&self, path: &str) -> Reply {
        let next = {
            self.calls.lock().push(path.to_string());
            self.scripts.lock().get_mut(path).and_then(VecDeque::pop_front)
        };
        self.call_count.send_modify(|issued| *issued += 1);
        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Deferred(receiver)) => receiver.await.unwrap_or_else(|_| {
                Err(TransportError::Network {
                    path: path.to_string(),
                    reason: "deferred reply dropped".to_string(),
                })
            }),
            None => Err(TransportError::Network {
                path: path.to_string(),
                reason: "no scripted reply".to_string(),
            }),
        }
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.answer(path).await
    }

    async fn post(&self, path: &str, _body: Value) -> Result<Value, TransportError> {
        self.answer(path).await
    }
}
