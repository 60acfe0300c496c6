//! In-memory transport for tests and offline development.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::Transport;
use super::error::TransportError;

/// Transport that replays canned response bodies and records every
/// request it was asked to send.
///
/// Useful for exercising the full request/response pipeline without
/// endpoint credentials. Responses are consumed in FIFO order; running
/// out of them fails like a dead endpoint would.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Vec<u8>>>,
    requests: Mutex<Vec<Vec<u8>>>,
}

impl MockTransport {
    /// A transport with one canned response queued.
    pub fn replying(body: impl Into<Vec<u8>>) -> Self {
        let transport = Self::default();
        transport.enqueue(body);
        transport
    }

    /// Queue another response body.
    pub fn enqueue(&self, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .expect("mock state poisoned")
            .push_back(body.into());
    }

    /// Request bodies captured so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().expect("mock state poisoned").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_raw(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        self.requests
            .lock()
            .expect("mock state poisoned")
            .push(body);
        self.responses
            .lock()
            .expect("mock state poisoned")
            .pop_front()
            .ok_or(TransportError::Status {
                status: 0,
                message: "no canned response queued".to_string(),
            })
    }
}
