//! Mock transport for testing.
//!
//! Allows queueing inbound frames and capturing sent frames for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for testing.
///
/// Clones share state, so a test can keep a handle after moving one into
/// an agent. An empty receive queue reads as a closed connection unless
/// [`MockTransport::hold_open`] was called.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_address: Option<String>,
    connect_attempts: usize,
    sent_messages: Vec<Vec<u8>>,
    receive_queue: VecDeque<Vec<u8>>,
    failing_connects: usize,
    hold_open: bool,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame to be returned by a later `recv()` call.
    pub fn queue_response(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.receive_queue.push_back(data);
    }

    /// Get all frames that were sent.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.clone()
    }

    /// Get the last frame that was sent.
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.last().cloned()
    }

    /// Get the address that was connected to.
    pub fn connected_address(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.connected_address.clone()
    }

    /// Number of `connect()` calls so far, successful or not.
    pub fn connect_attempts(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.connect_attempts
    }

    /// Cause the next `count` connect() calls to fail.
    pub fn fail_connects(&self, count: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_connects = count;
    }

    /// Make recv() on an empty queue wait forever instead of reporting a
    /// closed connection.
    pub fn hold_open(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.hold_open = true;
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_recv = Some(error.to_string());
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connect_attempts += 1;

        // Check for forced failure
        if inner.failing_connects > 0 {
            inner.failing_connects -= 1;
            return Err(TransportError::ConnectionFailed("connection refused".into()));
        }

        inner.connected = true;
        inner.connected_address = Some(address.to_string());
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        {
            let mut inner = self.inner.lock().unwrap();

            if !inner.connected {
                return Err(TransportError::NotConnected);
            }

            // Check for forced failure
            if let Some(error) = inner.fail_next_recv.take() {
                return Err(TransportError::ReceiveFailed(error));
            }

            if let Some(data) = inner.receive_queue.pop_front() {
                return Ok(data);
            }
            if !inner.hold_open {
                return Err(TransportError::ConnectionClosed);
            }
        }
        std::future::pending().await
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        Ok(())
    }
}
