//! Clipboard abstraction for the peer agent.
//!
//! [`SystemClipboard`] owns an `arboard` handle on a dedicated thread and
//! serves requests over a channel, so the async loops never block on the
//! platform clipboard and the handle never moves between threads. The handle
//! lives as long as the agent, which keeps written content available on
//! platforms where the clipboard owner must stay alive (X11).

use async_trait::async_trait;
use std::sync::{mpsc, Arc, Mutex};
use thiserror::Error;
use tokio::sync::oneshot;

/// Clipboard errors.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The platform clipboard could not be opened.
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    /// Reading failed.
    #[error("clipboard read failed: {0}")]
    Read(String),

    /// Writing failed.
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Plain-text clipboard access.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Current clipboard text. An empty or non-text clipboard reads as "".
    async fn read(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard text.
    async fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

enum Request {
    Read(oneshot::Sender<Result<String, ClipboardError>>),
    Write(String, oneshot::Sender<Result<(), ClipboardError>>),
}

/// The operating system clipboard, via `arboard`.
#[derive(Debug)]
pub struct SystemClipboard {
    requests: Mutex<mpsc::Sender<Request>>,
}

impl SystemClipboard {
    /// Open the system clipboard.
    ///
    /// Fails if no clipboard is available (e.g. no display server).
    pub fn new() -> Result<Self, ClipboardError> {
        let (requests, inbox) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        std::thread::Builder::new()
            .name("clipsync-clipboard".into())
            .spawn(move || {
                let mut clipboard = match arboard::Clipboard::new() {
                    Ok(clipboard) => {
                        let _ = ready_tx.send(Ok(()));
                        clipboard
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                // Ends when the SystemClipboard is dropped
                while let Ok(request) = inbox.recv() {
                    serve(&mut clipboard, request);
                }
            })
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                requests: Mutex::new(requests),
            }),
            Ok(Err(reason)) => Err(ClipboardError::Unavailable(reason)),
            Err(_) => Err(ClipboardError::Unavailable(
                "clipboard thread exited".into(),
            )),
        }
    }

    fn submit(&self, request: Request) -> Result<(), ClipboardError> {
        let requests = self
            .requests
            .lock()
            .map_err(|_| ClipboardError::Unavailable("request lock poisoned".into()))?;
        requests
            .send(request)
            .map_err(|_| ClipboardError::Unavailable("clipboard thread exited".into()))
    }
}

fn serve(clipboard: &mut arboard::Clipboard, request: Request) {
    match request {
        Request::Read(reply) => {
            let result = match clipboard.get_text() {
                Ok(text) => Ok(text),
                Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
                Err(e) => Err(ClipboardError::Read(e.to_string())),
            };
            let _ = reply.send(result);
        }
        Request::Write(text, reply) => {
            let result = clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::Write(e.to_string()));
            let _ = reply.send(result);
        }
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        let (reply, response) = oneshot::channel();
        self.submit(Request::Read(reply))?;
        response
            .await
            .map_err(|_| ClipboardError::Read("clipboard thread exited".into()))?
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let (reply, response) = oneshot::channel();
        self.submit(Request::Write(text.to_string(), reply))?;
        response
            .await
            .map_err(|_| ClipboardError::Write("clipboard thread exited".into()))?
    }
}

/// In-memory clipboard for testing.
///
/// Clones share state. `set` simulates the user copying something.
#[derive(Debug, Default, Clone)]
pub struct MockClipboard {
    inner: Arc<Mutex<MockClipboardInner>>,
}

#[derive(Debug, Default)]
struct MockClipboardInner {
    content: String,
    writes: Vec<String>,
    fail_next_read: Option<String>,
    fail_next_write: Option<String>,
}

impl MockClipboard {
    /// Create an empty mock clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock clipboard holding `text`.
    pub fn with_content(text: &str) -> Self {
        let clipboard = Self::new();
        clipboard.set(text);
        clipboard
    }

    /// Simulate a local copy. Not counted as a write.
    pub fn set(&self, text: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.content = text.to_string();
    }

    /// Current content.
    pub fn content(&self) -> String {
        let inner = self.inner.lock().unwrap();
        inner.content.clone()
    }

    /// Every text written through [`Clipboard::write`], in order.
    pub fn writes(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.writes.clone()
    }

    /// Cause the next read() to fail.
    pub fn fail_next_read(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_read = Some(error.to_string());
    }

    /// Cause the next write() to fail.
    pub fn fail_next_write(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_write = Some(error.to_string());
    }
}

#[async_trait]
impl Clipboard for MockClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_read.take() {
            return Err(ClipboardError::Read(error));
        }
        Ok(inner.content.clone())
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(ClipboardError::Write(error));
        }
        inner.content = text.to_string();
        inner.writes.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_reads_what_was_set() {
        let clipboard = MockClipboard::with_content("copied");
        assert_eq!(clipboard.read().await.unwrap(), "copied");
        assert!(clipboard.writes().is_empty());
    }

    #[tokio::test]
    async fn mock_records_writes() {
        let clipboard = MockClipboard::new();
        clipboard.write("one").await.unwrap();
        clipboard.write("two").await.unwrap();

        assert_eq!(clipboard.content(), "two");
        assert_eq!(clipboard.writes(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn mock_forced_failures_are_one_shot() {
        let clipboard = MockClipboard::with_content("x");
        clipboard.fail_next_read("locked");
        clipboard.fail_next_write("locked");

        assert!(matches!(
            clipboard.read().await,
            Err(ClipboardError::Read(_))
        ));
        assert!(matches!(
            clipboard.write("y").await,
            Err(ClipboardError::Write(_))
        ));
        assert_eq!(clipboard.content(), "x");

        assert_eq!(clipboard.read().await.unwrap(), "x");
        clipboard.write("y").await.unwrap();
        assert_eq!(clipboard.content(), "y");
    }

    #[tokio::test]
    async fn mock_clones_share_state() {
        let a = MockClipboard::new();
        let b = a.clone();
        a.set("shared");
        assert_eq!(b.read().await.unwrap(), "shared");
    }

    #[test]
    fn error_display() {
        let err = ClipboardError::Unavailable("no display".into());
        assert_eq!(err.to_string(), "clipboard unavailable: no display");
    }
}
