//! Output relay - forwards stdout chunks of a running tool to one subscriber.
//!
//! There is a single subscriber slot (the one UI). Publishing with nobody
//! listening is a no-op, and a late subscriber only sees chunks published
//! after it attached.

use std::sync::{Mutex, MutexGuard};
use tidy_common::OutputChunk;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

/// Stream of chunks handed to a subscriber
pub type OutputStream = UnboundedReceiverStream<OutputChunk>;

#[derive(Debug, Default)]
pub struct OutputRelay {
    slot: Mutex<Option<mpsc::UnboundedSender<OutputChunk>>>,
}

impl OutputRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new subscriber, detaching any previous one
    pub fn subscribe(&self) -> OutputStream {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.lock().replace(tx).is_some() {
            debug!("Output relay: previous subscriber replaced");
        }
        UnboundedReceiverStream::new(rx)
    }

    pub fn unsubscribe(&self) {
        self.lock().take();
    }

    pub fn has_subscriber(&self) -> bool {
        self.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn publish(&self, chunk: OutputChunk) {
        let mut slot = self.lock();
        let Some(tx) = slot.as_ref() else {
            return;
        };
        if tx.send(chunk).is_err() {
            debug!("Output relay: subscriber went away");
            slot.take();
        }
    }

    // A poisoned slot only means a publisher panicked mid-send; the Option
    // inside is still valid.
    fn lock(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<OutputChunk>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_publish_without_subscriber_is_noop() {
        let relay = OutputRelay::new();
        relay.publish(OutputChunk::new("lost"));
        assert!(!relay.has_subscriber());
    }

    #[tokio::test]
    async fn test_order_preserved() {
        let relay = OutputRelay::new();
        let mut stream = relay.subscribe();
        for i in 0..5 {
            relay.publish(OutputChunk::new(format!("line {}\n", i)));
        }
        relay.unsubscribe();

        let mut seen = Vec::new();
        while let Some(chunk) = stream.next().await {
            seen.push(chunk.text);
        }
        assert_eq!(seen, vec!["line 0\n", "line 1\n", "line 2\n", "line 3\n", "line 4\n"]);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_replay() {
        let relay = OutputRelay::new();
        relay.publish(OutputChunk::new("before"));
        let mut stream = relay.subscribe();
        relay.publish(OutputChunk::new("after"));
        relay.unsubscribe();

        assert_eq!(stream.next().await.map(|c| c.text), Some("after".to_string()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_new_subscriber_replaces_old() {
        let relay = OutputRelay::new();
        let mut first = relay.subscribe();
        let mut second = relay.subscribe();
        relay.publish(OutputChunk::new("x"));
        relay.unsubscribe();

        assert!(first.next().await.is_none());
        assert_eq!(second.next().await.map(|c| c.text), Some("x".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_clears_slot() {
        let relay = OutputRelay::new();
        let stream = relay.subscribe();
        assert!(relay.has_subscriber());
        drop(stream);
        assert!(!relay.has_subscriber());
        relay.publish(OutputChunk::new("nobody"));
        assert!(relay.lock().is_none());
    }
}
