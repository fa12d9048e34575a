//! Per-job outbound event sink
//!
//! A [`ProgressPublisher`] owns the sending half of one job's event channel. The
//! HTTP layer holds the receiving half and turns it into a server-sent event
//! stream; nothing in here knows about the transport.

use crate::types::{JobEvent, JobResult, ProgressEvent};
use tokio::sync::mpsc;

/// Sending side of one job's event stream
///
/// Progress is forwarded in call order. [`finish`](Self::finish) sends exactly one
/// terminal event and closes the channel; after that, and after the client has gone
/// away, every call is a no-op.
#[derive(Debug)]
pub struct ProgressPublisher {
    tx: Option<mpsc::Sender<JobEvent>>,
}

impl ProgressPublisher {
    /// Create a publisher and the receiver the client reads from
    ///
    /// `capacity` bounds how many events may wait for a slow client before
    /// publishing applies backpressure to the job.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<JobEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// Whether further events will be dropped
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }

    /// Forward one progress event
    pub async fn publish(&mut self, event: ProgressEvent) {
        self.send(event.into()).await;
    }

    /// Send the terminal event, then close
    pub async fn finish(&mut self, result: JobResult) {
        self.send(result.into()).await;
        self.close();
    }

    /// Close the channel without a terminal event
    ///
    /// Idempotent.
    pub fn close(&mut self) {
        self.tx = None;
    }

    async fn send(&mut self, event: JobEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("Client disconnected, dropping further events");
            self.tx = None;
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(mut rx: mpsc::Receiver<JobEvent>) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_progress_then_single_terminal_event() {
        let (mut publisher, rx) = ProgressPublisher::channel(8);

        publisher.publish(ProgressEvent::new(10.0)).await;
        publisher.publish(ProgressEvent::new(55.5)).await;
        publisher
            .finish(JobResult::Completed {
                file: "downloads/1.mp4".into(),
            })
            .await;

        assert_eq!(
            drain(rx).await,
            vec![
                JobEvent::Progress { progress: 10.0 },
                JobEvent::Progress { progress: 55.5 },
                JobEvent::Completed {
                    status: "completed".into(),
                    file: "downloads/1.mp4".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_is_sent_after_finish() {
        let (mut publisher, rx) = ProgressPublisher::channel(8);

        publisher
            .finish(JobResult::Failed {
                message: "ERROR: Unsupported URL".into(),
            })
            .await;
        publisher.publish(ProgressEvent::new(99.0)).await;
        publisher
            .finish(JobResult::Completed {
                file: "downloads/2.mp3".into(),
            })
            .await;

        assert!(publisher.is_closed());
        assert_eq!(
            drain(rx).await,
            vec![JobEvent::Error {
                error: "ERROR: Unsupported URL".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_disconnected_client_makes_publishing_a_no_op() {
        let (mut publisher, rx) = ProgressPublisher::channel(1);
        drop(rx);

        assert!(publisher.is_closed());
        publisher.publish(ProgressEvent::new(1.0)).await;
        publisher
            .finish(JobResult::Completed {
                file: "downloads/3.mp4".into(),
            })
            .await;
        publisher.close();
        assert!(publisher.is_closed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut publisher, mut rx) = ProgressPublisher::channel(4);
        publisher.close();
        publisher.close();

        assert!(rx.recv().await.is_none());
    }
}
