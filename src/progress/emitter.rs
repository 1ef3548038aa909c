//! Ordered progress channel
//!
//! The controller owns the sending half; the consumer reads the receiving
//! half as a stream. Handlers see every event before it is queued.

use super::event::ProgressEvent;
use super::handler::ProgressHandler;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

/// Receiving half of a progress channel
pub type ProgressStream = UnboundedReceiverStream<ProgressEvent>;

/// The consumer dropped its stream; the run should stop issuing steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("progress consumer disconnected")]
pub struct ConsumerGone;

pub struct ProgressEmitter {
    tx: UnboundedSender<ProgressEvent>,
    handlers: Vec<Arc<dyn ProgressHandler>>,
}

impl ProgressEmitter {
    pub fn channel() -> (Self, ProgressStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                handlers: Vec::new(),
            },
            UnboundedReceiverStream::new(rx),
        )
    }

    pub fn with_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn emit(&self, event: ProgressEvent) -> Result<(), ConsumerGone> {
        if let (Some(completed), Some(total)) = (event.completed_steps, event.total_steps) {
            if completed > total {
                warn!(
                    id = %event.id,
                    completed, total, "Progress event reports more completed steps than total"
                );
            }
        }

        for handler in &self.handlers {
            handler.on_progress(&event);
        }

        self.tx.send(event).map_err(|_| ConsumerGone)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for ProgressEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEmitter")
            .field("handlers", &self.handlers.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
