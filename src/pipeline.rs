//! Asynchronous error reporting pipeline
//!
//! Errors raised while serving (bind failures, connection failures, response
//! encoding failures) are handed to a single consumer that calls the
//! embedder's error handler. Producers never wait on the consumer:
//! [`ErrorReporter::report`] either enqueues the error or drops it.
//!
//! The consumer runs on a dedicated OS thread so a slow error handler cannot
//! stall the async runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::types::Error;

/// Default number of errors buffered between producers and the consumer
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

const CONSUMER_THREAD_NAME: &str = "reload-hook-errors";

/// Error sink registered by the embedder
pub type ErrorHandler = Box<dyn FnMut(Error) + Send + 'static>;

/// Create a pipeline with room for `capacity` pending errors (at least one)
pub fn channel(capacity: usize) -> (ErrorReporter, ErrorConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let reporter = ErrorReporter {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (reporter, ErrorConsumer { rx })
}

/// Producer half of the pipeline, shared by every request and the listener
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    tx: mpsc::Sender<Error>,
    dropped: Arc<AtomicU64>,
}

impl ErrorReporter {
    /// Enqueue `error` for the consumer, or drop it if the queue is full or
    /// the consumer is gone. Never blocks. Returns whether it was enqueued.
    pub fn report(&self, error: Error) -> bool {
        match self.tx.try_send(error) {
            Ok(()) => true,
            Err(TrySendError::Full(error)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(error = %error, "Error pipeline full, dropping error");
                false
            }
            Err(TrySendError::Closed(error)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(error = %error, "Error consumer is gone, dropping error");
                false
            }
        }
    }

    /// Number of errors dropped so far by any clone of this reporter
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half of the pipeline. There is exactly one per channel.
#[derive(Debug)]
pub struct ErrorConsumer {
    rx: mpsc::Receiver<Error>,
}

impl ErrorConsumer {
    /// Deliver errors to `handler` one at a time, in the order they were
    /// accepted. Returns once every reporter has been dropped and the queue
    /// is drained.
    ///
    /// Blocks the calling thread; must not be called from async code.
    pub fn run<F>(mut self, mut handler: F)
    where
        F: FnMut(Error),
    {
        while let Some(error) = self.rx.blocking_recv() {
            handler(error);
        }
        info!("Error pipeline closed");
    }

    /// Run the consumer loop on its own named thread
    pub fn spawn(self, handler: ErrorHandler) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(CONSUMER_THREAD_NAME.to_string())
            .spawn(move || self.run(handler))
    }
}
