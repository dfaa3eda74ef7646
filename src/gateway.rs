//! Per-session mutation serialization.
//!
//! Actor-style: all writes to a session's mutable state are funneled
//! through one dedicated worker task, so a watchdog tick and a
//! request-handling task never mutate concurrently. Submission is an
//! asynchronous hand-off; neither side blocks on the other beyond the
//! serialization itself.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{AppError, Result};

type Mutation = Box<dyn FnOnce() + Send + 'static>;

/// Serializes all mutations for one session onto a single worker task.
///
/// Two mutations submitted for the same session never execute
/// concurrently, and every mutation accepted by [`submit`](Self::submit)
/// runs to completion even if the submitter has since gone away.
pub struct MutationGateway {
    tx: mpsc::UnboundedSender<Mutation>,
    cancel: CancellationToken,
}

impl MutationGateway {
    /// Spawn the gateway worker for one session.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Mutation>();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    mutation = rx.recv() => match mutation {
                        Some(mutation) => mutation(),
                        None => break,
                    },
                    () = worker_cancel.cancelled() => {
                        // Drain mutations accepted before shutdown.
                        while let Ok(mutation) = rx.try_recv() {
                            mutation();
                        }
                        break;
                    }
                }
            }
            debug!("mutation gateway worker stopped");
        });
        Self { tx, cancel }
    }

    /// Schedule `mutation` to run with exclusive access to the session's
    /// mutable state. Returns once enqueued, without waiting for the
    /// mutation to execute.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Gateway` when the gateway has shut down, which
    /// means the session is already gone.
    pub fn submit(&self, mutation: impl FnOnce() + Send + 'static) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Gateway("gateway is shut down".into()));
        }
        self.tx
            .send(Box::new(mutation))
            .map_err(|_| AppError::Gateway("gateway worker is gone".into()))
    }

    /// Stop accepting new mutations. Mutations already accepted are still
    /// executed before the worker exits.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
