//! Cancellable, optionally delayed background work for the dashboard views.
//!
//! Every scheduled job receives a [`Ticket`]. Scheduling again (or calling
//! [`DebouncedTask::cancel`]) advances the generation, after which older
//! tickets report `is_current() == false`. Jobs are expected to check their
//! ticket after every await point and drop their results once it is stale.
//! Running requests are never aborted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.issued
    }
}

pub struct DebouncedTask {
    name: &'static str,
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl DebouncedTask {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        DebouncedTask {
            name,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// A task that starts its job right away but still discards stale results.
    pub fn immediate(name: &'static str) -> Self {
        Self::new(name, Duration::ZERO)
    }

    fn advance(&self) -> Ticket {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            generation: Arc::clone(&self.generation),
            issued,
        }
    }

    /// Replaces any pending job with `job`, run after the configured delay.
    pub fn schedule<F, Fut>(&mut self, job: F)
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.advance();
        let delay = self.delay;
        let name = self.name;

        self.pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !ticket.is_current() {
                debug!(task = name, "Skipping superseded job");
                return;
            }
            job(ticket).await;
        }));
    }

    /// Invalidates the pending job, if any.
    pub fn cancel(&mut self) {
        self.advance();
    }

    /// Waits for the most recently scheduled job to finish.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = handle.await;
        }
    }
}
