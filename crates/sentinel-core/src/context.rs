//! Per-request deadline and cancellation.
//!
//! Every operation a request triggers runs through [`RequestContext::run`], which
//! drops the operation (and whatever store call it is blocked on) as soon as the
//! deadline passes or the cancellation signal fires.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

/// Why an operation was abandoned before it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    deadline: Instant,
    cancel: Option<watch::Receiver<bool>>,
}

impl RequestContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancel: None,
        }
    }

    /// Attach a cancellation signal. The context is cancelled once the channel
    /// holds `true`; a dropped sender never cancels.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Drive `operation` to completion unless the deadline or the cancellation
    /// signal fires first.
    pub async fn run<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Interrupted>,
    {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled.into());
        }
        let mut cancel = self.cancel.clone();
        tokio::select! {
            result = operation => result,
            _ = sleep_until(self.deadline) => Err(Interrupted::DeadlineExceeded.into()),
            _ = cancelled(&mut cancel) => Err(Interrupted::Cancelled.into()),
        }
    }
}

async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    match cancel {
        Some(rx) => {
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
