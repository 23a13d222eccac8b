use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal and optional deadline bounding every backend call of a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Reports why the context is finished, if it is.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ContextError::Cancelled,
                _ = sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Drives `future` to completion unless the context finishes first.
    ///
    /// `future` is always polled once, ahead of the context, so the call is issued even
    /// on a finished context and aborted at its first suspension point.
    pub async fn run<F, T>(&self, future: F) -> Result<T, ContextError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            output = future => Ok(output),
            err = self.done() => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_completes_when_context_is_live() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn run_polls_future_once_when_already_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = ctx
            .run(async {
                polled.store(true, std::sync::atomic::Ordering::SeqCst);
                std::future::pending::<()>().await
            })
            .await;

        assert_eq!(result, Err(ContextError::Cancelled));
        assert!(polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn run_fails_fast_when_already_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(ContextError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_at_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(ContextError::DeadlineExceeded));
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancellation_from_another_task_aborts_run() {
        let ctx = RequestContext::new();
        let handle = ctx.clone();
        tokio::spawn(async move { handle.cancel() });
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(ContextError::Cancelled));
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::new()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(1));
        assert_eq!(ctx.deadline, Some(now + Duration::from_secs(1)));
    }
}
