//! Fault boundary around per-event work.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::error;

/// A handler that panicked instead of returning.
#[derive(Debug, Clone, Error)]
#[error("handler '{label}' failed: {message}")]
pub struct HandlerFailure {
    /// Name of the supervised unit of work.
    pub label: String,
    /// Panic payload rendered as text.
    pub message: String,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Run `fut`, turning a panic into [`HandlerFailure`].
pub async fn supervise<F, T>(label: &str, fut: F) -> Result<T, HandlerFailure>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(fut).catch_unwind().await.map_err(|payload| {
        let failure = HandlerFailure {
            label: label.to_string(),
            message: panic_message(payload.as_ref()),
        };
        error!(label, message = %failure.message, "handler panicked");
        failure
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_output() {
        let result = supervise("ok", async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let result: Result<(), _> = supervise("boom", async { panic!("bad payload") }).await;
        let failure = result.unwrap_err();
        assert_eq!(failure.label, "boom");
        assert_eq!(failure.message, "bad payload");
    }

    #[tokio::test]
    async fn test_formatted_panic_message() {
        let id = 42;
        let result: Result<(), _> = supervise("fmt", async move { panic!("missing member {id}") }).await;
        assert_eq!(result.unwrap_err().message, "missing member 42");
    }
}
