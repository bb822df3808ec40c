use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::TransportError;

/// Drive `fut` until it completes, the token fires or `limit` elapses
///
/// Cancellation wins over completion when both are ready, so a frame that
/// becomes available after the token fired is never handed out.
///
/// # Errors
///
/// Returns [`TransportError::Cancelled`] or [`TransportError::Timeout`].
pub async fn guarded<F>(
    token: &CancellationToken,
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, TransportError>
where
    F: Future,
{
    if token.is_cancelled() {
        return Err(TransportError::Cancelled);
    }

    let bounded = async {
        match limit {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| TransportError::Timeout),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        biased;
        () = token.cancelled() => Err(TransportError::Cancelled),
        output = bounded => output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes() {
        let token = CancellationToken::new();
        let value = guarded(&token, None, async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let token = CancellationToken::new();
        let result = guarded(
            &token,
            Some(Duration::from_millis(50)),
            std::future::pending::<()>(),
        )
        .await;
        assert!(matches!(result, Err(TransportError::Timeout)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let result = guarded(&token, None, async { 1 }).await;
        assert!(matches!(result, Err(TransportError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_while_waiting() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = guarded(&token, None, std::future::pending::<()>()).await;
        assert!(matches!(result, Err(TransportError::Cancelled)));
    }
}
