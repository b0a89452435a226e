use std::{future::Future, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreCallError {
    #[error("{label} timed out after {timeout:?}")]
    Timeout {
        label: &'static str,
        timeout: Duration,
    },
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Runs one store call under a deadline so a stuck connection turns into a
/// retryable error instead of a hung request.
pub async fn store_call<T, F>(
    timeout: Duration,
    label: &'static str,
    call: F,
) -> Result<T, StoreCallError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(StoreCallError::Failed),
        Err(_) => Err(StoreCallError::Timeout { label, timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_the_call_result() {
        let value = store_call(Duration::from_secs(1), "ok", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn surfaces_store_failures() {
        let err = store_call::<(), _>(Duration::from_secs(1), "boom", async {
            Err(anyhow::anyhow!("connection reset"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, StoreCallError::Failed(_)));
        assert_eq!(err.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn times_out_stuck_calls() {
        let err = store_call::<(), _>(
            Duration::from_millis(20),
            "entitlements.get",
            std::future::pending(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreCallError::Timeout {
                label: "entitlements.get",
                ..
            }
        ));
    }
}
