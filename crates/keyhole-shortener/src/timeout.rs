use keyhole_core::StorageError;
use std::future::Future;
use std::time::Duration;

/// Runs a store call, failing with `StorageError::Timeout` once `limit` elapses.
pub(crate) async fn store_call<T, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(format!(
            "{operation} did not finish within {limit:?}"
        ))),
    }
}
