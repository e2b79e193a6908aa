// src/error_recovery.rs
//! Bounded retry with a fixed sleep for timed-out requests.

use crate::api::TransportError;
use crate::error::AppError;
use std::time::Duration;

/// Outcome of a retried operation that did not fail fatally.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempted<T> {
    /// The operation completed on the given attempt.
    Completed { value: T, attempt: u32 },
    /// Every attempt timed out.
    Exhausted { attempts: u32 },
}

/// Retries an async operation while it times out.
///
/// At most `max_attempts` calls are made, with `sleep` between them.
/// Connection failures other than timeouts are fatal and returned at once.
pub async fn retry_on_timeout<F, T, Fut>(
    mut operation: F,
    max_attempts: u32,
    sleep: Duration,
    url: &str,
) -> Result<Attempted<T>, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, TransportError>>,
{
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => return Ok(Attempted::Completed { value, attempt }),
            Err(TransportError::Timeout(message)) => {
                log::warn!(
                    "Request timed out ({}), attempt {} of {}: {}",
                    message,
                    attempt,
                    max_attempts,
                    url
                );
                if attempt < max_attempts {
                    log::warn!("Next attempt after {:?}", sleep);
                    tokio::time::sleep(sleep).await;
                }
            }
            Err(TransportError::Connection(message)) => {
                return Err(AppError::Connection {
                    url: url.to_string(),
                    message,
                });
            }
        }
    }

    log::warn!("max_retries={} reached for {}", max_attempts, url);
    Ok(Attempted::Exhausted {
        attempts: max_attempts,
    })
}
