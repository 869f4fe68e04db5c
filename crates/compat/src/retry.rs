//! Bounded retries for idempotent requests.

use std::future::Future;
use std::num::NonZeroU32;

use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, Result};

/// Attempts per request unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = NonZeroU32::new(3).unwrap();

/// Runs `attempt` until it succeeds, up to `max_attempts` times.
///
/// `attempt` receives the 1-based attempt number. Failed attempts are logged
/// and the next one starts straight away. Once every attempt has failed the
/// call fails with [`CommunicationFailure`](ErrorKind::CommunicationFailure),
/// wrapping the last attempt's error.
///
/// Cancelling the token aborts the attempt in flight and fails with
/// [`Cancelled`](ErrorKind::Cancelled); no further attempts are made. An
/// attempt that itself fails with `Cancelled` stops the loop the same way.
///
/// # Examples
///
/// ```rust
/// use ird_compat::error::{ErrorKind, Result};
/// use ird_compat::retry::{DEFAULT_MAX_ATTEMPTS, execute_with_retry};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let answer: Result<u32> = execute_with_retry(DEFAULT_MAX_ATTEMPTS, &cancel, |attempt| async move {
///     if attempt < 2 { exn::bail!(ErrorKind::Transport("timed out".into())) } else { Ok(attempt) }
/// })
/// .await;
/// assert_eq!(answer.unwrap(), 2);
/// # }
/// ```
pub async fn execute_with_retry<T, F, Fut>(
    max_attempts: NonZeroU32,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.get();
    let mut last_error = None;
    for number in 1..=max_attempts {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
            outcome = attempt(number) => outcome,
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) => {
                match &*err {
                    ErrorKind::Cancelled => return Err(err),
                    ErrorKind::Deserialize(reason) => {
                        tracing::error!(attempt = number, max_attempts, %reason, "could not read API response");
                    },
                    other => tracing::warn!(attempt = number, max_attempts, error = %other, "API request failed"),
                }
                last_error = Some(err);
            },
        }
    }
    let failure = ErrorKind::CommunicationFailure { attempts: max_attempts };
    match last_error {
        Some(err) => Err(err.raise(failure)),
        None => exn::bail!(failure),
    }
}
