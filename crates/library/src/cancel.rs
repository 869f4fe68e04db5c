use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, Result};

/// Await `future` unless `cancel` fires first, in which case the future is
/// dropped mid-flight.
pub(crate) async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
        output = future => Ok(output),
    }
}
