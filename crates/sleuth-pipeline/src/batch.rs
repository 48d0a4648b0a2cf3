//! Batch formation: fill to capacity or wait out a deadline.

use std::time::Duration;

use tokio::sync::mpsc::Receiver;
use tokio::time::{timeout_at, Instant};

/// Fill a batch starting from `first`.
///
/// Keeps receiving until the batch reaches `capacity`, the channel closes,
/// or `deadline` elapses measured from the first pending item. Returns the
/// batch and whether the channel closed.
pub async fn fill_batch<T>(
    rx: &mut Receiver<T>,
    first: T,
    capacity: usize,
    deadline: Duration,
) -> (Vec<T>, bool) {
    let mut batch = Vec::with_capacity(capacity);
    batch.push(first);

    let deadline = Instant::now() + deadline;
    let mut closed = false;

    while batch.len() < capacity {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(item)) => batch.push(item),
            Ok(None) => {
                closed = true;
                break;
            }
            Err(_) => break,
        }
    }

    (batch, closed)
}
