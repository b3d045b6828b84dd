//! Join-all-or-first-error fan-out over independent remote calls.

use std::future::Future;

use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::error::ClientError;

/// Runs every future on its own task and collects the results in input order.
///
/// Workers report `(index, result)` to this coordinator, which alone owns the
/// result slots. The first error is returned unchanged and every outstanding
/// worker is cancelled; partial results are never returned.
pub async fn try_join_all<T, F>(tasks: Vec<F>) -> Result<Vec<T>, ClientError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ClientError>> + Send + 'static,
{
    let total = tasks.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let (result_tx, mut result_rx) = mpsc::channel(total);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let mut workers = JoinSet::new();

    for (index, task) in tasks.into_iter().enumerate() {
        let result_tx = result_tx.clone();
        let mut cancel_rx = cancel_rx.clone();

        workers.spawn(async move {
            tokio::select! {
                result = task => {
                    // The coordinator is gone once it has seen an error.
                    let _ = result_tx.send((index, result)).await;
                }
                _ = cancel_rx.changed() => {
                    debug!("fan-out worker {index} cancelled");
                }
            }
        });
    }
    drop(result_tx);

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();

    while let Some((index, result)) = result_rx.recv().await {
        match result {
            Ok(value) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(value);
                }
            }
            Err(err) => {
                warn!("fan-out worker {index} of {total} failed: {err}");
                let _ = cancel_tx.send(true);
                workers.abort_all();
                return Err(err);
            }
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or(ClientError::WorkerLost))
        .collect()
}
