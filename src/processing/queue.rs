//! Fire-and-forget handoff between the ingestion route and a single background worker.

use super::service::SearchApi;
use super::types::Document;
use crate::logging::render_error_chain;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Reasons a batch could not be queued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// Every slot in the queue is taken.
    #[error("Indexing queue is full")]
    Full,
    /// The worker has stopped.
    #[error("Indexing worker is not running")]
    Closed,
}

/// Sending half used by request handlers.
#[derive(Debug, Clone)]
pub struct IndexingQueue {
    sender: mpsc::Sender<Vec<Document>>,
}

/// Receiving half consumed by [`spawn_indexing_worker`].
#[derive(Debug)]
pub struct IndexingReceiver {
    receiver: mpsc::Receiver<Vec<Document>>,
}

/// Create a bounded queue holding at most `capacity` pending batches.
pub fn indexing_channel(capacity: usize) -> (IndexingQueue, IndexingReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (IndexingQueue { sender }, IndexingReceiver { receiver })
}

impl IndexingQueue {
    /// Queue a batch without waiting for capacity.
    pub fn enqueue(&self, documents: Vec<Document>) -> Result<(), EnqueueError> {
        self.sender.try_send(documents).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

impl IndexingReceiver {
    /// Wait for the next batch; `None` once every sender is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.receiver.recv().await
    }
}

/// Run batches one at a time until every [`IndexingQueue`] handle is dropped.
///
/// Each batch runs in its own task, so a panic fails that batch only. Failures are logged and
/// counted; nothing is reported back to the submitter.
pub fn spawn_indexing_worker<S>(mut receiver: IndexingReceiver, service: Arc<S>) -> JoinHandle<()>
where
    S: SearchApi + ?Sized + 'static,
{
    tokio::spawn(async move {
        while let Some(documents) = receiver.recv().await {
            let count = documents.len();
            let batch_service = service.clone();
            let batch =
                tokio::spawn(async move { batch_service.index_documents(documents).await });
            match batch.await {
                Ok(Ok(outcome)) => tracing::debug!(
                    documents = outcome.documents,
                    records = outcome.records,
                    "Indexing batch completed"
                ),
                Ok(Err(error)) => {
                    service.record_failed_batch();
                    tracing::error!(
                        documents = count,
                        code = error.code(),
                        error = %render_error_chain(&error),
                        "Indexing batch failed"
                    );
                }
                Err(join_error) => {
                    service.record_failed_batch();
                    tracing::error!(
                        documents = count,
                        panicked = join_error.is_panic(),
                        error = %join_error,
                        "Indexing batch aborted"
                    );
                }
            }
        }
        tracing::info!("Indexing queue closed; worker stopping");
    })
}
