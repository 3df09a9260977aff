//! CSV import queue and the worker that drains it.
//!
//! Submitting an import only enqueues an [`ImportJob`]; a single worker task
//! processes jobs one at a time, so imports are serialized per process. When
//! a job finishes its summary is published on the event bus for the
//! submitting user; a job that aborts publishes a single danger notice.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vstack_core::actor::Actor;
use vstack_core::error::CoreError;
use vstack_core::notification::NotificationLevel;
use vstack_core::import::{aborted_message, ImportConfig, ImportOutcome};
use vstack_core::resource::ResourceDefinition;
use vstack_db::RecordStore;
use vstack_events::{EventBus, Notification};

use crate::engine::import::execute;

/// A queued CSV import.
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub resource: Arc<ResourceDefinition>,
    pub actor: Actor,
    pub file: Vec<u8>,
    pub config: ImportConfig,
}

/// Sending half of the import queue, held in application state.
#[derive(Debug, Clone)]
pub struct ImportQueue {
    sender: mpsc::Sender<ImportJob>,
}

impl ImportQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ImportJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting. Fails when the queue is full or the worker
    /// has stopped.
    pub fn submit(&self, job: ImportJob) -> Result<(), CoreError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                CoreError::Conflict("Too many imports in progress, try again later".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                CoreError::Internal("Import worker is not running".into())
            }
        })
    }
}

/// Drain `receiver` until it closes or `cancel` fires. A job that has
/// started always runs to completion.
pub async fn run(
    store: Arc<dyn RecordStore>,
    event_bus: Arc<EventBus>,
    mut receiver: mpsc::Receiver<ImportJob>,
    cancel: CancellationToken,
) {
    tracing::info!("Import worker started");

    loop {
        let job = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Import worker stopping");
                break;
            }
            job = receiver.recv() => match job {
                Some(job) => job,
                None => {
                    tracing::info!("Import queue closed, worker stopping");
                    break;
                }
            },
        };

        match execute(store.as_ref(), &job).await {
            Ok(outcome) => {
                tracing::info!(
                    resource = %job.resource.slug,
                    created = outcome.created,
                    failed = outcome.failed,
                    "Import finished",
                );
                publish_summary(&event_bus, &job, outcome);
            }
            Err(e) => {
                tracing::error!(resource = %job.resource.slug, error = %e, "Import aborted");
                let notice = aborted_message(&job.resource.label);
                event_bus.publish(
                    Notification::new(NotificationLevel::Danger, notice)
                        .for_user(job.actor.user_id),
                );
            }
        }
    }
}

fn publish_summary(event_bus: &EventBus, job: &ImportJob, outcome: ImportOutcome) {
    let summary = outcome.summary(&job.resource.singular_label, &job.resource.label);
    for (level, message) in summary {
        event_bus.publish(Notification::new(level, message).for_user(job.actor.user_id));
    }
}
