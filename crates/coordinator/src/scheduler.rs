use std::{
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use client_core::EmployeeDirectory;
use futures::FutureExt;
use shared::{
    domain::{EmployeeFields, EmployeeId},
    error::{ErrorInfo, ErrorKind},
};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, error, warn};

use crate::{actions::Action, state::RosterState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch { seq: u64 },
    Add { fields: EmployeeFields },
    Update { id: EmployeeId, fields: EmployeeFields },
    Delete { id: EmployeeId },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Fetch { .. } => "fetch",
            Effect::Add { .. } => "add",
            Effect::Update { .. } => "update",
            Effect::Delete { .. } => "delete",
        }
    }

    pub fn failed(&self, error: ErrorInfo) -> Action {
        match self {
            Effect::Fetch { seq } => Action::FetchFailed { seq: *seq, error },
            Effect::Add { .. } => Action::AddFailed(error),
            Effect::Update { id, .. } => Action::UpdateFailed {
                id: id.clone(),
                error,
            },
            Effect::Delete { id } => Action::DeleteFailed {
                id: id.clone(),
                error,
            },
        }
    }
}

#[derive(Clone)]
pub struct EffectScheduler {
    directory: Arc<dyn EmployeeDirectory>,
    latest_fetch: Arc<AtomicU64>,
}

impl EffectScheduler {
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self {
            directory,
            latest_fetch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn resume(directory: Arc<dyn EmployeeDirectory>, state: &RosterState) -> Self {
        Self {
            directory,
            latest_fetch: Arc::new(AtomicU64::new(state.fetches.settled)),
        }
    }

    pub fn latest_fetch(&self) -> u64 {
        self.latest_fetch.load(Ordering::SeqCst)
    }

    /// Performs one remote call. Returns `None` when the outcome was superseded.
    pub async fn perform(&self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::Fetch { seq } => {
                let result = self.directory.list().await;
                let previous = self.latest_fetch.fetch_max(seq, Ordering::SeqCst);
                if previous > seq {
                    debug!(seq, latest = previous, "discarding superseded fetch outcome");
                    return None;
                }
                Some(match result {
                    Ok(records) => Action::FetchSucceeded { seq, records },
                    Err(err) => {
                        warn!(seq, error = %err, "fetch failed");
                        Action::FetchFailed {
                            seq,
                            error: err.to_error_info(),
                        }
                    }
                })
            }
            Effect::Add { fields } => Some(match self.directory.create(&fields).await {
                Ok(record) => Action::AddSucceeded(record),
                Err(err) => {
                    warn!(error = %err, "add failed");
                    Action::AddFailed(err.to_error_info())
                }
            }),
            Effect::Update { id, fields } => {
                Some(match self.directory.replace(&id, &fields).await {
                    Ok(record) => Action::UpdateSucceeded(record),
                    Err(err) => {
                        warn!(%id, error = %err, "update failed");
                        Action::UpdateFailed {
                            id,
                            error: err.to_error_info(),
                        }
                    }
                })
            }
            Effect::Delete { id } => Some(match self.directory.remove(&id).await {
                Ok(()) => Action::DeleteSucceeded(id),
                Err(err) if err.is_not_found() => {
                    debug!(%id, "delete target already absent");
                    Action::DeleteSucceeded(id)
                }
                Err(err) => {
                    warn!(%id, error = %err, "delete failed");
                    Action::DeleteFailed {
                        id,
                        error: err.to_error_info(),
                    }
                }
            }),
        }
    }

    /// Runs `effect` on its own task and sends exactly one message on `completions`
    /// when it ends, even if the directory panics.
    pub fn spawn(
        &self,
        effect: Effect,
        completions: UnboundedSender<Option<Action>>,
    ) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let fallback = effect.clone();
            let outcome = match AssertUnwindSafe(scheduler.perform(effect))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(effect = fallback.name(), "remote call panicked");
                    Some(fallback.failed(ErrorInfo::new(
                        ErrorKind::Transport,
                        "remote call aborted unexpectedly",
                    )))
                }
            };
            let _ = completions.send(outcome);
        })
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
