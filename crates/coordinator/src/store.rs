use std::sync::Arc;

use client_core::EmployeeDirectory;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::{
    actions::Action,
    reducer::{apply, effect_for},
    scheduler::EffectScheduler,
    selection::check_invariants,
    state::{ConflictPolicy, RosterState},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    pub policy: ConflictPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("roster store is no longer accepting intents")]
pub struct StoreClosed;

#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<Action>,
}

impl DispatchHandle {
    pub fn dispatch(&self, action: Action) -> Result<(), StoreClosed> {
        let name = action.name();
        self.tx.send(action).map_err(|_| StoreClosed)?;
        debug!(action = name, "queued intent");
        Ok(())
    }

    pub fn dispatch_all(
        &self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<(), StoreClosed> {
        actions
            .into_iter()
            .try_for_each(|action| self.dispatch(action))
    }
}

pub struct RosterStore {
    state: RosterState,
    scheduler: EffectScheduler,
    intents: mpsc::UnboundedReceiver<Action>,
    intents_open: bool,
    completion_tx: mpsc::UnboundedSender<Option<Action>>,
    completions: mpsc::UnboundedReceiver<Option<Action>>,
    in_flight: usize,
    snapshots: watch::Sender<Arc<RosterState>>,
}

impl RosterStore {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        options: StoreOptions,
    ) -> (Self, DispatchHandle) {
        Self::with_state(directory, RosterState::new(options.policy))
    }

    /// Starts from an existing snapshot; pending entries in it are not re-issued.
    pub fn with_state(
        directory: Arc<dyn EmployeeDirectory>,
        state: RosterState,
    ) -> (Self, DispatchHandle) {
        let (tx, intents) = mpsc::unbounded_channel();
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(Arc::new(state.clone()));
        let store = Self {
            scheduler: EffectScheduler::resume(directory, &state),
            state,
            intents,
            intents_open: true,
            completion_tx,
            completions,
            in_flight: 0,
            snapshots,
        };
        (store, DispatchHandle { tx })
    }

    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn snapshot(&self) -> Arc<RosterState> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<RosterState>> {
        self.snapshots.subscribe()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn dispatch(&mut self, action: Action) {
        let effect = effect_for(&self.state, &action);
        apply(&mut self.state, &action);
        debug_assert_eq!(check_invariants(&self.state), Ok(()));
        debug!(
            action = action.name(),
            records = self.state.collection.len(),
            "applied intent"
        );
        self.snapshots.send_replace(Arc::new(self.state.clone()));

        if let Some(effect) = effect {
            debug!(effect = effect.name(), "scheduling remote call");
            self.in_flight += 1;
            self.scheduler.spawn(effect, self.completion_tx.clone());
        }
    }

    fn complete(&mut self, outcome: Option<Action>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let Some(action) = outcome {
            self.dispatch(action);
        }
    }

    pub async fn settle(&mut self) {
        loop {
            while let Ok(action) = self.intents.try_recv() {
                self.dispatch(action);
            }
            if self.in_flight == 0 {
                break;
            }
            match self.completions.recv().await {
                Some(outcome) => self.complete(outcome),
                None => break,
            }
        }
    }

    /// Runs until every [`DispatchHandle`] is dropped and no remote call is in
    /// flight, then returns the final state.
    pub async fn run(mut self) -> RosterState {
        info!("roster store running");
        loop {
            tokio::select! {
                biased;
                Some(outcome) = self.completions.recv(), if self.in_flight > 0 => {
                    self.complete(outcome);
                }
                intent = self.intents.recv(), if self.intents_open => match intent {
                    Some(action) => self.dispatch(action),
                    None => self.intents_open = false,
                },
                else => break,
            }
        }
        info!(records = self.state.collection.len(), "roster store stopped");
        self.state
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
