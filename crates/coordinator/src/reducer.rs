use shared::{
    domain::{Employee, EmployeeId},
    error::{ErrorInfo, ErrorKind},
};

use crate::{
    actions::Action,
    scheduler::Effect,
    selection::{close_modal, dismiss_dialog, release_record},
    state::{Collection, ConflictPolicy, PendingOp, RosterState},
};

pub fn reduce(state: &RosterState, action: &Action) -> RosterState {
    let mut next = state.clone();
    apply(&mut next, action);
    next
}

pub fn apply(state: &mut RosterState, action: &Action) {
    match action {
        Action::SetModalOpen(true) => state.ui.is_modal_open = true,
        Action::SetModalOpen(false) => close_modal(&mut state.ui),
        Action::SetSelected(None) => state.ui.selected = None,
        Action::SetSelected(Some(id)) => {
            if state.collection.contains(id) {
                state.ui.selected = Some(id.clone());
            } else {
                state.ui.last_error = Some(ErrorInfo::new(
                    ErrorKind::NotFound,
                    format!("employee {id} is not in the roster"),
                ));
            }
        }

        Action::FetchRequested => {
            state.fetches.issued += 1;
            state.ui.pending.insert(PendingOp::Fetch);
        }
        Action::FetchSucceeded { seq, records } => {
            if settle_fetch(state, *seq) {
                state.collection = Collection::from_records(records.iter().cloned());
            }
        }
        Action::FetchFailed { seq, error } => {
            if settle_fetch(state, *seq) {
                state.ui.last_error = Some(error.clone());
            }
        }

        Action::AddRequested(_) => state.ui.pending.insert(PendingOp::Add),
        Action::AddSucceeded(record) => {
            state.collection.upsert(record.clone());
            state.ui.pending.remove(&PendingOp::Add);
            dismiss_dialog(&mut state.ui);
        }
        Action::AddFailed(error) => {
            state.ui.pending.remove(&PendingOp::Add);
            state.ui.last_error = Some(error.clone());
        }

        Action::UpdateRequested { id, .. } => {
            if update_in_flight(state, id) {
                state.ui.last_error = Some(ErrorInfo::new(
                    ErrorKind::Conflict,
                    format!("an update for employee {id} is already in flight"),
                ));
            } else {
                state.ui.pending.insert(PendingOp::Update(id.clone()));
            }
        }
        Action::UpdateSucceeded(record) => {
            apply_updated_record(state, record);
            settle_update(state, &record.id);
            dismiss_dialog(&mut state.ui);
        }
        Action::UpdateFailed { id, error } => {
            settle_update(state, id);
            state.ui.last_error = Some(error.clone());
        }

        Action::DeleteRequested(id) => state.ui.pending.insert(PendingOp::Delete(id.clone())),
        Action::DeleteSucceeded(id) => {
            state.collection.remove(id);
            // only an update still in flight can resurrect the record
            if state.policy == ConflictPolicy::DeleteWins && update_in_flight(state, id) {
                state.tombstones.insert(id.clone());
            }
            state.ui.pending.remove(&PendingOp::Delete(id.clone()));
            release_record(&mut state.ui, id);
        }
        Action::DeleteFailed { id, error } => {
            state.ui.pending.remove(&PendingOp::Delete(id.clone()));
            state.ui.last_error = Some(error.clone());
        }
    }
}

/// Must be evaluated against the state *before* `action` is applied.
pub fn effect_for(prior: &RosterState, action: &Action) -> Option<Effect> {
    match action {
        Action::FetchRequested => Some(Effect::Fetch {
            seq: prior.fetches.issued + 1,
        }),
        Action::AddRequested(fields) => Some(Effect::Add {
            fields: fields.clone(),
        }),
        Action::UpdateRequested { id, fields } if !update_in_flight(prior, id) => {
            Some(Effect::Update {
                id: id.clone(),
                fields: fields.clone(),
            })
        }
        Action::DeleteRequested(id) => Some(Effect::Delete { id: id.clone() }),
        _ => None,
    }
}

fn update_in_flight(state: &RosterState, id: &EmployeeId) -> bool {
    state.ui.pending.contains(&PendingOp::Update(id.clone()))
}

// false for a stale outcome, which must not touch the collection
fn settle_fetch(state: &mut RosterState, seq: u64) -> bool {
    let ledger = &mut state.fetches;
    if seq <= ledger.settled {
        return false;
    }
    ledger.issued = ledger.issued.max(seq);
    // every older fetch is superseded by this outcome
    let resolved = (seq - ledger.settled) as usize;
    ledger.settled = seq;
    state.ui.pending.remove_n(&PendingOp::Fetch, resolved);
    true
}

fn settle_update(state: &mut RosterState, id: &EmployeeId) {
    state.ui.pending.remove(&PendingOp::Update(id.clone()));
    if !update_in_flight(state, id) {
        state.tombstones.remove(id);
    }
}

fn apply_updated_record(state: &mut RosterState, record: &Employee) {
    let deleted = state.tombstones.contains(&record.id);
    if deleted && state.policy == ConflictPolicy::DeleteWins {
        return;
    }
    state.collection.upsert(record.clone());
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
