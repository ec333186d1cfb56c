use shared::domain::{EmployeeFields, EmployeeId};
use thiserror::Error;

use crate::{
    actions::Action,
    state::{RosterState, UiState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(EmployeeId),
}

/// Closes the dialog and drops its selection. `last_error` is left alone: it may
/// belong to another operation.
pub(crate) fn dismiss_dialog(ui: &mut UiState) {
    ui.is_modal_open = false;
    ui.selected = None;
}

/// User cancel: also acknowledges the shown error.
pub(crate) fn close_modal(ui: &mut UiState) {
    dismiss_dialog(ui);
    ui.last_error = None;
}

pub(crate) fn release_record(ui: &mut UiState, id: &EmployeeId) {
    if ui.selected.as_ref() == Some(id) {
        dismiss_dialog(ui);
    }
}

pub fn edit_intents(id: EmployeeId) -> [Action; 2] {
    [Action::SetSelected(Some(id)), Action::SetModalOpen(true)]
}

pub fn add_intents() -> [Action; 2] {
    [Action::SetSelected(None), Action::SetModalOpen(true)]
}

pub fn cancel_intent() -> Action {
    Action::SetModalOpen(false)
}

pub fn submit_intent(state: &RosterState, fields: EmployeeFields) -> Action {
    match &state.ui.selected {
        Some(id) => Action::UpdateRequested {
            id: id.clone(),
            fields,
        },
        None => Action::AddRequested(fields),
    }
}

pub fn form_mode(state: &RosterState) -> Option<FormMode> {
    if !state.ui.is_modal_open {
        return None;
    }
    Some(match &state.ui.selected {
        Some(id) => FormMode::Edit(id.clone()),
        None => FormMode::Add,
    })
}

/// An edit whose record disappeared from the collection falls back to empty fields.
pub fn form_prefill(state: &RosterState) -> Option<EmployeeFields> {
    match form_mode(state)? {
        FormMode::Add => Some(EmployeeFields::default()),
        FormMode::Edit(id) => Some(
            state
                .collection
                .get(&id)
                .map(|record| record.fields())
                .unwrap_or_default(),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("employee {0} appears more than once")]
    DuplicateId(EmployeeId),
    #[error("employee {later} is ordered after older record {earlier}")]
    OutOfOrder {
        earlier: EmployeeId,
        later: EmployeeId,
    },
    #[error("fetch {settled} settled before it was issued (issued {issued})")]
    FetchLedger { issued: u64, settled: u64 },
}

// Form values are derived from the collection on demand and never stored, so
// there is nothing to check for a closed dialog.
pub fn check_invariants(state: &RosterState) -> Result<(), InvariantViolation> {
    let records = state.employees();
    let mut seen = std::collections::HashSet::new();
    for record in records {
        if !seen.insert(&record.id) {
            return Err(InvariantViolation::DuplicateId(record.id.clone()));
        }
    }
    for pair in records.windows(2) {
        if pair[0].created_at < pair[1].created_at {
            return Err(InvariantViolation::OutOfOrder {
                earlier: pair[0].id.clone(),
                later: pair[1].id.clone(),
            });
        }
    }
    if state.fetches.settled > state.fetches.issued {
        return Err(InvariantViolation::FetchLedger {
            issued: state.fetches.issued,
            settled: state.fetches.settled,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
