use shared::{
    domain::{Employee, EmployeeFields, EmployeeId},
    error::ErrorInfo,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetModalOpen(bool),
    /// `None` selects the "new record" form.
    SetSelected(Option<EmployeeId>),
    FetchRequested,
    FetchSucceeded {
        seq: u64,
        records: Vec<Employee>,
    },
    FetchFailed {
        seq: u64,
        error: ErrorInfo,
    },
    AddRequested(EmployeeFields),
    AddSucceeded(Employee),
    AddFailed(ErrorInfo),
    UpdateRequested {
        id: EmployeeId,
        fields: EmployeeFields,
    },
    UpdateSucceeded(Employee),
    UpdateFailed {
        id: EmployeeId,
        error: ErrorInfo,
    },
    DeleteRequested(EmployeeId),
    DeleteSucceeded(EmployeeId),
    DeleteFailed {
        id: EmployeeId,
        error: ErrorInfo,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetModalOpen(_) => "set_modal_open",
            Action::SetSelected(_) => "set_selected",
            Action::FetchRequested => "fetch_requested",
            Action::FetchSucceeded { .. } => "fetch_succeeded",
            Action::FetchFailed { .. } => "fetch_failed",
            Action::AddRequested(_) => "add_requested",
            Action::AddSucceeded(_) => "add_succeeded",
            Action::AddFailed(_) => "add_failed",
            Action::UpdateRequested { .. } => "update_requested",
            Action::UpdateSucceeded(_) => "update_succeeded",
            Action::UpdateFailed { .. } => "update_failed",
            Action::DeleteRequested(_) => "delete_requested",
            Action::DeleteSucceeded(_) => "delete_succeeded",
            Action::DeleteFailed { .. } => "delete_failed",
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Action::FetchRequested
                | Action::AddRequested(_)
                | Action::UpdateRequested { .. }
                | Action::DeleteRequested(_)
        )
    }

    pub fn is_outcome(&self) -> bool {
        !self.is_request() && !matches!(self, Action::SetModalOpen(_) | Action::SetSelected(_))
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Action::FetchFailed { error, .. }
            | Action::UpdateFailed { error, .. }
            | Action::DeleteFailed { error, .. } => Some(error),
            Action::AddFailed(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorKind;

    #[test]
    fn classifies_requests_and_outcomes() {
        let id = EmployeeId::new("7");
        assert!(Action::FetchRequested.is_request());
        assert!(Action::DeleteRequested(id.clone()).is_request());
        assert!(Action::DeleteSucceeded(id.clone()).is_outcome());
        assert!(!Action::SetModalOpen(true).is_request());
        assert!(!Action::SetSelected(Some(id)).is_outcome());
    }

    #[test]
    fn exposes_failure_payload() {
        let error = ErrorInfo::new(ErrorKind::Transport, "offline");
        let action = Action::AddFailed(error.clone());
        assert_eq!(action.error(), Some(&error));
        assert_eq!(action.name(), "add_failed");
        assert_eq!(Action::FetchRequested.error(), None);
    }
}
