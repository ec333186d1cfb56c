use shared::{
    domain::EmployeeId,
    error::{ErrorInfo, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("server rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("employee {id} not found")]
    NotFound { id: EmployeeId },
    #[error("malformed response payload: {message}")]
    Malformed { message: String },
    #[error("invalid directory url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DirectoryError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let message = self.to_string();
        match self {
            Self::Transport { .. } => ErrorInfo::new(ErrorKind::Transport, message),
            Self::Rejected { status, .. } => {
                ErrorInfo::new(ErrorKind::ServerRejected, message).with_status(*status)
            }
            Self::NotFound { .. } => ErrorInfo::new(ErrorKind::NotFound, message).with_status(404),
            Self::Malformed { .. } => ErrorInfo::new(ErrorKind::MalformedPayload, message),
            Self::InvalidUrl(_) => ErrorInfo::new(ErrorKind::Transport, message),
        }
    }
}

impl From<DirectoryError> for ErrorInfo {
    fn from(value: DirectoryError) -> Self {
        value.to_error_info()
    }
}

pub(crate) fn classify_reqwest_error(err: &reqwest::Error) -> DirectoryError {
    if err.is_decode() {
        DirectoryError::Malformed {
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        DirectoryError::transport(format!("request timed out: {err}"))
    } else {
        DirectoryError::transport(err.to_string())
    }
}
