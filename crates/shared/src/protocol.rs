use serde::{Deserialize, Serialize};

use crate::domain::EmployeeId;

pub const EMPLOYEES_ROUTE: &str = "/employees";
pub const EMPLOYEES_ALLOW: &str = "GET, POST";
pub const EMPLOYEE_ALLOW: &str = "PUT, DELETE";

pub fn employee_route(id: &EmployeeId) -> String {
    format!("{EMPLOYEES_ROUTE}/{id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}
