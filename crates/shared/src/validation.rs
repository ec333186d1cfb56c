use std::{fmt, sync::OnceLock};

use regex::Regex;
use thiserror::Error;

use crate::domain::EmployeeFields;

pub const PHONE_MIN_DIGITS: usize = 11;
pub const PHONE_MAX_DIGITS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Address,
    Phone,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Address => "address",
            Field::Phone => "phone",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.0))]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|err| err.field == field)
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| err.message)
        .collect::<Vec<_>>()
        .join(" ")
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,4}$").expect("static email pattern")
    })
}

pub fn validate_fields(fields: &EmployeeFields) -> Result<(), FieldErrors> {
    let mut errors = Vec::new();

    if fields.name.trim().is_empty() {
        errors.push(FieldError {
            field: Field::Name,
            message: "Full name is required!",
        });
    }

    if fields.email.trim().is_empty() {
        errors.push(FieldError {
            field: Field::Email,
            message: "Email is required!",
        });
    } else if !email_pattern().is_match(fields.email.trim()) {
        errors.push(FieldError {
            field: Field::Email,
            message: "Invalid email address!",
        });
    }

    if fields.address.trim().is_empty() {
        errors.push(FieldError {
            field: Field::Address,
            message: "Address is required!",
        });
    }

    let phone = fields.phone.trim();
    if phone.is_empty() {
        errors.push(FieldError {
            field: Field::Phone,
            message: "Phone is required!",
        });
    } else if !phone.chars().all(|c| c.is_ascii_digit()) {
        errors.push(FieldError {
            field: Field::Phone,
            message: "Phone must contain digits only",
        });
    } else if phone.len() < PHONE_MIN_DIGITS {
        errors.push(FieldError {
            field: Field::Phone,
            message: "Minimum of 11 digits",
        });
    } else if phone.len() > PHONE_MAX_DIGITS {
        errors.push(FieldError {
            field: Field::Phone,
            message: "Maximum of 12 digits",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(FieldErrors(errors))
    }
}
