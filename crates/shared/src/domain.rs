use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned record identity. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFields {
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn from_fields(id: EmployeeId, fields: EmployeeFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: fields.name,
            email: fields.email,
            address: fields.address,
            phone: fields.phone,
            created_at,
        }
    }

    pub fn fields(&self) -> EmployeeFields {
        EmployeeFields {
            name: self.name.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
        }
    }
}

// Numeric form inputs reach the store as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_uses_store_field_names() {
        let raw = r#"{
            "_id": "65a1",
            "name": "Ann",
            "email": "ann@example.com",
            "address": "1 Main St",
            "phone": 12345678901,
            "createdAt": "2024-03-01T10:00:00Z"
        }"#;
        let employee: Employee = serde_json::from_str(raw).expect("decode");
        assert_eq!(employee.id, EmployeeId::new("65a1"));
        assert_eq!(employee.phone, "12345678901");

        let encoded = serde_json::to_value(&employee).expect("encode");
        assert_eq!(encoded["_id"], "65a1");
        assert_eq!(encoded["createdAt"], "2024-03-01T10:00:00Z");
    }

    #[test]
    fn fields_round_trip_through_record() {
        let fields = EmployeeFields {
            name: "Bo".into(),
            email: "bo@example.com".into(),
            address: "2 Side St".into(),
            phone: "098765432109".into(),
        };
        let created_at = "2024-03-01T10:00:00Z".parse().expect("timestamp");
        let employee = Employee::from_fields(EmployeeId::new("b"), fields.clone(), created_at);
        assert_eq!(employee.fields(), fields);
    }
}
