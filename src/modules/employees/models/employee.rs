// Employee record as stored in the department-partitioned collection.
//
// Names are validated when constructed (including during deserialization),
// so an Employee value always carries well-formed names. Department and id
// checks belong to the repository, which owns partition-key discipline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{AppError, Record, RecordKind, Result};

/// Path of the partition key inside an employee document
pub const PARTITION_KEY_PATH: &str = "/department/departmentId";

/// A validated first or last name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    pub const MIN_LENGTH: usize = 2;

    /// Validate and wrap a name; surrounding whitespace is dropped
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }

        if trimmed.chars().count() < Self::MIN_LENGTH {
            return Err(AppError::validation(format!(
                "Name '{}' must be at least {} characters",
                trimmed,
                Self::MIN_LENGTH
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PersonName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<PersonName> for String {
    fn from(name: PersonName) -> Self {
        name.0
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Department an employee belongs to; `department_id` is the partition key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub department_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
}

impl Department {
    pub fn new(department_id: impl Into<String>) -> Self {
        Self {
            department_id: department_id.into(),
            department_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.department_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl Address {
    pub fn new(street: impl Into<String>, city: impl Into<String>) -> Result<Self> {
        let street = street.into();
        let city = city.into();

        if street.trim().is_empty() {
            return Err(AppError::validation("Street cannot be empty"));
        }
        if city.trim().is_empty() {
            return Err(AppError::validation("City cannot be empty"));
        }

        Ok(Self {
            street,
            city,
            state: None,
            zip_code: None,
        })
    }
}

/// Employee document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Document id; assigned by the repository on create when blank
    #[serde(default)]
    pub id: String,

    pub employee_id: i32,

    pub first_name: PersonName,

    pub last_name: PersonName,

    #[serde(default)]
    pub position: String,

    /// Required for persistence. Kept optional so a missing department is
    /// reported as a validation failure rather than a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Employee {
    /// Create an employee with validated names and no id yet
    pub fn new(
        employee_id: i32,
        first_name: &str,
        last_name: &str,
        department: Department,
    ) -> Result<Self> {
        Ok(Self {
            id: String::new(),
            employee_id,
            first_name: PersonName::parse(first_name)?,
            last_name: PersonName::parse(last_name)?,
            position: String::new(),
            department: Some(department),
            address: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Partition key value, if a department is set
    pub fn partition_key(&self) -> Option<&str> {
        self.department
            .as_ref()
            .map(|department| department.department_id.as_str())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Employee {
    fn kind(&self) -> RecordKind {
        RecordKind::Employee
    }

    fn describe(&self) -> String {
        let mut description = format!("Employee #{} {}", self.employee_id, self.full_name());
        if !self.position.is_empty() {
            description.push_str(&format!(", {}", self.position));
        }
        if let Some(department_id) = self.partition_key() {
            description.push_str(&format!(" ({})", department_id));
        }
        description
    }
}
