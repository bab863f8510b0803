use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of record held in the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Employee,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Employee => write!(f, "employee"),
        }
    }
}

/// Capability shared by every persisted person record
pub trait Record {
    /// Which kind of record this is
    fn kind(&self) -> RecordKind;

    /// Human readable one-line description
    fn describe(&self) -> String;
}
