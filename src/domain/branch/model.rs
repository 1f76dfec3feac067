//! Branch domain entity

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Shop branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub id: i32,
    /// Short unique code, e.g. "DT-01"
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// New, not yet persisted branch (id is assigned by the store)
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            code: code.into(),
            name: name.into(),
            address: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
