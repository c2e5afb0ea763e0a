use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::StudentId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student name cannot be empty")]
    EmptyName,
}

/// A student whose sessions are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    name: String,
    teacher_name: Option<String>,
    start_date: Option<NaiveDate>,
}

impl Student {
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` if the trimmed name is empty.
    pub fn new(
        id: StudentId,
        name: impl Into<String>,
        teacher_name: Option<String>,
        start_date: Option<NaiveDate>,
    ) -> Result<Self, StudentError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        let teacher_name = teacher_name
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Ok(Self {
            id,
            name,
            teacher_name,
            start_date,
        })
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn teacher_name(&self) -> Option<&str> {
        self.teacher_name.as_deref()
    }

    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }
}
