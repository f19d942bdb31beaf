use serde::{Deserialize, Serialize};

use crate::model::CourseId;

/// A college course a first-year student can pick in the pre-survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "course_id")]
    pub id: CourseId,
    #[serde(rename = "course_name")]
    pub name: String,
}

impl Course {
    #[must_use]
    pub fn new(id: CourseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
