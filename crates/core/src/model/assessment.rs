use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{AssessmentId, CourseId, DataSetId, UserId};

/// Backend-reported completion percentage of the current attempt.
///
/// Always within `[0, 100]`; out-of-range input is clamped and NaN becomes 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "f64")]
pub struct Progress(f64);

impl Progress {
    pub const NONE: Progress = Progress(0.0);
    pub const COMPLETE: Progress = Progress(100.0);

    #[must_use]
    pub fn new(percent: f64) -> Self {
        if percent.is_nan() {
            return Self::NONE;
        }
        Self(percent.clamp(0.0, 100.0))
    }

    #[must_use]
    pub fn percent(self) -> f64 {
        self.0
    }

    /// Rounded whole percentage for display.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded(self) -> u8 {
        self.0.round() as u8
    }

    /// Started but not finished (`0 < p < 100`).
    #[must_use]
    pub fn is_partial(self) -> bool {
        self.0 > 0.0 && self.0 < 100.0
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.0 >= 100.0
    }
}

impl From<f64> for Progress {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// The backend sends `null` for attempts that have no saved answers yet.
impl From<Option<f64>> for Progress {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NONE, Self::new)
    }
}

impl From<Progress> for f64 {
    fn from(value: Progress) -> Self {
        value.0
    }
}

/// The buffer question asked before the first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreSurvey {
    is_first_year: Option<bool>,
    course: Option<CourseId>,
}

impl PreSurvey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_existing(is_first_year: Option<bool>, course: Option<CourseId>) -> Self {
        let mut survey = Self::new();
        if let Some(first_year) = is_first_year {
            survey.answer_first_year(first_year);
        }
        if survey.is_first_year == Some(true) {
            survey.course = course;
        }
        survey
    }

    /// Record the first-year answer. "No" drops any selected course.
    pub fn answer_first_year(&mut self, is_first_year: bool) {
        self.is_first_year = Some(is_first_year);
        if !is_first_year {
            self.course = None;
        }
    }

    pub fn select_course(&mut self, course: Option<CourseId>) {
        self.course = course;
    }

    #[must_use]
    pub fn is_first_year(&self) -> Option<bool> {
        self.is_first_year
    }

    #[must_use]
    pub fn course(&self) -> Option<CourseId> {
        self.course
    }

    /// The first-year question is answered and, for first-years, a course is chosen.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self.is_first_year {
            None => false,
            Some(true) => self.course.is_some(),
            Some(false) => true,
        }
    }
}

/// Snapshot of an attempt the backend already holds for (user, dataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingAssessment {
    pub assessment_id: AssessmentId,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default)]
    pub is_first_year: Option<bool>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of the create-attempt request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssessment {
    pub user_id: UserId,
    pub data_set_id: DataSetId,
    pub is_first_year: bool,
    pub course_id: Option<CourseId>,
}
