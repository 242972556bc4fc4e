use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, BoolFromInt, PickFirst};

use crate::error::CoreError;

pub type UserId = i64;
pub type CourseId = i64;
pub type ModuleId = i64;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewModule {
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order: i32,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

/// Completion state of one module for one user.
///
/// The stamp only exists on the `Completed` side, so a completed row can
/// never lack a timestamp and an incomplete row can never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Incomplete,
    Completed { at: DateTime<Utc> },
}

impl Completion {
    /// Builds the state requested by a toggle, stamping `now` when completed.
    pub fn from_flag(completed: bool, now: DateTime<Utc>) -> Self {
        if completed {
            Completion::Completed { at: now }
        } else {
            Completion::Incomplete
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Completion::Completed { .. })
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Completion::Completed { at } => Some(*at),
            Completion::Incomplete => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(into = "ProgressView")]
pub struct Progress {
    pub id: i64,
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub completion: Completion,
}

impl Progress {
    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }
}

/// Flat wire form of [`Progress`].
#[derive(Serialize, Debug, Clone)]
struct ProgressView {
    id: i64,
    user_id: UserId,
    module_id: ModuleId,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl From<Progress> for ProgressView {
    fn from(p: Progress) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            module_id: p.module_id,
            completed: p.completion.is_completed(),
            completed_at: p.completion.completed_at(),
        }
    }
}

/// Body of a completion update. `completed` accepts `true`/`false` or the
/// legacy integer encoding `1`/`0`.
#[serde_as]
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct CompletionFlag {
    #[serde_as(as = "PickFirst<(_, BoolFromInt)>")]
    pub completed: bool,
}

impl CompletionFlag {
    pub fn parse(body: serde_json::Value) -> Result<bool, CoreError> {
        serde_json::from_value::<CompletionFlag>(body)
            .map(|f| f.completed)
            .map_err(|e| CoreError::Validation(format!("invalid completion flag: {e}")))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseBreakdown {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub progress: u8,
    pub enrolled: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    #[serde(rename = "enrolledCourses")]
    pub enrolled_course_count: usize,
    #[serde(rename = "completedModules")]
    pub completed_module_count: usize,
    #[serde(rename = "enrolledCoursesData")]
    pub courses: Vec<CourseBreakdown>,
}
