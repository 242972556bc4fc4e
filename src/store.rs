//! Store seams the core runs against.
//!
//! Everything is keyed by id; nothing here hands out live references into
//! another record.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::*;

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only course/module catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_course(&self, id: CourseId) -> StoreResult<Option<Course>>;

    async fn get_module(&self, id: ModuleId) -> StoreResult<Option<Module>>;

    /// Modules of a course ordered by `order`, ties broken by id.
    async fn list_modules(&self, course_id: CourseId) -> StoreResult<Vec<Module>>;

    async fn list_courses(&self) -> StoreResult<Vec<Course>>;
}

/// Enrollment and progress rows.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>>;

    /// Inserts the (user, course) enrollment unless one exists, returning
    /// whichever row ends up stored. Concurrent callers get the same row.
    async fn enroll_once(&self, user_id: UserId, course_id: CourseId) -> StoreResult<Enrollment>;

    /// Enrollments of a user, oldest first.
    async fn list_enrollments(&self, user_id: UserId) -> StoreResult<Vec<Enrollment>>;

    /// Creates or overwrites the single (user, module) progress row.
    async fn upsert_progress(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completion: Completion,
    ) -> StoreResult<Progress>;

    async fn list_progress(&self, user_id: UserId) -> StoreResult<Vec<Progress>>;

    async fn list_progress_for_modules(
        &self,
        user_id: UserId,
        module_ids: &[ModuleId],
    ) -> StoreResult<Vec<Progress>>;
}

/// Catalog writes, used by seeding and fixtures only.
#[async_trait]
pub trait CatalogSeeder: Send + Sync {
    async fn is_empty(&self) -> StoreResult<bool>;

    async fn add_course(&self, course: NewCourse) -> StoreResult<Course>;

    async fn add_module(&self, course_id: CourseId, module: NewModule) -> StoreResult<Module>;
}
