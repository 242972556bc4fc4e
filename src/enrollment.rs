use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::models::{CourseId, Enrollment, UserId};
use crate::store::{Catalog, ProgressStore};

#[derive(Clone)]
pub struct EnrollmentManager {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ProgressStore>,
}

impl EnrollmentManager {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self { catalog, store }
    }

    /// Enrolls `user_id` in `course_id`, or returns the existing enrollment.
    pub async fn enroll(&self, user_id: UserId, course_id: CourseId) -> CoreResult<Enrollment> {
        if self.catalog.get_course(course_id).await?.is_none() {
            return Err(CoreError::course(course_id));
        }
        self.store
            .enroll_once(user_id, course_id)
            .await
            .map_err(|e| CoreError::from_store(e, CoreError::course(course_id)))
    }

    pub async fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> CoreResult<bool> {
        Ok(self
            .store
            .find_enrollment(user_id, course_id)
            .await?
            .is_some())
    }
}
