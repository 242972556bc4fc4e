use std::sync::Arc;

use crate::aggregate::ProgressAggregator;
use crate::enrollment::EnrollmentManager;
use crate::error::CoreResult;
use crate::models::*;
use crate::progress::ProgressTracker;
use crate::store::{Catalog, ProgressStore};

/// The operations the API layer calls, wired to one catalog and one store.
#[derive(Clone)]
pub struct LearningService {
    catalog: Arc<dyn Catalog>,
    enrollments: EnrollmentManager,
    tracker: ProgressTracker,
    aggregator: ProgressAggregator,
}

impl LearningService {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            enrollments: EnrollmentManager::new(catalog.clone(), store.clone()),
            tracker: ProgressTracker::new(catalog.clone(), store.clone()),
            aggregator: ProgressAggregator::new(catalog.clone(), store),
            catalog,
        }
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub async fn enroll(&self, user_id: UserId, course_id: CourseId) -> CoreResult<Enrollment> {
        self.enrollments.enroll(user_id, course_id).await
    }

    pub async fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> CoreResult<bool> {
        self.enrollments.is_enrolled(user_id, course_id).await
    }

    pub async fn set_module_completion(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completed: bool,
    ) -> CoreResult<Progress> {
        self.tracker.set_completion(user_id, module_id, completed).await
    }

    pub async fn course_progress_percent(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> CoreResult<u8> {
        self.aggregator.course_progress(user_id, course_id).await
    }

    pub async fn user_progress_summary(&self, user_id: UserId) -> CoreResult<UserSummary> {
        self.aggregator.user_summary(user_id).await
    }
}
