use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::models::{Course, CourseBreakdown, CourseId, UserId, UserSummary};
use crate::store::{Catalog, ProgressStore};

/// floor(100 * completed / total); an empty course is 0%.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    (completed * 100 / total) as u8
}

/// Derived progress figures. Recomputed from the store on every call.
#[derive(Clone)]
pub struct ProgressAggregator {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ProgressStore>,
}

impl ProgressAggregator {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self { catalog, store }
    }

    pub async fn course_progress(&self, user_id: UserId, course_id: CourseId) -> CoreResult<u8> {
        if self.catalog.get_course(course_id).await?.is_none() {
            return Err(CoreError::course(course_id));
        }
        self.percent_for(user_id, course_id).await
    }

    async fn percent_for(&self, user_id: UserId, course_id: CourseId) -> CoreResult<u8> {
        let modules = self.catalog.list_modules(course_id).await?;
        let ids: Vec<_> = modules.iter().map(|m| m.id).collect();
        let done: HashSet<_> = self
            .store
            .list_progress_for_modules(user_id, &ids)
            .await?
            .into_iter()
            .filter(|p| p.is_completed())
            .map(|p| p.module_id)
            .collect();
        Ok(percent(done.len(), modules.len()))
    }

    /// Enrollment count, global completed-module count and a per-course
    /// breakdown for the user's enrollments.
    ///
    /// `completed_module_count` counts every completed progress row the user
    /// has, not only those under courses they are enrolled in.
    pub async fn user_summary(&self, user_id: UserId) -> CoreResult<UserSummary> {
        let enrollments = self.store.list_enrollments(user_id).await?;
        let completed_module_count = self
            .store
            .list_progress(user_id)
            .await?
            .iter()
            .filter(|p| p.is_completed())
            .count();

        let mut courses = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let Some(course) = self.catalog.get_course(enrollment.course_id).await? else {
                continue;
            };
            let progress = self.percent_for(user_id, course.id).await?;
            courses.push(breakdown(course, progress));
        }

        Ok(UserSummary {
            enrolled_course_count: enrollments.len(),
            completed_module_count,
            courses,
        })
    }
}

fn breakdown(course: Course, progress: u8) -> CourseBreakdown {
    CourseBreakdown {
        id: course.id,
        title: course.title,
        description: course.description,
        thumbnail: course.image,
        progress,
        enrolled: true,
    }
}
