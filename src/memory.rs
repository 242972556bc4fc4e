use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::models::*;
use crate::store::{Catalog, CatalogSeeder, ProgressStore, StoreResult};

#[derive(Default)]
struct Tables {
    courses: BTreeMap<CourseId, Course>,
    modules: BTreeMap<ModuleId, Module>,
    enrollments: BTreeMap<(UserId, CourseId), Enrollment>,
    progress: BTreeMap<(UserId, ModuleId), Progress>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Every read-then-write happens under one lock, which
/// gives the same per-key convergence the Postgres unique indexes give.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enrollment_count(&self) -> usize {
        self.tables.lock().enrollments.len()
    }

    pub fn progress_count(&self) -> usize {
        self.tables.lock().progress.len()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn get_course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        Ok(self.tables.lock().courses.get(&id).cloned())
    }

    async fn get_module(&self, id: ModuleId) -> StoreResult<Option<Module>> {
        Ok(self.tables.lock().modules.get(&id).cloned())
    }

    async fn list_modules(&self, course_id: CourseId) -> StoreResult<Vec<Module>> {
        let t = self.tables.lock();
        let mut modules: Vec<Module> = t
            .modules
            .values()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| (m.order, m.id));
        Ok(modules)
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        Ok(self.tables.lock().courses.values().cloned().collect())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>> {
        Ok(self
            .tables
            .lock()
            .enrollments
            .get(&(user_id, course_id))
            .cloned())
    }

    async fn enroll_once(&self, user_id: UserId, course_id: CourseId) -> StoreResult<Enrollment> {
        let mut t = self.tables.lock();
        if !t.courses.contains_key(&course_id) {
            return Err(StoreError::MissingReference);
        }
        if let Some(existing) = t.enrollments.get(&(user_id, course_id)) {
            return Ok(existing.clone());
        }
        let enrollment = Enrollment {
            id: t.next_id(),
            user_id,
            course_id,
            enrolled_at: Utc::now(),
        };
        t.enrollments
            .insert((user_id, course_id), enrollment.clone());
        Ok(enrollment)
    }

    async fn list_enrollments(&self, user_id: UserId) -> StoreResult<Vec<Enrollment>> {
        let t = self.tables.lock();
        let mut rows: Vec<Enrollment> = t
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.id);
        Ok(rows)
    }

    async fn upsert_progress(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completion: Completion,
    ) -> StoreResult<Progress> {
        let mut t = self.tables.lock();
        if !t.modules.contains_key(&module_id) {
            return Err(StoreError::MissingReference);
        }
        let id = match t.progress.get(&(user_id, module_id)) {
            Some(existing) => existing.id,
            None => t.next_id(),
        };
        let row = Progress {
            id,
            user_id,
            module_id,
            completion,
        };
        t.progress.insert((user_id, module_id), row.clone());
        Ok(row)
    }

    async fn list_progress(&self, user_id: UserId) -> StoreResult<Vec<Progress>> {
        Ok(self
            .tables
            .lock()
            .progress
            .range((user_id, ModuleId::MIN)..=(user_id, ModuleId::MAX))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn list_progress_for_modules(
        &self,
        user_id: UserId,
        module_ids: &[ModuleId],
    ) -> StoreResult<Vec<Progress>> {
        let t = self.tables.lock();
        Ok(module_ids
            .iter()
            .filter_map(|m| t.progress.get(&(user_id, *m)).cloned())
            .collect())
    }
}

#[async_trait]
impl CatalogSeeder for MemoryStore {
    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.tables.lock().courses.is_empty())
    }

    async fn add_course(&self, course: NewCourse) -> StoreResult<Course> {
        let mut t = self.tables.lock();
        let row = Course {
            id: t.next_id(),
            title: course.title,
            description: course.description,
            image: course.image,
            duration: course.duration,
            level: course.level,
            created_at: Utc::now(),
        };
        t.courses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn add_module(&self, course_id: CourseId, module: NewModule) -> StoreResult<Module> {
        let mut t = self.tables.lock();
        if !t.courses.contains_key(&course_id) {
            return Err(StoreError::MissingReference);
        }
        let row = Module {
            id: t.next_id(),
            course_id,
            title: module.title,
            content: module.content,
            video_url: module.video_url,
            order: module.order,
        };
        t.modules.insert(row.id, row.clone());
        Ok(row)
    }
}
