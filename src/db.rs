use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{query, query_as, query_scalar, Pool, Postgres};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::*;
use crate::store::{Catalog, CatalogSeeder, ProgressStore, StoreResult};

pub type Db = Pool<Postgres>;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

pub async fn connect(url: &str, cfg: &Config) -> Result<Db, StoreError> {
    Ok(PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect(url)
        .await?)
}

pub async fn migrate(db: &Db) -> Result<(), StoreError> {
    // crate-relative path for sqlx migrations
    sqlx::migrate!("./migrations").run(db).await?;
    Ok(())
}

fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        match db.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::MissingReference,
            Some(UNIQUE_VIOLATION) => return StoreError::Conflict(db.message().to_string()),
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    id: i64,
    user_id: i64,
    module_id: i64,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl From<ProgressRow> for Progress {
    fn from(r: ProgressRow) -> Self {
        // completed = (completed_at IS NOT NULL) is a table CHECK
        let completion = match (r.completed, r.completed_at) {
            (true, Some(at)) => Completion::Completed { at },
            _ => Completion::Incomplete,
        };
        Progress {
            id: r.id,
            user_id: r.user_id,
            module_id: r.module_id,
            completion,
        }
    }
}

const COURSE_COLS: &str = "id, title, description, image, duration, level, created_at";
const MODULE_COLS: &str = r#"id, course_id, title, content, video_url, "order""#;
const ENROLLMENT_COLS: &str = "id, user_id, course_id, enrolled_at";
const PROGRESS_COLS: &str = "id, user_id, module_id, completed, completed_at";

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Catalog for PgStore {
    async fn get_course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLS} FROM courses WHERE id=$1");
        Ok(query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn get_module(&self, id: ModuleId) -> StoreResult<Option<Module>> {
        let sql = format!("SELECT {MODULE_COLS} FROM modules WHERE id=$1");
        Ok(query_as::<_, Module>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn list_modules(&self, course_id: CourseId) -> StoreResult<Vec<Module>> {
        let sql = format!(
            r#"SELECT {MODULE_COLS} FROM modules WHERE course_id=$1 ORDER BY "order", id"#
        );
        Ok(query_as::<_, Module>(&sql)
            .bind(course_id)
            .fetch_all(&self.db)
            .await?)
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLS} FROM courses ORDER BY id");
        Ok(query_as::<_, Course>(&sql).fetch_all(&self.db).await?)
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>> {
        let sql =
            format!("SELECT {ENROLLMENT_COLS} FROM enrollments WHERE user_id=$1 AND course_id=$2");
        Ok(query_as::<_, Enrollment>(&sql)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(&self.db)
            .await?)
    }

    async fn enroll_once(&self, user_id: UserId, course_id: CourseId) -> StoreResult<Enrollment> {
        let sql = format!(
            r#"
            INSERT INTO enrollments (user_id, course_id)
            VALUES ($1,$2)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING {ENROLLMENT_COLS}
            "#
        );
        let inserted = query_as::<_, Enrollment>(&sql)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(&self.db)
            .await
            .map_err(classify)?;
        if let Some(row) = inserted {
            return Ok(row);
        }

        // Lost the race (or already enrolled): the winner's row is committed.
        self.find_enrollment(user_id, course_id)
            .await?
            .ok_or_else(|| {
                StoreError::Conflict(format!(
                    "enrollment ({user_id}, {course_id}) vanished after conflict"
                ))
            })
    }

    async fn list_enrollments(&self, user_id: UserId) -> StoreResult<Vec<Enrollment>> {
        let sql = format!("SELECT {ENROLLMENT_COLS} FROM enrollments WHERE user_id=$1 ORDER BY id");
        Ok(query_as::<_, Enrollment>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?)
    }

    async fn upsert_progress(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completion: Completion,
    ) -> StoreResult<Progress> {
        let sql = format!(
            r#"
            INSERT INTO progress (user_id, module_id, completed, completed_at)
            VALUES ($1,$2,$3,$4)
            ON CONFLICT (user_id, module_id)
            DO UPDATE SET completed=EXCLUDED.completed, completed_at=EXCLUDED.completed_at
            RETURNING {PROGRESS_COLS}
            "#
        );
        let row = query_as::<_, ProgressRow>(&sql)
            .bind(user_id)
            .bind(module_id)
            .bind(completion.is_completed())
            .bind(completion.completed_at())
            .fetch_one(&self.db)
            .await
            .map_err(classify)?;
        Ok(row.into())
    }

    async fn list_progress(&self, user_id: UserId) -> StoreResult<Vec<Progress>> {
        let sql = format!("SELECT {PROGRESS_COLS} FROM progress WHERE user_id=$1 ORDER BY module_id");
        let rows = query_as::<_, ProgressRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Progress::from).collect())
    }

    async fn list_progress_for_modules(
        &self,
        user_id: UserId,
        module_ids: &[ModuleId],
    ) -> StoreResult<Vec<Progress>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {PROGRESS_COLS} FROM progress WHERE user_id=$1 AND module_id = ANY($2) ORDER BY module_id"
        );
        let rows = query_as::<_, ProgressRow>(&sql)
            .bind(user_id)
            .bind(module_ids.to_vec())
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Progress::from).collect())
    }
}

#[async_trait]
impl CatalogSeeder for PgStore {
    async fn is_empty(&self) -> StoreResult<bool> {
        let n: i64 = query_scalar("SELECT count(*) FROM courses")
            .fetch_one(&self.db)
            .await?;
        Ok(n == 0)
    }

    async fn add_course(&self, course: NewCourse) -> StoreResult<Course> {
        let sql = format!(
            r#"
            INSERT INTO courses (title, description, image, duration, level)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING {COURSE_COLS}
            "#
        );
        Ok(query_as::<_, Course>(&sql)
            .bind(course.title)
            .bind(course.description)
            .bind(course.image)
            .bind(course.duration)
            .bind(course.level)
            .fetch_one(&self.db)
            .await?)
    }

    async fn add_module(&self, course_id: CourseId, module: NewModule) -> StoreResult<Module> {
        let sql = format!(
            r#"
            INSERT INTO modules (course_id, title, content, video_url, "order")
            VALUES ($1,$2,$3,$4,$5)
            RETURNING {MODULE_COLS}
            "#
        );
        let row = query_as::<_, Module>(&sql)
            .bind(course_id)
            .bind(module.title)
            .bind(module.content)
            .bind(module.video_url)
            .bind(module.order)
            .fetch_one(&self.db)
            .await
            .map_err(classify)?;
        Ok(row)
    }
}

/// Removes every row; used to reset a scratch database.
pub async fn truncate_all(db: &Db) -> Result<(), StoreError> {
    query("TRUNCATE progress, enrollments, modules, courses RESTART IDENTITY")
        .execute(db)
        .await?;
    Ok(())
}
