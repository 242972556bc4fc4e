use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::CoreError;
use crate::identity::{CurrentUser, IdentityConfig};
use crate::models::*;
use crate::service::LearningService;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub service: LearningService,
    pub identity: IdentityConfig,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        // catalog views annotated for the caller
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:course_id", get(course_detail))
        .route("/api/courses/:course_id/modules", get(list_modules))
        // enrollment
        .route("/api/courses/:course_id/enroll", post(enroll))
        .route("/api/courses/:course_id/enrollment", get(enrollment_status))
        // progress
        .route("/api/courses/:course_id/progress", get(course_progress))
        .route("/api/courses/modules/:module_id/progress", post(set_module_progress))
        .route("/api/users/progress", get(user_progress))
        .with_state(state)
}

#[derive(Serialize)]
struct CourseView {
    #[serde(flatten)]
    course: Course,
    enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<u8>,
    modules: Vec<Module>,
}

#[derive(Serialize)]
struct EnrollmentStatus {
    course_id: CourseId,
    enrolled: bool,
}

#[derive(Serialize)]
struct CourseProgress {
    course_id: CourseId,
    progress: u8,
}

async fn list_courses(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<CourseView>> {
    let courses = svc.catalog().list_courses().await.map_err(e500)?;
    let mut out = Vec::with_capacity(courses.len());
    for course in courses {
        let enrolled = svc.is_enrolled(user, course.id).await.map_err(reject)?;
        let modules = svc.catalog().list_modules(course.id).await.map_err(e500)?;
        out.push(CourseView {
            course,
            enrolled,
            progress: None,
            modules,
        });
    }
    Ok(Json(out))
}

async fn course_detail(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<CourseId>,
) -> ApiResult<CourseView> {
    let course = svc
        .catalog()
        .get_course(course_id)
        .await
        .map_err(e500)?
        .ok_or_else(|| reject(CoreError::course(course_id)))?;
    let enrolled = svc.is_enrolled(user, course_id).await.map_err(reject)?;
    let progress = svc
        .course_progress_percent(user, course_id)
        .await
        .map_err(reject)?;
    let modules = svc.catalog().list_modules(course_id).await.map_err(e500)?;

    Ok(Json(CourseView {
        course,
        enrolled,
        progress: Some(progress),
        modules,
    }))
}

async fn list_modules(
    State(svc): State<LearningService>,
    Path(course_id): Path<CourseId>,
) -> ApiResult<Vec<Module>> {
    Ok(Json(
        svc.catalog().list_modules(course_id).await.map_err(e500)?,
    ))
}

async fn enroll(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<CourseId>,
) -> ApiResult<Enrollment> {
    Ok(Json(svc.enroll(user, course_id).await.map_err(reject)?))
}

async fn enrollment_status(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<CourseId>,
) -> ApiResult<EnrollmentStatus> {
    let enrolled = svc.is_enrolled(user, course_id).await.map_err(reject)?;
    Ok(Json(EnrollmentStatus { course_id, enrolled }))
}

async fn course_progress(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<CourseId>,
) -> ApiResult<CourseProgress> {
    let progress = svc
        .course_progress_percent(user, course_id)
        .await
        .map_err(reject)?;
    Ok(Json(CourseProgress { course_id, progress }))
}

async fn set_module_progress(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
    Path(module_id): Path<ModuleId>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Progress> {
    let completed = CompletionFlag::parse(body).map_err(reject)?;
    let progress = svc
        .set_module_completion(user, module_id, completed)
        .await
        .map_err(reject)?;
    Ok(Json(progress))
}

async fn user_progress(
    State(svc): State<LearningService>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UserSummary> {
    Ok(Json(svc.user_progress_summary(user).await.map_err(reject)?))
}

// --- helpers ---
fn reject(e: CoreError) -> (StatusCode, String) {
    match e {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        CoreError::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        CoreError::Store(_) => e500(e),
    }
}

fn e500<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error=%e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
