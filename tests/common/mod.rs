#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use learntrack::config::Config;
use learntrack::memory::MemoryStore;
use learntrack::models::{CourseId, ModuleId, NewCourse, NewModule};
use learntrack::service::LearningService;
use learntrack::store::CatalogSeeder;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::default())
}

pub fn create_test_app_with(cfg: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let service = LearningService::new(store.clone(), store.clone());
    TestApp {
        router: learntrack::app(service, &cfg),
        store,
    }
}

/// Adds a course with `n` modules ordered 1..=n.
pub async fn add_course(store: &MemoryStore, title: &str, n: i32) -> (CourseId, Vec<ModuleId>) {
    let course = store
        .add_course(NewCourse {
            title: title.into(),
            description: Some(format!("About {title}")),
            image: Some(format!("https://images.example/{title}.jpg")),
            duration: Some("4 weeks".into()),
            level: Some("Beginner".into()),
        })
        .await
        .unwrap();
    let mut ids = Vec::new();
    for order in 1..=n {
        let m = store
            .add_module(
                course.id,
                NewModule {
                    title: format!("{title} part {order}"),
                    order,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        ids.push(m.id);
    }
    (course.id, ids)
}

pub fn get(uri: &str, user: Option<i64>) -> Request<Body> {
    let mut b = Request::builder().uri(uri);
    if let Some(u) = user {
        b = b.header("x-user-id", u.to_string());
    }
    b.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, user: i64, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user.to_string())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str, user: i64) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user.to_string())
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
