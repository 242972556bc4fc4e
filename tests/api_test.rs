use axum::http::StatusCode;
use chrono::{Duration, Utc};
use learntrack::config::Config;
use learntrack::identity::IdentityConfig;
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::*;

#[tokio::test]
async fn test_health() {
    let app = create_test_app();
    let res = app.router.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthorized_without_user() {
    let app = create_test_app();
    let res = app
        .router
        .oneshot(get("/api/users/progress", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_rejected() {
    let app = create_test_app_with(Config {
        identity: IdentityConfig {
            token_lifetime_minutes: 10,
        },
        ..Config::default()
    });
    let issued = (Utc::now() - Duration::minutes(11)).to_rfc3339();
    let req = axum::http::Request::builder()
        .uri("/api/courses")
        .header("x-user-id", "1")
        .header("x-session-issued-at", issued)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.router.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_huge_session_lifetime_accepts_fresh_session() {
    let app = create_test_app_with(Config {
        identity: IdentityConfig {
            token_lifetime_minutes: i64::MAX,
        },
        ..Config::default()
    });
    let req = axum::http::Request::builder()
        .uri("/api/courses")
        .header("x-user-id", "1")
        .header("x-session-issued-at", Utc::now().to_rfc3339())
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.router.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_enroll_twice_keeps_one_row() {
    let app = create_test_app();
    let (course, _) = add_course(&app.store, "hiv", 2).await;
    let uri = format!("/api/courses/{course}/enroll");

    let first = app.router.clone().oneshot(post_empty(&uri, 1)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;

    let second = app.router.clone().oneshot(post_empty(&uri, 1)).await.unwrap();
    let second = json_body(second).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(app.store.enrollment_count(), 1);

    let status = app
        .router
        .oneshot(get(&format!("/api/courses/{course}/enrollment"), Some(1)))
        .await
        .unwrap();
    assert_eq!(json_body(status).await["enrolled"], json!(true));
}

#[tokio::test]
async fn test_enroll_unknown_course_is_404() {
    let app = create_test_app();
    let res = app
        .router
        .oneshot(post_empty("/api/courses/999/enroll", 1))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.enrollment_count(), 0);
}

#[tokio::test]
async fn test_progress_toggle_clears_timestamp() {
    let app = create_test_app();
    let (_, mods) = add_course(&app.store, "testing", 1).await;
    let uri = format!("/api/courses/modules/{}/progress", mods[0]);

    let on = app
        .router
        .clone()
        .oneshot(post_json(&uri, 3, json!({ "completed": true })))
        .await
        .unwrap();
    assert_eq!(on.status(), StatusCode::OK);
    let on = json_body(on).await;
    assert_eq!(on["completed"], json!(true));
    assert!(on["completed_at"].is_string());

    let off = app
        .router
        .oneshot(post_json(&uri, 3, json!({ "completed": 0 })))
        .await
        .unwrap();
    let off = json_body(off).await;
    assert_eq!(off["completed"], json!(false));
    assert!(off["completed_at"].is_null());
    assert_eq!(off["id"], on["id"]);
    assert_eq!(app.store.progress_count(), 1);
}

#[tokio::test]
async fn test_malformed_flag_is_400() {
    let app = create_test_app();
    let (_, mods) = add_course(&app.store, "flags", 1).await;
    let res = app
        .router
        .oneshot(post_json(
            &format!("/api/courses/modules/{}/progress", mods[0]),
            1,
            json!({ "completed": "maybe" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.progress_count(), 0);
}

#[tokio::test]
async fn test_progress_unknown_module_is_404() {
    let app = create_test_app();
    let res = app
        .router
        .oneshot(post_json(
            "/api/courses/modules/4242/progress",
            1,
            json!({ "completed": true }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.progress_count(), 0);
}

#[tokio::test]
async fn test_course_detail_reports_progress() {
    let app = create_test_app();
    let (course, mods) = add_course(&app.store, "strategies", 4).await;
    for m in [mods[0], mods[2]] {
        app.router
            .clone()
            .oneshot(post_json(
                &format!("/api/courses/modules/{m}/progress"),
                7,
                json!({ "completed": true }),
            ))
            .await
            .unwrap();
    }

    let pct = app
        .router
        .clone()
        .oneshot(get(&format!("/api/courses/{course}/progress"), Some(7)))
        .await
        .unwrap();
    assert_eq!(json_body(pct).await["progress"], json!(50));

    let detail = app
        .router
        .oneshot(get(&format!("/api/courses/{course}"), Some(7)))
        .await
        .unwrap();
    let detail = json_body(detail).await;
    assert_eq!(detail["progress"], json!(50));
    assert_eq!(detail["enrolled"], json!(false));
    assert_eq!(detail["title"], json!("strategies"));
    assert_eq!(detail["modules"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_course_list_marks_enrollment() {
    let app = create_test_app();
    let (a, _) = add_course(&app.store, "a", 1).await;
    add_course(&app.store, "b", 0).await;
    app.router
        .clone()
        .oneshot(post_empty(&format!("/api/courses/{a}/enroll"), 2))
        .await
        .unwrap();

    let res = app.router.oneshot(get("/api/courses", Some(2))).await.unwrap();
    let list = json_body(res).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["enrolled"], json!(true));
    assert_eq!(list[1]["enrolled"], json!(false));
    assert!(list[0].get("progress").is_none());
}

#[tokio::test]
async fn test_user_summary() {
    let app = create_test_app();
    let (a, a_mods) = add_course(&app.store, "a", 3).await;
    let (b, b_mods) = add_course(&app.store, "b", 2).await;
    for c in [a, b] {
        app.router
            .clone()
            .oneshot(post_empty(&format!("/api/courses/{c}/enroll"), 5))
            .await
            .unwrap();
    }
    for m in [a_mods[0], a_mods[1], b_mods[1]] {
        app.router
            .clone()
            .oneshot(post_json(
                &format!("/api/courses/modules/{m}/progress"),
                5,
                json!({ "completed": true }),
            ))
            .await
            .unwrap();
    }

    let res = app
        .router
        .oneshot(get("/api/users/progress", Some(5)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let summary = json_body(res).await;
    assert_eq!(summary["enrolledCourses"], json!(2));
    assert_eq!(summary["completedModules"], json!(3));
    let data = summary["enrolledCoursesData"].as_array().unwrap();
    assert_eq!(data[0]["progress"], json!(66));
    assert_eq!(data[1]["progress"], json!(50));
    assert_eq!(data[1]["thumbnail"], json!("https://images.example/b.jpg"));
}

#[tokio::test]
async fn test_modules_listed_in_order() {
    let app = create_test_app();
    let (course, mods) = add_course(&app.store, "ordered", 3).await;
    let res = app
        .router
        .oneshot(get(&format!("/api/courses/{course}/modules"), None))
        .await
        .unwrap();
    let list = json_body(res).await;
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, mods);
}
