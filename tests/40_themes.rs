mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

async fn activate(app: &common::TestApp, body: Value) -> Result<reqwest::Response> {
    Ok(app
        .client
        .post(app.url("/api/themes/activate"))
        .bearer_auth(common::session_token(Uuid::new_v4()))
        .json(&body)
        .send()
        .await?)
}

#[tokio::test]
async fn activation_requires_a_session() -> Result<()> {
    let app = common::spawn_app().await?;
    let theme = app.store.add_theme(false);

    let res = app.post("/api/themes/activate", json!({ "id": theme })).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(app.store.theme_calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn activation_switches_the_single_active_theme() -> Result<()> {
    let app = common::spawn_app().await?;
    let old = app.store.add_theme(true);
    let new = app.store.add_theme(false);
    app.store.add_theme(false);

    let res = activate(&app, json!({ "id": new })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);

    assert_eq!(app.store.active_themes(), vec![new]);
    assert_ne!(old, new);
    assert_eq!(
        *app.store.theme_calls.lock().unwrap(),
        vec!["exists", "deactivate_all", "activate"]
    );
    Ok(())
}

#[tokio::test]
async fn missing_id_is_400_without_store_calls() -> Result<()> {
    let app = common::spawn_app().await?;
    app.store.add_theme(true);

    let res = activate(&app, json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = activate(&app, json!({ "id": "  " })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(app.store.theme_calls.lock().unwrap().is_empty());
    assert_eq!(app.store.active_themes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn non_uuid_id_is_404_like_any_unknown_theme() -> Result<()> {
    let app = common::spawn_app().await?;
    let current = app.store.add_theme(true);

    let res = activate(&app, json!({ "id": "theme-blue" })).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "NOT_FOUND");

    assert!(app.store.theme_calls.lock().unwrap().is_empty());
    assert_eq!(app.store.active_themes(), vec![current]);
    Ok(())
}

#[tokio::test]
async fn unknown_theme_is_404_and_changes_nothing() -> Result<()> {
    let app = common::spawn_app().await?;
    let current = app.store.add_theme(true);

    let res = activate(&app, json!({ "id": Uuid::new_v4() })).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(app.store.active_themes(), vec![current]);
    assert_eq!(*app.store.theme_calls.lock().unwrap(), vec!["exists"]);
    Ok(())
}

#[tokio::test]
async fn deactivation_failure_leaves_themes_untouched() -> Result<()> {
    let app = common::spawn_app().await?;
    let current = app.store.add_theme(true);
    let target = app.store.add_theme(false);
    app.store.fail_deactivate.store(true, Ordering::SeqCst);

    let res = activate(&app, json!({ "id": target })).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "THEME_DEACTIVATION_FAILED");

    assert_eq!(app.store.active_themes(), vec![current]);
    assert!(!app.store.theme_calls.lock().unwrap().contains(&"activate"));
    Ok(())
}

#[tokio::test]
async fn partial_failure_is_reported_and_resume_finishes_it() -> Result<()> {
    let app = common::spawn_app().await?;
    app.store.add_theme(true);
    let target = app.store.add_theme(false);
    app.store.fail_activate.store(true, Ordering::SeqCst);

    let res = activate(&app, json!({ "id": target })).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "PARTIAL_ACTIVATION_FAILURE");
    assert_eq!(body["retry"]["id"], target.to_string());
    assert_eq!(body["retry"]["resume"], true);
    assert!(app.store.active_themes().is_empty());

    app.store.fail_activate.store(false, Ordering::SeqCst);
    app.store.theme_calls.lock().unwrap().clear();

    let res = activate(&app, json!({ "id": target, "resume": true })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.store.active_themes(), vec![target]);
    assert_eq!(
        *app.store.theme_calls.lock().unwrap(),
        vec!["exists", "active_count", "activate"]
    );
    Ok(())
}

#[tokio::test]
async fn resume_while_a_theme_is_active_is_409() -> Result<()> {
    let app = common::spawn_app().await?;
    let current = app.store.add_theme(true);
    let other = app.store.add_theme(false);

    let res = activate(&app, json!({ "id": other, "resume": true })).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "CONFLICT");

    assert_eq!(app.store.active_themes(), vec![current]);
    assert!(!app.store.theme_calls.lock().unwrap().contains(&"activate"));
    Ok(())
}

#[tokio::test]
async fn resume_of_unknown_theme_is_404() -> Result<()> {
    let app = common::spawn_app().await?;
    app.store.add_theme(false);

    let res = activate(&app, json!({ "id": Uuid::new_v4(), "resume": true })).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert!(body.get("retry").is_none());

    assert!(app.store.active_themes().is_empty());
    assert_eq!(*app.store.theme_calls.lock().unwrap(), vec!["exists"]);
    Ok(())
}
