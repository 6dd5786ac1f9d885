//! Session API integration tests.
//!
//! Run with: `cargo test -p kobodrop-api --test sessions_test`

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use helpers::{api_path, create_session, setup_test_app};
use kobodrop_core::models::{Session, SessionResponse};
use kobodrop_core::CODE_ALPHABET;
use uuid::Uuid;

#[tokio::test]
async fn test_create_session() {
    let app = setup_test_app().await;
    let session = create_session(app.client()).await;

    assert_eq!(session.code.len(), 6);
    assert!(session.code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    assert_eq!(
        session.display_code,
        format!("{}-{}", &session.code[..3], &session.code[3..])
    );
    assert_eq!(session.expires_at - session.created_at, Duration::days(90));
    assert_eq!(app.sessions.len().await, 1);
}

#[tokio::test]
async fn test_get_session_by_id_and_code() {
    let app = setup_test_app().await;
    let client = app.client();
    let created = create_session(client).await;

    let by_id = client
        .get(&api_path(&format!("/sessions/{}", created.id)))
        .await
        .json::<SessionResponse>();
    assert_eq!(by_id.code, created.code);

    let typed = format!(
        "{}-{}",
        created.code[..3].to_lowercase(),
        created.code[3..].to_lowercase()
    );
    let by_code = client
        .get(&api_path(&format!("/sessions/code/{}", typed)))
        .await
        .json::<SessionResponse>();
    assert_eq!(by_code.id, created.id);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .get(&api_path(&format!("/sessions/{}", Uuid::new_v4())))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");

    client
        .get(&api_path("/sessions/code/ZZZ-999"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_code_is_400() {
    let app = setup_test_app().await;
    let response = app.client().get(&api_path("/sessions/code/AB12")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_expired_session_is_extended_on_lookup() {
    let app = setup_test_app().await;
    let created_at = Utc::now() - Duration::days(200);
    let stale = Session {
        id: Uuid::new_v4(),
        code: "KQW7RT".to_string(),
        created_at,
        expires_at: created_at + Duration::days(90),
    };
    app.sessions.put(stale.clone()).await;

    let before = Utc::now();
    let resolved = app
        .client()
        .get(&api_path("/sessions/code/kqw-7rt"))
        .await
        .json::<SessionResponse>();

    assert_eq!(resolved.id, stale.id);
    assert!(resolved.expires_at >= before + Duration::days(90) - Duration::seconds(5));

    let stored = app.state.sessions.get_by_id(stale.id).await.unwrap().unwrap();
    assert_eq!(stored.expires_at, resolved.expires_at);
}
