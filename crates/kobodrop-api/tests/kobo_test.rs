//! E-reader page integration tests.
//!
//! Run with: `cargo test -p kobodrop-api --test kobo_test`

mod helpers;

use helpers::{create_session, setup_test_app, setup_test_app_with, upload};
use serde::Serialize;

#[derive(Serialize)]
struct CodeForm<'a> {
    code: &'a str,
}

#[tokio::test]
async fn test_entry_form_without_code() {
    let app = setup_test_app().await;
    let response = app.client().get("/kobo").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("<form method=\"GET\" action=\"/kobo\">"));
    assert!(html.contains("Pairing Code:"));
}

#[tokio::test]
async fn test_invalid_code_page() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get("/kobo")
        .add_query_param("code", "AB-12")
        .await;

    response.assert_status_ok();
    assert!(response
        .text()
        .contains("Invalid code format. Please enter a 6-character code"));
}

#[tokio::test]
async fn test_unknown_code_page() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get("/kobo")
        .add_query_param("code", "zzz-999")
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("Code not found or expired"));
}

#[tokio::test]
async fn test_file_list_links_by_size() {
    let app = setup_test_app_with(&[("PROXY_MAX_BYTES", "8")]).await;
    let client = app.client();
    let session = create_session(client).await;
    let small = upload(client, session.id, "short.txt", b"tiny").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let large = upload(client, session.id, "long.epub", b"definitely more than eight").await;

    let typed = session.display_code.to_lowercase();
    let response = client.get("/kobo").add_query_param("code", &typed).await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(&format!("<strong>{}</strong>", session.display_code)));
    assert!(html.contains(&format!("href=\"/download?id={}\"", small.id)));
    assert!(html.contains(&format!("href=\"{}\"", large.download_url)));
    assert!(html.contains("Large file - will save with a long name."));

    let newest = html.find("long.epub").unwrap();
    let oldest = html.find("short.txt").unwrap();
    assert!(newest < oldest);
}

#[tokio::test]
async fn test_post_form_resolves_code() {
    let app = setup_test_app().await;
    let client = app.client();
    let session = create_session(client).await;

    let response = client
        .post("/kobo")
        .form(&CodeForm {
            code: &session.display_code,
        })
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Available Files"));
    assert!(html.contains("No files uploaded yet"));
}
