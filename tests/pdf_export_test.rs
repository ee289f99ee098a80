mod common;

use axum::http::{header, Method, StatusCode};
use common::{body_bytes, TestApp, TINY_PNG_BASE64};
use serde_json::json;
use test_case::test_case;

#[test_case("", "en" ; "default language")]
#[test_case("?lang=en", "en" ; "english")]
#[test_case("?lang=zh", "zh" ; "chinese without configured font")]
#[tokio::test]
async fn export_is_a_named_pdf_download(query: &str, lang: &str) {
    let app = TestApp::new();
    let id = app
        .submit(json!({
            "requester": "Alice",
            "department": "Eng",
            "urgency": "high",
            "part_name": "Door hinge",
            "quantity": 4,
            "justification": "Line stoppage"
        }))
        .await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/applications/{id}/pdf{query}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{id}_{lang}.pdf\"").as_str()
    );

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF"), "not a PDF document");
}

#[tokio::test]
async fn export_with_attached_image() {
    let app = TestApp::new();
    let id = app
        .submit(json!({
            "requester": "Alice",
            "department": "Eng",
            "technical_specs": "M8 bolt, zinc plated",
            "image": {"content_type": "image/png", "data": TINY_PNG_BASE64}
        }))
        .await;

    let response = app
        .request(Method::GET, &format!("/api/v1/applications/{id}/pdf"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn unsupported_language_is_rejected() {
    let app = TestApp::new();
    let id = app
        .submit(json!({"requester": "Alice", "department": "Eng", "technical_specs": "bolt"}))
        .await;
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/applications/{id}/pdf?lang=fr"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_ticket_cannot_be_exported() {
    let app = TestApp::new();
    let response = app
        .request(Method::GET, "/api/v1/applications/-Nmissing/pdf", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
