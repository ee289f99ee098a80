mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp, BOM_MODEL};
use serde_json::{json, Value};

fn line<'a>(body: &'a Value, code: &str) -> &'a Value {
    body["data"]["lines"]
        .as_array()
        .and_then(|lines| lines.iter().find(|l| l["component_code"] == code))
        .unwrap_or_else(|| panic!("no line for {code}"))
}

#[tokio::test]
async fn models_are_listed_in_order() {
    let app = TestApp::new();
    let body = json_body(app.request(Method::GET, "/api/v1/bom/models", None).await).await;
    assert_eq!(body["data"], json!(["X5-2020", "Y3-2018"]));
}

#[tokio::test]
async fn missing_part_leaves_its_line_unenriched() {
    let app = TestApp::new();
    let response = app
        .request(Method::GET, &format!("/api/v1/bom/models/{BOM_MODEL}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["data"]["model"], BOM_MODEL);
    assert_eq!(body["data"]["component_count"], 3);
    assert_eq!(body["data"]["missing_parts"], json!(["GX-999"]));

    let brake = line(&body, "BP-100");
    assert_eq!(brake["part"]["stock"], 12);
    assert_eq!(brake["part"]["notes"], "old");
    assert_eq!(brake["description"], "Front brake pad set");

    assert_eq!(line(&body, "OF-10")["part"]["stock"], 140);
    assert_eq!(line(&body, "GX-999")["part"], Value::Null);
}

#[tokio::test]
async fn query_narrows_the_component_list() {
    let app = TestApp::new();
    let body = json_body(
        app.request(
            Method::GET,
            &format!("/api/v1/bom/models/{BOM_MODEL}?q=mann"),
            None,
        )
        .await,
    )
    .await;
    let codes: Vec<&str> = body["data"]["lines"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|l| l["component_code"].as_str())
        .collect();
    assert_eq!(codes, vec!["OF-10"]);
    assert_eq!(body["data"]["missing_parts"], json!([]));
}

#[tokio::test]
async fn unknown_model_is_not_found() {
    let app = TestApp::new();
    let response = app
        .request(Method::GET, "/api/v1/bom/models/Z9-1999", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn model_list_degrades_when_offline() {
    let app = TestApp::offline();
    let body = json_body(app.request(Method::GET, "/api/v1/bom/models", None).await).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], json!([]));
}
