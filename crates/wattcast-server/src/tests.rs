//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "wattcast-test-boundary";

const RISING_CSV: &str = "Month,kWh_Used,Bill_Cost\n\
    January,100,500\n\
    February,110,520\n\
    March,120,540\n\
    April,130,560\n\
    May,140,580\n\
    June,150,600\n";

fn setup_test_app() -> Router {
    create_router(ServerConfig::default(), None)
}

fn setup_app_with_login() -> Router {
    let config = ServerConfig {
        login: Some(LoginCredentials {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
            token: "test_token".to_string(),
        }),
        ..Default::default()
    };
    create_router(config, None)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(field: &str, content: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"usage.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        field = field,
        content = content,
    )
}

fn upload_request(csv: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body("file", csv)))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn upload(app: &Router, csv: &str) -> serde_json::Value {
    let response = app.clone().oneshot(upload_request(csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    get_body_json(response).await
}

// ========== Liveness ==========

#[tokio::test]
async fn test_home_and_security_headers() {
    let app = setup_test_app();

    let response = app.oneshot(get_request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let json = get_body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("running"));
}

// ========== Upload API Tests ==========

#[tokio::test]
async fn test_upload_csv() {
    let app = setup_test_app();

    let json = upload(&app, RISING_CSV).await;

    assert_eq!(json["ok"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 6);
    assert_eq!(json["data"][0]["Month"], "January");
    assert_eq!(json["data"][0]["Consumption_kWh"], 100.0);
    assert_eq!(json["data"][5]["Bill_Amount"], 600.0);
    assert_eq!(json["data"][5]["index"], 5);
    assert_eq!(json["metrics"]["totalEnergy"], 750.0);
    assert_eq!(json["metrics"]["avgBill"], 550.0);
    assert!(json["metrics"]["accuracy"].as_f64().unwrap() > 99.0);
    assert_eq!(json["columns"]["period"], "month");
    assert_eq!(json["columns"]["quantity"], "kwh_used");
    assert_eq!(json["columns"]["amount"], "bill_cost");
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(json["available_months"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upload_any_header_order_keeps_non_empty_rows() {
    let app = setup_test_app();
    let csv = "Total COST,Energy Usage,Billing Period Month\n\
        1800,420,Jan\n\
        ,,\n\
        1900,460,Feb\n\
        2100,500,Mar\n";

    let json = upload(&app, csv).await;

    assert_eq!(json["ok"], true);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[2]["Month"], "Mar");
    assert_eq!(data[2]["Bill_Amount"], 2100.0);
    // Fewer than 4 records are never scored
    assert_eq!(json["metrics"]["accuracy"], 0.0);
}

#[tokio::test]
async fn test_upload_missing_column_lists_found_headers() {
    let app = setup_test_app();

    let response = app
        .oneshot(upload_request("Month,Units,Total\nJan,1,2\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("Missing required columns"));
    assert!(message.contains("month"));
    assert!(message.contains("units"));
    assert!(message.contains("total"));
}

#[tokio::test]
async fn test_upload_without_file() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request("/api/upload", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "No file uploaded!");

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body("attachment", RISING_CSV)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["message"], "No file uploaded!");
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_dataset() {
    let app = setup_test_app();
    upload(&app, RISING_CSV).await;

    let response = app
        .clone()
        .oneshot(upload_request("Date,Units\n1,2\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get_request("/api/data")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 6);
    assert!(json["loaded_at"].is_string());
}

#[tokio::test]
async fn test_get_data_empty() {
    let app = setup_test_app();

    let response = app.oneshot(get_request("/api/data")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert!(json["data"].as_array().unwrap().is_empty());
    assert_eq!(json["metrics"]["totalEnergy"], 0.0);
    assert!(json["loaded_at"].is_null());
}

// ========== Search API Tests ==========

#[tokio::test]
async fn test_search_months_case_insensitive_in_order() {
    let app = setup_test_app();
    upload(
        &app,
        "Month,kWh,Bill\nJan 2024,1,2\nFeb 2024,1,2\nJanuary 2025,1,2\nJUNE 2025,1,2\n",
    )
    .await;

    let response = app
        .clone()
        .oneshot(get_request("/api/search?q=JAN"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["months"], serde_json::json!(["Jan 2024", "January 2025"]));

    let response = app.oneshot(get_request("/api/search?q=ju")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["months"], serde_json::json!(["JUNE 2025"]));
}

// ========== Predict / Retrain API Tests ==========

#[tokio::test]
async fn test_predict_before_upload() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({"month": "July"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["message"], "Upload a CSV before predicting!");
}

#[tokio::test]
async fn test_predict_rising_series() {
    let app = setup_test_app();
    upload(&app, RISING_CSV).await;

    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({"month": "July"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["month"], "July");
    assert!(json["prediction"].as_f64().unwrap() > 150.0);
    let bill = json["predicted_bill"].as_f64().unwrap();
    assert!(bill > 600.0);
    let expected_growth = (bill - 600.0) / 600.0 * 100.0;
    assert!((json["growth_rate"].as_f64().unwrap() - expected_growth).abs() < 0.01);
    assert_eq!(json["precautions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_predict_requires_month() {
    let app = setup_test_app();
    upload(&app, RISING_CSV).await;

    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({"month": "  "})))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["message"], "Please provide a month name!");
}

#[tokio::test]
async fn test_retrain_before_upload() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("/api/retrain", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["message"], "Upload data before retraining!");
}

#[tokio::test]
async fn test_retrain_then_predict_growth_rate() {
    let app = setup_test_app();
    upload(
        &app,
        "Month,Consumption,Bill\nJan,420,1800\nFeb,460,1900\nMar,500,2100\nApr,480,2000\nMay,530,2250\n",
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request("/api/retrain", serde_json::json!({})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["regressor"], "linear");
    assert!(json["accuracy"].is_number());

    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({"month": "June"})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    let bill = json["predicted_bill"].as_f64().unwrap();
    let expected_growth = (bill - 2250.0) / 2250.0 * 100.0;
    assert!((json["growth_rate"].as_f64().unwrap() - expected_growth).abs() < 0.01);
}

#[tokio::test]
async fn test_small_dataset_needs_retrain() {
    let app = setup_test_app();
    let json = upload(&app, "Month,kWh,Bill\nJan,100,500\nFeb,120,600\n").await;
    assert_eq!(json["metrics"]["accuracy"], 0.0);

    let response = app
        .clone()
        .oneshot(json_request("/api/predict", serde_json::json!({"month": "Mar"})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);

    let response = app
        .clone()
        .oneshot(json_request("/api/retrain", serde_json::json!({})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["accuracy"], 0.0);

    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({"month": "Mar"})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert!(json["prediction"].as_f64().unwrap() > 120.0);
}

#[tokio::test]
async fn test_predict_malformed_json() {
    let app = setup_test_app();
    upload(&app, RISING_CSV).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from("{\"month\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert!(json["message"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_trend_horizon() {
    let app = setup_test_app();
    upload(&app, RISING_CSV).await;

    let response = app.oneshot(get_request("/api/trend")).await.unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    let trend = json["trend"].as_array().unwrap();
    assert_eq!(trend.len(), 6);
    assert!(trend[0]["predicted_consumption"].as_f64().unwrap() > 150.0);
    assert!(trend[0]["month"].as_str().unwrap().contains(' '));
}

#[tokio::test]
async fn test_trend_before_upload() {
    let app = setup_test_app();

    let response = app.oneshot(get_request("/api/trend")).await.unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
}

// ========== Insights API Tests ==========

#[tokio::test]
async fn test_insights_summary_without_data() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("/api/insights_summary", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(
        json["summary"],
        "No data available. Please upload a CSV first."
    );
    assert!(json.get("message").is_none());
}

#[tokio::test]
async fn test_insights_summary() {
    let app = setup_test_app();
    upload(&app, "Month,kWh,Bill\nJan,400,1800\nFeb,0,150\nMar,500,2100\n").await;

    let response = app
        .oneshot(json_request("/api/insights_summary", serde_json::json!({})))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    let summary = json["summary"].as_str().unwrap();
    assert!(summary.contains("AI Energy Insights Summary"));
    assert!(summary.contains("Peak consumption in **Mar**"));
    assert!(summary.contains("Lowest in **Feb**"));
    assert!(!summary.contains("inf"));
}

#[tokio::test]
async fn test_insights_chat_without_data() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "/api/insights_chat",
            serde_json::json!({"query": "bill"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert!(json["reply"].as_str().unwrap().contains("No data available"));
}

#[tokio::test]
async fn test_insights_chat_replies_and_memory() {
    let app = setup_test_app();
    upload(&app, RISING_CSV).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/insights_chat",
            serde_json::json!({"query": "  What is my BILL?", "context": {"page": "dashboard"}}),
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert!(json["reply"].as_str().unwrap().contains("550.00"));
    assert_eq!(json["memory"][0]["user"], "what is my bill?");

    let mut last = serde_json::Value::Null;
    for i in 0..6 {
        let response = app
            .clone()
            .oneshot(json_request(
                "/api/insights_chat",
                serde_json::json!({"query": format!("usage {}", i)}),
            ))
            .await
            .unwrap();
        last = get_body_json(response).await;
    }
    let memory = last["memory"].as_array().unwrap();
    assert_eq!(memory.len(), 5);
    assert_eq!(memory[0]["user"], "usage 1");
    assert_eq!(memory[4]["user"], "usage 5");
}

#[tokio::test]
async fn test_insights_chat_malformed_json_uses_reply_field() {
    let app = setup_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/insights_chat")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert!(json["reply"].is_string());
}

// ========== Login / Save Chat API Tests ==========

#[tokio::test]
async fn test_login_success() {
    let app = setup_app_with_login();

    let response = app
        .oneshot(json_request(
            "/api/login",
            serde_json::json!({"username": "admin", "password": "s3cret"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["token"], "test_token");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = setup_app_with_login();

    let response = app
        .oneshot(json_request(
            "/api/login",
            serde_json::json!({"username": "admin", "password": "wrong"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["message"], "Invalid credentials");
    assert!(json.get("token").is_none());
}

#[tokio::test]
async fn test_login_without_configured_credentials() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "/api/login",
            serde_json::json!({"username": "", "password": ""}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_save_chat() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "/api/save_chat",
            serde_json::json!({"conversation": [{"role": "user", "text": "hi"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["message"], "Chat saved successfully!");
}
