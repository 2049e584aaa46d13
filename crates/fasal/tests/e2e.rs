// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: configuration, the full backend chain against mocked
//! upstream APIs, and the HTTP surface.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use base64::Engine as _;
use fasal_core::KnowledgeBase;
use fasal_gateway::{AppState, router};
use fasal_knowledge::StaticKnowledgeBase;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_from_toml(toml: &str) -> Router {
    let config = fasal_config::load_and_validate_str(toml).unwrap();
    let kb: Arc<dyn KnowledgeBase> = Arc::new(StaticKnowledgeBase::builtin().unwrap());
    router(AppState::from_config(&config, kb).unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn analyze_request() -> Request<Body> {
    let image = base64::engine::general_purpose::STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0]);
    Request::builder()
        .method("POST")
        .uri("/api/analyze/base64")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"image_base64": image, "media_type": "image/jpeg"}).to_string(),
        ))
        .unwrap()
}

fn form_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/whatsapp/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn vision_outage_opens_breaker_and_label_detector_takes_over() {
    let vision = MockServer::start().await;
    let labels = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(2)
        .mount(&vision)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .and(query_param("key", "label-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{"labelAnnotations": [
                {"description": "Rice", "score": 0.95},
                {"description": "Leaf spot", "score": 0.8}
            ]}]
        })))
        .expect(3)
        .mount(&labels)
        .await;

    let app = app_from_toml(&format!(
        r#"
[vision]
api_key = "vision-key"
base_url = "{vision}"

[labels]
api_key = "label-key"
endpoint = "{labels}/v1/images:annotate"

[breaker]
failure_threshold = 2
cooldown_secs = 300

[archive]
enabled = false
"#,
        vision = vision.uri(),
        labels = labels.uri(),
    ));

    for _ in 0..2 {
        let (status, body) = send(&app, analyze_request()).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let report: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["analysis_engine"], "label_detector");
        assert_eq!(report["attempts"][0]["engine"], "primary_vision");
        assert_eq!(report["attempts"][0]["status"], "failed");
        assert_eq!(report["attempts"][1]["status"], "succeeded");
    }

    let (status, body) = send(&app, analyze_request()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["attempts"][0]["status"], "skipped_by_breaker");
    assert_eq!(report["analysis_engine"], "label_detector");
    assert_eq!(report["disease"], "rice_blast");
    assert_eq!(report["confidence"], 0.65);

    let (_, body) = send(
        &app,
        Request::builder()
            .uri("/api/pipeline")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["engines"][0]["breaker"]["state"], "open");
    assert_eq!(status["engines"][1]["breaker"]["state"], "closed");
    // Dropping the mock servers verifies the expected call counts.
}

#[tokio::test]
async fn no_credentials_still_answers_from_the_knowledge_base() {
    let app = app_from_toml("[archive]\nenabled = false\n");

    let (status, body) = send(&app, analyze_request()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["analysis_engine"], "static_fallback");
}

#[tokio::test]
async fn twilio_conversation_from_greeting_to_hindi_diagnosis() {
    let upstream = MockServer::start().await;
    let answer = r#"{"crop": "tomato", "is_healthy": false, "disease_key": "tomato_early_blight",
        "disease_name": "Early Blight", "disease_cause": "fungal", "confidence": 88,
        "severity": "moderate", "symptoms_observed": ["concentric rings"],
        "affected_area_percent": 20, "spread_risk": "high",
        "immediate_action_needed": true, "additional_notes": ""}"#;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": answer}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1200, "output_tokens": 150}
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/ME1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = app_from_toml(&format!(
        r#"
[vision]
api_key = "vision-key"
base_url = "{uri}"

[archive]
enabled = false

[whatsapp.twilio]
account_sid = "AC123"
auth_token = "twilio-token"
"#,
        uri = upstream.uri(),
    ));

    let from = "From=whatsapp%3A%2B919800000001&To=whatsapp%3A%2B14155238886";

    let (status, twiml) = send(&app, form_request(format!("{from}&Body=namaste&NumMedia=0"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(twiml.contains("<Response>"));
    assert!(twiml.contains("1-9"), "{twiml}");

    let (_, twiml) = send(&app, form_request(format!("{from}&Body=2&NumMedia=0"))).await;
    assert!(twiml.contains("✅"), "{twiml}");

    let media_url = format!("{}/media/ME1", upstream.uri());
    let body = serde_urlencoded::to_string([
        ("From", "whatsapp:+919800000001"),
        ("To", "whatsapp:+14155238886"),
        ("Body", ""),
        ("NumMedia", "1"),
        ("MediaUrl0", media_url.as_str()),
        ("MediaContentType0", "image/jpeg"),
    ])
    .unwrap();
    let (status, twiml) = send(&app, form_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(twiml.contains("अगेती झुलसा"), "{twiml}");
    assert!(twiml.contains("🌾 *फसल:* टमाटर"), "{twiml}");
    assert!(
        twiml.contains("गहरे भूरे से काले धब्बे जो संकेंद्रित वलयों"),
        "Hindi description missing: {twiml}"
    );
    assert!(twiml.contains("88%"), "{twiml}");

    let (_, twiml) = send(&app, form_request(format!("{from}&Body=lang&NumMedia=0"))).await;
    assert!(twiml.contains("1-9"), "{twiml}");
}
