//! Handover gateway integration tests against a stub service

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shift_scribe::application::ports::{ReportError, ReportGateway};
use shift_scribe::domain::report::Attachments;
use shift_scribe::infrastructure::HttpReportGateway;

fn report_body() -> serde_json::Value {
    serde_json::json!({
        "markdown": "# Shift Handover\n\nAll stable.",
        "json": {
            "shiftSummary": ["Reactor R-101 stable at 95% capacity"],
            "criticalAlarms": [
                {"alarm": "LIC-301-HI", "meaning": "Separator level high"}
            ],
            "openIssues": [
                {"issue": "Calibrate LIC-301", "priority": "High", "confidence": 85}
            ],
            "recommendedActions": ["Monitor C-202 vibration"],
            "questions": ["Was PT-405 recently calibrated?"]
        },
        "sessionId": "session-42"
    })
}

#[tokio::test]
async fn generate_posts_notes_and_parses_report() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/handover/generate"))
        .and(body_partial_json(
            serde_json::json!({"shiftNotes": "Reactor stable."}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    let report = gateway
        .generate("Reactor stable.", &Attachments::default())
        .await
        .unwrap();

    assert!(report.markdown.starts_with("# Shift Handover"));
    assert_eq!(report.session_id.as_deref(), Some("session-42"));
    assert_eq!(report.summary.open_issues.len(), 1);
    assert_eq!(report.summary.open_issues[0].confidence, 85);
}

#[tokio::test]
async fn generate_sends_attachments_when_present() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/handover/generate"))
        .and(body_partial_json(serde_json::json!({
            "alarmsJson": {"active": []},
            "trendsCsv": "timestamp,tag,value"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    let attachments = Attachments {
        alarms: Some(serde_json::json!({"active": []})),
        trends_csv: Some("timestamp,tag,value".to_string()),
    };

    gateway
        .generate("Notes with attachments.", &attachments)
        .await
        .unwrap();
}

#[tokio::test]
async fn generate_surfaces_service_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/handover/generate"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"detail": "shift notes are required"})),
        )
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    let err = gateway
        .generate("", &Attachments::default())
        .await
        .unwrap_err();

    match err {
        ReportError::ServiceError(detail) => assert_eq!(detail, "shift notes are required"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn fetch_maps_missing_session_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/handover/no-such-session"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    let err = gateway.fetch("no-such-session").await.unwrap_err();

    assert!(matches!(err, ReportError::NotFound(id) if id == "no-such-session"));
}

#[tokio::test]
async fn fetch_returns_stored_report() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/handover/session-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body()))
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    let report = gateway.fetch("session-42").await.unwrap();
    assert_eq!(report.summary.shift_summary.len(), 1);
}

#[tokio::test]
async fn health_checks_the_probe_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    gateway.health().await.unwrap();
}

#[tokio::test]
async fn health_fails_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = HttpReportGateway::new(server.uri());
    assert!(gateway.health().await.is_err());
}
