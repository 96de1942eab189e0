//! HttpGateway against a mock backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use riskportal_core::error::{AuthError, GatewayError};
use riskportal_core::gateway::wire::{QuestionnaireEnvelope, UploadRequest};
use riskportal_core::questionnaire::{encode_responses, FormValueStore, Questionnaire};
use riskportal_core::{
    Answer, Credentials, HttpGateway, QuestionnaireKind, ReviewGateway, Role, ScoreSheet,
    StageStatus, SubmissionGateway,
};

fn vendor(server: &Server) -> HttpGateway {
    let creds = Credentials::new("vendor-token", Role::Vendor).unwrap();
    HttpGateway::new(&server.url(), creds, Duration::from_secs(5)).unwrap()
}

fn reviewer(server: &Server) -> HttpGateway {
    let creds = Credentials::new("ra-token", Role::RaTeam).unwrap();
    HttpGateway::new(&server.url(), creds, Duration::from_secs(5)).unwrap()
}

fn corporate_body() -> serde_json::Value {
    json!({
        "questions": [
            {"id": 1, "text": "Company name", "weight": 5},
            {"id": 2, "text": "Registered address", "weight": 5}
        ],
        "responses": [{"question_id": 1, "response_text": "Acme"}]
    })
}

#[tokio::test]
async fn fetch_sends_the_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/vendor/questionnaires/corporate/")
        .match_header("authorization", "Bearer vendor-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(corporate_body().to_string())
        .create_async()
        .await;

    let envelope = vendor(&server)
        .fetch(QuestionnaireKind::Corporate)
        .await
        .unwrap();
    mock.assert_async().await;

    let QuestionnaireEnvelope::Corporate(flat) = envelope else {
        panic!("expected a corporate envelope");
    };
    assert_eq!(flat.questions.len(), 2);
}

#[tokio::test]
async fn save_posts_every_answer_to_the_save_endpoint() {
    let mut server = Server::new_async().await;
    let fetch = server
        .mock("GET", "/api/v1/vendor/questionnaires/corporate/")
        .with_status(200)
        .with_body(corporate_body().to_string())
        .create_async()
        .await;
    let save = server
        .mock("POST", "/api/v1/vendor/questionnaires/corporate/save/")
        .match_header("authorization", "Bearer vendor-token")
        .match_body(Matcher::Json(json!({"responses": [
            {"question_id": 1, "response_text": "Acme Ltd"},
            {"question_id": 2, "response_text": ""}
        ]})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let gateway = vendor(&server);
    let questionnaire =
        Questionnaire::from_envelope(gateway.fetch(QuestionnaireKind::Corporate).await.unwrap());
    let mut store = FormValueStore::new();
    store.set(1, Answer::Text("Acme Ltd".into()));
    let payload = encode_responses(QuestionnaireKind::Corporate, &questionnaire.layout, &store, false);

    gateway.save(QuestionnaireKind::Corporate, &payload).await.unwrap();
    fetch.assert_async().await;
    save.assert_async().await;
}

#[tokio::test]
async fn error_message_comes_from_the_response_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/vendor/questionnaires/contextual/submit/")
        .with_status(400)
        .with_body(r#"{"error": "Questionnaire already submitted"}"#)
        .create_async()
        .await;

    let payload = encode_responses(
        QuestionnaireKind::Contextual,
        &riskportal_core::questionnaire::Layout::Flat(Vec::new()),
        &FormValueStore::new(),
        true,
    );
    let err = vendor(&server)
        .submit(QuestionnaireKind::Contextual, &payload)
        .await
        .unwrap_err();
    match err {
        GatewayError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Questionnaire already submitted");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_error_body_falls_back_to_the_status_reason() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/vendor/dashboard/")
        .with_status(500)
        .create_async()
        .await;

    let err = vendor(&server).vendor_status().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn vendor_status_reads_the_dashboard() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/vendor/dashboard/")
        .with_status(200)
        .with_body(
            json!({"assessment_status": {
                "corporate": {"status": "Submitted"},
                "contextual": {"status": "In Progress"},
                "risk_assessment": {"status": "Not Started"}
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let status = vendor(&server).vendor_status().await.unwrap();
    assert_eq!(status.status(QuestionnaireKind::Contextual), StageStatus::InProgress);
    assert!(status.is_editable(QuestionnaireKind::Contextual));
    assert!(!status.is_unlocked(QuestionnaireKind::RiskAssessment));
}

#[tokio::test]
async fn upload_streams_multipart_and_reports_progress() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/vendor/questionnaires/risk-assessment/upload/")
        .match_header("authorization", "Bearer vendor-token")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="question_id"\r\n\r\n13"#.into()),
            Matcher::Regex(r#"name="questionnaire_id"\r\n\r\n12"#.into()),
            Matcher::Regex(r#"filename="soc2.pdf""#.into()),
            Matcher::Regex("%PDF-1.7".into()),
        ]))
        .with_status(201)
        .with_body(r#"{"document_id": 77, "file_url": "/media/documents/soc2.pdf"}"#)
        .create_async()
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let receipt = vendor(&server)
        .with_chunk_size(4)
        .upload(
            UploadRequest {
                question_id: 13.into(),
                questionnaire_id: "12".into(),
                file_name: "soc2.pdf".into(),
                bytes: b"%PDF-1.7".to_vec(),
            },
            move |percent| sink.lock().unwrap().push(percent),
        )
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(receipt.document_id, "77");
    assert_eq!(receipt.file_url, "/media/documents/soc2.pdf");
    assert_eq!(*seen.lock().unwrap(), vec![50, 100]);
}

#[tokio::test]
async fn reviewer_endpoints_are_refused_for_vendors_without_a_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/ra-team/dashboard/")
        .expect(0)
        .create_async()
        .await;

    let err = vendor(&server).pending_reviews().await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Unauthorized(AuthError::Forbidden {
            required: Role::RaTeam,
            actual: Role::Vendor
        })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn reviewer_scores_and_completes_a_submission() {
    let mut server = Server::new_async().await;
    let pending = server
        .mock("GET", "/api/v1/ra-team/dashboard/")
        .match_header("authorization", "Bearer ra-token")
        .with_status(200)
        .with_body(
            json!({"pending_reviews": [{"id": 9, "vendor_name": "Acme", "status": "Submitted"}]})
                .to_string(),
        )
        .create_async()
        .await;
    let detail = server
        .mock("GET", "/api/v1/ra-team/submissions/9/")
        .with_status(200)
        .with_body(
            json!({
                "vendor_info": {"company_name": "Acme"},
                "risk_assessment": {
                    "main_factors": [{"name": "Technical", "weight": 100, "sub_factors": [
                        {"name": "Access", "weight": 100, "questions": [
                            {"id": 1, "type": "YN", "text": "MFA?", "weight": 10},
                            {"id": 2, "type": "SA", "text": "Describe IAM", "weight": 10}
                        ]}
                    ]}],
                    "responses": [{"question_id": 2, "requires_scoring": true, "response_text": "Okta"}]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let scores = server
        .mock("POST", "/api/v1/ra-team/submissions/9/score/")
        .match_body(Matcher::Json(json!({"scores": [
            {"question_id": 2, "score": 6.5, "comment": "SSO only"}
        ]})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let complete = server
        .mock("POST", "/api/v1/ra-team/submissions/9/complete/")
        .with_status(200)
        .with_body(
            json!({"risk_calculation": {
                "final_score": 42.5,
                "confidence_interval": {"low": 38.0, "high": 47.0}
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let gateway = reviewer(&server);
    let reviews = gateway.pending_reviews().await.unwrap();
    assert_eq!(reviews[0].vendor_name, "Acme");

    let submission = gateway.fetch_submission(9).await.unwrap();
    let mut sheet = ScoreSheet::from_submission(9, &submission);
    assert!(sheet.complete(&gateway).await.is_err());

    sheet.set_score(2, 6.5, Some("SSO only")).unwrap();
    let calc = sheet.complete(&gateway).await.unwrap().unwrap();
    assert_eq!(calc.final_score, 42.5);
    assert_eq!(calc.confidence_interval.high, 47.0);

    pending.assert_async().await;
    detail.assert_async().await;
    scores.assert_async().await;
    complete.assert_async().await;
}

#[tokio::test]
async fn complete_tolerates_an_empty_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/ra-team/submissions/3/complete/")
        .with_status(204)
        .create_async()
        .await;

    let response = reviewer(&server).complete_review(3).await.unwrap();
    assert!(response.risk_calculation.is_none());
}
