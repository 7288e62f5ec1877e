//! Credit-gated generation tests: precondition checks, optimistic spends,
//! and the no-refund-on-failure behavior.

use std::sync::Arc;

use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use promptgen_api::backends::{IdentityBackend, MemoryIdentity};
use promptgen_api::services::{GenerationService, SessionStore};
use promptgen_api::ApiError;
use promptgen_gemini::GeminiClient;
use promptgen_models::{ImageData, LanguageCode, VideoModel};

fn image() -> ImageData {
    ImageData {
        base64: "aGVsbG8=".to_string(),
        mime_type: "image/png".to_string(),
    }
}

async fn sessions_with_demo_users() -> (Arc<MemoryIdentity>, Arc<SessionStore>) {
    let identity = Arc::new(MemoryIdentity::with_demo_users());
    let sessions = Arc::new(SessionStore::new(identity.clone()));
    (identity, sessions)
}

async fn start_session(identity: &MemoryIdentity, sessions: &SessionStore, email: &str) -> String {
    let profile = identity.login(email, "password").await.unwrap();
    let uid = profile.id.clone();
    sessions.insert(profile).await;
    uid
}

fn service_against(server_uri: &str, sessions: Arc<SessionStore>) -> GenerationService {
    let client = Arc::new(GeminiClient::new("test-key").with_base_url(server_uri.to_string()));
    GenerationService::with_client(sessions, client)
}

#[tokio::test]
async fn video_request_with_one_credit_is_blocked() {
    let (identity, sessions) = sessions_with_demo_users().await;
    // test@demo.com holds 5 credits; burn down to 1
    let uid = start_session(&identity, &sessions, "test@demo.com").await;
    sessions.spend_credits(&uid, 4).await.unwrap();
    assert_eq!(sessions.profile(&uid).await.unwrap().credits, 1);

    // No Gemini server at all: the request must be blocked before any remote call
    let service = service_against("http://127.0.0.1:9", sessions.clone());
    let err = service
        .video(&uid, "a fireworks show", VideoModel::GeminiVeo)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InsufficientCredits(_)));
    assert!(err.to_string().contains("5 credits"));
    // Credits unchanged
    assert_eq!(sessions.profile(&uid).await.unwrap().credits, 1);
}

#[tokio::test]
async fn successful_prompt_generation_spends_one_credit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/gemini-.*:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "**Video Concept:** A short vertical ad." }] }
            }]
        })))
        .mount(&server)
        .await;

    let (identity, sessions) = sessions_with_demo_users().await;
    let uid = start_session(&identity, &sessions, "user@demo.com").await;
    let service = service_against(&server.uri(), sessions.clone());

    let generated = service
        .video_prompt(&uid, &image(), &[image()], LanguageCode::En)
        .await
        .unwrap();

    assert!(generated.output.contains("Video Concept"));
    assert_eq!(generated.credits, 9);
    assert_eq!(sessions.profile(&uid).await.unwrap().credits, 9);

    // The optimistic spend was written through to the identity backend
    let backend_profile = identity.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(backend_profile.credits, 9);
}

#[tokio::test]
async fn failed_generation_does_not_refund() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let (identity, sessions) = sessions_with_demo_users().await;
    let uid = start_session(&identity, &sessions, "user@demo.com").await;
    let service = service_against(&server.uri(), sessions.clone());

    let err = service
        .video_prompt(&uid, &image(), &[image()], LanguageCode::En)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Gemini(_)));

    // The credit is gone: spend-then-call, no compensation on failure
    assert_eq!(sessions.profile(&uid).await.unwrap().credits, 9);
}

#[tokio::test]
async fn speech_input_is_validated_before_spending() {
    let (identity, sessions) = sessions_with_demo_users().await;
    let uid = start_session(&identity, &sessions, "user@demo.com").await;
    let service = service_against("http://127.0.0.1:9", sessions.clone());

    let long_text = "a".repeat(1001);
    let err = service
        .speech(&uid, &long_text, promptgen_models::SpeechVoice::Kore)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = service
        .speech(&uid, "   ", promptgen_models::SpeechVoice::Kore)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    // Neither rejection spent anything
    assert_eq!(sessions.profile(&uid).await.unwrap().credits, 10);
}

#[tokio::test]
async fn storyboard_parses_schema_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/gemini-.*:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": r#"[
                    {"scene": 1, "description": "Opening shot", "image_prompt": "A sunrise over a city"},
                    {"scene": 2, "description": "Product reveal", "image_prompt": "A bottle on a marble table"}
                ]"# }] }
            }]
        })))
        .mount(&server)
        .await;

    let (identity, sessions) = sessions_with_demo_users().await;
    let uid = start_session(&identity, &sessions, "user@demo.com").await;
    let service = service_against(&server.uri(), sessions.clone());

    let generated = service.storyboard(&uid, "launch a new soda").await.unwrap();
    assert_eq!(generated.output.len(), 2);
    assert_eq!(generated.output[0].scene, 1);
    assert_eq!(generated.output[1].image_prompt, "A bottle on a marble table");
    assert_eq!(generated.credits, 9);
}
