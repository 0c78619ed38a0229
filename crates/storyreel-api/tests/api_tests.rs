//! API integration tests.
//!
//! The router is exercised end to end with `tower::ServiceExt::oneshot`;
//! both collaborators (Supabase, GenAI) are wiremock servers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storyreel_api::{AccessPolicy, ApiConfig, AppState};
use storyreel_genai::{GenAiClient, GenAiConfig};
use storyreel_supabase::{GenerationRepository, SupabaseClient, SupabaseConfig};

const ALLOWED_EMAIL: &str = "keeper@example.com";

fn test_state(supabase: &MockServer, genai: Option<&MockServer>) -> AppState {
    let client = SupabaseClient::new(SupabaseConfig::new(supabase.uri(), "anon-key")).unwrap();
    let generations = GenerationRepository::new(client.clone());

    let genai = genai.map(|server| {
        Arc::new(
            GenAiClient::new(GenAiConfig::new("test-key").with_base_url(server.uri())).unwrap(),
        )
    });

    AppState {
        config: ApiConfig {
            allowed_email: ALLOWED_EMAIL.to_string(),
            ..ApiConfig::default()
        },
        supabase: Arc::new(client),
        generations,
        genai,
        policy: AccessPolicy::single_user(ALLOWED_EMAIL),
    }
}

fn post_json(uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Mount the GoTrue user endpoint resolving to the given email.
async fn mount_auth_user(server: &MockServer, email: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": email
        })))
        .mount(server)
        .await;
}

fn generation_row(metadata: Value) -> Value {
    json!({
        "id": "gen-1",
        "prompt": "a lonely lighthouse keeper",
        "status": "processing",
        "metadata": metadata,
        "created_at": "2026-01-01T00:00:00Z",
        "completed_at": null
    })
}

fn gemini_text_response(text: &str) -> Value {
    json!({
        "candidates": [
            {"content": {"parts": [{"text": text}]}}
        ]
    })
}

#[tokio::test]
async fn test_generate_unauthenticated_creates_no_record() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generations"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&supabase)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json("/generate", None, json!({"prompt": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_generate_wrong_identity_is_forbidden() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, "intruder@example.com").await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generations"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&supabase)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json("/generate", Some("token"), json!({"prompt": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Access denied"));
}

#[tokio::test]
async fn test_generate_empty_prompt_is_bad_request() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json("/generate", Some("token"), json!({"prompt": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_without_api_key_is_degraded() {
    let supabase = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    let app = storyreel_api::create_router(test_state(&supabase, None), None);
    let response = app
        .oneshot(post_json("/generate", Some("token"), json!({"prompt": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn test_generate_happy_path_returns_story_and_five_scenes() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    // Record creation, reads for merge cycles, and the three patches.
    Mock::given(method("POST"))
        .and(path("/rest/v1/generations"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([generation_row(json!({"step": "initializing"}))])),
        )
        .expect(1)
        .mount(&supabase)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([generation_row(json!({"step": "initializing"}))])),
        )
        .mount(&supabase)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generations"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&supabase)
        .await;

    // Story expansion then scene segmentation, matched on instruction text.
    Mock::given(method("POST"))
        .and(body_string_contains("creative storyteller"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_text_response("The keeper lit the lamp alone.")),
        )
        .expect(1)
        .mount(&genai)
        .await;

    let scenes: Vec<Value> = (1..=5)
        .map(|n| {
            json!({
                "scene_number": n,
                "description": format!("scene {n}"),
                "image_prompt": format!("prompt {n}")
            })
        })
        .collect();
    let scenes_text = format!("```json\n{}\n```", Value::Array(scenes).to_string());
    Mock::given(method("POST"))
        .and(body_string_contains("Break this story"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response(&scenes_text)))
        .expect(1)
        .mount(&genai)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json(
            "/generate",
            Some("token"),
            json!({"prompt": "a lonely lighthouse keeper"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["generation_id"], "gen-1");
    assert_eq!(body["story"], "The keeper lit the lamp alone.");
    let scenes = body["scenes"].as_array().unwrap();
    assert_eq!(scenes.len(), 5);
    for (i, scene) in scenes.iter().enumerate() {
        assert_eq!(scene["scene_number"], (i + 1) as u64);
    }
    assert!(body.get("scene_error").is_none());
}

#[tokio::test]
async fn test_generate_malformed_scene_output_still_completes() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generations"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([generation_row(json!({"step": "initializing"}))])),
        )
        .mount(&supabase)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([generation_row(json!({"step": "initializing"}))])),
        )
        .mount(&supabase)
        .await;
    // Story merge, scenes merge, and the completed patch all still happen.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generations"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("creative storyteller"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response("A story.")))
        .mount(&genai)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Break this story"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_text_response("I am unable to produce scenes.")),
        )
        .mount(&genai)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json("/generate", Some("token"), json!({"prompt": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["scenes"], json!([]));
    assert!(body["scene_error"].as_str().unwrap().contains("no JSON array"));
}

#[tokio::test]
async fn test_generate_upstream_failure_marks_record_failed() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generations"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([generation_row(json!({"step": "initializing"}))])),
        )
        .mount(&supabase)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([generation_row(json!({"step": "initializing"}))])),
        )
        .mount(&supabase)
        .await;
    // Exactly one patch: the terminal failed transition.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generations"))
        .and(body_string_contains("failed"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model melted"))
        .mount(&genai)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json("/generate", Some("token"), json!({"prompt": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("AI generation failed"));
}

#[tokio::test]
async fn test_login_wrong_email_sends_no_link() {
    let supabase = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/otp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&supabase)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, None), None);
    let response = app
        .oneshot(post_json(
            "/auth/login",
            None,
            json!({"email": "intruder@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_allowed_email_sends_link() {
    let supabase = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&supabase)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, None), None);
    let response = app
        .oneshot(post_json("/auth/login", None, json!({"email": ALLOWED_EMAIL})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Check your email"));
}

#[tokio::test]
async fn test_generate_video_without_scenes_is_rejected_before_upstream() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    // Stored record has a story but an empty scene list.
    Mock::given(method("GET"))
        .and(path("/rest/v1/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([generation_row(
            json!({"step": "completed", "story": "s", "scenes": []})
        )])))
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&genai)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json(
            "/generate-video",
            Some("token"),
            json!({"generationId": "gen-1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "no scenes available");
}

#[tokio::test]
async fn test_generate_video_records_operation_on_record() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([generation_row(json!({
            "step": "completed",
            "story": "s",
            "scenes": [{"scene_number": 1, "description": "the beam ignites", "image_prompt": "lens flare"}]
        }))])))
        .mount(&supabase)
        .await;
    // Merge keeps story/scenes while adding the video bookkeeping keys.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generations"))
        .and(body_string_contains("video_operation"))
        .and(body_string_contains("\"story\":\"s\""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("the beam ignites. lens flare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo/operations/op-7"
        })))
        .expect(1)
        .mount(&genai)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json(
            "/generate-video",
            Some("token"),
            json!({"generationId": "gen-1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["operation"], "models/veo/operations/op-7");
}

#[tokio::test]
async fn test_check_video_passes_status_through() {
    let supabase = MockServer::start().await;
    let genai = MockServer::start().await;
    mount_auth_user(&supabase, ALLOWED_EMAIL).await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models/veo/operations/op-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "https://cdn/final.mp4"}}]
                }
            }
        })))
        .mount(&genai)
        .await;

    let app = storyreel_api::create_router(test_state(&supabase, Some(&genai)), None);
    let response = app
        .oneshot(post_json(
            "/check-video",
            Some("token"),
            json!({"operationName": "models/veo/operations/op-7"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["done"], true);
    assert_eq!(body["videoUrl"], "https://cdn/final.mp4");
}

#[tokio::test]
async fn test_health_endpoint() {
    let supabase = MockServer::start().await;

    let app = storyreel_api::create_router(test_state(&supabase, None), None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
