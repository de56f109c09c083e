use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use tower::util::ServiceExt;

use tether_api::{routes, state::AppState};
use tether_service::{Providers, TetherService};
use tether_testkit::{StubBlob, StubDirectory, StubLlm, StubSearch, hit, test_config};

fn app(search: StubSearch, llm: StubLlm) -> Router {
	let providers = Providers::new(
		Arc::new(search),
		Arc::new(StubDirectory::returning(Vec::new())),
		Arc::new(StubBlob::empty()),
		Arc::new(llm),
	);
	let service = TetherService::with_providers(test_config(), providers);

	routes::router(AppState::with_service(service))
}

fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let app = app(StubSearch::returning(Vec::new()), StubLlm::replying("unused"));
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_answers_with_citations_and_a_step_trace() {
	let app = app(
		StubSearch::returning(vec![hit("doc-1", "grounding content", 0.9)]),
		StubLlm::replying("Grounded answer [doc-1]."),
	);
	let payload = serde_json::json!({
		"message": "What does the corpus say?",
		"search_config": { "top_k": 5 }
	});
	let response = app.oneshot(post_json("/v1/chat", payload)).await.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["response_text"], "Grounded answer [doc-1].");
	assert_eq!(json["citations"][0]["id"], "doc-1");
	assert!(!json["request_id"].as_str().expect("request_id missing").is_empty());
	assert!(!json["processing_steps"].as_array().expect("steps missing").is_empty());
}

#[tokio::test]
async fn empty_message_is_a_bad_request() {
	let app = app(StubSearch::returning(Vec::new()), StubLlm::replying("unused"));
	let payload = serde_json::json!({
		"message": "   ",
		"search_config": { "top_k": 5 }
	});
	let response = app.oneshot(post_json("/v1/chat", payload)).await.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn grounding_returns_ranked_references_without_generation() {
	let llm = StubLlm::replying("unused");
	let app = app(
		StubSearch::returning(vec![
			hit("doc-1", "first", 0.9),
			hit("doc-2", "second", 0.8),
		]),
		llm,
	);
	let payload = serde_json::json!({
		"query": "ranked retrieval",
		"search_config": { "top_k": 5 }
	});
	let response = app
		.oneshot(post_json("/v1/grounding", payload))
		.await
		.expect("Failed to call grounding.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;
	let references = json["grounding"]["references"].as_array().expect("references missing");

	assert_eq!(references.len(), 2);
	assert_eq!(references[0]["id"], "doc-1");
	assert_eq!(references[1]["id"], "doc-2");
}

#[tokio::test]
async fn chat_stream_emits_sse_data_events() {
	let app = app(
		StubSearch::returning(vec![hit("doc-1", "content", 0.9)]),
		StubLlm::replying("Streamed answer [doc-1]."),
	);
	let payload = serde_json::json!({
		"message": "stream this",
		"search_config": { "top_k": 5 }
	});
	let response = app
		.oneshot(post_json("/v1/chat/stream", payload))
		.await
		.expect("Failed to call chat stream.");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(
		response
			.headers()
			.get("content-type")
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("text/event-stream"))
	);

	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let text = String::from_utf8(bytes.to_vec()).expect("Stream was not UTF-8.");

	assert!(text.contains("data: Streamed answer [doc-1]."));
}

#[tokio::test]
async fn chat_stream_rejects_an_empty_message_up_front() {
	let app = app(StubSearch::returning(Vec::new()), StubLlm::replying("unused"));
	let payload = serde_json::json!({
		"message": "",
		"search_config": { "top_k": 5 }
	});
	let response = app
		.oneshot(post_json("/v1/chat/stream", payload))
		.await
		.expect("Failed to call chat stream.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
