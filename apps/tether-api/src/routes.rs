use std::convert::Infallible;

use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{
		IntoResponse, Response,
		sse::{Event, KeepAlive, Sse},
	},
	routing::{get, post},
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};

use crate::state::AppState;
use tether_service::{
	ChatRequest, ChatResponse, Error as ServiceError, GroundingRequest, GroundingResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/chat", post(chat))
		.route("/v1/chat/stream", post(chat_stream))
		.route("/v1/grounding", post(grounding))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat(payload).await?;

	Ok(Json(response))
}

/// Server-sent events. Each model increment arrives as one `data:` event;
/// the stream closes once generation finishes.
async fn chat_stream(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
	payload.validate()?;

	let (tx, rx) = mpsc::channel(16);
	let service = state.service.clone();

	tokio::spawn(async move {
		let _ = service.chat_stream(payload, tx).await;
	});

	let stream = ReceiverStream::new(rx).map(|chunk| Ok(Event::default().data(chunk)));

	Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn grounding(
	State(state): State<AppState>,
	Json(payload): Json<GroundingRequest>,
) -> Result<Json<GroundingResponse>, ApiError> {
	let response = state.service.ground(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => Self {
				status: StatusCode::BAD_REQUEST,
				error_code: "invalid_request",
				message,
			},
			ServiceError::Provider { message } => Self {
				status: StatusCode::BAD_GATEWAY,
				error_code: "provider_error",
				message,
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code.to_string(),
			message: self.message,
		};

		(self.status, Json(body)).into_response()
	}
}
