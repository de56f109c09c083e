use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::{Error, ServiceResult, TetherService};
use tether_domain::{
	AuthContext, ChatMessage, ProcessingStep, Reference, SearchConfig, StepKind, StepTrace,
	citation,
};

/// Fixed degraded-answer text. Recoverable generation failures never surface
/// a transport-level error to the chat caller.
pub const APOLOGY_TEXT: &str =
	"I'm sorry, I was unable to generate an answer for this request. Please try again.";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
	pub message: String,
	#[serde(default)]
	pub chat_history: Vec<ChatMessage>,
	pub search_config: SearchConfig,
	#[serde(default)]
	pub access_token: Option<String>,
	#[serde(default)]
	pub require_security_trimming: bool,
}
impl ChatRequest {
	pub fn validate(&self) -> ServiceResult<()> {
		if self.message.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "message must be non-empty.".to_string(),
			});
		}

		Ok(())
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
	pub response_text: String,
	pub request_id: Uuid,
	pub citations: Vec<Reference>,
	pub processing_steps: Vec<ProcessingStep>,
}

/// Chosen once per request from `search_config.use_agentic_retrieval` and
/// never re-evaluated mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
	Traditional,
	Agentic,
}
impl Strategy {
	pub(crate) fn select(config: &SearchConfig) -> Self {
		if config.use_agentic_retrieval { Self::Agentic } else { Self::Traditional }
	}

	fn label(self) -> &'static str {
		match self {
			Self::Traditional => "traditional",
			Self::Agentic => "agentic",
		}
	}
}

impl TetherService {
	/// The synchronous chat operation. Apart from input validation, this
	/// always returns a well-formed `ChatResponse`: pipeline failures are
	/// narrated as processing steps and answered with the apology text.
	pub async fn chat(&self, mut req: ChatRequest) -> ServiceResult<ChatResponse> {
		req.validate()?;
		self.apply_retrieval_defaults(&mut req.search_config);

		let request_id = Uuid::new_v4();
		let mut trace = StepTrace::new();
		let strategy = Strategy::select(&req.search_config);

		trace.push(
			"Request accepted",
			StepKind::Data,
			Some(format!("Strategy: {}.", strategy.label())),
		);

		let auth = self
			.resolve_auth(req.access_token.as_deref(), req.require_security_trimming, &mut trace)
			.await;
		let (response_text, citations) = match strategy {
			Strategy::Agentic => self.run_agentic(&req, &auth, &mut trace).await,
			Strategy::Traditional => self.run_traditional(&req, &auth, &mut trace).await,
		};

		Ok(ChatResponse {
			response_text,
			request_id,
			citations,
			processing_steps: trace.into_steps(),
		})
	}

	/// The streaming chat operation. The traditional path forwards model
	/// increments as they arrive; the agentic path runs to completion and
	/// emits the whole answer as a single chunk (documented degraded
	/// behavior). A dropped receiver cancels the stream at the next increment
	/// boundary.
	pub async fn chat_stream(
		&self,
		mut req: ChatRequest,
		tx: mpsc::Sender<String>,
	) -> ServiceResult<()> {
		req.validate()?;
		self.apply_retrieval_defaults(&mut req.search_config);

		let mut trace = StepTrace::new();

		match Strategy::select(&req.search_config) {
			Strategy::Agentic => {
				let auth = self
					.resolve_auth(
						req.access_token.as_deref(),
						req.require_security_trimming,
						&mut trace,
					)
					.await;
				let (response_text, _) = self.run_agentic(&req, &auth, &mut trace).await;
				let _ = tx.send(response_text).await;

				Ok(())
			},
			Strategy::Traditional => {
				if let Err(err) = self.stream_traditional(&req, &mut trace, tx.clone()).await {
					warn!(error = %err, "Streaming generation failed; sending apology text.");

					let _ = tx.send(APOLOGY_TEXT.to_string()).await;
				}

				Ok(())
			},
		}
	}

	/// Traditional single-pass retrieve-then-generate. Any mid-pipeline
	/// failure is caught here: error step, apology text, empty citations,
	/// and whatever steps were already recorded.
	pub(crate) async fn run_traditional(
		&self,
		req: &ChatRequest,
		auth: &AuthContext,
		trace: &mut StepTrace,
	) -> (String, Vec<Reference>) {
		match self.traditional_pipeline(req, auth, trace).await {
			Ok(answered) => answered,
			Err(err) => {
				warn!(error = %err, "Traditional strategy failed; answering with apology text.");
				trace.push("Generation failed", StepKind::Error, Some(err.to_string()));

				(APOLOGY_TEXT.to_string(), Vec::new())
			},
		}
	}

	async fn traditional_pipeline(
		&self,
		req: &ChatRequest,
		auth: &AuthContext,
		trace: &mut StepTrace,
	) -> ServiceResult<(String, Vec<Reference>)> {
		let config = self.trimmed_config(&req.search_config, auth, trace);
		let grounding = self.resolve_grounding(&req.message, &config, trace).await;
		let messages = self.assemble(&grounding, &req.chat_history, &req.message, trace).await;

		trace.push(
			"Answer generation",
			StepKind::Llm,
			Some(format!("Model: {}.", self.cfg.providers.llm.model)),
		);

		let response_text =
			self.providers.llm.complete(&self.cfg.providers.llm, &messages).await?;
		let citations = citation::extract(&response_text, &grounding.references);

		trace.push(
			"Citations extracted",
			StepKind::Data,
			Some(format!(
				"{} of {} reference(s) cited.",
				citations.len(),
				grounding.references.len()
			)),
		);

		Ok((response_text, citations))
	}

	async fn stream_traditional(
		&self,
		req: &ChatRequest,
		trace: &mut StepTrace,
		tx: mpsc::Sender<String>,
	) -> ServiceResult<()> {
		let auth = self
			.resolve_auth(req.access_token.as_deref(), req.require_security_trimming, trace)
			.await;
		let config = self.trimmed_config(&req.search_config, &auth, trace);
		let grounding = self.resolve_grounding(&req.message, &config, trace).await;
		let messages = self.assemble(&grounding, &req.chat_history, &req.message, trace).await;

		self.providers
			.llm
			.complete_streaming(&self.cfg.providers.llm, &messages, tx)
			.await?;

		Ok(())
	}
}
