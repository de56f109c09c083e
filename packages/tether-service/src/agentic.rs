use serde_json::{Value, json};
use tracing::warn;

use crate::{ServiceResult, TetherService, chat::ChatRequest};
use tether_domain::{AuthContext, Reference, Role, SearchConfig, StepKind, StepTrace, citation};

/// Multi-source synthesis prompt, deliberately distinct from the traditional
/// preamble: the broadened reference pool makes cross-source synthesis and
/// mandatory citation the point of this strategy.
const AGENTIC_PREAMBLE: &str = "You are a research assistant synthesizing an answer from \
multiple retrieved sources. Weigh the sources against each other, combine agreeing sources, \
and point out disagreements. Every statement taken from a source must carry its citation as \
[id]. Citations are mandatory; an uncited claim is a defect. If no source supports an answer, \
state that plainly.";

impl TetherService {
	/// Agentic strategy: broadened retrieval, reranking against the fixed
	/// normalization cutoff, then a specialized synthesis prompt. Any failure
	/// falls back to the traditional strategy rather than failing the
	/// request.
	pub(crate) async fn run_agentic(
		&self,
		req: &ChatRequest,
		auth: &AuthContext,
		trace: &mut StepTrace,
	) -> (String, Vec<Reference>) {
		match self.agentic_pipeline(req, auth, trace).await {
			Ok(answered) => answered,
			Err(err) => {
				warn!(error = %err, "Agentic strategy failed; falling back to traditional.");
				trace.push(
					"Agentic strategy failed",
					StepKind::Warning,
					Some(format!("{err} Falling back to the traditional strategy.")),
				);

				self.run_traditional(req, auth, trace).await
			},
		}
	}

	async fn agentic_pipeline(
		&self,
		req: &ChatRequest,
		auth: &AuthContext,
		trace: &mut StepTrace,
	) -> ServiceResult<(String, Vec<Reference>)> {
		let agentic = &self.cfg.agentic;
		let broadened = broaden(&req.search_config, agentic);

		trace.push(
			"Broadened retrieval",
			StepKind::Agent,
			Some(format!(
				"top_k {} -> {}, threshold {:.2} -> {:.2}.",
				req.search_config.top_k,
				broadened.top_k,
				req.search_config.score_threshold,
				broadened.score_threshold
			)),
		);

		let config = self.trimmed_config(&broadened, auth, trace);
		let grounding = self.resolve_grounding(&req.message, &config, trace).await;
		let cutoff = agentic.reranker_threshold / agentic.reranker_scale;
		let references =
			rerank(grounding.references, cutoff, req.search_config.top_k as usize);

		trace.push(
			"Reranked references",
			StepKind::Agent,
			Some(format!(
				"{} reference(s) kept at cutoff {cutoff:.2}.",
				references.len()
			)),
		);

		let messages = synthesis_messages(&req.chat_history, &req.message, &references);

		trace.push(
			"Multi-source synthesis",
			StepKind::Llm,
			Some(format!("Model: {}.", self.cfg.providers.llm.model)),
		);

		let response_text =
			self.providers.llm.complete(&self.cfg.providers.llm, &messages).await?;
		let citations = citation::extract(&response_text, &references);

		trace.push(
			"Citations extracted",
			StepKind::Data,
			Some(format!("{} of {} reference(s) cited.", citations.len(), references.len())),
		);

		Ok((response_text, citations))
	}
}

/// Strictly looser retrieval settings than the caller asked for, gathering a
/// superset for the reranker to cut back down.
fn broaden(config: &SearchConfig, agentic: &tether_config::Agentic) -> SearchConfig {
	SearchConfig {
		top_k: config.top_k.min(agentic.top_k_cap),
		score_threshold: (config.score_threshold - agentic.threshold_relax)
			.max(agentic.threshold_floor),
		..config.clone()
	}
}

/// Keeps references at or above the normalized cutoff, best first, truncated
/// to the caller's original `top_k`.
fn rerank(references: Vec<Reference>, cutoff: f32, top_k: usize) -> Vec<Reference> {
	let mut kept: Vec<Reference> =
		references.into_iter().filter(|reference| reference.relevance_score >= cutoff).collect();

	kept.sort_by(|a, b| {
		b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal)
	});
	kept.truncate(top_k);

	kept
}

fn synthesis_messages(
	chat_history: &[tether_domain::ChatMessage],
	user_message: &str,
	references: &[Reference],
) -> Vec<Value> {
	let mut messages = Vec::with_capacity(chat_history.len() + 3);

	messages.push(json!({ "role": "system", "content": AGENTIC_PREAMBLE }));

	for turn in chat_history.iter().filter(|turn| turn.role != Role::System) {
		messages.push(json!({ "role": turn.role.as_str(), "content": turn.content }));
	}

	messages.push(json!({ "role": "user", "content": user_message }));

	if !references.is_empty() {
		messages.push(json!({ "role": "user", "content": context_block(references) }));
	}

	messages
}

fn context_block(references: &[Reference]) -> String {
	let mut block = String::from("Retrieved sources, best match first:\n");

	for reference in references {
		let title = reference.title.as_deref().unwrap_or("untitled");

		block.push_str(&format!(
			"- [{}] (score {:.3}) {title}: {}\n",
			reference.id, reference.relevance_score, reference.content
		));
	}

	block
}
