use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{ServiceResult, TetherService};
use tether_domain::{
	AuthContext, ChatMessage, GroundingResult, ProcessingStep, Reference, SearchConfig, StepKind,
	StepTrace, trim,
};
use tether_providers::search::SearchQuery;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroundingRequest {
	pub query: String,
	#[serde(default)]
	pub chat_history: Vec<ChatMessage>,
	pub search_config: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroundingResponse {
	pub grounding: GroundingResult,
	pub processing_steps: Vec<ProcessingStep>,
}

impl TetherService {
	/// Retrieval without generation: callers that only want ranked, typed
	/// references (and the step trace) skip the language model entirely.
	pub async fn ground(&self, mut req: GroundingRequest) -> ServiceResult<GroundingResponse> {
		if req.query.trim().is_empty() {
			return Err(crate::Error::InvalidRequest {
				message: "query must be non-empty.".to_string(),
			});
		}

		self.apply_retrieval_defaults(&mut req.search_config);

		let mut trace = StepTrace::new();
		let grounding = self.resolve_grounding(&req.query, &req.search_config, &mut trace).await;

		Ok(GroundingResponse { grounding, processing_steps: trace.into_steps() })
	}

	/// A request with `top_k` left at zero takes the configured default.
	pub(crate) fn apply_retrieval_defaults(&self, config: &mut SearchConfig) {
		if config.top_k == 0 {
			config.top_k = self.cfg.retrieval.default_top_k;
		}
	}

	/// Resolves the caller's identity once per request. Directory failures
	/// degrade to an unfiltered request rather than aborting it; the step
	/// trace narrates the degradation.
	pub(crate) async fn resolve_auth(
		&self,
		access_token: Option<&str>,
		require_security_trimming: bool,
		trace: &mut StepTrace,
	) -> AuthContext {
		if !require_security_trimming {
			return AuthContext {
				access_token: access_token.map(str::to_string),
				group_ids: None,
			};
		}

		let Some(token) = access_token else {
			trace.push(
				"Security trimming skipped",
				StepKind::Warning,
				Some("Security trimming was requested without an access token.".to_string()),
			);

			return AuthContext::default();
		};

		match self.providers.directory.resolve_groups(&self.cfg.providers.directory, token).await {
			Ok(groups) => {
				trace.push(
					"Group membership resolved",
					StepKind::Security,
					Some(format!("Caller belongs to {} group(s).", groups.len())),
				);

				AuthContext {
					access_token: Some(token.to_string()),
					group_ids: Some(groups),
				}
			},
			Err(err) => {
				warn!(error = %err, "Group lookup failed; proceeding without security trimming.");
				trace.push(
					"Group lookup failed",
					StepKind::Warning,
					Some(
						"Directory lookup failed; retrieval proceeds without security trimming."
							.to_string(),
					),
				);

				AuthContext { access_token: Some(token.to_string()), group_ids: None }
			},
		}
	}

	/// Derives the retrieval config actually sent to the backend. The caller's
	/// `SearchConfig` is never mutated; trimming yields an augmented copy.
	pub(crate) fn trimmed_config(
		&self,
		config: &SearchConfig,
		auth: &AuthContext,
		trace: &mut StepTrace,
	) -> SearchConfig {
		let Some(groups) = auth.group_ids.as_deref() else {
			return config.clone();
		};

		if groups.is_empty() {
			// Trimming ran and found no memberships; an empty clause would
			// zero out results, so the base filter stands.
			return config.clone();
		}

		let base = config.filter_expressions.clone().unwrap_or_default();
		let augmented = trim::augment(&base, groups, &self.cfg.security.group_filter_field);

		trace.push(
			"Security trimming applied",
			StepKind::Security,
			Some(format!("Filter restricted to {} group(s).", groups.len())),
		);

		SearchConfig { filter_expressions: Some(augmented), ..config.clone() }
	}

	/// One retrieval pass. Backend failure yields an empty result, never an
	/// error: zero references means "no grounding available" downstream.
	pub(crate) async fn resolve_grounding(
		&self,
		query: &str,
		config: &SearchConfig,
		trace: &mut StepTrace,
	) -> GroundingResult {
		if !config.include_text && !config.include_images {
			trace.push(
				"Retrieval skipped",
				StepKind::Warning,
				Some("Neither text nor image content was requested.".to_string()),
			);

			return GroundingResult::default();
		}

		let mut filter = config.filter_expressions.clone().unwrap_or_default();

		if let Some(clause) = content_type_clause(config) {
			filter.push(clause);
		}

		let search_query = SearchQuery {
			query: query.to_string(),
			top: config.top_k,
			filter: filter.clone(),
			min_score: config.score_threshold,
		};

		match self.providers.search.search(&self.cfg.providers.search, &search_query).await {
			Ok(outcome) => {
				let mut references = Vec::with_capacity(outcome.hits.len());

				for hit in outcome.hits {
					// Reference ids must be unique within one grounding
					// result; keep the backend's best-ranked duplicate.
					if references.iter().any(|existing: &Reference| existing.id == hit.id) {
						continue;
					}

					references.push(Reference {
						id: hit.id,
						content: hit.content,
						content_type: hit.content_type,
						content_path: hit.content_path,
						title: hit.title,
						relevance_score: hit.score,
					});
				}

				trace.push(
					"Search completed",
					StepKind::Search,
					Some(format!(
						"Retrieved {} reference(s) for \"{query}\".",
						references.len()
					)),
				);

				let mut metadata = serde_json::Map::new();

				metadata.insert("total_count".to_string(), json!(outcome.total_count));

				if !filter.is_empty() {
					metadata.insert("filter".to_string(), json!(filter.join(" and ")));
				}

				GroundingResult { references, metadata }
			},
			Err(err) => {
				warn!(error = %err, "Search backend call failed; returning empty grounding.");
				trace.push(
					"Search failed",
					StepKind::Warning,
					Some("Search backend call failed; no grounding is available.".to_string()),
				);

				GroundingResult::default()
			},
		}
	}
}

fn content_type_clause(config: &SearchConfig) -> Option<String> {
	const IMAGE_TYPES: &str = "contentType eq 'image/jpeg' or contentType eq 'image/png'";

	match (config.include_text, config.include_images) {
		(true, true) => None,
		(true, false) => Some(format!("not ({IMAGE_TYPES})")),
		(false, true) => Some(format!("({IMAGE_TYPES})")),
		// Retrieval is skipped before this point when both are false.
		(false, false) => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(include_text: bool, include_images: bool) -> SearchConfig {
		SearchConfig {
			use_agentic_retrieval: false,
			top_k: 5,
			include_text,
			include_images,
			score_threshold: 0.0,
			filter_expressions: None,
		}
	}

	#[test]
	fn both_content_kinds_need_no_clause() {
		assert!(content_type_clause(&config(true, true)).is_none());
	}

	#[test]
	fn text_only_excludes_image_types() {
		let clause = content_type_clause(&config(true, false)).expect("clause expected");

		assert!(clause.starts_with("not ("));
		assert!(clause.contains("image/jpeg"));
		assert!(clause.contains("image/png"));
	}

	#[test]
	fn images_only_selects_image_types() {
		let clause = content_type_clause(&config(false, true)).expect("clause expected");

		assert!(clause.starts_with('('));
		assert!(clause.contains("image/jpeg"));
	}
}
