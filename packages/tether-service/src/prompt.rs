use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tracing::warn;

use crate::TetherService;
use tether_domain::{ChatMessage, GroundingResult, Reference, StepKind, StepTrace};

/// Fixed instructional preamble. The `[id]` citation format here is what the
/// citation matcher later looks for, so the two must stay in sync.
const SYSTEM_PREAMBLE: &str = "You are an assistant that answers questions using only the \
provided sources. Every claim drawn from a source must cite it inline using its id in square \
brackets, for example [doc-1]. If the sources do not contain the answer, say so instead of \
guessing.";

impl TetherService {
	/// Builds the ordered, role-tagged message list for the language model:
	/// system preamble, unmodified chat history, the new user message, then
	/// one context message carrying all references. Empty grounding simply
	/// omits the context message.
	pub(crate) async fn assemble(
		&self,
		grounding: &GroundingResult,
		chat_history: &[ChatMessage],
		user_message: &str,
		trace: &mut StepTrace,
	) -> Vec<Value> {
		let mut messages = Vec::with_capacity(chat_history.len() + 3);

		messages.push(json!({ "role": "system", "content": SYSTEM_PREAMBLE }));

		for turn in chat_history {
			messages.push(json!({ "role": turn.role.as_str(), "content": turn.content }));
		}

		messages.push(json!({ "role": "user", "content": user_message }));

		if grounding.is_empty() {
			return messages;
		}

		let mut parts = Vec::with_capacity(grounding.references.len());

		for reference in &grounding.references {
			if reference.is_image() {
				parts.push(json!({
					"type": "text",
					"text": image_reference_line(reference),
				}));

				if let Some(payload) = self.inline_image(reference, trace).await {
					parts.push(json!({
						"type": "image_url",
						"image_url": {
							"url": format!(
								"data:{};base64,{payload}",
								reference.content_type
							),
						},
					}));
				}
			} else {
				parts.push(json!({
					"type": "text",
					"text": format!("Source [{}]: {}", reference.id, reference.content),
				}));
			}
		}

		messages.push(json!({ "role": "user", "content": parts }));

		messages
	}

	/// Fetches and base64-encodes an image reference. A miss or fetch failure
	/// keeps the textual reference line and drops the payload; the request
	/// never fails over an image.
	async fn inline_image(&self, reference: &Reference, trace: &mut StepTrace) -> Option<String> {
		match self
			.providers
			.blob
			.fetch(&self.cfg.providers.blob, &reference.content_path)
			.await
		{
			Ok(Some(bytes)) => Some(STANDARD.encode(bytes)),
			Ok(None) => {
				trace.push(
					"Image unavailable",
					StepKind::Warning,
					Some(format!(
						"Blob {} was not found; the image payload is omitted.",
						reference.content_path
					)),
				);

				None
			},
			Err(err) => {
				warn!(error = %err, path = %reference.content_path, "Image fetch failed.");
				trace.push(
					"Image fetch failed",
					StepKind::Warning,
					Some(format!(
						"Fetching blob {} failed; the image payload is omitted.",
						reference.content_path
					)),
				);

				None
			},
		}
	}
}

fn image_reference_line(reference: &Reference) -> String {
	match reference.title.as_deref() {
		Some(title) => format!("Image source [{}]: {title}", reference.id),
		None => format!("Image source [{}]: {}", reference.id, reference.content_path),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reference(id: &str, title: Option<&str>) -> Reference {
		Reference {
			id: id.to_string(),
			content: String::new(),
			content_type: "image/png".to_string(),
			content_path: format!("images/{id}.png"),
			title: title.map(str::to_string),
			relevance_score: 0.5,
		}
	}

	#[test]
	fn image_line_prefers_title() {
		assert_eq!(
			image_reference_line(&reference("img-1", Some("Quarterly chart"))),
			"Image source [img-1]: Quarterly chart"
		);
		assert_eq!(
			image_reference_line(&reference("img-2", None)),
			"Image source [img-2]: images/img-2.png"
		);
	}

	#[test]
	fn preamble_documents_citation_format() {
		assert!(SYSTEM_PREAMBLE.contains("[doc-1]"));
	}
}
