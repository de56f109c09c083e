use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
	Search,
	Llm,
	Agent,
	Security,
	Warning,
	Error,
	Data,
}

/// One entry of the per-request observability trace. The trace is returned to
/// the caller verbatim; it is never replayed or persisted.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProcessingStep {
	pub title: String,
	pub kind: StepKind,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

/// Append-only step collector. Emission order is preserved.
#[derive(Debug, Default)]
pub struct StepTrace {
	steps: Vec<ProcessingStep>,
}
impl StepTrace {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, title: impl Into<String>, kind: StepKind, description: Option<String>) {
		self.push_with_content(title, kind, description, None);
	}

	pub fn push_with_content(
		&mut self,
		title: impl Into<String>,
		kind: StepKind,
		description: Option<String>,
		content: Option<String>,
	) {
		self.steps.push(ProcessingStep {
			title: title.into(),
			kind,
			description,
			content,
			timestamp: OffsetDateTime::now_utc(),
		});
	}

	pub fn steps(&self) -> &[ProcessingStep] {
		&self.steps
	}

	pub fn into_steps(self) -> Vec<ProcessingStep> {
		self.steps
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preserves_emission_order() {
		let mut trace = StepTrace::new();

		trace.push("first", StepKind::Search, None);
		trace.push("second", StepKind::Llm, Some("generation".to_string()));
		trace.push("third", StepKind::Error, None);

		let titles: Vec<&str> =
			trace.steps().iter().map(|step| step.title.as_str()).collect();

		assert_eq!(titles, vec!["first", "second", "third"]);
	}

	#[test]
	fn kind_serializes_lowercase() {
		let json = serde_json::to_value(StepKind::Warning).expect("serialize failed");

		assert_eq!(json, serde_json::json!("warning"));
	}
}
