use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-request retrieval settings supplied by the caller. Treated as an
/// immutable value: security trimming derives an augmented copy and never
/// writes through to the original.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchConfig {
	#[serde(default)]
	pub use_agentic_retrieval: bool,
	/// Zero means "use the service's configured default".
	#[serde(default)]
	pub top_k: u32,
	#[serde(default = "default_true")]
	pub include_text: bool,
	#[serde(default)]
	pub include_images: bool,
	#[serde(default)]
	pub score_threshold: f32,
	#[serde(default)]
	pub filter_expressions: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Reference {
	pub id: String,
	pub content: String,
	pub content_type: String,
	pub content_path: String,
	#[serde(default)]
	pub title: Option<String>,
	pub relevance_score: f32,
}
impl Reference {
	pub fn is_image(&self) -> bool {
		matches!(self.content_type.as_str(), "image/jpeg" | "image/png")
	}
}

/// One retrieval pass worth of ranked references. Created fresh per request
/// and discarded once the response is built.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GroundingResult {
	pub references: Vec<Reference>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
}
impl GroundingResult {
	pub fn is_empty(&self) -> bool {
		self.references.is_empty()
	}
}

/// Caller identity resolved once per request. `group_ids: None` means security
/// trimming was not performed and retrieval runs unfiltered; `Some(vec![])`
/// means trimming was performed and the caller belongs to no groups.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
	pub access_token: Option<String>,
	pub group_ids: Option<Vec<String>>,
}

fn default_true() -> bool {
	true
}
