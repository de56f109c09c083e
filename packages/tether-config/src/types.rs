use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub retrieval: Retrieval,
	pub agentic: Agentic,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub search: SearchProviderConfig,
	pub directory: DirectoryProviderConfig,
	pub blob: BlobProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct SearchProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryProviderConfig {
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct BlobProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub default_top_k: u32,
}

/// Score-normalization heuristics for the agentic strategy. The arithmetic
/// downstream (`min(top_k, top_k_cap)`, `max(threshold - threshold_relax,
/// threshold_floor)`, `score >= reranker_threshold / reranker_scale`) is fixed;
/// only the constants are tunable.
#[derive(Debug, Deserialize)]
pub struct Agentic {
	#[serde(default = "default_top_k_cap")]
	pub top_k_cap: u32,
	#[serde(default = "default_threshold_relax")]
	pub threshold_relax: f32,
	#[serde(default = "default_threshold_floor")]
	pub threshold_floor: f32,
	#[serde(default = "default_reranker_threshold")]
	pub reranker_threshold: f32,
	#[serde(default = "default_reranker_scale")]
	pub reranker_scale: f32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	#[serde(default = "default_group_filter_field")]
	pub group_filter_field: String,
}

fn default_top_k_cap() -> u32 {
	20
}

fn default_threshold_relax() -> f32 {
	0.2
}

fn default_threshold_floor() -> f32 {
	0.3
}

fn default_reranker_threshold() -> f32 {
	2.5
}

fn default_reranker_scale() -> f32 {
	4.0
}

fn default_group_filter_field() -> String {
	"group_ids".to_string()
}
