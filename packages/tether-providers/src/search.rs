use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// One search invocation against the backend index. `filter` elements are
/// AND-combined into a single expression; `min_score` is applied backend-side
/// so callers must not re-threshold the returned hits.
#[derive(Clone, Debug)]
pub struct SearchQuery {
	pub query: String,
	pub top: u32,
	pub filter: Vec<String>,
	pub min_score: f32,
}

#[derive(Clone, Debug)]
pub struct SearchHit {
	pub id: String,
	pub content: String,
	pub content_type: String,
	pub content_path: String,
	pub title: Option<String>,
	pub score: f32,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
	pub hits: Vec<SearchHit>,
	pub total_count: u64,
}

pub async fn search(
	cfg: &tether_config::SearchProviderConfig,
	query: &SearchQuery,
) -> Result<SearchOutcome> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"search": query.query,
		"top": query.top,
		"count": true,
	});

	if query.min_score > 0.0 {
		body["minimumScore"] = serde_json::json!(query.min_score);
	}
	if !query.filter.is_empty() {
		body["filter"] = serde_json::json!(query.filter.join(" and "));
	}

	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<SearchOutcome> {
	let values = json.get("value").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Search response is missing value array.".to_string() }
	})?;
	let total_count = json
		.get("@odata.count")
		.or_else(|| json.get("count"))
		.and_then(|v| v.as_u64())
		.unwrap_or(values.len() as u64);
	let mut hits = Vec::with_capacity(values.len());

	for item in values {
		let Some(id) = item.get("id").and_then(|v| v.as_str()) else {
			return Err(Error::InvalidResponse {
				message: "Search hit is missing id.".to_string(),
			});
		};
		let score = item
			.get("@search.score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.unwrap_or(0.0) as f32;

		hits.push(SearchHit {
			id: id.to_string(),
			content: string_field(item, "content"),
			content_type: string_field(item, "contentType"),
			content_path: string_field(item, "contentPath"),
			title: item.get("title").and_then(|v| v.as_str()).map(str::to_string),
			score,
		});
	}

	Ok(SearchOutcome { hits, total_count })
}

fn string_field(item: &Value, key: &str) -> String {
	item.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string()
}
