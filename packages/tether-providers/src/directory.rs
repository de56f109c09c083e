use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Resolves the caller's transitive group memberships. Authenticates with the
/// caller-supplied access token, not the service key.
pub async fn resolve_groups(
	cfg: &tether_config::DirectoryProviderConfig,
	access_token: &str,
) -> Result<Vec<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(&url)
		.headers(crate::auth_headers(access_token, &cfg.default_headers)?)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_group_response(json)
}

fn parse_group_response(json: Value) -> Result<Vec<String>> {
	let values = json.get("value").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse {
			message: "Directory response is missing value array.".to_string(),
		}
	})?;
	let mut groups = Vec::with_capacity(values.len());

	for item in values {
		let Some(id) = item.get("id").and_then(|v| v.as_str()) else {
			// Directory listings mix group and role objects; skip entries
			// without a usable id.
			continue;
		};

		groups.push(id.to_string());
	}

	Ok(groups)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collects_group_ids() {
		let json = serde_json::json!({
			"value": [
				{ "id": "g1", "displayName": "Engineering" },
				{ "displayName": "no id, skipped" },
				{ "id": "g2" }
			]
		});
		let groups = parse_group_response(json).expect("parse failed");

		assert_eq!(groups, vec!["g1".to_string(), "g2".to_string()]);
	}

	#[test]
	fn rejects_malformed_response() {
		assert!(parse_group_response(serde_json::json!({ "groups": [] })).is_err());
	}
}
