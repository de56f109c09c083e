use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::Result;

/// Fetches an original file or extracted image by its store path. A missing
/// blob is `Ok(None)`; the caller decides whether that degrades the request.
/// The response body is fully consumed before returning.
pub async fn fetch(
	cfg: &tether_config::BlobProviderConfig,
	path: &str,
) -> Result<Option<Vec<u8>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/{}", cfg.api_base.trim_end_matches('/'), path.trim_start_matches('/'));
	let res = client
		.get(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.send()
		.await?;

	if res.status() == StatusCode::NOT_FOUND {
		return Ok(None);
	}

	let bytes = res.error_for_status()?.bytes().await?;

	Ok(Some(bytes.to_vec()))
}
