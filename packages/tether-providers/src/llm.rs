use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{Error, Result};

/// Non-streaming chat completion. Messages are already in the provider's wire
/// shape (role + string or multimodal content parts).
pub async fn complete(cfg: &tether_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(json)
}

/// Streaming chat completion. Text increments are sent on `tx` as they arrive;
/// a dropped receiver ends the loop early, which cancels the upstream call by
/// dropping the response stream.
pub async fn complete_streaming(
	cfg: &tether_config::LlmProviderConfig,
	messages: &[Value],
	tx: mpsc::Sender<String>,
) -> Result<()> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
		"stream": true,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?
		.error_for_status()?;
	let mut byte_stream = res.bytes_stream();
	let mut line_buffer = String::new();

	while let Some(chunk) = byte_stream.next().await {
		let chunk = chunk?;

		line_buffer.push_str(&String::from_utf8_lossy(&chunk));

		while let Some(newline_pos) = line_buffer.find('\n') {
			let line = line_buffer[..newline_pos].trim().to_string();

			line_buffer.drain(..=newline_pos);

			match parse_stream_line(&line)? {
				StreamPayload::Increment(text) =>
					if tx.send(text).await.is_err() {
						// Consumer cancelled; stop reading.
						return Ok(());
					},
				StreamPayload::Done => return Ok(()),
				StreamPayload::Skip => {},
			}
		}
	}

	Ok(())
}

enum StreamPayload {
	Increment(String),
	Done,
	Skip,
}

fn parse_stream_line(line: &str) -> Result<StreamPayload> {
	if line.is_empty() || line.starts_with("event:") || line.starts_with(':') {
		return Ok(StreamPayload::Skip);
	}

	let Some(data) = line.strip_prefix("data:").map(str::trim) else {
		return Ok(StreamPayload::Skip);
	};

	if data == "[DONE]" {
		return Ok(StreamPayload::Done);
	}

	let json: Value = serde_json::from_str(data)?;
	let text = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("delta"))
		.and_then(|delta| delta.get("content"))
		.and_then(|content| content.as_str());

	match text {
		Some(text) if !text.is_empty() => Ok(StreamPayload::Increment(text.to_string())),
		_ => Ok(StreamPayload::Skip),
	}
}

fn parse_completion(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(|content| content.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})
}
