use toml::Value;

use tether_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:8080"
log_level = "info"

[providers.search]
api_base   = "http://localhost:9200"
api_key    = "key"
path       = "/indexes/docs/search"
timeout_ms = 5000

[providers.directory]
api_base   = "http://localhost:9300"
path       = "/me/transitiveMemberOf"
timeout_ms = 5000

[providers.blob]
api_base   = "http://localhost:9400"
api_key    = "key"
timeout_ms = 5000

[providers.llm]
api_base    = "http://localhost:9500"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "gpt-test"
temperature = 0.2
max_tokens  = 1024
timeout_ms  = 30000

[retrieval]
default_top_k = 5

[agentic]

[security]
"#;

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample.");
	let table = root
		.as_table_mut()
		.and_then(|table| table.get_mut(section))
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Sample config must include [{section}]."));

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn parse(raw: &str) -> Config {
	toml::from_str(raw).expect("Failed to parse config.")
}

#[test]
fn sample_config_is_valid() {
	let cfg = parse(SAMPLE_CONFIG_TOML);

	tether_config::validate(&cfg).expect("Sample config must validate.");
}

#[test]
fn agentic_defaults_match_documented_constants() {
	let cfg = parse(SAMPLE_CONFIG_TOML);

	assert_eq!(cfg.agentic.top_k_cap, 20);
	assert_eq!(cfg.agentic.threshold_relax, 0.2);
	assert_eq!(cfg.agentic.threshold_floor, 0.3);
	assert_eq!(cfg.agentic.reranker_threshold, 2.5);
	assert_eq!(cfg.agentic.reranker_scale, 4.0);
	assert_eq!(cfg.security.group_filter_field, "group_ids");
}

#[test]
fn rejects_zero_top_k() {
	let raw = sample_toml_with("retrieval", "default_top_k", Value::Integer(0));
	let cfg = parse(&raw);
	let err = tether_config::validate(&cfg).expect_err("Zero top_k must be rejected.");

	assert!(matches!(err, Error::Validation { key: "retrieval.default_top_k", .. }));
	assert!(err.to_string().contains("retrieval.default_top_k"));
}

#[test]
fn rejects_threshold_floor_above_one() {
	let raw = sample_toml_with("agentic", "threshold_floor", Value::Float(1.5));
	let cfg = parse(&raw);

	assert!(tether_config::validate(&cfg).is_err());
}

#[test]
fn rejects_zero_reranker_scale() {
	let raw = sample_toml_with("agentic", "reranker_scale", Value::Float(0.0));
	let cfg = parse(&raw);

	assert!(tether_config::validate(&cfg).is_err());
}

#[test]
fn rejects_zero_provider_timeout() {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample.");
	root.as_table_mut()
		.and_then(|table| table.get_mut("providers"))
		.and_then(Value::as_table_mut)
		.and_then(|providers| providers.get_mut("llm"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [providers.llm].")
		.insert("timeout_ms".to_string(), Value::Integer(0));

	let raw = toml::to_string(&root).expect("Failed to render sample config.");
	let cfg = parse(&raw);

	assert!(tether_config::validate(&cfg).is_err());
}

#[test]
fn rejects_empty_group_filter_field() {
	let raw = sample_toml_with("security", "group_filter_field", Value::String(" ".to_string()));
	let cfg = parse(&raw);

	assert!(tether_config::validate(&cfg).is_err());
}
