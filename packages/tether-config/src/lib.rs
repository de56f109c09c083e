mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Agentic, BlobProviderConfig, Config, DirectoryProviderConfig, LlmProviderConfig, Providers,
	Retrieval, SearchProviderConfig, Security, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(invalid("service.http_bind", "must be non-empty"));
	}
	if cfg.retrieval.default_top_k == 0 {
		return Err(invalid("retrieval.default_top_k", "must be greater than zero"));
	}
	if cfg.agentic.top_k_cap == 0 {
		return Err(invalid("agentic.top_k_cap", "must be greater than zero"));
	}
	if !(0.0..=1.0).contains(&cfg.agentic.threshold_floor) {
		return Err(invalid("agentic.threshold_floor", "must be within [0, 1]"));
	}
	if cfg.agentic.threshold_relax < 0.0 {
		return Err(invalid("agentic.threshold_relax", "must be zero or greater"));
	}
	if cfg.agentic.reranker_scale <= 0.0 {
		return Err(invalid("agentic.reranker_scale", "must be greater than zero"));
	}
	if cfg.security.group_filter_field.trim().is_empty() {
		return Err(invalid("security.group_filter_field", "must be non-empty"));
	}

	for (key, timeout_ms) in [
		("providers.search.timeout_ms", cfg.providers.search.timeout_ms),
		("providers.directory.timeout_ms", cfg.providers.directory.timeout_ms),
		("providers.blob.timeout_ms", cfg.providers.blob.timeout_ms),
		("providers.llm.timeout_ms", cfg.providers.llm.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(invalid(key, "must be greater than zero"));
		}
	}

	Ok(())
}

fn invalid(key: &'static str, reason: &str) -> Error {
	Error::Validation { key, reason: format!("{reason}.") }
}
