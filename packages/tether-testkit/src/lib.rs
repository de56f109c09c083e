//! Stub collaborators and config builders shared by the service and API test
//! suites. Everything here is deterministic and in-memory.

use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use tether_config::{
	Agentic, BlobProviderConfig, Config, DirectoryProviderConfig, LlmProviderConfig, Providers,
	Retrieval, SearchProviderConfig, Security, Service,
};
use tether_providers::search::{SearchHit, SearchOutcome, SearchQuery};
use tether_service::{BlobProvider, BoxFuture, DirectoryProvider, LlmProvider, SearchProvider};

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		providers: Providers {
			search: SearchProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/indexes/docs/search".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			directory: DirectoryProviderConfig {
				api_base: "http://localhost".to_string(),
				path: "/me/transitiveMemberOf".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			blob: BlobProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-model".to_string(),
				temperature: 0.2,
				max_tokens: 1_024,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		retrieval: Retrieval { default_top_k: 5 },
		agentic: Agentic {
			top_k_cap: 20,
			threshold_relax: 0.2,
			threshold_floor: 0.3,
			reranker_threshold: 2.5,
			reranker_scale: 4.0,
		},
		security: Security { group_filter_field: "group_ids".to_string() },
	}
}

pub fn hit(id: &str, content: &str, score: f32) -> SearchHit {
	SearchHit {
		id: id.to_string(),
		content: content.to_string(),
		content_type: "text/plain".to_string(),
		content_path: format!("{id}.txt"),
		title: Some(format!("Title of {id}")),
		score,
	}
}

pub fn image_hit(id: &str, path: &str, score: f32) -> SearchHit {
	SearchHit {
		id: id.to_string(),
		content: String::new(),
		content_type: "image/png".to_string(),
		content_path: path.to_string(),
		title: None,
		score,
	}
}

/// Canned search backend. Records every query so tests can assert on the
/// filter expressions and broadened settings actually sent.
pub struct StubSearch {
	pub hits: Vec<SearchHit>,
	pub fail: bool,
	pub queries: Mutex<Vec<SearchQuery>>,
}
impl StubSearch {
	pub fn returning(hits: Vec<SearchHit>) -> Self {
		Self { hits, fail: false, queries: Mutex::new(Vec::new()) }
	}

	pub fn failing() -> Self {
		Self { hits: Vec::new(), fail: true, queries: Mutex::new(Vec::new()) }
	}

	pub fn recorded_queries(&self) -> Vec<SearchQuery> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SearchProvider for StubSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a SearchProviderConfig,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, tether_providers::Result<SearchOutcome>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query.clone());

		let outcome = SearchOutcome { hits: self.hits.clone(), total_count: self.hits.len() as u64 };
		let fail = self.fail;

		Box::pin(async move {
			if fail {
				return Err(tether_providers::Error::InvalidResponse {
					message: "Search backend is unavailable.".to_string(),
				});
			}

			Ok(outcome)
		})
	}
}

pub struct StubDirectory {
	pub groups: Vec<String>,
	pub fail: bool,
	pub calls: AtomicUsize,
}
impl StubDirectory {
	pub fn returning(groups: Vec<String>) -> Self {
		Self { groups, fail: false, calls: AtomicUsize::new(0) }
	}

	pub fn failing() -> Self {
		Self { groups: Vec::new(), fail: true, calls: AtomicUsize::new(0) }
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl DirectoryProvider for StubDirectory {
	fn resolve_groups<'a>(
		&'a self,
		_cfg: &'a DirectoryProviderConfig,
		_access_token: &'a str,
	) -> BoxFuture<'a, tether_providers::Result<Vec<String>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let groups = self.groups.clone();
		let fail = self.fail;

		Box::pin(async move {
			if fail {
				return Err(tether_providers::Error::InvalidResponse {
					message: "Directory service is unavailable.".to_string(),
				});
			}

			Ok(groups)
		})
	}
}

pub struct StubBlob {
	pub blobs: HashMap<String, Vec<u8>>,
	pub fail: bool,
}
impl StubBlob {
	pub fn empty() -> Self {
		Self { blobs: HashMap::new(), fail: false }
	}

	pub fn with(path: &str, bytes: Vec<u8>) -> Self {
		let mut blobs = HashMap::new();

		blobs.insert(path.to_string(), bytes);

		Self { blobs, fail: false }
	}

	pub fn failing() -> Self {
		Self { blobs: HashMap::new(), fail: true }
	}
}
impl BlobProvider for StubBlob {
	fn fetch<'a>(
		&'a self,
		_cfg: &'a BlobProviderConfig,
		path: &'a str,
	) -> BoxFuture<'a, tether_providers::Result<Option<Vec<u8>>>> {
		let result = self.blobs.get(path).cloned();
		let fail = self.fail;

		Box::pin(async move {
			if fail {
				return Err(tether_providers::Error::InvalidResponse {
					message: "Blob store is unavailable.".to_string(),
				});
			}

			Ok(result)
		})
	}
}

/// Canned language model. `fail_times` makes the first N completion calls
/// fail, which is how the agentic-fallback tests arrange "synthesis throws,
/// traditional succeeds".
pub struct StubLlm {
	pub reply: String,
	pub stream_chunks: Vec<String>,
	pub fail_times: AtomicUsize,
	pub calls: AtomicUsize,
	pub seen_messages: Mutex<Vec<Vec<Value>>>,
}
impl StubLlm {
	pub fn replying(reply: &str) -> Self {
		Self {
			reply: reply.to_string(),
			stream_chunks: vec![reply.to_string()],
			fail_times: AtomicUsize::new(0),
			calls: AtomicUsize::new(0),
			seen_messages: Mutex::new(Vec::new()),
		}
	}

	pub fn failing_then_replying(fail_times: usize, reply: &str) -> Self {
		let stub = Self::replying(reply);

		stub.fail_times.store(fail_times, Ordering::SeqCst);

		stub
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn recorded_messages(&self) -> Vec<Vec<Value>> {
		self.seen_messages.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn take_failure(&self) -> bool {
		self.fail_times
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
				remaining.checked_sub(1)
			})
			.is_ok()
	}
}
impl LlmProvider for StubLlm {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, tether_providers::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.seen_messages.lock().unwrap_or_else(|err| err.into_inner()).push(messages.to_vec());

		let fail = self.take_failure();
		let reply = self.reply.clone();

		Box::pin(async move {
			if fail {
				return Err(tether_providers::Error::InvalidResponse {
					message: "Language model call failed.".to_string(),
				});
			}

			Ok(reply)
		})
	}

	fn complete_streaming<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		tx: mpsc::Sender<String>,
	) -> BoxFuture<'a, tether_providers::Result<()>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.seen_messages.lock().unwrap_or_else(|err| err.into_inner()).push(messages.to_vec());

		let fail = self.take_failure();
		let chunks = self.stream_chunks.clone();

		Box::pin(async move {
			if fail {
				return Err(tether_providers::Error::InvalidResponse {
					message: "Language model stream failed.".to_string(),
				});
			}

			for chunk in chunks {
				if tx.send(chunk).await.is_err() {
					break;
				}
			}

			Ok(())
		})
	}
}
