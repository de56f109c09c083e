pub mod agentic;
pub mod chat;
pub mod ground;
pub mod prompt;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use tokio::sync::mpsc;

pub use chat::{APOLOGY_TEXT, ChatRequest, ChatResponse};
pub use error::{Error, Result};
pub use ground::{GroundingRequest, GroundingResponse};
use tether_config::{
	BlobProviderConfig, Config, DirectoryProviderConfig, LlmProviderConfig, SearchProviderConfig,
};
use tether_providers::search::{SearchOutcome, SearchQuery};

pub type ServiceResult<T> = Result<T, Error>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, tether_providers::Result<SearchOutcome>>;
}

pub trait DirectoryProvider
where
	Self: Send + Sync,
{
	fn resolve_groups<'a>(
		&'a self,
		cfg: &'a DirectoryProviderConfig,
		access_token: &'a str,
	) -> BoxFuture<'a, tether_providers::Result<Vec<String>>>;
}

pub trait BlobProvider
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		cfg: &'a BlobProviderConfig,
		path: &'a str,
	) -> BoxFuture<'a, tether_providers::Result<Option<Vec<u8>>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, tether_providers::Result<String>>;

	fn complete_streaming<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		tx: mpsc::Sender<String>,
	) -> BoxFuture<'a, tether_providers::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub search: Arc<dyn SearchProvider>,
	pub directory: Arc<dyn DirectoryProvider>,
	pub blob: Arc<dyn BlobProvider>,
	pub llm: Arc<dyn LlmProvider>,
}
impl Providers {
	pub fn new(
		search: Arc<dyn SearchProvider>,
		directory: Arc<dyn DirectoryProvider>,
		blob: Arc<dyn BlobProvider>,
		llm: Arc<dyn LlmProvider>,
	) -> Self {
		Self { search, directory, blob, llm }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			search: provider.clone(),
			directory: provider.clone(),
			blob: provider.clone(),
			llm: provider,
		}
	}
}

struct DefaultProviders;

impl SearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, tether_providers::Result<SearchOutcome>> {
		Box::pin(tether_providers::search::search(cfg, query))
	}
}

impl DirectoryProvider for DefaultProviders {
	fn resolve_groups<'a>(
		&'a self,
		cfg: &'a DirectoryProviderConfig,
		access_token: &'a str,
	) -> BoxFuture<'a, tether_providers::Result<Vec<String>>> {
		Box::pin(tether_providers::directory::resolve_groups(cfg, access_token))
	}
}

impl BlobProvider for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a BlobProviderConfig,
		path: &'a str,
	) -> BoxFuture<'a, tether_providers::Result<Option<Vec<u8>>>> {
		Box::pin(tether_providers::blob::fetch(cfg, path))
	}
}

impl LlmProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, tether_providers::Result<String>> {
		Box::pin(tether_providers::llm::complete(cfg, messages))
	}

	fn complete_streaming<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		tx: mpsc::Sender<String>,
	) -> BoxFuture<'a, tether_providers::Result<()>> {
		Box::pin(tether_providers::llm::complete_streaming(cfg, messages, tx))
	}
}

pub struct TetherService {
	pub cfg: Config,
	pub providers: Providers,
}
impl TetherService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}
