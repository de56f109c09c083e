pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Only `InvalidRequest` ever reaches the chat caller as a structured error;
/// collaborator failures are absorbed into the step trace instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}

impl From<tether_providers::Error> for Error {
	fn from(err: tether_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
