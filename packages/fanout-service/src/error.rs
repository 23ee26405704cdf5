pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Source {source_name} failed: {message}")]
	Source { source_name: String, message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Cache error: {message}")]
	Cache { message: String },
}
impl From<fanout_storage::Error> for Error {
	fn from(err: fanout_storage::Error) -> Self {
		Self::Cache { message: err.to_string() }
	}
}

/// Outcome of a single source call that did not produce results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
	#[error("Source timed out.")]
	Timeout,
	#[error("{message}")]
	Failed { message: String },
}
impl SourceError {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed { message: message.into() }
	}

	pub fn into_error(self, source_name: impl Into<String>) -> Error {
		Error::Source { source_name: source_name.into(), message: self.to_string() }
	}
}

impl From<fanout_providers::Error> for SourceError {
	fn from(err: fanout_providers::Error) -> Self {
		if err.is_timeout() { Self::Timeout } else { Self::Failed { message: err.to_string() } }
	}
}
