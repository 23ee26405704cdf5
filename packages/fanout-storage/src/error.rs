#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error("Corrupt cache record: {0}")]
	Corrupt(String),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
