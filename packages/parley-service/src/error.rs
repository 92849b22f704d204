pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid configuration: {message}")]
	Config { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Timed out after {timeout_ms} ms: {message}")]
	Timeout { message: String, timeout_ms: u64 },
}
impl From<parley_config::Error> for Error {
	fn from(err: parley_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}

impl From<parley_providers::Error> for Error {
	fn from(err: parley_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
