pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Upstream unavailable: {message}")]
	UpstreamUnavailable { message: String },
	#[error("Malformed record: {message}")]
	MalformedRecord { message: String },
	#[error("Invalid prefix {prefix:?}: must be at least {min_len} characters.")]
	InvalidPrefix { prefix: String, min_len: usize },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Deadline exceeded during {step}.")]
	DeadlineExceeded { step: String },
}
impl Error {
	/// Only transient upstream failures are worth another attempt.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::UpstreamUnavailable { .. })
	}
}

impl From<clue_providers::Error> for Error {
	fn from(err: clue_providers::Error) -> Self {
		if err.is_transient() {
			return Self::UpstreamUnavailable { message: err.to_string() };
		}

		match err {
			clue_providers::Error::NotFound { resource } => Self::NotFound { message: resource },
			clue_providers::Error::SerdeJson(inner) =>
				Self::MalformedRecord { message: inner.to_string() },
			clue_providers::Error::InvalidResponse { message } => Self::MalformedRecord { message },
			other => Self::Provider { message: other.to_string() },
		}
	}
}
