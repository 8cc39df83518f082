pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Request aborted.")]
	Aborted,
	#[error("Request timed out after {ms} ms.")]
	Timeout { ms: u64 },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error("Transport error: {message}")]
	Transport { message: String },
}
impl Error {
	pub fn is_abort(&self) -> bool {
		matches!(self, Self::Aborted)
	}
}
