pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Catalog error: {message}")]
	Catalog { message: String },
}
impl From<agora_catalog::Error> for Error {
	fn from(err: agora_catalog::Error) -> Self {
		match err {
			agora_catalog::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			err => Self::Catalog { message: err.to_string() },
		}
	}
}
