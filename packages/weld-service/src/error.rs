pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<weld_storage::Error> for Error {
	fn from(err: weld_storage::Error) -> Self {
		match err {
			weld_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			weld_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			weld_storage::Error::CorruptRow(message) => Self::Storage { message },
		}
	}
}
