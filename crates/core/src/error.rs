//! Error types for the bridge.

use std::net::SocketAddr;
use std::time::Duration;

use tb_protocol::BridgeResponse;
use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while relaying a call.
#[derive(Debug, Error)]
pub enum Error {
	/// The automation pipe endpoint rejected the connection for a reason
	/// other than not-listening-yet (which is retried until the deadline).
	#[error("automation pipe unavailable at {addr}: {source}")]
	PipeUnavailable {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	/// The fixed client-side deadline elapsed. Expected when credentials are
	/// missing or the terminal's first-boot warm-up has not finished;
	/// surfaced to the caller verbatim, never retried here.
	#[error("automation pipe call timed out after {}s", .0.as_secs())]
	PipeTimeout(Duration),

	/// The pipe answered with something that is not a response line.
	#[error("automation pipe protocol error: {0}")]
	Pipe(String),

	/// I/O error on an established pipe connection.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Stable wire code for this error.
	pub fn code(&self) -> &'static str {
		match self {
			Error::PipeUnavailable { .. } => "pipe_unavailable",
			Error::PipeTimeout(_) => "pipe_timeout",
			Error::Pipe(_) => "pipe_error",
			Error::Io(_) => "io_error",
			Error::Json(_) => "json_error",
		}
	}

	/// Convert into the error response sent back to the caller.
	pub fn to_response(&self) -> BridgeResponse {
		BridgeResponse::Error {
			code: self.code().to_string(),
			message: self.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timeout_maps_to_stable_code() {
		let err = Error::PipeTimeout(Duration::from_secs(240));
		assert_eq!(err.code(), "pipe_timeout");
		match err.to_response() {
			BridgeResponse::Error { code, message } => {
				assert_eq!(code, "pipe_timeout");
				assert!(message.contains("240"));
			}
			other => panic!("unexpected response: {other:?}"),
		}
	}
}
