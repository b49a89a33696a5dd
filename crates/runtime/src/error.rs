//! Error types for the terminal runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while supervising the terminal.
#[derive(Debug, Error)]
pub enum Error {
	/// The virtual framebuffer did not come up or died during its grace
	/// period. Fatal: nothing can run headless without it.
	#[error("virtual display unavailable: {0}")]
	DisplayUnavailable(String),

	/// The terminal process could not be spawned.
	#[error("failed to launch terminal: {0}")]
	LaunchFailed(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
