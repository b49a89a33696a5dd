//! Automation pipe client.
//!
//! The terminal's embedded automation API is synchronous and single-homed:
//! one local endpoint, one outstanding call at a time per connection. The
//! client therefore opens a fresh connection per call, writes the request as
//! one JSON line, and reads one response line, all under the API's fixed
//! deadline. A not-yet-listening endpoint (cold start) is retried inside the
//! deadline rather than failed fast; callers are told to expect a timeout,
//! not a connection error, while the terminal warms up.

use std::net::SocketAddr;
use std::time::Duration;

use tb_protocol::{BridgeRequest, BridgeResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Error, Result};

/// Fixed client-side deadline for one automation call. Session starts go
/// through credential checks and history sync on the terminal side, so the
/// bound is generous; it is not configurable per call.
pub const SYNC_REQUEST_TIMEOUT: Duration = Duration::from_secs(240);

/// How often to re-try connecting while the endpoint is not listening yet.
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// One-call-per-connection client for the automation endpoint.
#[derive(Debug, Clone)]
pub struct PipeClient {
	addr: SocketAddr,
	timeout: Duration,
}

impl PipeClient {
	pub fn new(addr: SocketAddr) -> Self {
		Self {
			addr,
			timeout: SYNC_REQUEST_TIMEOUT,
		}
	}

	/// Override the fixed deadline. Test seam; production keeps
	/// [`SYNC_REQUEST_TIMEOUT`].
	pub fn with_timeout(addr: SocketAddr, timeout: Duration) -> Self {
		Self { addr, timeout }
	}

	pub fn addr(&self) -> SocketAddr {
		self.addr
	}

	/// Relay one request and return the terminal's response.
	///
	/// # Errors
	///
	/// [`Error::PipeTimeout`] when the deadline elapses (including the
	/// endpoint never starting to listen), [`Error::PipeUnavailable`] on a
	/// hard connect failure, [`Error::Pipe`] on a broken exchange.
	pub async fn call(&self, request: &BridgeRequest) -> Result<BridgeResponse> {
		match tokio::time::timeout(self.timeout, self.exchange(request)).await {
			Ok(result) => result,
			Err(_) => Err(Error::PipeTimeout(self.timeout)),
		}
	}

	async fn exchange(&self, request: &BridgeRequest) -> Result<BridgeResponse> {
		let stream = self.connect_with_retry().await?;
		let (read_half, mut write_half) = stream.into_split();

		let payload = serde_json::to_string(request)?;
		write_half.write_all(format!("{payload}\n").as_bytes()).await?;
		write_half.flush().await?;

		let mut reader = BufReader::new(read_half);
		let mut line = String::new();
		let bytes = reader.read_line(&mut line).await?;
		if bytes == 0 {
			return Err(Error::Pipe("connection closed before response".to_string()));
		}
		Ok(serde_json::from_str(line.trim_end())?)
	}

	async fn connect_with_retry(&self) -> Result<TcpStream> {
		loop {
			match TcpStream::connect(self.addr).await {
				Ok(stream) => return Ok(stream),
				Err(err)
					if matches!(
						err.kind(),
						std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
					) =>
				{
					debug!(
						target = "tb.pipe",
						addr = %self.addr,
						"automation pipe not listening yet, retrying"
					);
					tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
				}
				Err(source) => {
					return Err(Error::PipeUnavailable {
						addr: self.addr,
						source,
					});
				}
			}
		}
	}
}
