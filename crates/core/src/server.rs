//! TCP front end for the bridge.

use std::net::SocketAddr;
use std::sync::Arc;

use tb_protocol::{BridgeRequest, BridgeResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::bridge::Bridge;
use crate::error::Result;

/// Accepts caller connections and serves them until a shutdown signal.
///
/// One spawned task per connection; requests on a single connection are
/// answered in order, while separate connections proceed independently.
/// Concurrency control beyond that lives in [`Bridge`]'s session gate.
pub struct BridgeServer {
	listener: TcpListener,
	bridge: Arc<Bridge>,
}

impl BridgeServer {
	/// Bind the listening socket.
	pub async fn bind(addr: SocketAddr, bridge: Bridge) -> Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		info!(target = "tb.server", addr = %listener.local_addr()?, "bridge listening");
		Ok(Self {
			listener,
			bridge: Arc::new(bridge),
		})
	}

	pub fn local_addr(&self) -> Result<SocketAddr> {
		Ok(self.listener.local_addr()?)
	}

	/// Serve until SIGTERM or SIGINT.
	pub async fn run(self) -> Result<()> {
		let mut sigterm = signal(SignalKind::terminate())?;
		let mut sigint = signal(SignalKind::interrupt())?;

		loop {
			tokio::select! {
				_ = sigterm.recv() => {
					info!(target = "tb.server", "received SIGTERM, shutting down");
					break;
				}
				_ = sigint.recv() => {
					info!(target = "tb.server", "received SIGINT, shutting down");
					break;
				}
				accept = self.listener.accept() => {
					let (stream, peer) = accept?;
					let bridge = Arc::clone(&self.bridge);
					tokio::spawn(async move {
						if let Err(err) = handle_client(stream, bridge).await {
							warn!(target = "tb.server", peer = %peer, error = %err, "connection error");
						}
					});
				}
			}
		}

		Ok(())
	}
}

async fn handle_client(stream: TcpStream, bridge: Arc<Bridge>) -> Result<()> {
	let (read_half, mut write_half) = stream.into_split();
	let mut reader = BufReader::new(read_half);
	let mut line = String::new();

	loop {
		line.clear();
		let bytes = reader.read_line(&mut line).await?;
		if bytes == 0 {
			break;
		}

		let response = match serde_json::from_str::<BridgeRequest>(line.trim_end()) {
			Ok(request) => bridge.handle(request).await,
			Err(err) => BridgeResponse::Error {
				code: "invalid_request".to_string(),
				message: err.to_string(),
			},
		};

		let payload = serde_json::to_string(&response)?;
		write_half.write_all(format!("{payload}\n").as_bytes()).await?;
		write_half.flush().await?;
	}

	Ok(())
}
