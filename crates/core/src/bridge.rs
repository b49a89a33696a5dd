//! Request dispatch and the session gate.

use tb_protocol::{BridgeRequest, BridgeResponse, Session};
use tb_runtime::ConfigInjector;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::pipe::PipeClient;

/// Everything a session mutation touches: the config files (via the
/// injector) and the startup credentials used to complete partial calls.
struct SessionState {
	injector: ConfigInjector,
	startup: Session,
}

/// Relays calls into the automation pipe, serializing session mutations.
///
/// Introspection calls go straight through and run concurrently; calls that
/// mutate session state (`initialize`, `login`, `shutdown`) take the gate,
/// and a begin-session call re-injects config while holding it. There is
/// one terminal instance and one pair of config files, so inject-then-start
/// must be atomic with respect to other mutations.
pub struct Bridge {
	pipe: PipeClient,
	gate: Mutex<SessionState>,
}

impl Bridge {
	pub fn new(pipe: PipeClient, injector: ConfigInjector, startup: Session) -> Self {
		Self {
			pipe,
			gate: Mutex::new(SessionState { injector, startup }),
		}
	}

	/// Serve one request. Always answers; failures become error responses.
	pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
		if matches!(request, BridgeRequest::Ping) {
			return BridgeResponse::Pong;
		}
		if request.mutates_session() {
			self.forward_gated(request).await
		} else {
			self.forward(&request).await
		}
	}

	/// Config injection and the forwarded call form one critical section.
	async fn forward_gated(&self, request: BridgeRequest) -> BridgeResponse {
		let state = self.gate.lock().await;

		let request = match request {
			BridgeRequest::Initialize {
				path,
				login,
				password,
				server,
				proxy,
			} => {
				let call = Session {
					login,
					password,
					server,
					proxy,
				};
				let session = call.merged_with(&state.startup);
				if session.login.is_none() && session.password.is_none() {
					debug!(
						target = "tb.bridge",
						"begin session without credentials; the automation call is expected to time out"
					);
				}
				if let Err(err) = state.injector.apply(&session) {
					// The invariant violation surfaces upstream as a
					// predictable timeout; nothing useful to return here.
					warn!(target = "tb.bridge", error = %err, "config injection incomplete");
				}
				BridgeRequest::Initialize {
					path,
					login: session.login,
					password: session.password,
					server: session.server,
					proxy: session.proxy,
				}
			}
			other => other,
		};

		self.forward(&request).await
	}

	async fn forward(&self, request: &BridgeRequest) -> BridgeResponse {
		match self.pipe.call(request).await {
			Ok(response) => response,
			Err(err) => {
				debug!(target = "tb.bridge", error = %err, "automation call failed");
				err.to_response()
			}
		}
	}
}
