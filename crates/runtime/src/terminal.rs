//! Terminal process supervision.
//!
//! Launches the controlled terminal under the virtual display and watches
//! its warm-up. Readiness is observed from the outside: the terminal is
//! ready once its automation endpoint accepts a connection. On a cold image
//! the terminal first compiles its script modules (a one-time multi-minute
//! pass), so timing out here is the normal first-boot outcome, not a fault.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::info;

use crate::error::{Error, Result};

/// Liveness poll cadence while waiting for readiness.
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound on a single readiness probe.
const PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Outcome of waiting for the terminal to become usable.
#[derive(Debug)]
pub enum ReadyState {
	/// The automation endpoint accepted a connection.
	Ready,
	/// The terminal exited before the deadline. Reported upward as an
	/// observation; whether to relaunch is the caller's decision.
	Exited(ExitStatus),
	/// Still alive but not reachable at the deadline. Normal on a cold
	/// start while script modules compile.
	TimedOut,
}

/// Owned handle to the running terminal process.
#[derive(Debug)]
pub struct TerminalProcess {
	child: Child,
}

impl TerminalProcess {
	/// OS process id, while the process is running.
	pub fn id(&self) -> Option<u32> {
		self.child.id()
	}

	/// True while the process has not exited.
	pub fn is_alive(&mut self) -> bool {
		matches!(self.child.try_wait(), Ok(None))
	}

	/// Force-kill the terminal. Failures are swallowed; the process may
	/// already be gone.
	pub async fn terminate(&mut self) {
		let _ = self.child.kill().await;
		let _ = self.child.wait().await;
	}
}

/// Launches the terminal and waits for it to come up.
#[derive(Debug, Clone)]
pub struct TerminalSupervisor {
	program: PathBuf,
	args: Vec<String>,
	display: Option<String>,
	pipe_addr: SocketAddr,
}

impl TerminalSupervisor {
	pub fn new(program: PathBuf, args: Vec<String>, pipe_addr: SocketAddr) -> Self {
		Self {
			program,
			args,
			display: None,
			pipe_addr,
		}
	}

	/// Render into `display` (the `DISPLAY` value) instead of inheriting.
	pub fn with_display(mut self, display: impl Into<String>) -> Self {
		self.display = Some(display.into());
		self
	}

	/// Spawn the terminal process.
	///
	/// # Errors
	///
	/// Returns [`Error::LaunchFailed`] if the process cannot be spawned.
	/// An early exit after a successful spawn is not an error here; it
	/// surfaces as [`ReadyState::Exited`] from [`Self::wait_ready`].
	pub fn launch(&self) -> Result<TerminalProcess> {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args)
			.stdout(std::process::Stdio::null())
			.stderr(std::process::Stdio::null());
		if let Some(display) = &self.display {
			cmd.env("DISPLAY", display);
		}

		let child = cmd
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("{}: {e}", self.program.display())))?;
		info!(
			target = "tb.terminal",
			program = %self.program.display(),
			pid = ?child.id(),
			"terminal launched"
		);
		Ok(TerminalProcess { child })
	}

	/// Poll until the terminal is reachable, exits, or `timeout` elapses.
	pub async fn wait_ready(&self, process: &mut TerminalProcess, timeout: Duration) -> ReadyState {
		let deadline = Instant::now() + timeout;
		loop {
			if let Ok(Some(status)) = process.child.try_wait() {
				return ReadyState::Exited(status);
			}
			if probe_pipe(self.pipe_addr).await {
				return ReadyState::Ready;
			}
			if Instant::now() >= deadline {
				return ReadyState::TimedOut;
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}
}

async fn probe_pipe(addr: SocketAddr) -> bool {
	matches!(
		tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(addr)).await,
		Ok(Ok(_))
	)
}
