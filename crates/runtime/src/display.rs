//! Virtual framebuffer management.
//!
//! The controlled terminal is GUI-only; inside a headless environment it
//! needs an X display to render into. The display manager owns that
//! framebuffer process for the whole service lifetime and is the last thing
//! stopped on shutdown.

use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::{Error, Result};

/// How long the framebuffer gets to prove it stays alive.
const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Owns the virtual framebuffer process.
#[derive(Debug)]
pub struct DisplayManager {
	process: Child,
	display: String,
}

impl DisplayManager {
	/// Start `Xvfb` on display `:N` and verify it survives the grace period.
	///
	/// # Errors
	///
	/// Returns [`Error::DisplayUnavailable`] if the framebuffer cannot be
	/// spawned or exits before the grace period ends.
	pub async fn start(display_num: u32) -> Result<Self> {
		Self::start_with_command("Xvfb", display_num).await
	}

	/// Same as [`DisplayManager::start`] with an explicit framebuffer binary.
	pub async fn start_with_command(program: &str, display_num: u32) -> Result<Self> {
		let display_addr = format!(":{display_num}");

		let mut cmd = Command::new(program);
		cmd.arg(&display_addr)
			.args(["-screen", "0", "1024x768x16", "-nolisten", "tcp"])
			.stdout(std::process::Stdio::null())
			.stderr(std::process::Stdio::null());

		let mut child = cmd
			.spawn()
			.map_err(|e| Error::DisplayUnavailable(format!("failed to spawn {program}: {e}")))?;

		tokio::time::sleep(STARTUP_GRACE).await;

		match child.try_wait() {
			Ok(Some(status)) => Err(Error::DisplayUnavailable(format!(
				"framebuffer exited during startup with status: {status}"
			))),
			Ok(None) => {
				info!(target = "tb.display", display = %display_addr, "virtual display up");
				Ok(Self { process: child, display: display_addr })
			}
			Err(e) => Err(Error::DisplayUnavailable(format!(
				"failed to check framebuffer status: {e}"
			))),
		}
	}

	/// The `DISPLAY` value (`:N`) downstream processes must render into.
	pub fn display(&self) -> &str {
		&self.display
	}

	/// Kill the framebuffer. Call after everything rendering into it is gone.
	pub async fn shutdown(mut self) -> Result<()> {
		self.process.kill().await?;
		let _ = self.process.wait().await;
		info!(target = "tb.display", display = %self.display, "virtual display stopped");
		Ok(())
	}
}
