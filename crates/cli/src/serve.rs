//! Startup sequence: display, config, terminal, reaper, bridge.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tb::{Bridge, BridgeServer, PipeClient};
use tb_protocol::Session;
use tb_runtime::{
	ConfigInjector, DisplayManager, Reaper, ReaperConfig, ReadyState, TerminalPaths,
	TerminalSupervisor,
};
use tracing::{info, warn};

use crate::cli::Cli;

/// Bring the environment up in dependency order and serve until signaled.
///
/// Display first (nothing renders without it), config injection before any
/// terminal launch, the reaper as a detached loop, and the bridge in the
/// foreground. On the way down the display goes last.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
	let display = DisplayManager::start(cli.display)
		.await
		.context("virtual display startup failed")?;

	let paths = resolve_paths(&cli);
	info!(
		target = "tb",
		install = %paths.install_config.display(),
		profiles = %paths.profile_base.display(),
		"config locations"
	);
	let injector = ConfigInjector::new(paths);

	let startup = session_from_env(|name| std::env::var(name).ok());
	if startup.is_empty() {
		info!(target = "tb", "no startup credentials; callers must supply them per session");
	} else {
		injector
			.apply(&startup)
			.context("initial config injection failed")?;
	}

	let pipe_addr = SocketAddr::from(([127, 0, 0, 1], cli.pipe_port));
	let supervisor = TerminalSupervisor::new(cli.terminal.clone(), cli.terminal_args.clone(), pipe_addr)
		.with_display(display.display());

	let mut terminal = None;
	if !cli.skip_prelaunch {
		let mut process = supervisor.launch().context("terminal launch failed")?;
		match supervisor
			.wait_ready(&mut process, Duration::from_secs(cli.ready_timeout))
			.await
		{
			ReadyState::Ready => info!(target = "tb", "terminal ready"),
			ReadyState::Exited(status) => {
				warn!(target = "tb", %status, "terminal exited during warm-up")
			}
			ReadyState::TimedOut => info!(
				target = "tb",
				"terminal still warming up; the first session start may exceed the automation deadline"
			),
		}
		terminal = Some(process);
	}

	tokio::spawn(
		Reaper::new(ReaperConfig {
			pattern: cli.reaper_pattern.clone(),
			keep: cli.reaper_keep,
			period: Duration::from_secs(cli.reaper_period),
		})
		.run(),
	);

	let bridge = Bridge::new(PipeClient::new(pipe_addr), injector, startup);
	let server = BridgeServer::bind(SocketAddr::from(([0, 0, 0, 0], cli.port)), bridge)
		.await
		.context("bridge bind failed")?;
	server.run().await?;

	if let Some(mut process) = terminal {
		process.terminate().await;
	}
	display.shutdown().await.context("display shutdown failed")?;
	Ok(())
}

/// Assemble the startup session from the environment.
pub fn session_from_env(lookup: impl Fn(&str) -> Option<String>) -> Session {
	let login = lookup("TERMINAL_LOGIN").and_then(|raw| match raw.parse() {
		Ok(login) => Some(login),
		Err(_) => {
			warn!(target = "tb", value = %raw, "TERMINAL_LOGIN is not an account number, ignoring");
			None
		}
	});
	Session {
		login,
		password: lookup("TERMINAL_PASSWORD"),
		server: lookup("TERMINAL_SERVER"),
		proxy: lookup("TERMINAL_PROXY"),
	}
}

/// Default config locations live under the compatibility prefix.
fn resolve_paths(cli: &Cli) -> TerminalPaths {
	let prefix = std::env::var("WINEPREFIX")
		.map(PathBuf::from)
		.unwrap_or_else(|_| {
			dirs::home_dir()
				.unwrap_or_else(|| PathBuf::from("/root"))
				.join(".wine")
		});

	let install_config = cli.install_config.clone().unwrap_or_else(|| {
		prefix
			.join("drive_c")
			.join("Program Files")
			.join("Terminal")
			.join("Config")
			.join("common.ini")
	});

	let profile_base = cli.profiles.clone().unwrap_or_else(|| {
		let user = std::env::var("USER").unwrap_or_else(|_| "root".to_string());
		prefix
			.join("drive_c")
			.join("users")
			.join(user)
			.join("AppData")
			.join("Roaming")
			.join("Terminal")
	});

	TerminalPaths {
		install_config,
		profile_base,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn env_session_is_field_wise() {
		let session = session_from_env(|name| match name {
			"TERMINAL_LOGIN" => Some("12345678".to_string()),
			"TERMINAL_SERVER" => Some("1.2.3.4:443".to_string()),
			_ => None,
		});
		assert_eq!(session.login, Some(12345678));
		assert_eq!(session.server.as_deref(), Some("1.2.3.4:443"));
		assert!(session.password.is_none());
		assert!(session.proxy.is_none());
	}

	#[test]
	fn unparseable_login_is_dropped_not_fatal() {
		let session = session_from_env(|name| match name {
			"TERMINAL_LOGIN" => Some("not-a-number".to_string()),
			"TERMINAL_PASSWORD" => Some("hunter2".to_string()),
			_ => None,
		});
		assert!(session.login.is_none());
		assert_eq!(session.password.as_deref(), Some("hunter2"));
	}

	#[test]
	fn empty_environment_means_empty_session() {
		assert!(session_from_env(|_| None).is_empty());
	}
}
