//! Session config injection.
//!
//! The terminal reads its account, server, and proxy settings from an
//! INI-style `common.ini` at startup, and keeps a second copy under a
//! per-profile directory whose hashed name depends on the install path. Both
//! copies must agree before a session starts. The terminal also resets the
//! `[Experts]` automation flag to `0` whenever it detects an account change,
//! and refuses a credential change outright while `accounts.dat` still
//! records the previous account, so every apply re-forces the flag and
//! deletes the artifact.

use std::path::{Path, PathBuf};

use regex::Regex;
use tb_protocol::Session;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Proxy kind written alongside a proxy address: SOCKS5.
const PROXY_TYPE: &str = "2";

/// The two config locations the terminal keeps.
#[derive(Debug, Clone)]
pub struct TerminalPaths {
	/// Install-root copy, e.g. `<install>/Config/common.ini`.
	pub install_config: PathBuf,
	/// Base directory holding per-profile directories. The profile config
	/// lives at `<base>/<hash>/config/common.ini`; the hash directory is
	/// created lazily by the terminal on first launch.
	pub profile_base: PathBuf,
}

impl TerminalPaths {
	/// Locate the per-profile `common.ini`, if the terminal has created one.
	///
	/// Resolved fresh on every call: the profile directory appears only
	/// after the terminal's first launch, so a cached miss would be sticky.
	pub fn resolve_profile_config(&self) -> Option<PathBuf> {
		let pattern = self.profile_base.join("*").join("config").join("common.ini");
		glob::glob(&pattern.to_string_lossy()).ok()?.flatten().next()
	}

	fn install_artifact(&self) -> Option<PathBuf> {
		self.install_config.parent().map(|dir| dir.join("accounts.dat"))
	}

	fn profile_artifacts(&self) -> Vec<PathBuf> {
		let pattern = self.profile_base.join("*").join("config").join("accounts.dat");
		match glob::glob(&pattern.to_string_lossy()) {
			Ok(paths) => paths.flatten().collect(),
			Err(_) => Vec::new(),
		}
	}
}

/// Rewrites session parameters into the terminal's config files.
#[derive(Debug)]
pub struct ConfigInjector {
	paths: TerminalPaths,
}

impl ConfigInjector {
	pub fn new(paths: TerminalPaths) -> Self {
		Self { paths }
	}

	/// Apply `session` to every config location that exists.
	///
	/// Missing files are skipped silently (the per-profile copy does not
	/// exist before first launch). Each field is rewritten only when the
	/// corresponding session attribute is present; the automation flag is
	/// forced on unconditionally. Finishes by deleting the cached account
	/// artifacts so the terminal accepts the credential change. Idempotent.
	pub fn apply(&self, session: &Session) -> Result<()> {
		let mut targets = vec![self.paths.install_config.clone()];
		if let Some(profile) = self.paths.resolve_profile_config() {
			targets.push(profile);
		}

		for path in &targets {
			if !path.exists() {
				debug!(target = "tb.config", path = %path.display(), "config not present, skipping");
				continue;
			}
			match rewrite_config(path, session) {
				Ok(()) => info!(
					target = "tb.config",
					path = %path.display(),
					login = ?session.login,
					server = ?session.server,
					"prepared terminal config"
				),
				Err(err) => warn!(
					target = "tb.config",
					path = %path.display(),
					error = %err,
					"could not prepare terminal config"
				),
			}
		}

		self.delete_session_artifacts();
		Ok(())
	}

	/// Remove cached `accounts.dat` copies so the terminal cannot treat the
	/// incoming credentials as a forbidden account switch.
	fn delete_session_artifacts(&self) {
		let mut artifacts = self.paths.profile_artifacts();
		if let Some(install) = self.paths.install_artifact() {
			artifacts.push(install);
		}
		for path in artifacts {
			match std::fs::remove_file(&path) {
				Ok(()) => debug!(target = "tb.config", path = %path.display(), "deleted session artifact"),
				Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
				Err(err) => warn!(
					target = "tb.config",
					path = %path.display(),
					error = %err,
					"could not delete session artifact"
				),
			}
		}
	}
}

fn rewrite_config(path: &Path, session: &Session) -> std::io::Result<()> {
	let mut text = std::fs::read_to_string(path)?;

	if let Some(login) = session.login {
		text = replace_field(&text, "Login", &login.to_string());
	}
	if let Some(server) = &session.server {
		text = replace_field(&text, "Server", server);
	}
	if let Some(proxy) = &session.proxy {
		text = replace_field(&text, "ProxyEnable", "1");
		text = replace_field(&text, "ProxyType", PROXY_TYPE);
		text = replace_field(&text, "ProxyAddress", proxy);
	}
	text = force_automation_enabled(&text);

	std::fs::write(path, text)
}

/// Replace every `Key=...` line with `Key=value`. A key absent from the file
/// stays absent.
fn replace_field(text: &str, key: &str, value: &str) -> String {
	let re = Regex::new(&format!(r"(?m)^{key}=.*")).expect("static field pattern");
	// NoExpand: credential values are literal, `$` included.
	re.replace_all(text, regex::NoExpand(&format!("{key}={value}")))
		.into_owned()
}

/// Force `Enabled=1` inside the `[Experts]` section, whatever its value.
fn force_automation_enabled(text: &str) -> String {
	let re = Regex::new(r"(?ms)^(\[Experts\].*?^Enabled=).*?$").expect("static experts pattern");
	re.replace(text, "${1}1").into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_INI: &str = "\
[Common]
Login=11111111
Server=Demo-Server
ProxyEnable=0
ProxyType=0
ProxyAddress=
KeepPrivate=1

[Experts]
AllowLiveTrading=1
AllowDllImport=0
Enabled=0
Account=
Profile=
";

	struct Fixture {
		_dir: tempfile::TempDir,
		paths: TerminalPaths,
		profile_config: PathBuf,
	}

	fn fixture() -> Fixture {
		let dir = tempfile::tempdir().unwrap();
		let install_dir = dir.path().join("install").join("Config");
		let profile_dir = dir.path().join("profiles").join("0A1B2C3D").join("config");
		std::fs::create_dir_all(&install_dir).unwrap();
		std::fs::create_dir_all(&profile_dir).unwrap();

		let install_config = install_dir.join("common.ini");
		let profile_config = profile_dir.join("common.ini");
		std::fs::write(&install_config, BASE_INI).unwrap();
		std::fs::write(&profile_config, BASE_INI).unwrap();

		Fixture {
			paths: TerminalPaths {
				install_config,
				profile_base: dir.path().join("profiles"),
			},
			profile_config,
			_dir: dir,
		}
	}

	fn session() -> Session {
		Session {
			login: Some(22223333),
			password: Some("secret".into()),
			server: Some("Broker-Live".into()),
			proxy: Some("10.0.0.1:1080".into()),
		}
	}

	#[test]
	fn rewrites_both_copies() {
		let fx = fixture();
		ConfigInjector::new(fx.paths.clone()).apply(&session()).unwrap();

		for path in [&fx.paths.install_config, &fx.profile_config] {
			let text = std::fs::read_to_string(path).unwrap();
			assert!(text.contains("Login=22223333"), "{text}");
			assert!(text.contains("Server=Broker-Live"));
			assert!(text.contains("ProxyEnable=1"));
			assert!(text.contains("ProxyType=2"));
			assert!(text.contains("ProxyAddress=10.0.0.1:1080"));
			assert!(text.contains("Enabled=1"));
		}
	}

	#[test]
	fn apply_is_idempotent() {
		let fx = fixture();
		let injector = ConfigInjector::new(fx.paths.clone());

		injector.apply(&session()).unwrap();
		let once = std::fs::read(&fx.paths.install_config).unwrap();
		injector.apply(&session()).unwrap();
		let twice = std::fs::read(&fx.paths.install_config).unwrap();
		assert_eq!(once, twice);
	}

	#[test]
	fn absent_attributes_leave_fields_untouched() {
		let fx = fixture();
		let partial = Session {
			login: Some(44445555),
			..Default::default()
		};
		ConfigInjector::new(fx.paths.clone()).apply(&partial).unwrap();

		let text = std::fs::read_to_string(&fx.paths.install_config).unwrap();
		assert!(text.contains("Login=44445555"));
		assert!(text.contains("Server=Demo-Server"));
		assert!(text.contains("ProxyEnable=0"));
		assert!(text.contains("ProxyAddress=\n"));
	}

	#[test]
	fn automation_flag_forced_on_every_apply() {
		let fx = fixture();
		let injector = ConfigInjector::new(fx.paths.clone());

		injector.apply(&Session::default()).unwrap();
		let text = std::fs::read_to_string(&fx.paths.install_config).unwrap();
		assert!(text.contains("Enabled=1"));
		// Only the [Experts] flag changed; AllowDllImport in the same
		// section keeps its value.
		assert!(text.contains("AllowDllImport=0"));

		// Simulate the terminal resetting the flag on account change.
		std::fs::write(
			&fx.paths.install_config,
			text.replace("Enabled=1", "Enabled=0"),
		)
		.unwrap();
		injector.apply(&Session::default()).unwrap();
		let text = std::fs::read_to_string(&fx.paths.install_config).unwrap();
		assert!(text.contains("Enabled=1"));
	}

	#[test]
	fn missing_files_are_skipped() {
		let dir = tempfile::tempdir().unwrap();
		let injector = ConfigInjector::new(TerminalPaths {
			install_config: dir.path().join("install").join("common.ini"),
			profile_base: dir.path().join("profiles"),
		});
		injector.apply(&session()).unwrap();
	}

	#[test]
	fn profile_path_resolved_fresh_per_apply() {
		let fx = fixture();
		// The terminal creates a second lazily-named profile later; the
		// injector must pick up profile configs without being rebuilt.
		let late_dir = fx.paths.profile_base.join("0A1B2C3D").join("config");
		let injector = ConfigInjector::new(fx.paths.clone());
		std::fs::remove_file(&fx.profile_config).unwrap();
		injector.apply(&session()).unwrap();

		std::fs::write(late_dir.join("common.ini"), BASE_INI).unwrap();
		injector.apply(&session()).unwrap();
		let text = std::fs::read_to_string(&fx.profile_config).unwrap();
		assert!(text.contains("Login=22223333"));
	}

	#[test]
	fn session_artifacts_deleted_at_both_locations() {
		let fx = fixture();
		let install_artifact = fx.paths.install_config.parent().unwrap().join("accounts.dat");
		let profile_artifact = fx.profile_config.parent().unwrap().join("accounts.dat");
		std::fs::write(&install_artifact, b"cached").unwrap();
		std::fs::write(&profile_artifact, b"cached").unwrap();

		ConfigInjector::new(fx.paths.clone()).apply(&session()).unwrap();
		assert!(!install_artifact.exists());
		assert!(!profile_artifact.exists());
	}
}
