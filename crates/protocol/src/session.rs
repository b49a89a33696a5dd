//! Trading session credentials.

use serde::{Deserialize, Serialize};

/// Credentials and connectivity for one terminal session.
///
/// Every field is optional on the wire: a begin-session call may carry only
/// the fields it wants to change, and the startup session assembled from the
/// environment may be partial. Credentials are never persisted by the bridge
/// itself; they only ever flow into the terminal's own config files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub login: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub server: Option<String>,
	/// Outbound proxy address (`host:port`), when the terminal must tunnel.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub proxy: Option<String>,
}

impl Session {
	/// True when no field is set at all.
	pub fn is_empty(&self) -> bool {
		self.login.is_none() && self.password.is_none() && self.server.is_none() && self.proxy.is_none()
	}

	/// Field-wise merge: values present in `self` win, absent ones fall back
	/// to `fallback`. Used to complete a begin-session call from the
	/// startup-configured session.
	pub fn merged_with(&self, fallback: &Session) -> Session {
		Session {
			login: self.login.or(fallback.login),
			password: self.password.clone().or_else(|| fallback.password.clone()),
			server: self.server.clone().or_else(|| fallback.server.clone()),
			proxy: self.proxy.clone().or_else(|| fallback.proxy.clone()),
		}
	}
}
