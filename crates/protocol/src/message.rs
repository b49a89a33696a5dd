//! Request/response envelopes for the bridge socket and the automation pipe.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::Session;

/// The fixed method surface exposed by the bridge.
///
/// Every variant except [`BridgeRequest::Ping`] is relayed to the terminal's
/// automation API as-is. Date parameters are raw [`Value`]s (ISO-8601 string
/// or unix timestamp) and order payloads are opaque objects; the bridge does
/// not interpret either, it only moves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
	/// Bridge liveness probe, answered locally.
	Ping,
	/// Begin a session: launches/attaches the terminal and logs in.
	Initialize {
		#[serde(skip_serializing_if = "Option::is_none")]
		path: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		login: Option<i64>,
		#[serde(skip_serializing_if = "Option::is_none")]
		password: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		server: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		proxy: Option<String>,
	},
	Shutdown,
	Login {
		login: i64,
		#[serde(skip_serializing_if = "Option::is_none")]
		password: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		server: Option<String>,
	},
	LastError,
	Version,
	AccountInfo,
	TerminalInfo,
	SymbolsTotal,
	SymbolsGet {
		#[serde(skip_serializing_if = "Option::is_none")]
		group: Option<String>,
	},
	SymbolInfo {
		symbol: String,
	},
	SymbolInfoTick {
		symbol: String,
	},
	SymbolSelect {
		symbol: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		enable: Option<bool>,
	},
	CopyRatesFrom {
		symbol: String,
		timeframe: i64,
		date_from: Value,
		count: i64,
	},
	CopyRatesFromPos {
		symbol: String,
		timeframe: i64,
		start_pos: i64,
		count: i64,
	},
	CopyRatesRange {
		symbol: String,
		timeframe: i64,
		date_from: Value,
		date_to: Value,
	},
	CopyTicksFrom {
		symbol: String,
		date_from: Value,
		count: i64,
		flags: i64,
	},
	CopyTicksRange {
		symbol: String,
		date_from: Value,
		date_to: Value,
		flags: i64,
	},
	OrdersTotal,
	OrdersGet {
		#[serde(skip_serializing_if = "Option::is_none")]
		symbol: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		ticket: Option<i64>,
		#[serde(skip_serializing_if = "Option::is_none")]
		group: Option<String>,
	},
	PositionsTotal,
	PositionsGet {
		#[serde(skip_serializing_if = "Option::is_none")]
		symbol: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		ticket: Option<i64>,
		#[serde(skip_serializing_if = "Option::is_none")]
		group: Option<String>,
	},
	HistoryOrdersTotal {
		date_from: Value,
		date_to: Value,
	},
	HistoryOrdersGet {
		date_from: Value,
		date_to: Value,
		#[serde(skip_serializing_if = "Option::is_none")]
		ticket: Option<i64>,
		#[serde(skip_serializing_if = "Option::is_none")]
		group: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		position: Option<i64>,
	},
	HistoryDealsTotal {
		date_from: Value,
		date_to: Value,
	},
	HistoryDealsGet {
		date_from: Value,
		date_to: Value,
		#[serde(skip_serializing_if = "Option::is_none")]
		ticket: Option<i64>,
		#[serde(skip_serializing_if = "Option::is_none")]
		group: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		position: Option<i64>,
	},
	OrderSend {
		request: Value,
	},
	OrderCheck {
		request: Value,
	},
	OrderCalcMargin {
		action: i64,
		symbol: String,
		volume: f64,
		price: f64,
	},
	OrderCalcProfit {
		action: i64,
		symbol: String,
		volume: f64,
		price_open: f64,
		price_close: f64,
	},
}

impl BridgeRequest {
	/// Calls that mutate session state and must serialize through the
	/// bridge's single mutual-exclusion gate.
	pub fn mutates_session(&self) -> bool {
		matches!(
			self,
			BridgeRequest::Initialize { .. } | BridgeRequest::Login { .. } | BridgeRequest::Shutdown
		)
	}

	/// Credentials carried by a begin-session call, if this is one.
	pub fn session(&self) -> Option<Session> {
		match self {
			BridgeRequest::Initialize {
				login,
				password,
				server,
				proxy,
				..
			} => Some(Session {
				login: *login,
				password: password.clone(),
				server: server.clone(),
				proxy: proxy.clone(),
			}),
			_ => None,
		}
	}
}

/// One response line per request line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeResponse {
	Pong,
	/// The automation API's native result, unchanged.
	Result { value: Value },
	Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn method_names_are_wire_tags() {
		let json = serde_json::to_string(&BridgeRequest::AccountInfo).unwrap();
		assert_eq!(json, r#"{"type":"account_info"}"#);

		let json = serde_json::to_string(&BridgeRequest::SymbolInfoTick {
			symbol: "EURUSD".into(),
		})
		.unwrap();
		assert_eq!(json, r#"{"type":"symbol_info_tick","symbol":"EURUSD"}"#);
	}

	#[test]
	fn initialize_accepts_partial_credentials() {
		let request: BridgeRequest =
			serde_json::from_str(r#"{"type":"initialize","login":12345678}"#).unwrap();
		let session = request.session().unwrap();
		assert_eq!(session.login, Some(12345678));
		assert!(session.password.is_none());
	}

	#[test]
	fn gate_covers_exactly_the_mutating_calls() {
		assert!(
			BridgeRequest::Initialize {
				path: None,
				login: None,
				password: None,
				server: None,
				proxy: None,
			}
			.mutates_session()
		);
		assert!(BridgeRequest::Shutdown.mutates_session());
		assert!(
			BridgeRequest::Login {
				login: 1,
				password: None,
				server: None,
			}
			.mutates_session()
		);
		assert!(!BridgeRequest::AccountInfo.mutates_session());
		assert!(!BridgeRequest::OrderSend { request: serde_json::json!({}) }.mutates_session());
	}

	#[test]
	fn error_response_round_trips() {
		let response: BridgeResponse = serde_json::from_str(
			r#"{"type":"error","code":"pipe_timeout","message":"automation pipe call timed out"}"#,
		)
		.unwrap();
		match response {
			BridgeResponse::Error { code, .. } => assert_eq!(code, "pipe_timeout"),
			other => panic!("unexpected response: {other:?}"),
		}
	}
}
