//! Terminal bridge - relaying remote calls into the terminal's automation API
//!
//! The bridge is the long-lived foreground service of the supervisor. It
//! accepts line-delimited JSON requests on a TCP socket, relays each one into
//! the controlled terminal's automation pipe, and returns the native result
//! unchanged. Its only added behavior sits around session starts: config
//! injection strictly precedes the forwarded call, and everything that
//! mutates session state funnels through one mutual-exclusion gate, because
//! there is exactly one terminal instance and one pair of config files.
//!
//! # Architecture
//!
//! ```text
//! callers ──TCP──▶ BridgeServer ──▶ Bridge ──▶ PipeClient ──TCP──▶ terminal
//!                                    │
//!                                    └─▶ ConfigInjector (gated, pre-forward)
//! ```
//!
//! The bridge trusts the automation API's own result and error shapes; it is
//! a protocol adapter, not a trading layer.

pub mod bridge;
pub mod error;
pub mod pipe;
pub mod server;

pub use bridge::Bridge;
pub use error::{Error, Result};
pub use pipe::{PipeClient, SYNC_REQUEST_TIMEOUT};
pub use server::BridgeServer;
