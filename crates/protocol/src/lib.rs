//! Wire types for the terminal bridge protocol.
//!
//! This crate contains the serde-serializable types exchanged on the two
//! sockets the bridge touches: the inbound request socket callers connect
//! to, and the outbound automation pipe into the controlled terminal. Both
//! carry line-delimited JSON of the same shapes, so a bridge call is a
//! verbatim relay of the request value.
//!
//! Types in this crate are:
//! - **Pure data**: no behavior beyond serialization and a few shape
//!   predicates the dispatcher needs (which calls mutate session state).
//! - **Pass-through friendly**: business payloads (rates, ticks, order
//!   results) stay as raw [`serde_json::Value`]; the bridge never models
//!   the terminal's own result shapes.

pub mod message;
pub mod session;

pub use message::{BridgeRequest, BridgeResponse};
pub use session::Session;
