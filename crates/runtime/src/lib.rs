//! Terminal runtime - display, process lifecycle, config injection, reaping
//!
//! This crate provides the OS-facing infrastructure for supervising the
//! controlled terminal inside a headless environment:
//!
//! - **Display**: owning the virtual framebuffer the GUI renders into
//! - **Config injection**: rewriting session credentials into the terminal's
//!   on-disk config ahead of every session start
//! - **Supervision**: launching the terminal and observing its warm-up
//! - **Reaping**: bounding the compatibility layer's helper-process sprawl
//!
//! Nothing here talks to the automation API itself; the bridge in `tb-core`
//! builds on these pieces.

pub mod config;
pub mod display;
pub mod error;
pub mod reaper;
pub mod terminal;

pub use config::{ConfigInjector, TerminalPaths};
pub use display::DisplayManager;
pub use error::{Error, Result};
pub use reaper::{Reaper, ReaperConfig, select_victims};
pub use terminal::{ReadyState, TerminalProcess, TerminalSupervisor};
