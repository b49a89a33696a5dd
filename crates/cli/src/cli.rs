use std::path::PathBuf;

use clap::Parser;

/// Supervisor for a headless trading terminal and its request bridge.
#[derive(Parser, Debug)]
#[command(name = "termbridge")]
#[command(about = "Supervises a headless trading terminal and bridges its automation API over TCP")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// TCP port the bridge listens on
	#[arg(long, default_value_t = 18812)]
	pub port: u16,

	/// Local port of the terminal's automation endpoint
	#[arg(long, default_value_t = 18800)]
	pub pipe_port: u16,

	/// Virtual display number (the `:N` in DISPLAY)
	#[arg(long, default_value_t = 99)]
	pub display: u32,

	/// Program used to start the terminal
	#[arg(long, default_value = "wine")]
	pub terminal: PathBuf,

	/// Arguments passed to the terminal program (repeatable)
	#[arg(
		long = "terminal-arg",
		value_name = "ARG",
		default_values_t = [String::from(r"C:\Program Files\Terminal\terminal64.exe"), String::from("/portable")]
	)]
	pub terminal_args: Vec<String>,

	/// Install-root config file (defaults to the standard location under the
	/// compatibility prefix)
	#[arg(long, value_name = "FILE")]
	pub install_config: Option<PathBuf>,

	/// Base directory of the per-profile config directories
	#[arg(long, value_name = "DIR")]
	pub profiles: Option<PathBuf>,

	/// Seconds to wait for the terminal after pre-launch
	#[arg(long, default_value_t = 120)]
	pub ready_timeout: u64,

	/// Do not pre-launch the terminal; the first begin-session call starts it
	#[arg(long)]
	pub skip_prelaunch: bool,

	/// Name substring of the helper processes the reaper bounds
	#[arg(long, default_value = "winedevice")]
	pub reaper_pattern: String,

	/// How many helper instances survive each reaper cycle
	#[arg(long, default_value_t = 2)]
	pub reaper_keep: usize,

	/// Reaper cycle period in seconds
	#[arg(long, default_value_t = 10)]
	pub reaper_period: u64,
}
