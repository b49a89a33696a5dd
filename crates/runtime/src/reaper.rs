//! Helper-process reaping.
//!
//! The compatibility layer the terminal runs under keeps spawning device-host
//! helper processes and never collects them; left alone they accumulate until
//! the environment runs out of memory. The reaper bounds that growth: every
//! cycle it keeps the two oldest instances (lowest PID as the creation-order
//! proxy) and force-kills the rest. Which instances survive does not matter
//! for correctness, only that the count stays bounded, so kill failures are
//! swallowed.

use std::time::Duration;

use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Reaper tuning. Defaults match the deployed environment.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
	/// Substring matched against process names.
	pub pattern: String,
	/// How many matching instances survive each cycle.
	pub keep: usize,
	/// Cycle period.
	pub period: Duration,
}

impl Default for ReaperConfig {
	fn default() -> Self {
		Self {
			pattern: "winedevice".to_string(),
			keep: 2,
			period: Duration::from_secs(10),
		}
	}
}

/// Pick the PIDs to terminate from a process snapshot: all processes whose
/// name contains `pattern`, minus the `keep` lowest PIDs.
///
/// Lowest-PID-first is a creation-order proxy, not a verified semantic; it is
/// kept as-is because a different ordering could select the primary helper.
pub fn select_victims(snapshot: &[(u32, String)], pattern: &str, keep: usize) -> Vec<u32> {
	let mut matching: Vec<u32> = snapshot
		.iter()
		.filter(|(_, name)| name.contains(pattern))
		.map(|(pid, _)| *pid)
		.collect();
	matching.sort_unstable();
	matching.split_off(keep.min(matching.len()))
}

/// Background loop bounding helper-process proliferation.
#[derive(Debug)]
pub struct Reaper {
	config: ReaperConfig,
}

impl Reaper {
	pub fn new(config: ReaperConfig) -> Self {
		Self { config }
	}

	/// Run forever. Spawn this on its own task; it never returns and never
	/// panics the host.
	pub async fn run(self) {
		info!(
			target = "tb.reaper",
			pattern = %self.config.pattern,
			keep = self.config.keep,
			period_secs = self.config.period.as_secs(),
			"reaper started"
		);
		let mut interval = tokio::time::interval(self.config.period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut system = System::new();
		loop {
			interval.tick().await;
			reap_cycle(&mut system, &self.config);
		}
	}
}

fn reap_cycle(system: &mut System, config: &ReaperConfig) {
	system.refresh_processes(ProcessesToUpdate::All, true);
	let snapshot: Vec<(u32, String)> = system
		.processes()
		.iter()
		.map(|(pid, process)| (pid.as_u32(), process.name().to_string_lossy().into_owned()))
		.collect();

	for pid in select_victims(&snapshot, &config.pattern, config.keep) {
		let Some(process) = system.process(Pid::from_u32(pid)) else {
			continue;
		};
		if process.kill() {
			debug!(target = "tb.reaper", pid, "reaped helper process");
		} else {
			// Already gone, or unkillable this cycle; the next cycle sees it.
			debug!(target = "tb.reaper", pid, "helper process kill skipped");
		}
	}
}
