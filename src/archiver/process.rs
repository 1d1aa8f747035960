//! Subprocess invocation, priority/affinity mapping, retries and exit-code
//! classification for 7-Zip runs (§4.4.2, §4.4.3).

use crate::error::PoshBackupError;
use crate::strategies::{OverallStatus, ProcessPriority};
use std::process::Stdio;
use std::time::Duration;

/// Outcome of a single 7-Zip invocation.
#[derive(Debug, Clone)]
pub struct ArchiverOutcome {
	pub exit_code: i32,
	pub stderr: String,
	pub stdout: String,
	pub status: OverallStatus,
}

/// Run `7z <argv>`, capturing stderr always and stdout when `capture_stdout`
/// is set ("hide output" in the design's terms), retrying on non-fatal exit
/// codes per `enable_retries`/`max_retry_attempts`/`retry_delay_seconds`.
pub struct ProcessRunner {
	pub seven_zip_path: std::path::PathBuf,
}

impl ProcessRunner {
	pub fn new(seven_zip_path: std::path::PathBuf) -> Self {
		ProcessRunner { seven_zip_path }
	}

	pub async fn run(
		&self,
		argv: &[String],
		capture_stdout: bool,
		priority: ProcessPriority,
		cpu_affinity: Option<&str>,
		warnings_as_success: bool,
		enable_retries: bool,
		max_retry_attempts: u32,
		retry_delay: Duration,
	) -> Result<ArchiverOutcome, PoshBackupError> {
		let affinity_mask = cpu_affinity.and_then(|spec| parse_cpu_affinity(spec, core_count()));

		let mut attempt = 0;
		loop {
			attempt += 1;
			let outcome = self.spawn_once(argv, capture_stdout, priority, affinity_mask.as_deref()).await?;

			let should_stop = match outcome.exit_code {
				0 => true,
				1 => warnings_as_success || !enable_retries || attempt >= max_retry_attempts,
				_ => !enable_retries || attempt >= max_retry_attempts,
			};

			if should_stop || attempt >= max_retry_attempts.max(1) {
				return Ok(outcome);
			}
			tokio::time::sleep(retry_delay).await;
		}
	}

	async fn spawn_once(
		&self,
		argv: &[String],
		capture_stdout: bool,
		priority: ProcessPriority,
		affinity: Option<&[usize]>,
	) -> Result<ArchiverOutcome, PoshBackupError> {
		let mut command = tokio::process::Command::new(&self.seven_zip_path);
		command.args(argv);
		command.stderr(Stdio::piped());
		command.stdout(if capture_stdout { Stdio::piped() } else { Stdio::null() });

		let mut child = command.spawn().map_err(|e| PoshBackupError::ArchiverError {
			exit_code: -999,
			message: format!("failed to spawn 7-Zip: {}", e),
		})?;

		if let Some(pid) = child.id() {
			platform::apply_priority(pid, priority);
			if let Some(cores) = affinity {
				platform::apply_affinity(pid, cores);
			}
		}

		let output = child.wait_with_output().await.map_err(|e| PoshBackupError::ArchiverError {
			exit_code: -999,
			message: format!("failed to wait on 7-Zip: {}", e),
		})?;

		let exit_code = output.status.code().unwrap_or(-999);
		let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
		let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

		// Raw 7-Zip exit semantics (§4.4.3); `treat_seven_zip_warnings_as_success`
		// is applied by the caller when folding this into a job-level status.
		let status = match exit_code {
			0 => OverallStatus::Success,
			1 => OverallStatus::Warnings,
			_ => OverallStatus::Failure,
		};

		Ok(ArchiverOutcome { exit_code, stderr, stdout, status })
	}
}

/// Process priority and CPU affinity are applied against the spawned
/// child's PID, not at `Command` build time, since neither is portable: a
/// niceness/affinity syscall only makes sense once the OS has handed back a
/// real process.
#[cfg(unix)]
#[allow(unsafe_code)]
mod platform {
	use super::ProcessPriority;

	/// Map the design's priority class to a `setpriority` niceness value and
	/// apply it. Best-effort: a non-root caller can only raise niceness
	/// (lower priority), never lower it, so a failure here is logged nowhere
	/// and simply leaves the child at the parent's default niceness.
	pub fn apply_priority(pid: u32, priority: ProcessPriority) {
		let niceness: i32 = match priority {
			ProcessPriority::Idle => 19,
			ProcessPriority::BelowNormal => 10,
			ProcessPriority::Normal => 0,
			ProcessPriority::AboveNormal => -5,
			ProcessPriority::High => -10,
		};
		unsafe {
			libc::setpriority(libc::PRIO_PROCESS, pid, niceness);
		}
	}

	/// Pin the child to `cores`. Linux-only: `sched_setaffinity` has no BSD
	/// or macOS equivalent in `libc`, so other Unix targets are a no-op.
	#[cfg(target_os = "linux")]
	pub fn apply_affinity(pid: u32, cores: &[usize]) {
		unsafe {
			let mut set: libc::cpu_set_t = std::mem::zeroed();
			libc::CPU_ZERO(&mut set);
			for &core in cores {
				libc::CPU_SET(core, &mut set);
			}
			libc::sched_setaffinity(pid as libc::pid_t, std::mem::size_of::<libc::cpu_set_t>(), &set);
		}
	}

	#[cfg(not(target_os = "linux"))]
	pub fn apply_affinity(_pid: u32, _cores: &[usize]) {}
}

#[cfg(not(unix))]
mod platform {
	use super::ProcessPriority;

	// A real implementation calls SetPriorityClass / SetProcessAffinityMask
	// against a HANDLE opened from the PID.
	pub fn apply_priority(_pid: u32, _priority: ProcessPriority) {}
	pub fn apply_affinity(_pid: u32, _cores: &[usize]) {}
}

/// Parse a CPU affinity spec, either a hex bitmask (`0x...`) or a comma list
/// (`0,1,3`), clamped to `available_cores`. A single invalid core is dropped
/// with the rest kept; a totally invalid spec yields `None` (§4.4.2).
pub fn parse_cpu_affinity(spec: &str, available_cores: usize) -> Option<Vec<usize>> {
	let spec = spec.trim();
	let cores: Vec<usize> = if let Some(hex) = spec.strip_prefix("0x").or_else(|| spec.strip_prefix("0X")) {
		let mask = u64::from_str_radix(hex, 16).ok()?;
		(0..available_cores).filter(|i| mask & (1 << i) != 0).collect()
	} else {
		spec.split(',')
			.filter_map(|part| part.trim().parse::<usize>().ok())
			.filter(|&core| core < available_cores)
			.collect()
	};

	if cores.is_empty() {
		None
	} else {
		Some(cores)
	}
}

fn core_count() -> usize {
	let mut system = sysinfo::System::new();
	system.refresh_cpu_all();
	system.cpus().len().max(1)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn affinity_hex_mask_clamped_to_core_count() {
		let cores = parse_cpu_affinity("0xFF", 4).unwrap();
		assert_eq!(cores, vec![0, 1, 2, 3]);
	}

	#[test]
	fn affinity_comma_list_drops_out_of_range_core() {
		let cores = parse_cpu_affinity("0,1,99", 4).unwrap();
		assert_eq!(cores, vec![0, 1]);
	}

	#[test]
	fn totally_invalid_affinity_yields_none() {
		assert!(parse_cpu_affinity("bogus", 4).is_none());
	}

	#[test]
	fn all_zero_mask_yields_no_affinity() {
		assert!(parse_cpu_affinity("0x0", 4).is_none());
	}
}

// vim: ts=4
