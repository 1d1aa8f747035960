//! `HookRunner` (C11): invoke pre/post lifecycle scripts with environment
//! injection. A hook's exit code is recorded but never changes job status;
//! a hook script that doesn't exist on disk is a WARNING, not an error.

use crate::context::RunContext;
use crate::model::HookInvocation;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
	PreBackup,
	PostLocalArchive,
	OnSuccess,
	OnFailure,
	Always,
}

impl HookPoint {
	fn label(self) -> &'static str {
		match self {
			HookPoint::PreBackup => "pre-backup",
			HookPoint::PostLocalArchive => "post-local-archive",
			HookPoint::OnSuccess => "on-success",
			HookPoint::OnFailure => "on-failure",
			HookPoint::Always => "always",
		}
	}
}

pub struct HookRunner;

impl HookRunner {
	/// Run `script_path` if it exists, injecting the documented environment
	/// variables. Returns a `HookInvocation` recording whether it ran and
	/// its exit code; never returns `Err` — a failing or missing hook is
	/// logged and absorbed (§4.11, §7 `HookNonZero`).
	pub async fn run(
		ctx: &RunContext,
		point: HookPoint,
		script_path: Option<&Path>,
		job_name: &str,
		status_so_far: &str,
		archive_path: Option<&Path>,
		archive_size_bytes: Option<u64>,
	) -> HookInvocation {
		let Some(script_path) = script_path else {
			return HookInvocation {
				script_path: std::path::PathBuf::new(),
				point: point.label().to_string(),
				exit_code: None,
				ran: false,
			};
		};

		if !script_path.exists() {
			ctx.logger.warning(&format!(
				"{} hook script does not exist, skipping: {}",
				point.label(),
				script_path.display()
			));
			return HookInvocation {
				script_path: script_path.to_path_buf(),
				point: point.label().to_string(),
				exit_code: None,
				ran: false,
			};
		}

		if ctx.simulate {
			ctx.logger.simulate(&format!("would run {} hook: {}", point.label(), script_path.display()));
			return HookInvocation {
				script_path: script_path.to_path_buf(),
				point: point.label().to_string(),
				exit_code: None,
				ran: false,
			};
		}

		let mut command = tokio::process::Command::new(script_path);
		command.env("POSH_BACKUP_JOB_NAME", job_name);
		command.env("POSH_BACKUP_STATUS", status_so_far);
		if let Some(path) = archive_path {
			command.env("POSH_BACKUP_ARCHIVE_PATH", path);
		}
		if let Some(size) = archive_size_bytes {
			command.env("POSH_BACKUP_ARCHIVE_SIZE_BYTES", size.to_string());
		}

		match command.status().await {
			Ok(status) => {
				let code = status.code();
				if code != Some(0) {
					ctx.logger.warning(&format!(
						"{} hook '{}' exited with code {:?}",
						point.label(),
						script_path.display(),
						code
					));
				}
				HookInvocation {
					script_path: script_path.to_path_buf(),
					point: point.label().to_string(),
					exit_code: code,
					ran: true,
				}
			}
			Err(e) => {
				ctx.logger.warning(&format!(
					"{} hook '{}' failed to start: {}",
					point.label(),
					script_path.display(),
					e
				));
				HookInvocation {
					script_path: script_path.to_path_buf(),
					point: point.label().to_string(),
					exit_code: None,
					ran: false,
				}
			}
		}
	}
}


// vim: ts=4
