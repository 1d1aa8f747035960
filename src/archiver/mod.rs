//! `ArchiverDriver` (C4): builds 7-Zip argv and runs it as a subprocess for
//! create/test/list operations.

pub mod argv;
pub mod checksum;
pub mod list_parser;
pub mod process;

use crate::error::PoshBackupError;
use crate::model::EffectiveJobConfig;
use crate::strategies::OverallStatus;
use list_parser::SltEntry;
use process::{ArchiverOutcome, ProcessRunner};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct ArchiverDriver {
	runner: ProcessRunner,
}

impl ArchiverDriver {
	pub fn new(seven_zip_path: PathBuf) -> Self {
		ArchiverDriver { runner: ProcessRunner::new(seven_zip_path) }
	}

	/// `7z a` — create an archive from `source_paths` at `archive_path`.
	pub async fn create(
		&self,
		cfg: &EffectiveJobConfig,
		archive_path: &Path,
		source_paths: &[PathBuf],
		password: Option<&str>,
	) -> Result<ArchiverOutcome, PoshBackupError> {
		let argv = argv::build_create_argv(cfg, archive_path, source_paths, password);
		self.runner
			.run(
				&argv,
				false,
				cfg.seven_zip_process_priority,
				cfg.seven_zip_cpu_affinity.as_deref(),
				cfg.treat_seven_zip_warnings_as_success,
				cfg.enable_retries,
				cfg.max_retry_attempts,
				Duration::from_secs(cfg.retry_delay_seconds),
			)
			.await
	}

	/// `7z t` — test archive integrity, used both after creation and as the
	/// retention engine's safety check before deletion (§4.3, §4.7).
	pub async fn test(
		&self,
		archive_path: &Path,
		password: Option<&str>,
		verify_checksum_on_test: bool,
		warnings_as_success: bool,
	) -> Result<ArchiverOutcome, PoshBackupError> {
		let argv = argv::build_test_argv(archive_path, password, verify_checksum_on_test);
		self.runner
			.run(&argv, false, Default::default(), None, warnings_as_success, false, 1, Duration::ZERO)
			.await
	}

	/// `7z l -slt` — list contents in technical mode.
	pub async fn list(
		&self,
		archive_path: &Path,
		password: Option<&str>,
	) -> Result<Vec<SltEntry>, PoshBackupError> {
		let argv = argv::build_list_argv(archive_path, password);
		let outcome = self
			.runner
			.run(&argv, true, Default::default(), None, false, false, 1, Duration::ZERO)
			.await?;
		if outcome.exit_code >= 2 {
			return Err(PoshBackupError::ArchiverError {
				exit_code: outcome.exit_code,
				message: outcome.stderr,
			});
		}
		Ok(list_parser::parse_slt(&outcome.stdout))
	}
}

/// Fold a raw 7-Zip `ArchiverOutcome` into the job-level classification the
/// design names (§4.4.3, §7): exit 0/1-with-flag → `Success`, exit 1 without
/// the flag → `Warnings`, exit `-1000` (user declined a confirmation prompt,
/// e.g. overwrite) → `Skipped`, anything else → an error variant.
pub fn classify_outcome(
	outcome: &ArchiverOutcome,
	warnings_as_success: bool,
) -> Result<OverallStatus, PoshBackupError> {
	match outcome.exit_code {
		0 => Ok(OverallStatus::Success),
		1 if warnings_as_success => Ok(OverallStatus::Success),
		1 => Ok(OverallStatus::Warnings),
		-1000 => Ok(OverallStatus::Skipped),
		-999 => Err(PoshBackupError::ArchiverError {
			exit_code: -999,
			message: format!("failed to spawn 7-Zip: {}", outcome.stderr),
		}),
		code => Err(PoshBackupError::ArchiverError { exit_code: code, message: outcome.stderr.clone() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn outcome(exit_code: i32) -> ArchiverOutcome {
		ArchiverOutcome {
			exit_code,
			stderr: String::new(),
			stdout: String::new(),
			status: OverallStatus::Success,
		}
	}

	#[test]
	fn exit_1_without_flag_is_warnings() {
		let status = classify_outcome(&outcome(1), false).unwrap();
		assert_eq!(status, OverallStatus::Warnings);
	}

	#[test]
	fn exit_1_with_flag_is_success() {
		let status = classify_outcome(&outcome(1), true).unwrap();
		assert_eq!(status, OverallStatus::Success);
	}

	#[test]
	fn exit_2_is_archiver_error_regardless_of_flag() {
		assert!(classify_outcome(&outcome(2), true).is_err());
		assert!(classify_outcome(&outcome(2), false).is_err());
	}

	#[test]
	fn exit_minus_1000_is_skipped_not_a_failure() {
		let status = classify_outcome(&outcome(-1000), false).unwrap();
		assert_eq!(status, OverallStatus::Skipped);
	}
}

// vim: ts=4
