//! `TargetProvider` (C8): per-transport plug-in contract. The core never
//! hard-codes transport semantics — subdirectory-per-job, credentials
//! lookup, region, bucket, path prefix all live inside the provider
//! (§4.5).

use crate::error::PoshBackupError;
use crate::model::{FileRef, TargetDef, TransferResult};
use async_trait::async_trait;
use std::path::Path;

pub struct ConnectivityResult {
	pub success: bool,
	pub message: String,
}

/// Shared context a provider needs for one job's transfer, beyond the
/// per-file path — kept intentionally small per §4.5's "the core never
/// hard-codes transport semantics".
pub struct JobContext<'a> {
	pub job_name: &'a str,
	pub instance_key: &'a str,
	pub password: Option<&'a str>,
}

#[async_trait]
pub trait TargetProvider: Send + Sync {
	/// Pure, config-time validation of `def`. Problems are appended to
	/// `errors` rather than returned, so every provider validation issue
	/// surfaces in one pass alongside `ConfigResolver`'s own checks.
	fn validate_settings(&self, def: &TargetDef, errors: &mut Vec<String>);

	/// Read-only connectivity probe.
	async fn test_connectivity(&self, def: &TargetDef) -> ConnectivityResult;

	/// Upload one file.
	async fn transfer(
		&self,
		local_file: &Path,
		def: &TargetDef,
		job_context: &JobContext<'_>,
	) -> Result<TransferResult, PoshBackupError>;

	/// List files on the remote matching `base_file_name`/`extension`, for
	/// remote retention. Optional — providers that don't support remote
	/// retention return `Ok(vec![])`.
	async fn list_remote_instances(
		&self,
		_def: &TargetDef,
		_base_file_name: &str,
		_extension: &str,
	) -> Result<Vec<FileRef>, PoshBackupError> {
		Ok(Vec::new())
	}

	/// Delete one remote file, for remote retention. Optional.
	async fn delete_remote(&self, _file: &FileRef, _def: &TargetDef) -> Result<(), PoshBackupError> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NoopProvider;

	#[async_trait]
	impl TargetProvider for NoopProvider {
		fn validate_settings(&self, _def: &TargetDef, _errors: &mut Vec<String>) {}

		async fn test_connectivity(&self, _def: &TargetDef) -> ConnectivityResult {
			ConnectivityResult { success: true, message: "ok".to_string() }
		}

		async fn transfer(
			&self,
			_local_file: &Path,
			_def: &TargetDef,
			_job_context: &JobContext<'_>,
		) -> Result<TransferResult, PoshBackupError> {
			unreachable!()
		}
	}

	#[tokio::test]
	async fn default_list_and_delete_are_no_ops() {
		let provider = NoopProvider;
		let def = TargetDef::default();
		let listed = provider.list_remote_instances(&def, "base", ".7z").await.unwrap();
		assert!(listed.is_empty());
		let file = FileRef {
			path: std::path::PathBuf::from("x"),
			size_bytes: 0,
			creation_time: std::time::SystemTime::now(),
		};
		assert!(provider.delete_remote(&file, &def).await.is_ok());
	}
}

// vim: ts=4
