//! `local` target provider: copies staged files to another path on the
//! same or a UNC-mounted filesystem. The simplest real `TargetProvider`,
//! used as both a working default and the reference shape new providers
//! copy (§4.5, §12 Non-goals: transports beyond local/UNC and a mock are
//! out of scope).

use crate::error::PoshBackupError;
use crate::model::{FileRef, TargetDef, TransferResult, TransferStatus};
use crate::transfer::target::{ConnectivityResult, JobContext, TargetProvider};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct LocalTargetProvider;

impl LocalTargetProvider {
	fn destination_dir(def: &TargetDef) -> Option<PathBuf> {
		def.target_specific_settings.get("path").and_then(|v| v.as_str()).map(PathBuf::from)
	}
}

#[async_trait]
impl TargetProvider for LocalTargetProvider {
	fn validate_settings(&self, def: &TargetDef, errors: &mut Vec<String>) {
		if Self::destination_dir(def).is_none() {
			errors.push("local target requires a 'path' setting".to_string());
		}
	}

	async fn test_connectivity(&self, def: &TargetDef) -> ConnectivityResult {
		match Self::destination_dir(def) {
			Some(dir) if dir.exists() => ConnectivityResult { success: true, message: "path exists".to_string() },
			Some(dir) => {
				ConnectivityResult { success: false, message: format!("path does not exist: {}", dir.display()) }
			}
			None => ConnectivityResult { success: false, message: "no 'path' configured".to_string() },
		}
	}

	async fn transfer(
		&self,
		local_file: &Path,
		def: &TargetDef,
		job_context: &JobContext<'_>,
	) -> Result<TransferResult, PoshBackupError> {
		let started = Instant::now();
		let destination_dir = Self::destination_dir(def).ok_or_else(|| {
			PoshBackupError::config("local target requires a 'path' setting")
		})?;
		let destination_dir = destination_dir.join(job_context.job_name);
		tokio::fs::create_dir_all(&destination_dir).await?;

		let file_name = local_file.file_name().ok_or_else(|| {
			PoshBackupError::Transfer {
				target_name: "local".to_string(),
				message: format!("source path has no file name: {}", local_file.display()),
			}
		})?;
		let destination = destination_dir.join(file_name);

		match tokio::fs::copy(local_file, &destination).await {
			Ok(bytes) => Ok(TransferResult {
				target_name: "local".to_string(),
				target_type: "local".to_string(),
				status: TransferStatus::Success,
				remote_path: Some(destination.display().to_string()),
				transfer_size: bytes,
				transfer_duration: started.elapsed(),
				error_message: None,
			}),
			Err(e) => Ok(TransferResult {
				target_name: "local".to_string(),
				target_type: "local".to_string(),
				status: TransferStatus::Failure(e.to_string()),
				remote_path: None,
				transfer_size: 0,
				transfer_duration: started.elapsed(),
				error_message: Some(e.to_string()),
			}),
		}
	}

	async fn list_remote_instances(
		&self,
		def: &TargetDef,
		base_file_name: &str,
		extension: &str,
	) -> Result<Vec<FileRef>, PoshBackupError> {
		let Some(dir) = Self::destination_dir(def) else { return Ok(Vec::new()) };
		let instances = crate::instance_scanner::InstanceScanner::scan(&dir, base_file_name, extension)?;
		Ok(instances.into_values().flat_map(|i| i.files).collect())
	}

	async fn delete_remote(&self, file: &FileRef, _def: &TargetDef) -> Result<(), PoshBackupError> {
		tokio::fs::remove_file(&file.path).await.map_err(PoshBackupError::from)
	}
}


// vim: ts=4
