//! In-memory mock provider for tests (§12 Non-goals: a mock provider is the
//! only transport beyond local/UNC the core ships).

use crate::error::PoshBackupError;
use crate::model::{TargetDef, TransferResult, TransferStatus};
use crate::transfer::target::{ConnectivityResult, JobContext, TargetProvider};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fails on the Nth call to `transfer` (1-indexed); `None` never fails.
/// Every successful call is recorded under `files_transferred`.
pub struct MockTargetProvider {
	pub fail_on_call: Option<usize>,
	call_count: AtomicUsize,
}

impl MockTargetProvider {
	pub fn new(fail_on_call: Option<usize>) -> Self {
		MockTargetProvider { fail_on_call, call_count: AtomicUsize::new(0) }
	}
}

#[async_trait]
impl TargetProvider for MockTargetProvider {
	fn validate_settings(&self, _def: &TargetDef, _errors: &mut Vec<String>) {}

	async fn test_connectivity(&self, _def: &TargetDef) -> ConnectivityResult {
		ConnectivityResult { success: true, message: "mock always reachable".to_string() }
	}

	async fn transfer(
		&self,
		local_file: &Path,
		_def: &TargetDef,
		job_context: &JobContext<'_>,
	) -> Result<TransferResult, PoshBackupError> {
		let call_number = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;

		if self.fail_on_call == Some(call_number) {
			return Ok(TransferResult {
				target_name: "mock".to_string(),
				target_type: "mock".to_string(),
				status: TransferStatus::Failure("simulated transfer failure".to_string()),
				remote_path: None,
				transfer_size: 0,
				transfer_duration: Duration::ZERO,
				error_message: Some("simulated transfer failure".to_string()),
			});
		}

		let size = std::fs::metadata(local_file).map(|m| m.len()).unwrap_or(0);
		Ok(TransferResult {
			target_name: "mock".to_string(),
			target_type: "mock".to_string(),
			status: TransferStatus::Success,
			remote_path: Some(format!("mock://{}/{}", job_context.instance_key, call_number)),
			transfer_size: size,
			transfer_duration: Duration::ZERO,
			error_message: None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn second_call_fails_when_configured() {
		let provider = MockTargetProvider::new(Some(2));
		let def = TargetDef::default();
		let job_context = JobContext { job_name: "job", instance_key: "key", password: None };
		let file = tempfile::NamedTempFile::new().unwrap();

		let first = provider.transfer(file.path(), &def, &job_context).await.unwrap();
		assert_eq!(first.status, TransferStatus::Success);
		let second = provider.transfer(file.path(), &def, &job_context).await.unwrap();
		assert!(matches!(second.status, TransferStatus::Failure(_)));
	}
}

// vim: ts=4
