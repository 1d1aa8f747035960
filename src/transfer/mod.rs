//! `TransferOrchestrator` (C7): fan staged files out to every resolved
//! target in parallel, one worker per target, each worker sequential over
//! its own files (§4.5).

pub mod providers;
pub mod target;

use crate::context::RunContext;
use crate::error::PoshBackupError;
use crate::model::{EffectiveJobConfig, TransferResult, TransferStatus};
use std::path::{Path, PathBuf};
use target::{JobContext, TargetProvider};

/// Outcome of one run of the orchestrator: every target's result for every
/// file it reached, plus whether staged files are safe to delete (P6).
pub struct TransferOutcome {
	pub results: Vec<TransferResult>,
	pub all_targets_succeeded: bool,
}

pub struct TransferOrchestrator;

impl TransferOrchestrator {
	/// Transfer `staged_files` (primary archive, `.NNN` volume parts,
	/// checksum/manifest sidecars) to every target in `cfg.target_instances`.
	///
	/// Each target runs as its own concurrent worker and transfers its files
	/// sequentially, stopping at the first file that fails for that target
	/// (remaining files for that target are skipped, not attempted); workers
	/// for different targets never block on one another. Staged-file cleanup
	/// is the caller's decision, gated on `all_targets_succeeded` plus
	/// `DeleteLocalArchiveAfterSuccessfulTransfer` and "at least one target
	/// configured" (P6) — this function reports the fact, never deletes.
	pub async fn run(
		ctx: &RunContext,
		cfg: &EffectiveJobConfig,
		staged_files: &[PathBuf],
		providers: &[(&str, &dyn TargetProvider)],
	) -> TransferOutcome {
		if cfg.target_instances.is_empty() {
			return TransferOutcome { results: Vec::new(), all_targets_succeeded: false };
		}

		let job_context = JobContext {
			job_name: &cfg.job_name,
			instance_key: &cfg.base_file_name,
			password: None,
		};

		let workers = cfg.target_instances.iter().map(|resolved| {
			let provider = providers
				.iter()
				.find(|(type_name, _)| *type_name == resolved.def.target_type)
				.map(|(_, p)| *p);
			Self::run_one_target(ctx, resolved.name.clone(), provider, &resolved.def, staged_files, &job_context)
		});

		let per_target_results: Vec<Vec<TransferResult>> = futures::future::join_all(workers).await;

		let mut results = Vec::new();
		let mut all_succeeded = true;
		for target_results in per_target_results {
			let target_ok = target_results.iter().all(|r| r.status == TransferStatus::Success);
			all_succeeded = all_succeeded && target_ok;
			results.extend(target_results);
		}

		TransferOutcome { results, all_targets_succeeded: all_succeeded }
	}

	async fn run_one_target(
		ctx: &RunContext,
		target_name: String,
		provider: Option<&dyn TargetProvider>,
		def: &crate::model::TargetDef,
		staged_files: &[PathBuf],
		job_context: &JobContext<'_>,
	) -> Vec<TransferResult> {
		let Some(provider) = provider else {
			ctx.logger.error(&format!("no provider registered for target type '{}'", def.target_type));
			return vec![TransferResult {
				target_name: target_name.clone(),
				target_type: def.target_type.clone(),
				status: TransferStatus::Failure(format!("unknown target type '{}'", def.target_type)),
				remote_path: None,
				transfer_size: 0,
				transfer_duration: std::time::Duration::ZERO,
				error_message: Some(format!("unknown target type '{}'", def.target_type)),
			}];
		};

		let mut results = Vec::new();
		for file in staged_files {
			if ctx.is_cancelled() {
				results.push(cancelled_result(&target_name, &def.target_type, file));
				break;
			}

			let result = if ctx.simulate {
				ctx.logger.simulate(&format!("would transfer '{}' to target '{}'", file.display(), target_name));
				simulated_result(&target_name, &def.target_type, file)
			} else {
				match provider.transfer(file, def, job_context).await {
					Ok(mut r) => {
						r.target_name = target_name.clone();
						r
					}
					Err(e) => TransferResult {
						target_name: target_name.clone(),
						target_type: def.target_type.clone(),
						status: TransferStatus::Failure(e.to_string()),
						remote_path: None,
						transfer_size: 0,
						transfer_duration: std::time::Duration::ZERO,
						error_message: Some(e.to_string()),
					},
				}
			};

			let failed = result.status != TransferStatus::Success;
			results.push(result);
			if failed {
				ctx.logger.warning(&format!(
					"transfer of '{}' to target '{}' failed, skipping remaining files for this target",
					file.display(),
					target_name
				));
				break;
			}
		}
		results
	}

	/// Staged-file cleanup gate (P6): only true if every target succeeded,
	/// at least one target was configured, and the job asked for it.
	pub fn should_delete_staged_files(
		cfg: &EffectiveJobConfig,
		outcome: &TransferOutcome,
	) -> bool {
		cfg.delete_local_archive_after_successful_transfer
			&& !cfg.target_instances.is_empty()
			&& outcome.all_targets_succeeded
	}
}

fn simulated_result(target_name: &str, target_type: &str, file: &Path) -> TransferResult {
	TransferResult {
		target_name: target_name.to_string(),
		target_type: target_type.to_string(),
		status: TransferStatus::Success,
		remote_path: Some(format!("(simulated) {}", file.display())),
		transfer_size: 0,
		transfer_duration: std::time::Duration::ZERO,
		error_message: None,
	}
}

fn cancelled_result(target_name: &str, target_type: &str, file: &Path) -> TransferResult {
	let message = PoshBackupError::Cancelled.to_string();
	TransferResult {
		target_name: target_name.to_string(),
		target_type: target_type.to_string(),
		status: TransferStatus::Failure(message.clone()),
		remote_path: None,
		transfer_size: 0,
		transfer_duration: std::time::Duration::ZERO,
		error_message: Some(message),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{ResolvedTarget, TargetDef};
	use crate::strategies::{
		ArchivePasswordSource, ArchiveType, ChecksumAlgorithm, PostRunAction, ProcessPriority, SfxModule,
	};
	use providers::local::LocalTargetProvider;
	use providers::mock::MockTargetProvider;
	use serde_json::json;

	fn base_cfg(targets: Vec<ResolvedTarget>) -> EffectiveJobConfig {
		EffectiveJobConfig {
			job_name: "nightly".to_string(),
			source_paths: vec![],
			base_file_name: "nightly".to_string(),
			destination_dir: PathBuf::from("/tmp"),
			target_instances: targets,
			depends_on_jobs: vec![],
			archive_type: ArchiveType::SevenZip,
			compression_level: 5,
			compression_method: None,
			dictionary_size: None,
			word_size: None,
			solid_block_size: None,
			compress_open_files: true,
			threads_setting: None,
			follow_symbolic_links: false,
			seven_zip_temp_directory: None,
			create_sfx: false,
			sfx_module: SfxModule::Console,
			split_volume_size: None,
			additional_exclusions: vec![],
			seven_zip_include_list_file: None,
			seven_zip_exclude_list_file: None,
			archive_password_source: ArchivePasswordSource::None,
			archive_password_plain: None,
			archive_password_secret_name: None,
			archive_date_format: "yyyy-MMM-dd".to_string(),
			job_archive_extension: ".7z".to_string(),
			internal_archive_extension: ".7z".to_string(),
			enable_vss: false,
			vss_context_option: "Default".to_string(),
			vss_polling_timeout_seconds: 60,
			vss_polling_interval_seconds: 2,
			generate_archive_checksum: false,
			checksum_algorithm: ChecksumAlgorithm::Sha256,
			generate_split_archive_manifest: false,
			generate_contents_manifest: false,
			test_archive_after_creation: false,
			verify_archive_checksum_on_test: false,
			verify_local_archive_before_transfer: false,
			test_archive_before_deletion: false,
			pin_on_creation: false,
			local_retention_count: 0,
			delete_to_recycle_bin: false,
			retention_confirm_delete: false,
			minimum_required_free_space_gb: 0,
			exit_on_low_space: false,
			treat_seven_zip_warnings_as_success: false,
			seven_zip_cpu_affinity: None,
			seven_zip_process_priority: ProcessPriority::Normal,
			max_retry_attempts: 0,
			retry_delay_seconds: 0,
			enable_retries: false,
			pre_backup_script_path: None,
			post_local_archive_script_path: None,
			post_backup_script_on_success_path: None,
			post_backup_script_on_failure_path: None,
			post_backup_script_always_path: None,
			post_run_action: PostRunAction::None,
			delete_local_archive_after_successful_transfer: true,
			simulate: false,
		}
	}

	#[tokio::test]
	async fn no_targets_yields_no_cleanup() {
		let ctx = RunContext::new(false);
		let cfg = base_cfg(vec![]);
		let outcome = TransferOrchestrator::run(&ctx, &cfg, &[], &[]).await;
		assert!(outcome.results.is_empty());
		assert!(!TransferOrchestrator::should_delete_staged_files(&cfg, &outcome));
	}

	#[tokio::test]
	async fn one_target_failing_blocks_cleanup_even_if_others_succeed() {
		let source_dir = tempfile::tempdir().unwrap();
		let dest_dir = tempfile::tempdir().unwrap();
		let file_a = source_dir.path().join("a.7z");
		tokio::fs::write(&file_a, b"data").await.unwrap();

		let mut good_settings = serde_json::Map::new();
		good_settings.insert("path".to_string(), json!(dest_dir.path().display().to_string()));
		let good_target = ResolvedTarget {
			name: "good".to_string(),
			def: TargetDef { target_type: "local".to_string(), target_specific_settings: good_settings, ..Default::default() },
		};
		let bad_target = ResolvedTarget {
			name: "bad".to_string(),
			def: TargetDef { target_type: "mock".to_string(), ..Default::default() },
		};

		let cfg = base_cfg(vec![good_target, bad_target]);
		let ctx = RunContext::new(false);
		let local = LocalTargetProvider;
		let mock = MockTargetProvider::new(Some(1));
		let providers: Vec<(&str, &dyn TargetProvider)> = vec![("local", &local), ("mock", &mock)];

		let outcome = TransferOrchestrator::run(&ctx, &cfg, &[file_a], &providers).await;
		assert!(!outcome.all_targets_succeeded);
		assert!(!TransferOrchestrator::should_delete_staged_files(&cfg, &outcome));
	}
}

// vim: ts=4
