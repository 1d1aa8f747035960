//! `LocalArchivePipeline` (C6): the sequential per-job state machine that
//! produces one local backup instance (§4.7).
//!
//! ```text
//! [Init] -> [FreeSpaceCheck] -> [VssMaybe] -> [PasswordResolve]
//!        -> [PreHook] -> [Archive] -> [PostLocalHook]
//!        -> [Checksum/Manifest] -> [Test] -> [Pin] -> [Done]
//!        \_ (any failure) -> [Release VSS] -> [Exit]
//! ```
//!
//! Hook ownership is split from `JobOrchestrator` (C9): this pipeline only
//! ever runs the `PreBackup`/`PostLocalArchive` points named in its own
//! diagram. `OnSuccess`/`OnFailure`/`Always` are run once per job by the
//! orchestrator after transfer and retention have also had their say (see
//! `orchestrator.rs` and `DESIGN.md`).

use crate::archiver::{classify_outcome, ArchiverDriver};
use crate::context::RunContext;
use crate::error::PoshBackupError;
use crate::hooks::{HookPoint, HookRunner};
use crate::model::{EffectiveJobConfig, HookInvocation, VssSession};
use crate::naming;
use crate::password::PasswordBroker;
use crate::strategies::OverallStatus;
use crate::vss::{VssCoordinator, VssRequest};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Everything `JobOrchestrator` needs from one local-archive run.
pub struct PipelineOutcome {
	pub status: OverallStatus,
	pub archive_path: Option<PathBuf>,
	/// Primary archive (or every `.NNN` volume part) plus every sidecar
	/// produced, in the order a `TransferOrchestrator` should send them —
	/// excludes the `.pinned` marker, which never leaves the local host.
	pub staged_files: Vec<PathBuf>,
	pub archive_size_bytes: Option<u64>,
	pub compression_time: Option<Duration>,
	pub seven_zip_exit_code: Option<i32>,
	pub hook_invocations: Vec<HookInvocation>,
	pub error: Option<PoshBackupError>,
}

impl PipelineOutcome {
	fn failure(status: OverallStatus, error: PoshBackupError, hooks: Vec<HookInvocation>) -> Self {
		PipelineOutcome {
			status,
			archive_path: None,
			staged_files: Vec::new(),
			archive_size_bytes: None,
			compression_time: None,
			seven_zip_exit_code: None,
			hook_invocations: hooks,
			error: Some(error),
		}
	}
}

pub struct LocalArchivePipeline;

impl LocalArchivePipeline {
	/// Run one job's local archive pipeline. `when` is the moment the
	/// archive's date stamp is taken from (passed in rather than read from
	/// the clock so callers and tests control it deterministically).
	pub async fn run(
		ctx: &RunContext,
		cfg: &EffectiveJobConfig,
		archiver: &ArchiverDriver,
		when: DateTime<Local>,
	) -> PipelineOutcome {
		let mut hooks = Vec::new();
		let mut status = OverallStatus::Success;
		let mut vss_session: Option<VssSession> = None;

		let date_stamp = naming::format_date_stamp(when, &cfg.archive_date_format);
		let archive_path =
			naming::build_archive_path(&cfg.destination_dir, &cfg.base_file_name, &date_stamp, &cfg.internal_archive_extension);
		let instance_key = naming::build_instance_key(&cfg.base_file_name, &date_stamp, &cfg.internal_archive_extension);

		// FreeSpaceCheck (§4.7).
		if let Err(e) = check_free_space(ctx, cfg, &mut status) {
			return PipelineOutcome::failure(OverallStatus::Failure, e, hooks);
		}

		remove_stale_volume_parts(ctx, cfg, &archive_path);

		// VssMaybe.
		let mut source_paths = cfg.source_paths.clone();
		if cfg.enable_vss {
			let request = VssRequest {
				source_paths: cfg.source_paths.clone(),
				context_option: cfg.vss_context_option.clone(),
				polling_timeout: Duration::from_secs(cfg.vss_polling_timeout_seconds),
				polling_interval: Duration::from_secs(cfg.vss_polling_interval_seconds),
			};
			match VssCoordinator::create(&request).await {
				Ok(session) => {
					source_paths = cfg
						.source_paths
						.iter()
						.map(|p| VssCoordinator::remap(&session, p).to_path_buf())
						.collect();
					vss_session = Some(session);
				}
				Err(e) => return PipelineOutcome::failure(OverallStatus::Failure, e, hooks),
			}
		}

		// PasswordResolve.
		let password = match PasswordBroker::resolve(
			ctx,
			cfg.archive_password_source,
			cfg.archive_password_plain.as_deref(),
			cfg.archive_password_secret_name.as_deref(),
		)
		.await
		{
			Ok(password) => password,
			Err(e) => {
				release_vss(vss_session).await;
				return PipelineOutcome::failure(OverallStatus::Failure, e, hooks);
			}
		};

		// PreHook.
		hooks.push(
			HookRunner::run(
				ctx,
				HookPoint::PreBackup,
				cfg.pre_backup_script_path.as_deref(),
				&cfg.job_name,
				&status.to_string(),
				None,
				None,
			)
			.await,
		);

		// Archive.
		let started = Instant::now();
		let archive_result = if ctx.simulate {
			ctx.logger.simulate(&format!("would create archive '{}'", archive_path.display()));
			None
		} else {
			Some(archiver.create(cfg, &archive_path, &source_paths, password.as_deref().map(String::as_str)).await)
		};
		let compression_time = started.elapsed();

		let mut archive_skipped = false;
		let (seven_zip_exit_code, archive_failed) = match &archive_result {
			None => (None, false),
			Some(Ok(outcome)) => {
				let exit_code = outcome.exit_code;
				match classify_outcome(outcome, cfg.treat_seven_zip_warnings_as_success) {
					Ok(OverallStatus::Skipped) => {
						archive_skipped = true;
						(Some(exit_code), false)
					}
					Ok(step_status) => {
						status = status.worst_of(step_status);
						(Some(exit_code), false)
					}
					Err(e) => {
						ctx.logger.error(&e.to_string());
						(Some(exit_code), true)
					}
				}
			}
			Some(Err(e)) => {
				ctx.logger.error(&e.to_string());
				(None, true)
			}
		};

		if archive_skipped {
			ctx.logger.warning("archive creation skipped: 7-Zip's confirmation prompt was declined");
			drop(password);
			release_vss(vss_session).await;
			return PipelineOutcome::failure(
				OverallStatus::Skipped,
				PoshBackupError::Other {
					message: "archive creation skipped: user declined 7-Zip's confirmation prompt".to_string(),
				},
				hooks,
			);
		}

		if archive_failed {
			drop(password);
			release_vss(vss_session).await;
			let error = match archive_result {
				Some(Err(e)) => e,
				_ => PoshBackupError::ArchiverError { exit_code: -1, message: "archive step failed".to_string() },
			};
			return PipelineOutcome::failure(OverallStatus::Failure, error, hooks);
		}

		let archive_size_bytes = if ctx.simulate {
			None
		} else {
			std::fs::metadata(&archive_path).ok().map(|m| m.len())
		};

		// PostLocalHook.
		hooks.push(
			HookRunner::run(
				ctx,
				HookPoint::PostLocalArchive,
				cfg.post_local_archive_script_path.as_deref(),
				&cfg.job_name,
				&status.to_string(),
				Some(&archive_path),
				archive_size_bytes,
			)
			.await,
		);

		let mut staged_files = Vec::new();

		if !ctx.simulate {
			// Checksum/Manifest.
			if cfg.split_volume_size.is_some() {
				let parts = find_volume_parts(&archive_path);
				if parts.is_empty() {
					ctx.logger.warning(&format!(
						"SplitVolumeSize is set but no '{}.NNN' volume parts were found",
						archive_path.display()
					));
				}
				staged_files.extend(parts.iter().cloned());

				if cfg.generate_split_archive_manifest {
					match hash_parts(&parts, cfg.checksum_algorithm) {
						Ok(entries) => {
							let rendered = crate::archiver::checksum::render_manifest(&entries);
							let manifest_path = cfg.destination_dir.join(format!(
								"{}.manifest.{}",
								instance_key,
								cfg.checksum_algorithm.extension()
							));
							if let Err(e) = std::fs::write(&manifest_path, rendered) {
								ctx.logger.warning(&format!("failed to write split archive manifest: {}", e));
								status = status.worst_of(OverallStatus::Warnings);
							} else {
								staged_files.push(manifest_path);
							}
						}
						Err(e) => {
							ctx.logger.warning(&format!("failed to hash volume parts: {}", e));
							status = status.worst_of(OverallStatus::Warnings);
						}
					}
				}
			} else {
				staged_files.push(archive_path.clone());

				if cfg.generate_archive_checksum {
					match crate::archiver::checksum::hash_file(&archive_path, cfg.checksum_algorithm) {
						Ok(digest) => {
							let sidecar_path =
								cfg.destination_dir.join(format!("{}.{}", instance_key, cfg.checksum_algorithm.extension()));
							if let Err(e) = std::fs::write(&sidecar_path, format!("{}\n", digest)) {
								ctx.logger.warning(&format!("failed to write checksum sidecar: {}", e));
								status = status.worst_of(OverallStatus::Warnings);
							} else {
								staged_files.push(sidecar_path);
							}
						}
						Err(e) => {
							ctx.logger.warning(&format!("failed to hash archive: {}", e));
							status = status.worst_of(OverallStatus::Warnings);
						}
					}
				}
			}

			if cfg.generate_contents_manifest {
				match archiver.list(&archive_path, password.as_deref().map(String::as_str)).await {
					Ok(entries) => {
						let mut body = String::new();
						for entry in &entries {
							let path = entry.path().unwrap_or_default();
							let size = entry.size().unwrap_or(0);
							body.push_str(&format!("{}  {}\n", size, path));
						}
						let contents_path = cfg.destination_dir.join(format!("{}.contents.manifest", instance_key));
						if let Err(e) = std::fs::write(&contents_path, body) {
							ctx.logger.warning(&format!("failed to write contents manifest: {}", e));
							status = status.worst_of(OverallStatus::Warnings);
						} else {
							staged_files.push(contents_path);
						}
					}
					Err(e) => {
						ctx.logger.warning(&format!("failed to list archive contents: {}", e));
						status = status.worst_of(OverallStatus::Warnings);
					}
				}
			}

			// Test.
			if cfg.test_archive_after_creation {
				match archiver
					.test(
						&archive_path,
						password.as_deref().map(String::as_str),
						cfg.verify_archive_checksum_on_test,
						cfg.treat_seven_zip_warnings_as_success,
					)
					.await
				{
					Ok(outcome) => match classify_outcome(&outcome, cfg.treat_seven_zip_warnings_as_success) {
						Ok(step_status) => status = status.worst_of(step_status),
						Err(e) => {
							ctx.logger.error(&format!("post-creation archive test failed: {}", e));
							status = status.worst_of(OverallStatus::Failure);
						}
					},
					Err(e) => {
						ctx.logger.error(&format!("post-creation archive test failed to run: {}", e));
						status = status.worst_of(OverallStatus::Failure);
					}
				}
			}

			// Pin.
			if cfg.pin_on_creation {
				let pin_path = cfg.destination_dir.join(format!("{}.pinned", instance_key));
				if let Err(e) = std::fs::write(&pin_path, b"") {
					ctx.logger.warning(&format!("failed to write pin marker: {}", e));
					status = status.worst_of(OverallStatus::Warnings);
				}
			}
		} else {
			staged_files.push(archive_path.clone());
		}

		drop(password);
		release_vss(vss_session).await;

		if ctx.simulate && status == OverallStatus::Success {
			status = OverallStatus::SimulatedComplete;
		}

		PipelineOutcome {
			status,
			archive_path: Some(archive_path),
			staged_files,
			archive_size_bytes,
			compression_time: Some(compression_time),
			seven_zip_exit_code,
			hook_invocations: hooks,
			error: None,
		}
	}
}

async fn release_vss(session: Option<VssSession>) {
	if let Some(session) = session {
		let _ = VssCoordinator::release(session).await;
	}
}

/// Consult the destination drive's free space; below the configured
/// minimum is a FAILURE when `ExitOnLowSpace`, else a WARNING (§4.7).
fn check_free_space(
	ctx: &RunContext,
	cfg: &EffectiveJobConfig,
	status: &mut OverallStatus,
) -> Result<(), PoshBackupError> {
	if cfg.minimum_required_free_space_gb == 0 {
		return Ok(());
	}

	let Some(available_bytes) = available_space_bytes(&cfg.destination_dir) else {
		ctx.logger.debug("could not determine free space for destination directory, skipping check");
		return Ok(());
	};

	let required_bytes = cfg.minimum_required_free_space_gb.saturating_mul(1024 * 1024 * 1024);
	if available_bytes >= required_bytes {
		return Ok(());
	}

	let message = format!(
		"destination directory has {} bytes free, below the required {} bytes",
		available_bytes, required_bytes
	);
	if cfg.exit_on_low_space {
		Err(PoshBackupError::env(message))
	} else {
		ctx.logger.warning(&message);
		*status = status.worst_of(OverallStatus::Warnings);
		Ok(())
	}
}

fn available_space_bytes(destination_dir: &std::path::Path) -> Option<u64> {
	let disks = sysinfo::Disks::new_with_refreshed_list();
	let mut best: Option<(&std::path::Path, u64)> = None;
	for disk in disks.list() {
		let mount_point = disk.mount_point();
		if destination_dir.starts_with(mount_point) {
			let depth = mount_point.components().count() as u64;
			if best.map(|(_, best_depth)| depth > best_depth).unwrap_or(true) {
				best = Some((mount_point, depth));
			}
		}
	}
	let mount_point = best.map(|(p, _)| p)?;
	disks.list().iter().find(|d| d.mount_point() == mount_point).map(|d| d.available_space())
}

/// Delete pre-existing `.NNN` volume parts for the intended split set so
/// 7-Zip never appends to a stale one (§4.7). Failures downgrade to a
/// warning, logged, and do not halt the job.
fn remove_stale_volume_parts(ctx: &RunContext, cfg: &EffectiveJobConfig, archive_path: &std::path::Path) {
	if cfg.split_volume_size.is_none() || ctx.simulate {
		return;
	}
	for part in find_volume_parts(archive_path) {
		if let Err(e) = std::fs::remove_file(&part) {
			ctx.logger.warning(&format!("failed to remove stale volume part '{}': {}", part.display(), e));
		}
	}
}

fn find_volume_parts(archive_path: &std::path::Path) -> Vec<PathBuf> {
	let pattern = format!("{}.[0-9][0-9][0-9]", archive_path.display());
	let Ok(paths) = glob::glob(&pattern) else { return Vec::new() };
	let mut parts: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
	parts.sort();
	parts
}

fn hash_parts(
	parts: &[PathBuf],
	algorithm: crate::strategies::ChecksumAlgorithm,
) -> Result<Vec<(String, String)>, PoshBackupError> {
	parts
		.iter()
		.map(|part| {
			let digest = crate::archiver::checksum::hash_file(part, algorithm)?;
			let filename = part.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
			Ok((digest, filename))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::archiver::ArchiverDriver;
	use crate::strategies::{
		ArchivePasswordSource, ArchiveType, ChecksumAlgorithm, PostRunAction, ProcessPriority, SfxModule,
	};
	use chrono::TimeZone;

	fn cfg_with_dest(dest: PathBuf, source: PathBuf) -> EffectiveJobConfig {
		EffectiveJobConfig {
			job_name: "hello".to_string(),
			source_paths: vec![source],
			base_file_name: "hello".to_string(),
			destination_dir: dest,
			target_instances: vec![],
			depends_on_jobs: vec![],
			archive_type: ArchiveType::SevenZip,
			compression_level: 5,
			compression_method: None,
			dictionary_size: None,
			word_size: None,
			solid_block_size: None,
			compress_open_files: false,
			threads_setting: None,
			follow_symbolic_links: true,
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
			archive_date_format: "%Y-%b-%d".to_string(),
			job_archive_extension: ".7z".to_string(),
			internal_archive_extension: ".7z".to_string(),
			enable_vss: false,
			vss_context_option: "Persistent".to_string(),
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
			delete_to_recycle_bin: true,
			retention_confirm_delete: false,
			minimum_required_free_space_gb: 0,
			exit_on_low_space: false,
			treat_seven_zip_warnings_as_success: false,
			seven_zip_cpu_affinity: None,
			seven_zip_process_priority: ProcessPriority::Normal,
			max_retry_attempts: 1,
			retry_delay_seconds: 0,
			enable_retries: false,
			pre_backup_script_path: None,
			post_local_archive_script_path: None,
			post_backup_script_on_success_path: None,
			post_backup_script_on_failure_path: None,
			post_backup_script_always_path: None,
			post_run_action: PostRunAction::None,
			delete_local_archive_after_successful_transfer: false,
			simulate: false,
		}
	}

	#[tokio::test]
	async fn simulate_mode_produces_no_archive_on_disk() {
		let source_dir = tempfile::tempdir().unwrap();
		let dest_dir = tempfile::tempdir().unwrap();
		let source_file = source_dir.path().join("hello.txt");
		std::fs::write(&source_file, b"hello").unwrap();

		let mut cfg = cfg_with_dest(dest_dir.path().to_path_buf(), source_file);
		cfg.simulate = true;
		let mut ctx = RunContext::new(true);
		ctx.simulate = true;

		let archiver = ArchiverDriver::new(PathBuf::from("/bin/true"));
		let when = Local.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
		let outcome = LocalArchivePipeline::run(&ctx, &cfg, &archiver, when).await;

		assert_eq!(outcome.status, OverallStatus::SimulatedComplete);
		assert!(outcome.archive_path.is_some());
		let archive_path = outcome.archive_path.unwrap();
		assert!(!archive_path.exists());
	}

	#[tokio::test]
	async fn archiver_spawn_failure_is_reported_as_a_failure() {
		let source_dir = tempfile::tempdir().unwrap();
		let dest_dir = tempfile::tempdir().unwrap();
		let source_file = source_dir.path().join("hello.txt");
		std::fs::write(&source_file, b"hello").unwrap();

		let cfg = cfg_with_dest(dest_dir.path().to_path_buf(), source_file);
		let ctx = RunContext::new(false);
		let archiver = ArchiverDriver::new(PathBuf::from("/nonexistent/7z"));
		let when = Local.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
		let outcome = LocalArchivePipeline::run(&ctx, &cfg, &archiver, when).await;

		assert_eq!(outcome.status, OverallStatus::Failure);
		assert!(outcome.error.is_some());
		assert!(outcome.archive_path.is_none());
	}
}

// vim: ts=4
