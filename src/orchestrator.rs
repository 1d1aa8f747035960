//! `JobOrchestrator` (C9): run a list of jobs to completion, honouring
//! dependencies and set policies (§4.9).
//!
//! The dependency-ordered job list itself is produced by `topo_sort`, kept
//! in this module for convenience but deliberately outside the
//! orchestrator's own contract: `run_set` accepts the list "already resolved
//! to enabled, in dependency order" (§4.9), matching an upstream CLI/test
//! caller having run `topo_sort` first.

use crate::archiver::ArchiverDriver;
use crate::config::ConfigResolver;
use crate::context::RunContext;
use crate::error::PoshBackupError;
use crate::hooks::{HookPoint, HookRunner};
use crate::instance_scanner::{group_files_into_instances, InstanceScanner};
use crate::model::{CliOverrides, EffectiveJobConfig, GlobalConfig, JobReport, LogEntry};
use crate::password::PasswordBroker;
use crate::pipeline::LocalArchivePipeline;
use crate::retention::RetentionEngine;
use crate::strategies::{OnErrorInJob, OverallStatus, PostRunAction};
use crate::transfer::target::TargetProvider;
use crate::transfer::TransferOrchestrator;
use chrono::Local;
use std::collections::{BTreeMap, VecDeque};

/// Outcome of running a whole set (or a single ad-hoc job, treated as a
/// set of one): every job's report, the aggregate status (§4.9 "if any job
/// is FAILURE -> FAILURE; else if any is WARNINGS -> WARNINGS; else
/// SUCCESS"), the resolved post-run action, and whether `StopSet` cut the
/// run short.
pub struct SetOutcome {
	pub job_reports: Vec<JobReport>,
	pub overall_status: OverallStatus,
	pub post_run_action: PostRunAction,
	pub stopped_early: bool,
}

pub struct JobOrchestrator;

impl JobOrchestrator {
	/// Run `job_names` in order. Each job goes through: resolve config, run
	/// `LocalArchivePipeline`, run `TransferOrchestrator`, run
	/// `RetentionEngine` (local then remote), run the matching post-hook,
	/// and fold the job's status into the set aggregate.
	///
	/// `providers` maps a target's `target_type` to the `TargetProvider`
	/// that implements it; a target whose type has no registered provider
	/// fails every transfer to it (`TransferOrchestrator` already reports
	/// this per-target, it is not a reason to stop the job).
	#[allow(clippy::too_many_arguments)]
	pub async fn run_set(
		ctx: &RunContext,
		global: &GlobalConfig,
		job_names: &[String],
		cli: &CliOverrides,
		set_name: Option<&str>,
		archiver: &ArchiverDriver,
		providers: &[(&str, &dyn TargetProvider)],
	) -> SetOutcome {
		let resolver = ConfigResolver::new(global);
		let on_error = set_name
			.and_then(|name| global.backup_sets.get(name))
			.and_then(|set| set.on_error_in_job)
			.unwrap_or_default();

		let mut job_reports = Vec::new();
		let mut overall_status = OverallStatus::Success;
		let mut resolved_configs: Vec<EffectiveJobConfig> = Vec::new();
		let mut stopped_early = false;

		for job_name in job_names {
			let job_ctx = ctx.child();

			let cfg = match resolver.resolve(job_name, cli, set_name) {
				Ok(cfg) => cfg,
				Err(errors) => {
					let mut report = JobReport::new(job_name.clone());
					for e in &errors {
						job_ctx.logger.error(&e.to_string());
						report.log_entries.push(LogEntry { level: "ERROR".to_string(), message: e.to_string() });
					}
					report.downgrade_to(OverallStatus::Failure);
					overall_status = overall_status.worst_of(report.overall_status);
					job_reports.push(report);

					if on_error == OnErrorInJob::StopSet {
						stopped_early = true;
						break;
					}
					continue;
				}
			};

			let report = Self::run_one_job(&job_ctx, &resolver, &cfg, set_name, archiver, providers).await;
			overall_status = overall_status.worst_of(report.overall_status);
			let job_failed = matches!(report.overall_status, OverallStatus::Failure | OverallStatus::Skipped);
			job_reports.push(report);
			resolved_configs.push(cfg);

			if job_failed && on_error == OnErrorInJob::StopSet {
				stopped_early = true;
				break;
			}
		}

		let post_run_action = Self::resolve_post_run_action(&resolved_configs);

		SetOutcome { job_reports, overall_status, post_run_action, stopped_early }
	}

	async fn run_one_job(
		ctx: &RunContext,
		resolver: &ConfigResolver<'_>,
		cfg: &EffectiveJobConfig,
		set_name: Option<&str>,
		archiver: &ArchiverDriver,
		providers: &[(&str, &dyn TargetProvider)],
	) -> JobReport {
		let mut report = JobReport::new(cfg.job_name.clone());

		ctx.logger.heading(&format!("starting job '{}'", cfg.job_name));

		let pipeline_outcome = LocalArchivePipeline::run(ctx, cfg, archiver, Local::now()).await;
		report.overall_status = pipeline_outcome.status;
		report.archive_path = pipeline_outcome.archive_path.clone();
		report.archive_size_bytes = pipeline_outcome.archive_size_bytes;
		report.compression_time = pipeline_outcome.compression_time;
		report.seven_zip_exit_code = pipeline_outcome.seven_zip_exit_code;
		report.hook_scripts = pipeline_outcome.hook_invocations;
		if let Some(e) = &pipeline_outcome.error {
			report.log_entries.push(LogEntry { level: "ERROR".to_string(), message: e.to_string() });
		}

		if let Some(archive_path) = &pipeline_outcome.archive_path {
			let verified = Self::verify_before_transfer(ctx, cfg, archiver, archive_path, &mut report).await;

			let transfer_outcome = if verified {
				TransferOrchestrator::run(ctx, cfg, &pipeline_outcome.staged_files, providers).await
			} else {
				crate::transfer::TransferOutcome { results: Vec::new(), all_targets_succeeded: false }
			};
			report.target_transfers = transfer_outcome.results.clone();
			if !cfg.target_instances.is_empty() && !transfer_outcome.all_targets_succeeded {
				report.downgrade_to(OverallStatus::Warnings);
			}

			if TransferOrchestrator::should_delete_staged_files(cfg, &transfer_outcome) && !ctx.simulate {
				for file in &pipeline_outcome.staged_files {
					if let Err(e) = std::fs::remove_file(file) {
						ctx.logger.warning(&format!("failed to remove staged file '{}': {}", file.display(), e));
					}
				}
			}

			Self::run_local_retention(ctx, cfg, archiver, &mut report).await;
			Self::run_remote_retention(ctx, cfg, providers, &mut report).await;
		}

		Self::run_completion_hooks(ctx, cfg, &pipeline_outcome.archive_path, pipeline_outcome.archive_size_bytes, &mut report)
			.await;

		let log_retention_count = resolver.resolve_log_retention_count(cfg_log_retention_cli(cfg), set_name);
		report.log_entries.push(LogEntry {
			level: "INFO".to_string(),
			message: format!(
				"log retention resolved to {} entries for job '{}' (rotation/deletion of log files is a Reporter concern, not performed here)",
				log_retention_count, cfg.job_name
			),
		});

		report
	}

	/// `VerifyLocalArchiveBeforeTransfer`: re-run the archive integrity test
	/// immediately before handing staged files to `TransferOrchestrator`, the
	/// same safety check `RetentionEngine` runs before deletion (§4.3, §4.7).
	/// A failed test keeps the staged files on disk and downgrades the job to
	/// `Warnings` rather than shipping a corrupt archive to a remote target.
	async fn verify_before_transfer(
		ctx: &RunContext,
		cfg: &EffectiveJobConfig,
		archiver: &ArchiverDriver,
		archive_path: &std::path::Path,
		report: &mut JobReport,
	) -> bool {
		if !cfg.verify_local_archive_before_transfer || ctx.simulate {
			return true;
		}

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
				ctx.logger.warning(&format!("pre-transfer verification could not resolve archive password: {}", e));
				None
			}
		};

		let test_result = archiver
			.test(archive_path, password.as_deref().map(String::as_str), cfg.verify_archive_checksum_on_test, cfg.treat_seven_zip_warnings_as_success)
			.await;

		let passed = match test_result {
			Ok(outcome) => crate::archiver::classify_outcome(&outcome, cfg.treat_seven_zip_warnings_as_success).is_ok(),
			Err(_) => false,
		};

		if !passed {
			ctx.logger.error(&format!(
				"pre-transfer verification failed for '{}', skipping transfer and keeping local files",
				archive_path.display()
			));
			report.log_entries.push(LogEntry {
				level: "ERROR".to_string(),
				message: format!("pre-transfer archive verification failed for '{}'", archive_path.display()),
			});
			report.downgrade_to(OverallStatus::Warnings);
		}

		passed
	}

	async fn run_local_retention(
		ctx: &RunContext,
		cfg: &EffectiveJobConfig,
		archiver: &ArchiverDriver,
		report: &mut JobReport,
	) {
		if cfg.local_retention_count == 0 {
			return;
		}

		let instances = match InstanceScanner::scan(&cfg.destination_dir, &cfg.base_file_name, &cfg.internal_archive_extension)
		{
			Ok(instances) => instances,
			Err(e) => {
				ctx.logger.warning(&format!("failed to scan existing instances for retention: {}", e));
				report.downgrade_to(OverallStatus::Warnings);
				return;
			}
		};

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
				ctx.logger.warning(&format!("retention could not resolve archive password: {}", e));
				report.downgrade_to(OverallStatus::Warnings);
				None
			}
		};

		match RetentionEngine::run(
			ctx,
			archiver,
			&instances,
			cfg.local_retention_count,
			cfg.delete_to_recycle_bin,
			cfg.test_archive_before_deletion,
			password.as_deref().map(String::as_str),
			cfg.treat_seven_zip_warnings_as_success,
			cfg.retention_confirm_delete,
		)
		.await
		{
			Ok(outcome) => {
				for key in &outcome.safety_halted {
					report.log_entries.push(LogEntry {
						level: "ERROR".to_string(),
						message: format!("retention safety halt kept instance '{}'", key),
					});
				}
				for key in &outcome.skipped {
					report.log_entries.push(LogEntry {
						level: "WARN".to_string(),
						message: format!("retention deletion of instance '{}' declined by operator", key),
					});
				}
			}
			Err(e) => {
				ctx.logger.error(&format!("retention failed: {}", e));
				report.downgrade_to(OverallStatus::Warnings);
			}
		}
	}

	async fn run_remote_retention(
		ctx: &RunContext,
		cfg: &EffectiveJobConfig,
		providers: &[(&str, &dyn TargetProvider)],
		report: &mut JobReport,
	) {
		for target in &cfg.target_instances {
			let Some(retention) = target.def.remote_retention_settings else { continue };
			if retention.keep_count == 0 {
				continue;
			}
			let Some(provider) = providers.iter().find(|(t, _)| *t == target.def.target_type).map(|(_, p)| *p)
			else {
				continue;
			};

			let files = match provider
				.list_remote_instances(&target.def, &cfg.base_file_name, &cfg.job_archive_extension)
				.await
			{
				Ok(files) => files,
				Err(e) => {
					ctx.logger.warning(&format!(
						"failed to list remote instances on target '{}' for retention: {}",
						target.name, e
					));
					report.downgrade_to(OverallStatus::Warnings);
					continue;
				}
			};

			let remote_instances = group_files_into_instances(files, &cfg.base_file_name, &cfg.job_archive_extension);
			let candidates = RetentionEngine::select_candidates(&remote_instances, retention.keep_count);

			for instance in candidates {
				for file in &instance.files {
					if ctx.simulate {
						ctx.logger.simulate(&format!(
							"would delete remote file '{}' on target '{}'",
							file.path.display(),
							target.name
						));
						continue;
					}
					if let Err(e) = provider.delete_remote(file, &target.def).await {
						ctx.logger.warning(&format!(
							"failed to delete remote file '{}' on target '{}': {}",
							file.path.display(),
							target.name,
							e
						));
						report.downgrade_to(OverallStatus::Warnings);
					}
				}
			}
		}
	}

	async fn run_completion_hooks(
		ctx: &RunContext,
		cfg: &EffectiveJobConfig,
		archive_path: &Option<std::path::PathBuf>,
		archive_size_bytes: Option<u64>,
		report: &mut JobReport,
	) {
		let status = report.overall_status.to_string();

		let (point, script) = if matches!(report.overall_status, OverallStatus::Failure | OverallStatus::Skipped) {
			(HookPoint::OnFailure, cfg.post_backup_script_on_failure_path.as_deref())
		} else {
			(HookPoint::OnSuccess, cfg.post_backup_script_on_success_path.as_deref())
		};
		report.hook_scripts.push(
			HookRunner::run(ctx, point, script, &cfg.job_name, &status, archive_path.as_deref(), archive_size_bytes)
				.await,
		);

		report.hook_scripts.push(
			HookRunner::run(
				ctx,
				HookPoint::Always,
				cfg.post_backup_script_always_path.as_deref(),
				&cfg.job_name,
				&status,
				archive_path.as_deref(),
				archive_size_bytes,
			)
			.await,
		);
	}

	/// Post-run action precedence is already folded into each job's
	/// `EffectiveJobConfig.post_run_action` by `ConfigResolver::resolve`
	/// (CLI > Set > Job > GlobalConfig). The Set/CLI/Global levels are
	/// uniform across every job in the run; only `Job.PostRunAction` can
	/// differ per job, so the last job actually attempted is the
	/// representative answer for "what should happen once the run ends"
	/// (§4.9's resolve-only mode: the core never performs the action
	/// either way, it only decides which one wins).
	fn resolve_post_run_action(resolved_configs: &[EffectiveJobConfig]) -> PostRunAction {
		resolved_configs
			.iter()
			.rev()
			.map(|cfg| cfg.post_run_action.clone())
			.find(PostRunAction::is_enabled)
			.unwrap_or(PostRunAction::None)
	}
}

fn cfg_log_retention_cli(cfg: &EffectiveJobConfig) -> Option<u32> {
	// LogRetentionCount has no per-job override slot on EffectiveJobConfig
	// (it only varies at CLI/Set/GlobalConfig granularity, §4.1), so there
	// is nothing job-specific to surface here; kept as a named seam rather
	// than passing `None` inline at the call site.
	let _ = cfg;
	None
}

/// Topologically sort `job_names` by `DependsOnJobs` (Kahn's algorithm), so
/// a caller can hand `JobOrchestrator::run_set` an "already resolved to
/// enabled, in dependency order" list per §9. Ties are broken
/// lexicographically so the order is deterministic across runs. A cycle is
/// a configuration error, not a runtime one.
pub fn topo_sort(job_names: &[String], depends_on: &BTreeMap<String, Vec<String>>) -> Result<Vec<String>, PoshBackupError> {
	let mut in_degree: BTreeMap<&str, usize> = job_names.iter().map(|j| (j.as_str(), 0)).collect();
	let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

	for job in job_names {
		let deps = depends_on.get(job).map(Vec::as_slice).unwrap_or(&[]);
		for dep in deps {
			if !in_degree.contains_key(dep.as_str()) {
				// A dependency outside the requested set is not this
				// sort's concern; the caller decides whether that is an
				// error.
				continue;
			}
			*in_degree.get_mut(job.as_str()).unwrap() += 1;
			dependents.entry(dep.as_str()).or_default().push(job.as_str());
		}
	}

	let mut ready: Vec<&str> = in_degree.iter().filter(|(_, deg)| **deg == 0).map(|(k, _)| *k).collect();
	ready.sort();
	let mut queue: VecDeque<&str> = ready.into();

	let mut order = Vec::new();
	while let Some(job) = queue.pop_front() {
		order.push(job.to_string());
		if let Some(children) = dependents.get(job) {
			let mut newly_ready = Vec::new();
			for &child in children {
				let degree = in_degree.get_mut(child).unwrap();
				*degree -= 1;
				if *degree == 0 {
					newly_ready.push(child);
				}
			}
			newly_ready.sort();
			for child in newly_ready {
				queue.push_back(child);
			}
		}
	}

	if order.len() != job_names.len() {
		return Err(PoshBackupError::config("dependency cycle detected among DependsOnJobs"));
	}

	Ok(order)
}


// vim: ts=4
