//! Tagged record types for the configuration and run-report data model.
//!
//! These replace the dynamic hashtables the original tool keeps its config
//! and report data in (§9 Design Notes: "Dynamic hashtables → tagged
//! records"). Every field recognised by the core is an explicit struct
//! field; values present in a config file but not recognised here are kept
//! in `extras` so they can be round-tripped and surfaced as warnings rather
//! than silently dropped.

use crate::strategies::{
	ArchivePasswordSource, ArchiveType, ChecksumAlgorithm, OnErrorInJob, OverallStatus,
	PostRunAction, ProcessPriority, SfxModule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Global, read-only-after-load configuration (§3 `GlobalConfig`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
	pub seven_zip_path: Option<PathBuf>,
	pub default_destination_dir: Option<PathBuf>,
	pub default_script_exclude_recycle_bin: bool,
	pub default_script_exclude_sys_vol_info: bool,
	pub default_additional_exclusions: Vec<String>,
	pub enable_vss: bool,
	pub treat_seven_zip_warnings_as_success: bool,
	pub delete_local_archive_after_successful_transfer: bool,
	pub backup_targets: BTreeMap<String, TargetDef>,
	pub backup_locations: BTreeMap<String, JobDef>,
	pub backup_sets: BTreeMap<String, SetDef>,
	pub post_run_action_defaults: Option<PostRunAction>,
	pub maintenance_mode_file_path: Option<PathBuf>,
	pub log_retention_count: Option<u32>,

	/// Unrecognised top-level keys, preserved for forward-compat warnings.
	#[serde(flatten)]
	pub extras: serde_json::Map<String, serde_json::Value>,
}

/// One backup job definition (§3 `JobDef`). Every field is optional here
/// because a job may legitimately omit a key and inherit it from its
/// `SetDef` or `GlobalConfig` — see `config::ConfigResolver`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobDef {
	pub path: Vec<PathBuf>,
	pub name: Option<String>,
	pub destination_dir: Option<PathBuf>,
	pub target_names: Vec<String>,
	pub depends_on_jobs: Vec<String>,
	pub enabled: Option<bool>,
	pub schedule: Option<String>,

	pub archive_type: Option<ArchiveType>,
	pub compression_level: Option<u8>,
	pub compression_method: Option<String>,
	pub dictionary_size: Option<String>,
	pub word_size: Option<u32>,
	pub solid_block_size: Option<String>,
	pub compress_open_files: Option<bool>,
	pub threads_setting: Option<u32>,
	pub follow_symbolic_links: Option<bool>,
	pub seven_zip_temp_directory: Option<PathBuf>,
	pub create_sfx: Option<bool>,
	pub sfx_module: Option<SfxModule>,
	pub split_volume_size: Option<String>,
	pub additional_exclusions: Vec<String>,
	pub seven_zip_include_list_file: Option<PathBuf>,
	pub seven_zip_exclude_list_file: Option<PathBuf>,

	pub archive_password_source: Option<ArchivePasswordSource>,
	/// Inline password value, only meaningful when `archive_password_source`
	/// is `Plain` (§4.10 — "configured inline, with a warning").
	pub archive_password_plain: Option<String>,
	/// Name to look up in the `SecretStore`, only meaningful when
	/// `archive_password_source` is `Secret`.
	pub archive_password_secret_name: Option<String>,
	pub archive_date_format: Option<String>,

	pub enable_vss: Option<bool>,
	pub vss_context_option: Option<String>,
	pub vss_polling_timeout_seconds: Option<u64>,
	pub vss_polling_interval_seconds: Option<u64>,

	pub generate_archive_checksum: Option<bool>,
	pub checksum_algorithm: Option<ChecksumAlgorithm>,
	pub generate_split_archive_manifest: Option<bool>,
	pub generate_contents_manifest: Option<bool>,
	pub test_archive_after_creation: Option<bool>,
	pub verify_archive_checksum_on_test: Option<bool>,
	pub verify_local_archive_before_transfer: Option<bool>,
	pub test_archive_before_deletion: Option<bool>,
	pub pin_on_creation: Option<bool>,

	pub local_retention_count: Option<u32>,
	pub delete_to_recycle_bin: Option<bool>,
	pub retention_confirm_delete: Option<bool>,

	pub minimum_required_free_space_gb: Option<u64>,
	pub exit_on_low_space: Option<bool>,

	pub treat_seven_zip_warnings_as_success: Option<bool>,
	pub seven_zip_cpu_affinity: Option<String>,
	pub seven_zip_process_priority: Option<ProcessPriority>,

	pub max_retry_attempts: Option<u32>,
	pub retry_delay_seconds: Option<u64>,
	pub enable_retries: Option<bool>,

	pub pre_backup_script_path: Option<PathBuf>,
	pub post_local_archive_script_path: Option<PathBuf>,
	pub post_backup_script_on_success_path: Option<PathBuf>,
	pub post_backup_script_on_failure_path: Option<PathBuf>,
	pub post_backup_script_always_path: Option<PathBuf>,

	pub post_run_action: Option<PostRunAction>,

	#[serde(flatten)]
	pub extras: serde_json::Map<String, serde_json::Value>,
}

/// A named, ordered group of jobs (§3 `SetDef`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SetDef {
	pub job_names: Vec<String>,
	pub on_error_in_job: Option<OnErrorInJob>,
	pub post_run_action: Option<PostRunAction>,
	pub log_retention_count: Option<u32>,
}

/// A named remote-target definition (§3 `TargetDef`). The core treats
/// `target_specific_settings` as opaque and hands it to the matching
/// `TargetProvider`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TargetDef {
	pub target_type: String,
	pub target_specific_settings: serde_json::Map<String, serde_json::Value>,
	pub credentials_secret_name: Option<String>,
	pub remote_retention_settings: Option<RemoteRetentionSettings>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemoteRetentionSettings {
	pub keep_count: u32,
}

/// CLI-level overrides, the highest-precedence merge layer (§4.1).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub archive_password_source: Option<ArchivePasswordSource>,
	pub archive_password_plain: Option<String>,
	pub archive_password_secret_name: Option<String>,
	pub local_retention_count: Option<u32>,
	pub post_run_action: Option<PostRunAction>,
	pub log_retention_count: Option<u32>,
	pub simulate: bool,
}

/// A resolved target reference carried on `EffectiveJobConfig`.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
	pub name: String,
	pub def: TargetDef,
}

/// Fully resolved, per-run configuration for exactly one job (§3
/// `EffectiveJobConfig`). Every field downstream code needs is present —
/// nothing falls back to "default if unset" past this point.
#[derive(Debug, Clone)]
pub struct EffectiveJobConfig {
	pub job_name: String,
	pub source_paths: Vec<PathBuf>,
	pub base_file_name: String,
	pub destination_dir: PathBuf,
	pub target_instances: Vec<ResolvedTarget>,
	pub depends_on_jobs: Vec<String>,

	pub archive_type: ArchiveType,
	pub compression_level: u8,
	pub compression_method: Option<String>,
	pub dictionary_size: Option<String>,
	pub word_size: Option<u32>,
	pub solid_block_size: Option<String>,
	pub compress_open_files: bool,
	pub threads_setting: Option<u32>,
	pub follow_symbolic_links: bool,
	pub seven_zip_temp_directory: Option<PathBuf>,
	pub create_sfx: bool,
	pub sfx_module: SfxModule,
	pub split_volume_size: Option<String>,
	pub additional_exclusions: Vec<String>,
	pub seven_zip_include_list_file: Option<PathBuf>,
	pub seven_zip_exclude_list_file: Option<PathBuf>,

	pub archive_password_source: ArchivePasswordSource,
	pub archive_password_plain: Option<String>,
	pub archive_password_secret_name: Option<String>,
	pub archive_date_format: String,

	/// Derived: `CreateSFX ? ".exe" : ArchiveType extension` (§4.1).
	pub job_archive_extension: String,
	/// Derived: always `.7z` when split, even for a `zip` archive type
	/// (§4.1 — 7-Zip requires a real archive type before `.NNN`).
	pub internal_archive_extension: String,

	pub enable_vss: bool,
	pub vss_context_option: String,
	pub vss_polling_timeout_seconds: u64,
	pub vss_polling_interval_seconds: u64,

	pub generate_archive_checksum: bool,
	pub checksum_algorithm: ChecksumAlgorithm,
	pub generate_split_archive_manifest: bool,
	pub generate_contents_manifest: bool,
	pub test_archive_after_creation: bool,
	pub verify_archive_checksum_on_test: bool,
	pub verify_local_archive_before_transfer: bool,
	pub test_archive_before_deletion: bool,
	pub pin_on_creation: bool,

	pub local_retention_count: u32,
	pub delete_to_recycle_bin: bool,
	pub retention_confirm_delete: bool,

	pub minimum_required_free_space_gb: u64,
	pub exit_on_low_space: bool,

	pub treat_seven_zip_warnings_as_success: bool,
	pub seven_zip_cpu_affinity: Option<String>,
	pub seven_zip_process_priority: ProcessPriority,

	pub max_retry_attempts: u32,
	pub retry_delay_seconds: u64,
	pub enable_retries: bool,

	pub pre_backup_script_path: Option<PathBuf>,
	pub post_local_archive_script_path: Option<PathBuf>,
	pub post_backup_script_on_success_path: Option<PathBuf>,
	pub post_backup_script_on_failure_path: Option<PathBuf>,
	pub post_backup_script_always_path: Option<PathBuf>,

	pub post_run_action: PostRunAction,
	pub delete_local_archive_after_successful_transfer: bool,

	pub simulate: bool,
}

/// One file belonging to a `BackupInstance`: the primary archive, a split
/// volume part, or a recognised sidecar (§3 `FileRef`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
	pub path: PathBuf,
	pub size_bytes: u64,
	pub creation_time: std::time::SystemTime,
}

/// A logical backup snapshot grouped by `InstanceScanner` (§3
/// `BackupInstance`).
#[derive(Debug, Clone)]
pub struct BackupInstance {
	/// `<BaseFileName> [<DateStamp>]<InternalExtension>`, e.g.
	/// `hello [2025-Jan-02].7z`.
	pub instance_key: String,
	pub files: Vec<FileRef>,
	pub sort_time: std::time::SystemTime,
	pub pinned: bool,
}

/// Handle to an active VSS snapshot session (§3 `VssSession`).
#[derive(Debug, Clone, Default)]
pub struct VssSession {
	pub original_to_shadow_path: BTreeMap<PathBuf, PathBuf>,
	pub shadow_ids: Vec<String>,
}

impl VssSession {
	pub fn is_empty(&self) -> bool {
		self.shadow_ids.is_empty()
	}
}

/// Outcome of a `TargetProvider` kind (success, or a classified failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
	Success,
	Failure(String),
}

/// Result of transferring one file to one target (§3 `TransferResult`).
#[derive(Debug, Clone)]
pub struct TransferResult {
	pub target_name: String,
	pub target_type: String,
	pub status: TransferStatus,
	pub remote_path: Option<String>,
	pub transfer_size: u64,
	pub transfer_duration: Duration,
	pub error_message: Option<String>,
}

/// A recorded hook-script invocation, kept on the `JobReport` for the
/// caller's benefit (§4.11).
#[derive(Debug, Clone)]
pub struct HookInvocation {
	pub script_path: PathBuf,
	pub point: String,
	pub exit_code: Option<i32>,
	pub ran: bool,
}

/// A single structured log line captured for this job's report, distinct
/// from whatever the `Logger` also streamed live.
#[derive(Debug, Clone)]
pub struct LogEntry {
	pub level: String,
	pub message: String,
}

/// Accumulated outcome of running one job (§3 `JobReport`).
#[derive(Debug, Clone)]
pub struct JobReport {
	pub job_name: String,
	pub overall_status: OverallStatus,
	pub seven_zip_exit_code: Option<i32>,
	pub archive_size_bytes: Option<u64>,
	pub compression_time: Option<Duration>,
	pub target_transfers: Vec<TransferResult>,
	pub log_entries: Vec<LogEntry>,
	pub hook_scripts: Vec<HookInvocation>,
	pub archive_path: Option<PathBuf>,
}

impl JobReport {
	pub fn new(job_name: impl Into<String>) -> Self {
		JobReport {
			job_name: job_name.into(),
			overall_status: OverallStatus::Success,
			seven_zip_exit_code: None,
			archive_size_bytes: None,
			compression_time: None,
			target_transfers: Vec::new(),
			log_entries: Vec::new(),
			hook_scripts: Vec::new(),
			archive_path: None,
		}
	}

	/// Fold a step outcome into the running worst-of status (§4.7).
	pub fn downgrade_to(&mut self, status: OverallStatus) {
		self.overall_status = self.overall_status.worst_of(status);
	}
}


// vim: ts=4
