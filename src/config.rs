#![allow(dead_code)]

//! `ConfigResolver` (C1): load layered configuration and compute an
//! `EffectiveJobConfig` for exactly one job.
//!
//! Merge order, latest wins: `GlobalConfig` defaults → `JobDef` → `SetDef`
//! (only the keys it is allowed to override: `PostRunAction`,
//! `LogRetentionCount`) → `CliOverrides`. Merging is scalar-replace;
//! arrays are replaced, never concatenated. An unset (`None`) value is
//! distinguished from an explicit empty/zero value — only *set* values
//! override (P1).

use crate::error::PoshBackupError;
use crate::model::{
	CliOverrides, EffectiveJobConfig, GlobalConfig, JobDef, ResolvedTarget, SetDef,
};
use crate::strategies::{ArchivePasswordSource, ArchiveType, ChecksumAlgorithm, PostRunAction, ProcessPriority, SfxModule};
use crate::validation;
use std::path::PathBuf;

/// Resolves layered configuration into per-job effective configuration.
pub struct ConfigResolver<'a> {
	global: &'a GlobalConfig,
}

impl<'a> ConfigResolver<'a> {
	pub fn new(global: &'a GlobalConfig) -> Self {
		ConfigResolver { global }
	}

	/// Load defaults + an optional user overlay from TOML, deep-merging the
	/// overlay over the defaults (maps merge key-by-key, scalars/arrays are
	/// replaced wholesale). Unknown keys in either file land in `extras` and
	/// are returned alongside so the caller can log a WARNING per key.
	pub fn load(
		defaults_path: &std::path::Path,
		overlay_path: Option<&std::path::Path>,
	) -> Result<(GlobalConfig, Vec<String>), PoshBackupError> {
		let defaults_text = std::fs::read_to_string(defaults_path)?;
		let mut value: toml::Value = toml::from_str(&defaults_text)
			.map_err(|e| PoshBackupError::config(format!("parsing {}: {}", defaults_path.display(), e)))?;

		if let Some(overlay_path) = overlay_path {
			let overlay_text = std::fs::read_to_string(overlay_path)?;
			let overlay: toml::Value = toml::from_str(&overlay_text)
				.map_err(|e| PoshBackupError::config(format!("parsing {}: {}", overlay_path.display(), e)))?;
			deep_merge_toml(&mut value, overlay);
		}

		let global: GlobalConfig = value
			.try_into()
			.map_err(|e| PoshBackupError::config(format!("decoding merged config: {}", e)))?;

		let unknown_keys = global.extras.keys().cloned().collect();
		Ok((global, unknown_keys))
	}

	/// Resolve the effective configuration for `job_name`, optionally as a
	/// member of `set_name`. Accumulates every validation problem rather
	/// than stopping at the first (§4.1 ambient addition).
	pub fn resolve(
		&self,
		job_name: &str,
		cli: &CliOverrides,
		set_name: Option<&str>,
	) -> Result<EffectiveJobConfig, Vec<PoshBackupError>> {
		let mut errors = Vec::new();

		let job = match self.global.backup_locations.get(job_name) {
			Some(job) => job,
			None => {
				errors.push(PoshBackupError::config(format!("unknown job '{}'", job_name)));
				return Err(errors);
			}
		};

		let set = match set_name {
			Some(name) => match self.global.backup_sets.get(name) {
				Some(set) => Some(set),
				None => {
					errors.push(PoshBackupError::config(format!("unknown set '{}'", name)));
					None
				}
			},
			None => None,
		};

		let base_file_name = job.name.clone().unwrap_or_else(|| job_name.to_string());
		if let Err(e) = validation::validate_base_filename(&base_file_name) {
			errors.push(PoshBackupError::config(e.to_string()));
		}

		let destination_dir = job
			.destination_dir
			.clone()
			.or_else(|| self.global.default_destination_dir.clone());
		let destination_dir = match destination_dir {
			Some(dir) => dir,
			None => {
				errors.push(PoshBackupError::config(format!(
					"job '{}' has no DestinationDir and GlobalConfig.DefaultDestinationDir is unset",
					job_name
				)));
				PathBuf::new()
			}
		};

		if job.path.is_empty() {
			errors.push(PoshBackupError::config(format!("job '{}' has an empty Path list", job_name)));
		}

		let mut target_instances = Vec::new();
		for name in &job.target_names {
			match self.global.backup_targets.get(name) {
				Some(def) => target_instances.push(ResolvedTarget { name: name.clone(), def: def.clone() }),
				None => errors.push(PoshBackupError::config(format!(
					"job '{}' references unknown target '{}'",
					job_name, name
				))),
			}
		}

		let archive_type = job.archive_type.unwrap_or_default();
		let create_sfx = job.create_sfx.unwrap_or(false);
		let sfx_module = job.sfx_module.unwrap_or_default();
		let split_volume_size = job.split_volume_size.clone().filter(|s| !s.is_empty());

		if let Some(size) = &split_volume_size {
			if !is_valid_split_size(size) {
				errors.push(PoshBackupError::config(format!(
					"job '{}' has invalid SplitVolumeSize '{}' (expected e.g. '4g', '700m', '100k')",
					job_name, size
				)));
			}
		}

		let job_archive_extension =
			if create_sfx { ".exe".to_string() } else { archive_type.extension().to_string() };
		let internal_archive_extension =
			if split_volume_size.is_some() { ".7z".to_string() } else { job_archive_extension.clone() };

		let compression_level = job.compression_level.unwrap_or(5);
		if let Err(e) = validation::validate_compression_level(compression_level) {
			errors.push(PoshBackupError::config(e.to_string()));
		}

		let checksum_algorithm = job.checksum_algorithm.unwrap_or_default();

		let max_retry_attempts = job.max_retry_attempts.unwrap_or(1);
		if let Err(e) = validation::validate_retry_count(max_retry_attempts) {
			errors.push(PoshBackupError::config(e.to_string()));
		}

		let local_retention_count = cli
			.local_retention_count
			.or(job.local_retention_count)
			.unwrap_or(0);

		// PostRunAction: CLI > Set > Job > GlobalConfig.PostRunActionDefaults (§4.9).
		let post_run_action = cli
			.post_run_action
			.clone()
			.or_else(|| set.and_then(|s| s.post_run_action.clone()))
			.or_else(|| job.post_run_action.clone())
			.or_else(|| self.global.post_run_action_defaults.clone())
			.unwrap_or(PostRunAction::None);

		let archive_password_source = cli
			.archive_password_source
			.or(job.archive_password_source)
			.unwrap_or_default();
		let archive_password_plain =
			cli.archive_password_plain.clone().or_else(|| job.archive_password_plain.clone());
		let archive_password_secret_name =
			cli.archive_password_secret_name.clone().or_else(|| job.archive_password_secret_name.clone());

		let enable_vss = job.enable_vss.unwrap_or(self.global.enable_vss);

		let treat_seven_zip_warnings_as_success = job
			.treat_seven_zip_warnings_as_success
			.unwrap_or(self.global.treat_seven_zip_warnings_as_success);

		let delete_local_archive_after_successful_transfer =
			self.global.delete_local_archive_after_successful_transfer;

		let mut additional_exclusions = self.global.default_additional_exclusions.clone();
		additional_exclusions.extend(job.additional_exclusions.clone());
		if self.global.default_script_exclude_recycle_bin {
			additional_exclusions.push("-x!$RECYCLE.BIN".to_string());
		}
		if self.global.default_script_exclude_sys_vol_info {
			additional_exclusions.push("-x!System Volume Information".to_string());
		}

		if !errors.is_empty() {
			return Err(errors);
		}

		Ok(EffectiveJobConfig {
			job_name: job_name.to_string(),
			source_paths: job.path.clone(),
			base_file_name,
			destination_dir,
			target_instances,
			depends_on_jobs: job.depends_on_jobs.clone(),

			archive_type,
			compression_level,
			compression_method: job.compression_method.clone(),
			dictionary_size: job.dictionary_size.clone(),
			word_size: job.word_size,
			solid_block_size: job.solid_block_size.clone(),
			compress_open_files: job.compress_open_files.unwrap_or(false),
			threads_setting: job.threads_setting,
			follow_symbolic_links: job.follow_symbolic_links.unwrap_or(true),
			seven_zip_temp_directory: job.seven_zip_temp_directory.clone(),
			create_sfx,
			sfx_module,
			split_volume_size,
			additional_exclusions,
			seven_zip_include_list_file: job.seven_zip_include_list_file.clone(),
			seven_zip_exclude_list_file: job.seven_zip_exclude_list_file.clone(),

			archive_password_source,
			archive_password_plain,
			archive_password_secret_name,
			archive_date_format: job.archive_date_format.clone().unwrap_or_else(|| "%Y-%b-%d".to_string()),

			job_archive_extension,
			internal_archive_extension,

			enable_vss,
			vss_context_option: job.vss_context_option.clone().unwrap_or_else(|| "Persistent".to_string()),
			vss_polling_timeout_seconds: job.vss_polling_timeout_seconds.unwrap_or(60),
			vss_polling_interval_seconds: job.vss_polling_interval_seconds.unwrap_or(2),

			generate_archive_checksum: job.generate_archive_checksum.unwrap_or(false),
			checksum_algorithm,
			generate_split_archive_manifest: job.generate_split_archive_manifest.unwrap_or(false),
			generate_contents_manifest: job.generate_contents_manifest.unwrap_or(false),
			test_archive_after_creation: job.test_archive_after_creation.unwrap_or(true),
			verify_archive_checksum_on_test: job.verify_archive_checksum_on_test.unwrap_or(false),
			verify_local_archive_before_transfer: job.verify_local_archive_before_transfer.unwrap_or(false),
			test_archive_before_deletion: job.test_archive_before_deletion.unwrap_or(false),
			pin_on_creation: job.pin_on_creation.unwrap_or(false),

			local_retention_count,
			delete_to_recycle_bin: job.delete_to_recycle_bin.unwrap_or(true),
			retention_confirm_delete: job.retention_confirm_delete.unwrap_or(false),

			minimum_required_free_space_gb: job.minimum_required_free_space_gb.unwrap_or(0),
			exit_on_low_space: job.exit_on_low_space.unwrap_or(false),

			treat_seven_zip_warnings_as_success,
			seven_zip_cpu_affinity: job.seven_zip_cpu_affinity.clone(),
			seven_zip_process_priority: job.seven_zip_process_priority.unwrap_or(ProcessPriority::Normal),

			max_retry_attempts,
			retry_delay_seconds: job.retry_delay_seconds.unwrap_or(5),
			enable_retries: job.enable_retries.unwrap_or(max_retry_attempts > 1),

			pre_backup_script_path: job.pre_backup_script_path.clone(),
			post_local_archive_script_path: job.post_local_archive_script_path.clone(),
			post_backup_script_on_success_path: job.post_backup_script_on_success_path.clone(),
			post_backup_script_on_failure_path: job.post_backup_script_on_failure_path.clone(),
			post_backup_script_always_path: job.post_backup_script_always_path.clone(),

			post_run_action,
			delete_local_archive_after_successful_transfer,

			simulate: cli.simulate,
		})
	}

	/// Resolve `LogRetentionCount` per the CLI > Set > already-merged-default
	/// precedence noted as an open question in §9 (CLI if given, else Set if
	/// the key is present, else the value already carried by `GlobalConfig`).
	pub fn resolve_log_retention_count(
		&self,
		cli_value: Option<u32>,
		set_name: Option<&str>,
	) -> u32 {
		if let Some(v) = cli_value {
			return v;
		}
		if let Some(set_name) = set_name {
			if let Some(set) = self.global.backup_sets.get(set_name) {
				if let Some(v) = set.log_retention_count {
					return v;
				}
			}
		}
		self.global.log_retention_count.unwrap_or(10)
	}
}

fn is_valid_split_size(s: &str) -> bool {
	let bytes = s.as_bytes();
	if bytes.is_empty() {
		return false;
	}
	let (digits, unit) = bytes.split_at(bytes.len() - 1);
	!digits.is_empty()
		&& digits.iter().all(u8::is_ascii_digit)
		&& matches!(unit[0], b'k' | b'K' | b'm' | b'M' | b'g' | b'G')
}

/// Deep-merge `overlay` into `base` in place: tables merge key-by-key,
/// everything else (including arrays) is replaced wholesale (§4.1).
fn deep_merge_toml(base: &mut toml::Value, overlay: toml::Value) {
	match (base, overlay) {
		(toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
			for (key, overlay_value) in overlay_table {
				match base_table.get_mut(&key) {
					Some(base_value) => deep_merge_toml(base_value, overlay_value),
					None => {
						base_table.insert(key, overlay_value);
					}
				}
			}
		}
		(base_slot, overlay_value) => {
			*base_slot = overlay_value;
		}
	}
}


// vim: ts=4
