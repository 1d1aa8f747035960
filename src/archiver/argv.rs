//! 7-Zip command-line construction (§4.4.1).
//!
//! 7-Zip is sensitive to flag position relative to the archive path, so this
//! builds the argument vector in the exact 14-step order the design calls
//! for rather than appending flags as they're discovered to be needed.

use crate::model::EffectiveJobConfig;
use std::path::{Path, PathBuf};

/// Build the argv for a `7z a` (create) invocation.
pub fn build_create_argv(
	cfg: &EffectiveJobConfig,
	archive_path: &Path,
	source_paths: &[PathBuf],
	password: Option<&str>,
) -> Vec<String> {
	let mut argv = Vec::new();

	// 1. command
	argv.push("a".to_string());

	// 2. archive type, compression level, method, dictionary, word size, solid block size
	argv.push(format!("-t{}", cfg.archive_type.seven_zip_type_flag()));
	argv.push(format!("-mx{}", cfg.compression_level));
	if let Some(method) = &cfg.compression_method {
		argv.push(format!("-m0={}", method));
	}
	if let Some(dict) = &cfg.dictionary_size {
		argv.push(format!("-md{}", dict));
	}
	if let Some(word_size) = cfg.word_size {
		argv.push(format!("-mfb{}", word_size));
	}
	if let Some(solid) = &cfg.solid_block_size {
		argv.push(format!("-ms{}", solid));
	}

	// 3. compress open files
	if cfg.compress_open_files {
		argv.push("-ssw".to_string());
	}

	// 4. thread count
	if let Some(threads) = cfg.threads_setting {
		argv.push(format!("-mmt{}", threads));
	}

	// 5. follow symbolic links
	if !cfg.follow_symbolic_links {
		argv.push("-snl".to_string());
	}

	// 6. temp directory
	if let Some(temp_dir) = &cfg.seven_zip_temp_directory {
		if temp_dir.exists() {
			argv.push(format!("-w\"{}\"", temp_dir.display()));
		}
	}

	// 7. SFX
	if cfg.create_sfx {
		argv.push(cfg.sfx_module.sfx_switch().to_string());
	}

	// 8. split volumes
	if let Some(size) = &cfg.split_volume_size {
		argv.push(format!("-v{}", size));
	}

	// 9. standard exclusions are folded into cfg.additional_exclusions by
	// ConfigResolver (DefaultScriptExcludeRecycleBin / SysVolInfo), so steps
	// 9 and 10 collapse into one pass here.
	// 10. additional exclusions (globals then per-job)
	for exclusion in &cfg.additional_exclusions {
		argv.push(exclusion.clone());
	}

	// 11. include/exclude list files
	if let Some(path) = &cfg.seven_zip_include_list_file {
		if path.exists() {
			argv.push(format!("-i@\"{}\"", path.display()));
		}
	}
	if let Some(path) = &cfg.seven_zip_exclude_list_file {
		if path.exists() {
			argv.push(format!("-x@\"{}\"", path.display()));
		}
	}

	// 12. header encryption + password, before the archive path
	if let Some(password) = password {
		argv.push("-mhe=on".to_string());
		argv.push(format!("-p{}", password));
	}

	// 13. archive target path
	argv.push(archive_path.display().to_string());

	// 14. source paths
	for source in source_paths {
		argv.push(source.display().to_string());
	}

	argv
}

/// Build the argv for a `7z t` (test) invocation.
pub fn build_test_argv(
	archive_path: &Path,
	password: Option<&str>,
	verify_checksum_on_test: bool,
) -> Vec<String> {
	let mut argv = vec!["t".to_string()];
	if verify_checksum_on_test {
		argv.push("-scrc".to_string());
	}
	if let Some(password) = password {
		argv.push(format!("-p{}", password));
	}
	argv.push(archive_path.display().to_string());
	argv
}

/// Build the argv for a `7z l -slt` (technical list) invocation.
pub fn build_list_argv(archive_path: &Path, password: Option<&str>) -> Vec<String> {
	let mut argv = vec!["l".to_string(), "-slt".to_string()];
	if let Some(password) = password {
		argv.push(format!("-p{}", password));
	}
	argv.push(archive_path.display().to_string());
	argv
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::strategies::{ArchivePasswordSource, ArchiveType, ChecksumAlgorithm, PostRunAction, ProcessPriority, SfxModule};

	fn base_config() -> EffectiveJobConfig {
		EffectiveJobConfig {
			job_name: "nightly".to_string(),
			source_paths: vec![PathBuf::from("/data")],
			base_file_name: "nightly".to_string(),
			destination_dir: PathBuf::from("/backups"),
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
			test_archive_after_creation: true,
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
			retry_delay_seconds: 5,
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

	#[test]
	fn password_flags_land_before_archive_path() {
		let cfg = base_config();
		let archive = PathBuf::from("/backups/nightly [2025-Jan-02].7z");
		let argv = build_create_argv(&cfg, &archive, &cfg.source_paths.clone(), Some("hunter2"));
		let password_pos = argv.iter().position(|a| a.starts_with("-p")).unwrap();
		let archive_pos = argv.iter().position(|a| a == &archive.display().to_string()).unwrap();
		assert!(password_pos < archive_pos);
		assert!(argv.contains(&"-mhe=on".to_string()));
	}

	#[test]
	fn no_password_means_no_header_encryption_flag() {
		let cfg = base_config();
		let archive = PathBuf::from("/backups/nightly [2025-Jan-02].7z");
		let argv = build_create_argv(&cfg, &archive, &cfg.source_paths.clone(), None);
		assert!(!argv.iter().any(|a| a.starts_with("-p")));
		assert!(!argv.contains(&"-mhe=on".to_string()));
	}

	#[test]
	fn sfx_switch_precedes_split_volume_flag() {
		let mut cfg = base_config();
		cfg.create_sfx = true;
		cfg.split_volume_size = Some("4g".to_string());
		let archive = PathBuf::from("/backups/nightly [2025-Jan-02].exe");
		let argv = build_create_argv(&cfg, &archive, &cfg.source_paths.clone(), None);
		let sfx_pos = argv.iter().position(|a| a.starts_with("-sfx")).unwrap();
		let split_pos = argv.iter().position(|a| a.starts_with("-v")).unwrap();
		assert!(sfx_pos < split_pos);
	}

	#[test]
	fn test_argv_includes_scrc_only_when_requested() {
		let archive = PathBuf::from("/backups/nightly [2025-Jan-02].7z");
		let with = build_test_argv(&archive, None, true);
		let without = build_test_argv(&archive, None, false);
		assert!(with.contains(&"-scrc".to_string()));
		assert!(!without.contains(&"-scrc".to_string()));
	}
}

// vim: ts=4
