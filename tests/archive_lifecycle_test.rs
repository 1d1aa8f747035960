//! Exercises `LocalArchivePipeline` against a stand-in `7z` binary (a small
//! shell script) rather than the real 7-Zip executable, which a sandboxed
//! test run cannot assume is installed. The stand-in only has to honour the
//! handful of exit-code and archive-path conventions the pipeline depends
//! on; it never actually compresses anything.

use chrono::{Local, TimeZone};
use posh_backup_core::archiver::ArchiverDriver;
use posh_backup_core::context::RunContext;
use posh_backup_core::model::EffectiveJobConfig;
use posh_backup_core::strategies::{
	ArchivePasswordSource, ArchiveType, ChecksumAlgorithm, OverallStatus, PostRunAction, ProcessPriority, SfxModule,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable shell script standing in for `7z`: on `a` (create)
/// it writes a placeholder file at whichever positional argument doesn't
/// already exist on disk (the archive target); on `t`/`l` it just exits with
/// `exit_code`.
fn write_fake_seven_zip(dir: &Path, exit_code: i32) -> PathBuf {
	let script_path = dir.join("fake-7z.sh");
	let script = format!(
		r#"#!/bin/sh
cmd="$1"
shift
if [ "$cmd" = "a" ]; then
	for arg in "$@"; do
		case "$arg" in
			-*) ;;
			*)
				if [ ! -e "$arg" ]; then
					echo "stand-in archive contents" > "$arg"
				fi
				;;
		esac
	done
fi
exit {exit_code}
"#
	);
	std::fs::write(&script_path, script).unwrap();
	let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
	perms.set_mode(0o755);
	std::fs::set_permissions(&script_path, perms).unwrap();
	script_path
}

fn base_cfg(dest: PathBuf, source: PathBuf) -> EffectiveJobConfig {
	EffectiveJobConfig {
		job_name: "nightly".to_string(),
		source_paths: vec![source],
		base_file_name: "nightly".to_string(),
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
		generate_archive_checksum: true,
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
async fn successful_create_yields_archive_and_checksum_sidecar() {
	let source_dir = tempfile::tempdir().unwrap();
	let dest_dir = tempfile::tempdir().unwrap();
	let tool_dir = tempfile::tempdir().unwrap();
	std::fs::write(source_dir.path().join("a.txt"), b"hello").unwrap();

	let cfg = base_cfg(dest_dir.path().to_path_buf(), source_dir.path().to_path_buf());
	let ctx = RunContext::new(false);
	let archiver = ArchiverDriver::new(write_fake_seven_zip(tool_dir.path(), 0));
	let when = Local.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();

	let outcome = posh_backup_core::pipeline::LocalArchivePipeline::run(&ctx, &cfg, &archiver, when).await;

	assert_eq!(outcome.status, OverallStatus::Success);
	let archive_path = outcome.archive_path.expect("archive path set on success");
	assert_eq!(archive_path.file_name().unwrap().to_str().unwrap(), "nightly [2025-Jun-12].7z");
	assert!(archive_path.exists());
	assert!(outcome.staged_files.iter().any(|p| p.extension().and_then(|e| e.to_str()) == Some("sha256")));
	assert_eq!(outcome.seven_zip_exit_code, Some(0));
}

#[tokio::test]
async fn exit_code_one_without_warnings_flag_downgrades_to_warnings() {
	let source_dir = tempfile::tempdir().unwrap();
	let dest_dir = tempfile::tempdir().unwrap();
	let tool_dir = tempfile::tempdir().unwrap();
	std::fs::write(source_dir.path().join("a.txt"), b"hello").unwrap();

	let mut cfg = base_cfg(dest_dir.path().to_path_buf(), source_dir.path().to_path_buf());
	cfg.generate_archive_checksum = false;
	cfg.test_archive_after_creation = false;
	let ctx = RunContext::new(false);
	let archiver = ArchiverDriver::new(write_fake_seven_zip(tool_dir.path(), 1));
	let when = Local.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();

	let outcome = posh_backup_core::pipeline::LocalArchivePipeline::run(&ctx, &cfg, &archiver, when).await;

	assert_eq!(outcome.status, OverallStatus::Warnings);
	assert!(outcome.archive_path.unwrap().exists());
}

#[tokio::test]
async fn exit_code_one_with_warnings_as_success_is_clean_success() {
	let source_dir = tempfile::tempdir().unwrap();
	let dest_dir = tempfile::tempdir().unwrap();
	let tool_dir = tempfile::tempdir().unwrap();
	std::fs::write(source_dir.path().join("a.txt"), b"hello").unwrap();

	let mut cfg = base_cfg(dest_dir.path().to_path_buf(), source_dir.path().to_path_buf());
	cfg.generate_archive_checksum = false;
	cfg.test_archive_after_creation = false;
	cfg.treat_seven_zip_warnings_as_success = true;
	let ctx = RunContext::new(false);
	let archiver = ArchiverDriver::new(write_fake_seven_zip(tool_dir.path(), 1));
	let when = Local.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();

	let outcome = posh_backup_core::pipeline::LocalArchivePipeline::run(&ctx, &cfg, &archiver, when).await;

	assert_eq!(outcome.status, OverallStatus::Success);
}

#[tokio::test]
async fn exit_code_two_is_a_failure_with_no_staged_files() {
	let source_dir = tempfile::tempdir().unwrap();
	let dest_dir = tempfile::tempdir().unwrap();
	let tool_dir = tempfile::tempdir().unwrap();
	std::fs::write(source_dir.path().join("a.txt"), b"hello").unwrap();

	let cfg = base_cfg(dest_dir.path().to_path_buf(), source_dir.path().to_path_buf());
	let ctx = RunContext::new(false);
	let archiver = ArchiverDriver::new(write_fake_seven_zip(tool_dir.path(), 2));
	let when = Local.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();

	let outcome = posh_backup_core::pipeline::LocalArchivePipeline::run(&ctx, &cfg, &archiver, when).await;

	assert_eq!(outcome.status, OverallStatus::Failure);
	assert!(outcome.staged_files.is_empty());
	assert!(outcome.error.is_some());
}

// vim: ts=4
