//! End-to-end coverage of layered TOML configuration: `ConfigResolver::load`
//! deep-merging a user overlay over the shipped defaults, then
//! `ConfigResolver::resolve` applying the CLI > Job > Global precedence
//! chain, all through the public crate API rather than any one module's
//! internals.

use posh_backup_core::config::ConfigResolver;
use posh_backup_core::model::CliOverrides;
use std::fs;

#[test]
fn overlay_replaces_scalars_and_merges_nested_tables() {
	let dir = tempfile::tempdir().unwrap();
	let defaults_path = dir.path().join("config.default.toml");
	let overlay_path = dir.path().join("config.user.toml");

	fs::write(
		&defaults_path,
		r#"
enable_vss = false
default_destination_dir = "/backups"

[backup_locations.nightly]
path = ["/data"]
compression_level = 3
"#,
	)
	.unwrap();

	fs::write(
		&overlay_path,
		r#"
[backup_locations.nightly]
compression_level = 9
"#,
	)
	.unwrap();

	let (global, unknown_keys) = ConfigResolver::load(&defaults_path, Some(&overlay_path)).unwrap();
	assert!(unknown_keys.is_empty());
	assert!(!global.enable_vss);
	let job = global.backup_locations.get("nightly").unwrap();
	assert_eq!(job.compression_level, Some(9));
	assert_eq!(job.path, vec![std::path::PathBuf::from("/data")]);
}

#[test]
fn unrecognised_top_level_keys_are_surfaced_not_dropped() {
	let dir = tempfile::tempdir().unwrap();
	let defaults_path = dir.path().join("config.default.toml");
	fs::write(&defaults_path, "some_future_setting = true\n").unwrap();

	let (_global, unknown_keys) = ConfigResolver::load(&defaults_path, None).unwrap();
	assert!(unknown_keys.iter().any(|k| k == "some_future_setting"));
}

#[test]
fn cli_override_wins_over_job_which_wins_over_global_default() {
	let dir = tempfile::tempdir().unwrap();
	let defaults_path = dir.path().join("config.default.toml");
	fs::write(
		&defaults_path,
		r#"
default_destination_dir = "/backups"

[backup_locations.nightly]
path = ["/data"]
local_retention_count = 5
"#,
	)
	.unwrap();

	let (global, _) = ConfigResolver::load(&defaults_path, None).unwrap();
	let resolver = ConfigResolver::new(&global);

	let job_only = resolver.resolve("nightly", &CliOverrides::default(), None).unwrap();
	assert_eq!(job_only.local_retention_count, 5);

	let mut cli = CliOverrides::default();
	cli.local_retention_count = Some(1);
	let with_cli = resolver.resolve("nightly", &cli, None).unwrap();
	assert_eq!(with_cli.local_retention_count, 1);
}

#[test]
fn missing_destination_dir_is_a_resolve_time_config_error() {
	let dir = tempfile::tempdir().unwrap();
	let defaults_path = dir.path().join("config.default.toml");
	fs::write(
		&defaults_path,
		r#"
[backup_locations.nightly]
path = ["/data"]
"#,
	)
	.unwrap();

	let (global, _) = ConfigResolver::load(&defaults_path, None).unwrap();
	let resolver = ConfigResolver::new(&global);
	let errors = resolver.resolve("nightly", &CliOverrides::default(), None).unwrap_err();
	assert!(errors.iter().any(|e| e.to_string().contains("DestinationDir")));
}

// vim: ts=4
