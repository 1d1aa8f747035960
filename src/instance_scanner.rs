//! `InstanceScanner` (C2): group archive files and their sidecars into
//! logical `BackupInstance`s by date-stamped filename key (§4.2).

use crate::model::{BackupInstance, FileRef};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

pub struct InstanceScanner;

impl InstanceScanner {
	/// Scan `dir` for files matching `<base_file_name>*` and group them into
	/// logical instances keyed by `<base_file_name> [<yyyy-MMM-dd>]<extension>`.
	///
	/// Files that match the base glob but not the date-stamped key pattern
	/// are ignored (§4.2 edge case). A missing `.001` first volume does not
	/// cause instance loss — the scan groups whatever files exist and the
	/// caller is expected to log a warning when a split set looks
	/// incomplete.
	pub fn scan(
		dir: &Path,
		base_file_name: &str,
		extension: &str,
	) -> std::io::Result<BTreeMap<String, BackupInstance>> {
		let glob_pattern = format!("{}/{}*", dir.display(), glob_escape(base_file_name));

		let mut files = Vec::new();
		for entry in glob::glob(&glob_pattern).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))? {
			let path = match entry {
				Ok(path) => path,
				Err(_) => continue,
			};
			if !path.is_file() {
				continue;
			}
			let metadata = std::fs::metadata(&path)?;
			let creation_time = metadata.created().or_else(|_| metadata.modified())?;
			files.push(FileRef { path, size_bytes: metadata.len(), creation_time });
		}

		Ok(group_files_into_instances(files, base_file_name, extension))
	}
}

/// Group already-known files into instances by their date-stamped key
/// (§4.2), the same rule `scan` applies to a freshly-globbed directory
/// listing. `JobOrchestrator` reuses this for remote retention, where the
/// file list comes from a `TargetProvider::list_remote_instances` call
/// instead of a local directory scan.
pub fn group_files_into_instances(
	files: Vec<FileRef>,
	base_file_name: &str,
	extension: &str,
) -> BTreeMap<String, BackupInstance> {
	let key_regex = build_instance_key_regex(base_file_name, extension);
	let mut instances: BTreeMap<String, BackupInstance> = BTreeMap::new();

	for file in files {
		let file_name = match file.path.file_name().and_then(|n| n.to_str()) {
			Some(name) => name.to_string(),
			None => continue,
		};
		let Some(captures) = key_regex.find(&file_name) else {
			continue;
		};
		let instance_key = captures.as_str().to_string();
		let creation_time = file.creation_time;

		let instance = instances.entry(instance_key.clone()).or_insert_with(|| BackupInstance {
			instance_key: instance_key.clone(),
			files: Vec::new(),
			sort_time: creation_time,
			pinned: false,
		});

		if file_name.ends_with(".pinned") {
			instance.pinned = true;
			continue;
		}

		if creation_time < instance.sort_time {
			instance.sort_time = creation_time;
		}
		instance.files.push(file);
	}

	instances
}

/// Build the regex `^<esc(base)> \[\d{4}-\w{3}-\d{2}\]<esc(ext)>` (§4.2,
/// §6 "Archive filename format").
fn build_instance_key_regex(base_file_name: &str, extension: &str) -> Regex {
	let pattern = format!(
		"^{} \\[\\d{{4}}-\\w{{3}}-\\d{{2}}\\]{}",
		regex::escape(base_file_name),
		regex::escape(extension)
	);
	Regex::new(&pattern).expect("instance key pattern is always a valid regex")
}

fn glob_escape(base_file_name: &str) -> String {
	base_file_name.chars().flat_map(|c| {
		if matches!(c, '*' | '?' | '[' | ']') {
			vec!['[', c, ']']
		} else {
			vec![c]
		}
	}).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use filetime::{set_file_mtime, FileTime};
	use std::io::Write;

	fn touch(path: &Path, contents: &[u8], mtime_offset_secs: i64) {
		std::fs::File::create(path).unwrap().write_all(contents).unwrap();
		let time = FileTime::from_unix_time(1_700_000_000 + mtime_offset_secs, 0);
		set_file_mtime(path, time).unwrap();
	}

	#[test]
	fn groups_primary_sidecars_and_pin_marker() {
		let dir = tempfile::tempdir().unwrap();
		let base = "MyJob [2025-Jun-12].7z";
		touch(&dir.path().join(base), b"data", 0);
		touch(&dir.path().join(format!("{}.sha256", base)), b"hash", 1);
		touch(&dir.path().join(format!("{}.pinned", base)), b"", 2);

		let instances = InstanceScanner::scan(dir.path(), "MyJob", ".7z").unwrap();
		assert_eq!(instances.len(), 1);
		let instance = instances.get(base).unwrap();
		assert!(instance.pinned);
		assert_eq!(instance.files.len(), 2);
		assert!(!instance.files.iter().any(|f| f.path.to_string_lossy().ends_with(".pinned")));
	}

	#[test]
	fn split_volumes_group_under_the_same_key() {
		let dir = tempfile::tempdir().unwrap();
		let base = "Nightly [2025-Jan-02].7z";
		touch(&dir.path().join(format!("{}.001", base)), b"a", 0);
		touch(&dir.path().join(format!("{}.002", base)), b"b", 1);

		let instances = InstanceScanner::scan(dir.path(), "Nightly", ".7z").unwrap();
		assert_eq!(instances.len(), 1);
		assert_eq!(instances.get(base).unwrap().files.len(), 2);
	}

	#[test]
	fn non_date_stamped_matches_are_ignored() {
		let dir = tempfile::tempdir().unwrap();
		touch(&dir.path().join("Nightly-latest.7z"), b"x", 0);

		let instances = InstanceScanner::scan(dir.path(), "Nightly", ".7z").unwrap();
		assert!(instances.is_empty());
	}

	#[test]
	fn missing_first_volume_does_not_lose_the_instance() {
		let dir = tempfile::tempdir().unwrap();
		let base = "Nightly [2025-Jan-02].7z";
		touch(&dir.path().join(format!("{}.002", base)), b"b", 0);

		let instances = InstanceScanner::scan(dir.path(), "Nightly", ".7z").unwrap();
		assert_eq!(instances.len(), 1);
	}
}

// vim: ts=4
