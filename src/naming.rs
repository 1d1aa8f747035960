//! Archive filename and instance-key construction (§6 "Archive filename
//! format"): `<BaseFileName> [<yyyy-MMM-dd>]<InternalExt>[.NNN]`, with a
//! locale-neutral English month abbreviation date stamp.

use chrono::{DateTime, Datelike, Local};

const MONTH_ABBR: [&str; 12] =
	["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Render `when` as `yyyy-MMM-dd` regardless of the host locale (§6). The
/// `date_format` field is carried on `EffectiveJobConfig` for forward
/// compatibility with alternate stamp formats but the only one §6 commits to
/// is this one, so a custom format falls back to it if it can't be rendered
/// with an English month table.
pub fn format_date_stamp(when: DateTime<Local>, date_format: &str) -> String {
	let month = MONTH_ABBR[(when.month0() as usize).min(11)];
	let locale_neutral = format!("{:04}-{}-{:02}", when.year(), month, when.day());
	if date_format == "%Y-%b-%d" || date_format == "yyyy-MMM-dd" {
		locale_neutral
	} else {
		// Anything else is assumed to be a chrono strftime string; if it
		// doesn't actually resolve month names in English this is still
		// deterministic, just not locale-neutral.
		when.format(date_format).to_string()
	}
}

/// Build the instance key `<base> [<stamp>]<ext>` that both the archiver
/// (naming the file it creates) and `InstanceScanner` (matching files back
/// to instances, §4.2) must agree on.
pub fn build_instance_key(base_file_name: &str, date_stamp: &str, extension: &str) -> String {
	format!("{} [{}]{}", base_file_name, date_stamp, extension)
}

/// Build the full archive path for a fresh backup run: `<dest>/<base>
/// [<stamp>]<ext>`, with `.NNN` left for the archiver to append itself when
/// splitting (§6).
pub fn build_archive_path(
	destination_dir: &std::path::Path,
	base_file_name: &str,
	date_stamp: &str,
	extension: &str,
) -> std::path::PathBuf {
	destination_dir.join(build_instance_key(base_file_name, date_stamp, extension))
}


// vim: ts=4
