//! Enums shared across configuration, the archiver, and job orchestration.
//!
//! Each enum follows the same shape: a `FromStr` for config/CLI parsing, a
//! `Display` for logging and file naming, and `serde` for config file I/O.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// ARCHIVE TYPE
// ============================================================================

/// 7-Zip archive format selected for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
	#[default]
	SevenZip,
	Zip,
}

impl ArchiveType {
	/// The 7-Zip `-t` switch value for this format.
	pub fn seven_zip_type_flag(self) -> &'static str {
		match self {
			ArchiveType::SevenZip => "7z",
			ArchiveType::Zip => "zip",
		}
	}

	/// The filename extension used when not an SFX archive.
	pub fn extension(self) -> &'static str {
		match self {
			ArchiveType::SevenZip => ".7z",
			ArchiveType::Zip => ".zip",
		}
	}
}

impl FromStr for ArchiveType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"7z" | "sevenzip" => Ok(Self::SevenZip),
			"zip" => Ok(Self::Zip),
			_ => Err(format!("Unknown archive type: {}. Valid options: 7z, zip", s)),
		}
	}
}

impl std::fmt::Display for ArchiveType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.seven_zip_type_flag())
	}
}

// ============================================================================
// SFX MODULE
// ============================================================================

/// Self-extracting-archive stub module, selects which `-sfx` switch 7-Zip gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum SfxModule {
	#[default]
	Console,
	Gui,
	Installer,
}

impl SfxModule {
	/// The 7-Zip switch for this SFX module.
	pub fn sfx_switch(self) -> &'static str {
		match self {
			SfxModule::Console => "-sfx",
			SfxModule::Gui => "-sfx7zS.sfx",
			SfxModule::Installer => "-sfx7zSD.sfx",
		}
	}
}

impl FromStr for SfxModule {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"console" => Ok(Self::Console),
			"gui" => Ok(Self::Gui),
			"installer" => Ok(Self::Installer),
			_ => Err(format!(
				"Unknown SFX module: {}. Valid options: Console, GUI, Installer",
				s
			)),
		}
	}
}

impl std::fmt::Display for SfxModule {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SfxModule::Console => write!(f, "Console"),
			SfxModule::Gui => write!(f, "GUI"),
			SfxModule::Installer => write!(f, "Installer"),
		}
	}
}

// ============================================================================
// PROCESS PRIORITY
// ============================================================================

/// 7-Zip subprocess OS priority class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ProcessPriority {
	Idle,
	BelowNormal,
	#[default]
	Normal,
	AboveNormal,
	High,
}

impl FromStr for ProcessPriority {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().replace(['-', '_'], "").as_str() {
			"idle" => Ok(Self::Idle),
			"belownormal" => Ok(Self::BelowNormal),
			"normal" => Ok(Self::Normal),
			"abovenormal" => Ok(Self::AboveNormal),
			"high" => Ok(Self::High),
			_ => Ok(Self::Normal),
		}
	}
}

impl std::fmt::Display for ProcessPriority {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ProcessPriority::Idle => write!(f, "Idle"),
			ProcessPriority::BelowNormal => write!(f, "BelowNormal"),
			ProcessPriority::Normal => write!(f, "Normal"),
			ProcessPriority::AboveNormal => write!(f, "AboveNormal"),
			ProcessPriority::High => write!(f, "High"),
		}
	}
}

// ============================================================================
// CHECKSUM ALGORITHM
// ============================================================================

/// Hash algorithm used for archive checksums and split-volume manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChecksumAlgorithm {
	Md5,
	Sha1,
	#[default]
	Sha256,
	Sha384,
	Sha512,
}

impl ChecksumAlgorithm {
	/// Sidecar file extension / manifest suffix for this algorithm.
	pub fn extension(self) -> &'static str {
		match self {
			ChecksumAlgorithm::Md5 => "md5",
			ChecksumAlgorithm::Sha1 => "sha1",
			ChecksumAlgorithm::Sha256 => "sha256",
			ChecksumAlgorithm::Sha384 => "sha384",
			ChecksumAlgorithm::Sha512 => "sha512",
		}
	}
}

impl FromStr for ChecksumAlgorithm {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"MD5" => Ok(Self::Md5),
			"SHA1" => Ok(Self::Sha1),
			"SHA256" => Ok(Self::Sha256),
			"SHA384" => Ok(Self::Sha384),
			"SHA512" => Ok(Self::Sha512),
			_ => Err(format!(
				"Unknown checksum algorithm: {}. Valid options: MD5, SHA1, SHA256, SHA384, SHA512",
				s
			)),
		}
	}
}

impl std::fmt::Display for ChecksumAlgorithm {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.extension().to_uppercase())
	}
}

// ============================================================================
// ARCHIVE PASSWORD SOURCE
// ============================================================================

/// Where the archive password is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ArchivePasswordSource {
	#[default]
	None,
	Plain,
	Secret,
	Interactive,
}

impl FromStr for ArchivePasswordSource {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"none" => Ok(Self::None),
			"plain" | "plaintext" => Ok(Self::Plain),
			"secret" | "secretstore" => Ok(Self::Secret),
			"interactive" => Ok(Self::Interactive),
			_ => Err(format!(
				"Unknown password source: {}. Valid options: None, Plain, Secret, Interactive",
				s
			)),
		}
	}
}

impl std::fmt::Display for ArchivePasswordSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArchivePasswordSource::None => write!(f, "None"),
			ArchivePasswordSource::Plain => write!(f, "Plain"),
			ArchivePasswordSource::Secret => write!(f, "Secret"),
			ArchivePasswordSource::Interactive => write!(f, "Interactive"),
		}
	}
}

// ============================================================================
// SET ERROR POLICY
// ============================================================================

/// How a `BackupSet` reacts to a job failing mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum OnErrorInJob {
	#[default]
	StopSet,
	ContinueSet,
}

impl FromStr for OnErrorInJob {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().replace(['-', '_'], "").as_str() {
			"stopset" => Ok(Self::StopSet),
			"continueset" => Ok(Self::ContinueSet),
			_ => Err(format!(
				"Unknown error policy: {}. Valid options: StopSet, ContinueSet",
				s
			)),
		}
	}
}

impl std::fmt::Display for OnErrorInJob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OnErrorInJob::StopSet => write!(f, "StopSet"),
			OnErrorInJob::ContinueSet => write!(f, "ContinueSet"),
		}
	}
}

// ============================================================================
// OVERALL STATUS
// ============================================================================

/// Terminal status of a job or a set, ordered worst-to-best for aggregation.
/// `Skipped` is the archiver declining to produce an archive at all (7-Zip
/// exit `-1000`, or a retention deletion the operator declined to confirm)
/// — distinct from `Failure` because nothing actually went wrong, and worse
/// than `Warnings` because nothing was produced either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
	Failure,
	Skipped,
	Warnings,
	SimulatedComplete,
	Success,
}

impl OverallStatus {
	/// Fold another step's status into this one, keeping the worse of the two.
	/// `Failure` beats `Skipped` beats `Warnings` beats either success variant.
	pub fn worst_of(self, other: Self) -> Self {
		use OverallStatus::*;
		fn rank(s: OverallStatus) -> u8 {
			match s {
				Failure => 0,
				Skipped => 1,
				Warnings => 2,
				SimulatedComplete => 3,
				Success => 3,
			}
		}
		if rank(self) <= rank(other) {
			self
		} else {
			other
		}
	}
}

impl std::fmt::Display for OverallStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OverallStatus::Success => write!(f, "SUCCESS"),
			OverallStatus::Warnings => write!(f, "WARNINGS"),
			OverallStatus::Failure => write!(f, "FAILURE"),
			OverallStatus::Skipped => write!(f, "SKIPPED"),
			OverallStatus::SimulatedComplete => write!(f, "SIMULATED_COMPLETE"),
		}
	}
}

// ============================================================================
// POST-RUN ACTION
// ============================================================================

/// System-state change applied after the run. The core only resolves which
/// action wins (§4.9); performing it is an external collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum PostRunAction {
	#[default]
	None,
	Shutdown,
	Restart,
	Sleep,
	Lock,
	Hibernate,
	LogOff,
}

impl PostRunAction {
	pub fn is_enabled(&self) -> bool {
		!matches!(self, PostRunAction::None)
	}
}

impl FromStr for PostRunAction {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"none" => Ok(Self::None),
			"shutdown" => Ok(Self::Shutdown),
			"restart" => Ok(Self::Restart),
			"sleep" => Ok(Self::Sleep),
			"lock" => Ok(Self::Lock),
			"hibernate" => Ok(Self::Hibernate),
			"logoff" | "log-off" => Ok(Self::LogOff),
			_ => Err(format!(
				"Unknown post-run action: {}. Valid options: None, Shutdown, Restart, Sleep, Lock, Hibernate, LogOff",
				s
			)),
		}
	}
}

impl std::fmt::Display for PostRunAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn archive_type_extension() {
		assert_eq!(ArchiveType::SevenZip.extension(), ".7z");
		assert_eq!(ArchiveType::Zip.extension(), ".zip");
	}

	#[test]
	fn sfx_module_from_str() {
		assert_eq!(SfxModule::from_str("gui").unwrap(), SfxModule::Gui);
		assert!(SfxModule::from_str("bogus").is_err());
	}

	#[test]
	fn checksum_algorithm_round_trip() {
		for alg in [
			ChecksumAlgorithm::Md5,
			ChecksumAlgorithm::Sha1,
			ChecksumAlgorithm::Sha256,
			ChecksumAlgorithm::Sha384,
			ChecksumAlgorithm::Sha512,
		] {
			let s = alg.extension();
			assert_eq!(ChecksumAlgorithm::from_str(s).unwrap(), alg);
		}
	}

	#[test]
	fn overall_status_worst_of() {
		assert_eq!(OverallStatus::Success.worst_of(OverallStatus::Warnings), OverallStatus::Warnings);
		assert_eq!(OverallStatus::Warnings.worst_of(OverallStatus::Failure), OverallStatus::Failure);
		assert_eq!(OverallStatus::Failure.worst_of(OverallStatus::Success), OverallStatus::Failure);
	}

	#[test]
	fn skipped_ranks_between_failure_and_warnings() {
		assert_eq!(OverallStatus::Warnings.worst_of(OverallStatus::Skipped), OverallStatus::Skipped);
		assert_eq!(OverallStatus::Skipped.worst_of(OverallStatus::Failure), OverallStatus::Failure);
		assert_eq!(OverallStatus::Skipped.worst_of(OverallStatus::Success), OverallStatus::Skipped);
	}

	#[test]
	fn post_run_action_enabled() {
		assert!(!PostRunAction::None.is_enabled());
		assert!(PostRunAction::Shutdown.is_enabled());
	}

	#[test]
	fn on_error_in_job_from_str() {
		assert_eq!(OnErrorInJob::from_str("stop-set").unwrap(), OnErrorInJob::StopSet);
		assert_eq!(OnErrorInJob::from_str("ContinueSet").unwrap(), OnErrorInJob::ContinueSet);
	}
}

// vim: ts=4
