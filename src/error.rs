//! Error types for the backup execution core

use std::error::Error;
use std::fmt;
use std::io;

/// Helper to reduce `Box::new()` boilerplate when wrapping nested errors.
#[inline]
pub fn boxed_error<E: Error + Send + Sync + 'static>(e: E) -> Box<dyn Error + Send + Sync> {
	Box::new(e)
}

/// Unified error type for the execution core.
///
/// Variants map directly to the error kinds named in the design: a
/// `ConfigError` stops the affected job before it starts, an `EnvError`
/// surfaces as a job `FAILURE`, `ArchiverWarning`/`ArchiverError` come from
/// 7-Zip's exit code, `Transfer` is per-target/per-file and never aborts
/// the job, `RetentionSafetyHalt` keeps a candidate instead of propagating,
/// `HookNonZero` is recorded but never changes job status, and `Cancelled`
/// is kept distinct from a generic failure so reports can say why a job
/// stopped.
#[derive(Debug)]
pub enum PoshBackupError {
	/// Missing required setting, unknown target reference, malformed value.
	Config { message: String },

	/// 7-Zip missing, insufficient privileges for VSS, Recycle Bin facility
	/// unavailable.
	Env { message: String },

	/// 7-Zip exited with code 1 (warnings, e.g. files in use).
	ArchiverWarning { exit_code: i32, message: String },

	/// 7-Zip exited with code >= 2, or failed to spawn (exit_code == -999).
	ArchiverError { exit_code: i32, message: String },

	/// A single file failed to transfer to a single target.
	Transfer { target_name: String, message: String },

	/// Test-before-delete failed; the candidate instance was kept.
	RetentionSafetyHalt { instance_key: String, message: String },

	/// A hook script exited non-zero; recorded, does not change job status.
	HookNonZero { script: String, exit_code: i32 },

	/// The run was cancelled.
	Cancelled,

	/// I/O error with no more specific classification.
	Io(io::Error),

	/// Catch-all, carries a message produced elsewhere.
	Other { message: String },
}

impl fmt::Display for PoshBackupError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PoshBackupError::Config { message } => write!(f, "configuration error: {}", message),
			PoshBackupError::Env { message } => write!(f, "environment error: {}", message),
			PoshBackupError::ArchiverWarning { exit_code, message } => {
				write!(f, "7-Zip warning (exit {}): {}", exit_code, message)
			}
			PoshBackupError::ArchiverError { exit_code, message } => {
				write!(f, "7-Zip error (exit {}): {}", exit_code, message)
			}
			PoshBackupError::Transfer { target_name, message } => {
				write!(f, "transfer to '{}' failed: {}", target_name, message)
			}
			PoshBackupError::RetentionSafetyHalt { instance_key, message } => {
				write!(f, "retention safety halt for '{}': {}", instance_key, message)
			}
			PoshBackupError::HookNonZero { script, exit_code } => {
				write!(f, "hook '{}' exited with code {}", script, exit_code)
			}
			PoshBackupError::Cancelled => write!(f, "operation cancelled"),
			PoshBackupError::Io(e) => write!(f, "I/O error: {}", e),
			PoshBackupError::Other { message } => write!(f, "{}", message),
		}
	}
}

impl Error for PoshBackupError {}

impl From<io::Error> for PoshBackupError {
	fn from(e: io::Error) -> Self {
		PoshBackupError::Io(e)
	}
}

impl From<String> for PoshBackupError {
	fn from(e: String) -> Self {
		PoshBackupError::Other { message: e }
	}
}

impl PoshBackupError {
	pub fn config<S: Into<String>>(message: S) -> Self {
		PoshBackupError::Config { message: message.into() }
	}

	pub fn env<S: Into<String>>(message: S) -> Self {
		PoshBackupError::Env { message: message.into() }
	}

	/// True for error kinds that must stop the affected job outright
	/// (as opposed to being recorded and absorbed, e.g. `Transfer`,
	/// `HookNonZero`, `RetentionSafetyHalt`).
	pub fn is_fatal_to_job(&self) -> bool {
		matches!(
			self,
			PoshBackupError::Config { .. }
				| PoshBackupError::Env { .. }
				| PoshBackupError::ArchiverError { .. }
				| PoshBackupError::Cancelled
		)
	}
}

// vim: ts=4
