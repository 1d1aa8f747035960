//! The `Logger` trait and its default `tracing`-backed implementation.
//!
//! The execution core never writes to stdout/stderr directly. Every
//! component holds a `Arc<dyn Logger>` (via `RunContext`, see `context.rs`)
//! and calls one of the level methods below. A caller that wants coloured
//! console output, a GUI log pane, or silence can swap in its own `Logger`
//! without the core depending on any of those concerns.

use std::sync::Arc;

/// Severity/category of a single log line.
///
/// `Success`, `Simulate`, `Heading` and `Advice` are not standard `tracing`
/// levels; they are carried as structured fields on an `INFO`-level event so
/// a `Logger` implementation that only understands five levels can still
/// make a reasonable choice, while one that wants the full distinction (a
/// themed console reporter) can match on `LogLevel` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Error,
	Warning,
	Info,
	Success,
	Debug,
	/// Emitted instead of performing an action when running with `--simulate`.
	Simulate,
	/// Section banner, e.g. "Starting job 'Documents'".
	Heading,
	/// Non-fatal operator guidance, e.g. "consider enabling TestArchiveBeforeDeletion".
	Advice,
}

impl LogLevel {
	fn as_tag(self) -> &'static str {
		match self {
			LogLevel::Error => "ERROR",
			LogLevel::Warning => "WARNING",
			LogLevel::Info => "INFO",
			LogLevel::Success => "SUCCESS",
			LogLevel::Debug => "DEBUG",
			LogLevel::Simulate => "SIMULATE",
			LogLevel::Heading => "HEADING",
			LogLevel::Advice => "ADVICE",
		}
	}
}

/// Sink for structured log output. Implementations must be cheap to clone
/// (wrap in `Arc`) and safe to call from any `tokio` task.
pub trait Logger: Send + Sync {
	fn log(&self, level: LogLevel, message: &str);

	fn error(&self, message: &str) {
		self.log(LogLevel::Error, message);
	}
	fn warning(&self, message: &str) {
		self.log(LogLevel::Warning, message);
	}
	fn info(&self, message: &str) {
		self.log(LogLevel::Info, message);
	}
	fn success(&self, message: &str) {
		self.log(LogLevel::Success, message);
	}
	fn debug(&self, message: &str) {
		self.log(LogLevel::Debug, message);
	}
	fn simulate(&self, message: &str) {
		self.log(LogLevel::Simulate, message);
	}
	fn heading(&self, message: &str) {
		self.log(LogLevel::Heading, message);
	}
	fn advice(&self, message: &str) {
		self.log(LogLevel::Advice, message);
	}
}

/// Default `Logger` that forwards every level to `tracing`, tagging the
/// non-standard levels (`Success`, `Simulate`, `Heading`, `Advice`) as a
/// structured `posh_level` field on an `INFO` event so subscribers can still
/// filter or reformat on it.
pub struct TracingLogger;

impl Logger for TracingLogger {
	fn log(&self, level: LogLevel, message: &str) {
		match level {
			LogLevel::Error => tracing::error!(message),
			LogLevel::Warning => tracing::warn!(message),
			LogLevel::Debug => tracing::debug!(message),
			LogLevel::Info
			| LogLevel::Success
			| LogLevel::Simulate
			| LogLevel::Heading
			| LogLevel::Advice => {
				tracing::info!(posh_level = level.as_tag(), message)
			}
		}
	}
}

/// Build an `Arc<dyn Logger>` wrapping the default `tracing`-backed logger.
pub fn default_logger() -> Arc<dyn Logger> {
	Arc::new(TracingLogger)
}

/// Initialize the global `tracing` subscriber with environment filter support.
///
/// ```bash
/// RUST_LOG=debug posh-backup run --config ./config.toml
/// RUST_LOG=posh_backup_core::archiver=trace posh-backup run --config ./config.toml
/// ```
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	struct RecordingLogger {
		lines: Mutex<Vec<(LogLevel, String)>>,
	}

	impl Logger for RecordingLogger {
		fn log(&self, level: LogLevel, message: &str) {
			self.lines.lock().unwrap().push((level, message.to_string()));
		}
	}

	#[test]
	fn default_methods_forward_to_log() {
		let logger = RecordingLogger { lines: Mutex::new(Vec::new()) };
		logger.success("archive verified");
		logger.advice("enable TestArchiveBeforeDeletion");
		let lines = logger.lines.lock().unwrap();
		assert_eq!(lines[0], (LogLevel::Success, "archive verified".to_string()));
		assert_eq!(lines[1], (LogLevel::Advice, "enable TestArchiveBeforeDeletion".to_string()));
	}
}

// vim: ts=4
