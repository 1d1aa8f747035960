//! External collaborator contracts the core consumes (§6) but does not
//! implement beyond minimal usable defaults — report rendering, OS
//! scheduler registration, and real secret-store backends are out of scope
//! (§1 Non-goals).

use crate::model::JobReport;
use async_trait::async_trait;

/// Receives a finished `JobReport`. The core does not know or care about
/// output formats; a real implementation renders HTML/JSON/TXT/CSV.
#[async_trait]
pub trait Reporter: Send + Sync {
	async fn emit(&self, report: &JobReport);
}

/// Looks up a named secret, used only by `PasswordBroker` when a job's
/// `ArchivePasswordSource` is `Secret`.
#[async_trait]
pub trait SecretStore: Send + Sync {
	async fn get(&self, name: &str) -> Option<String>;
}

/// Registers/unregisters an OS-level scheduled task. Named for
/// completeness per §6; the core never calls it directly — it belongs to
/// a "manage schedules" entry point outside the execution core.
pub trait Scheduler: Send + Sync {
	fn register(&self, task_name: &str, spec: &str) -> Result<(), String>;
	fn unregister(&self, task_name: &str) -> Result<(), String>;
}

/// `Reporter` that discards every report. Default when no real reporter is
/// wired up (e.g. library consumers driving the core directly).
pub struct NullReporter;

#[async_trait]
impl Reporter for NullReporter {
	async fn emit(&self, _report: &JobReport) {}
}

/// `SecretStore` backed by `POSH_BACKUP_SECRET_<NAME>` environment
/// variables, uppercased with non-alphanumeric characters replaced by `_`.
/// A minimal usable default; a real secret-store backend is out of scope.
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
	async fn get(&self, name: &str) -> Option<String> {
		let env_name: String = name
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
			.collect();
		std::env::var(format!("POSH_BACKUP_SECRET_{}", env_name)).ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn env_secret_store_reads_normalized_variable_name() {
		std::env::set_var("POSH_BACKUP_SECRET_DB_PASSWORD", "hunter2");
		let store = EnvSecretStore;
		assert_eq!(store.get("db-password").await, Some("hunter2".to_string()));
		std::env::remove_var("POSH_BACKUP_SECRET_DB_PASSWORD");
	}

	#[tokio::test]
	async fn env_secret_store_missing_variable_is_none() {
		let store = EnvSecretStore;
		assert_eq!(store.get("nonexistent-secret-xyz").await, None);
	}

	#[tokio::test]
	async fn null_reporter_accepts_any_report() {
		let reporter = NullReporter;
		reporter.emit(&JobReport::new("job")).await;
	}
}

// vim: ts=4
