//! `PasswordBroker` (C10): resolve an archive password from the source the
//! job names, in precedence order, without ever logging it.

use crate::context::RunContext;
use crate::error::PoshBackupError;
use crate::strategies::ArchivePasswordSource;
use crate::utils::terminal::TerminalGuard;
use std::io::BufRead;
use zeroize::Zeroizing;

pub struct PasswordBroker;

impl PasswordBroker {
	/// Resolve the password for `source`, given an inline plaintext value
	/// (only meaningful for `Plain`) and a secret name (only meaningful for
	/// `Secret`). Returns `None` for `ArchivePasswordSource::None`.
	///
	/// Resolution order when more than one source could apply: Interactive
	/// → Secret → Plain (§4.10); in practice `source` already names exactly
	/// one, so this simply dispatches on it and fails the job if resolution
	/// is impossible.
	pub async fn resolve(
		ctx: &RunContext,
		source: ArchivePasswordSource,
		plain_value: Option<&str>,
		secret_name: Option<&str>,
	) -> Result<Option<Zeroizing<String>>, PoshBackupError> {
		match source {
			ArchivePasswordSource::None => Ok(None),
			ArchivePasswordSource::Interactive => {
				let password = prompt_interactive()?;
				Ok(Some(password))
			}
			ArchivePasswordSource::Secret => {
				let name = secret_name.ok_or_else(|| {
					PoshBackupError::config("ArchivePasswordSource is Secret but no secret name was given")
				})?;
				match ctx.secret_store.get(name).await {
					Some(value) => Ok(Some(Zeroizing::new(value))),
					None => Err(PoshBackupError::config(format!("secret '{}' was not found", name))),
				}
			}
			ArchivePasswordSource::Plain => {
				ctx.logger.warning("ArchivePasswordSource is Plain: password is stored unencrypted in configuration");
				let value = plain_value.ok_or_else(|| {
					PoshBackupError::config("ArchivePasswordSource is Plain but no password value was given")
				})?;
				Ok(Some(Zeroizing::new(value.to_string())))
			}
		}
	}
}

fn prompt_interactive() -> Result<Zeroizing<String>, PoshBackupError> {
	eprint!("Archive password: ");
	let _guard = TerminalGuard::new();
	let stdin = std::io::stdin();
	let mut line = String::new();
	stdin
		.lock()
		.read_line(&mut line)
		.map_err(|e| PoshBackupError::env(format!("failed to read password: {}", e)))?;
	eprintln!();
	while line.ends_with('\n') || line.ends_with('\r') {
		line.pop();
	}
	Ok(Zeroizing::new(line))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn none_source_resolves_to_no_password() {
		let ctx = RunContext::new(false);
		let result = PasswordBroker::resolve(&ctx, ArchivePasswordSource::None, None, None).await.unwrap();
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn plain_source_without_value_is_config_error() {
		let ctx = RunContext::new(false);
		let result = PasswordBroker::resolve(&ctx, ArchivePasswordSource::Plain, None, None).await;
		assert!(matches!(result, Err(PoshBackupError::Config { .. })));
	}

	#[tokio::test]
	async fn plain_source_with_value_resolves() {
		let ctx = RunContext::new(false);
		let result =
			PasswordBroker::resolve(&ctx, ArchivePasswordSource::Plain, Some("hunter2"), None).await.unwrap();
		assert_eq!(result.as_deref(), Some("hunter2"));
	}

	#[tokio::test]
	async fn secret_source_missing_secret_is_config_error() {
		let ctx = RunContext::new(false);
		let result =
			PasswordBroker::resolve(&ctx, ArchivePasswordSource::Secret, None, Some("nonexistent-xyz")).await;
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn secret_source_found_via_env_secret_store() {
		std::env::set_var("POSH_BACKUP_SECRET_DB", "s3cr3t");
		let ctx = RunContext::new(false);
		let result = PasswordBroker::resolve(&ctx, ArchivePasswordSource::Secret, None, Some("db")).await.unwrap();
		assert_eq!(result.as_deref(), Some("s3cr3t"));
		std::env::remove_var("POSH_BACKUP_SECRET_DB");
	}
}

// vim: ts=4
