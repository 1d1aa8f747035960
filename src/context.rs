//! `RunContext`: the explicit, passed-down replacement for the source
//! tool's process-wide logger/report globals (§9 Design Notes).

use crate::interfaces::{EnvSecretStore, NullReporter, Reporter, SecretStore};
use crate::logging::{default_logger, Logger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Carries everything a job needs that would otherwise be a global: the
/// logger, the collaborator trait objects, and the cancellation token every
/// suspension point observes (§5 "Suspension points").
#[derive(Clone)]
pub struct RunContext {
	pub logger: Arc<dyn Logger>,
	pub reporter: Arc<dyn Reporter>,
	pub secret_store: Arc<dyn SecretStore>,
	pub cancellation: CancellationToken,
	pub simulate: bool,
}

impl RunContext {
	pub fn new(simulate: bool) -> Self {
		RunContext {
			logger: default_logger(),
			reporter: Arc::new(NullReporter),
			secret_store: Arc::new(EnvSecretStore),
			cancellation: CancellationToken::new(),
			simulate,
		}
	}

	pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
		self.logger = logger;
		self
	}

	pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
		self.reporter = reporter;
		self
	}

	pub fn with_secret_store(mut self, secret_store: Arc<dyn SecretStore>) -> Self {
		self.secret_store = secret_store;
		self
	}

	/// A child context sharing the same collaborators but its own
	/// cancellation child token, so cancelling one job's subtree never
	/// cancels siblings already dispatched.
	pub fn child(&self) -> Self {
		RunContext {
			logger: self.logger.clone(),
			reporter: self.reporter.clone(),
			secret_store: self.secret_store.clone(),
			cancellation: self.cancellation.child_token(),
			simulate: self.simulate,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancellation.is_cancelled()
	}
}

impl Default for RunContext {
	fn default() -> Self {
		RunContext::new(false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn child_context_cancellation_is_independent_of_siblings() {
		let root = RunContext::new(false);
		let child_a = root.child();
		let child_b = root.child();
		child_a.cancellation.cancel();
		assert!(child_a.is_cancelled());
		assert!(!child_b.is_cancelled());
		assert!(!root.is_cancelled());
	}

	#[test]
	fn cancelling_root_propagates_to_children() {
		let root = RunContext::new(false);
		let child = root.child();
		root.cancellation.cancel();
		assert!(child.is_cancelled());
	}
}

// vim: ts=4
