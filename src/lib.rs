//! # posh-backup-core
//!
//! Execution core for an operator-driven backup engine: resolves layered
//! job configuration, drives 7-Zip archive creation (optionally over a VSS
//! snapshot), verifies and checksums the result, fans the archive out to
//! zero or more remote targets in parallel, and applies local/remote
//! retention. The core never touches a terminal or a config file format
//! directly outside `ConfigResolver::load` — everything else is reached
//! through `RunContext`'s `Logger`/`Reporter`/`SecretStore` collaborators so
//! a caller (CLI, GUI, test harness) can substitute its own.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use posh_backup_core::context::RunContext;
//! use posh_backup_core::config::ConfigResolver;
//! use posh_backup_core::orchestrator::{topo_sort, JobOrchestrator};
//! use posh_backup_core::archiver::ArchiverDriver;
//! use posh_backup_core::model::CliOverrides;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (global, _unknown_keys) =
//!         ConfigResolver::load(std::path::Path::new("config.default.toml"), None)?;
//!     let ctx = RunContext::new(false);
//!     let archiver = ArchiverDriver::new(PathBuf::from("7z"));
//!     let jobs = topo_sort(&["nightly".to_string()], &Default::default())?;
//!     let outcome = JobOrchestrator::run_set(
//!         &ctx, &global, &jobs, &CliOverrides::default(), None, &archiver, &[],
//!     )
//!     .await;
//!     println!("{}", outcome.overall_status);
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(dead_code)]

pub mod archiver;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod instance_scanner;
pub mod interfaces;
pub mod logging;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod password;
pub mod pipeline;
pub mod retention;
pub mod strategies; // Consolidated strategy/mode enums - declared early to avoid circular deps
pub mod transfer;
pub mod utils;
pub mod validation;
pub mod vss;

// Re-export commonly used types and functions
pub use archiver::ArchiverDriver;
pub use config::ConfigResolver;
pub use context::RunContext;
pub use error::PoshBackupError;
pub use instance_scanner::InstanceScanner;
pub use logging::{default_logger, LogLevel, Logger};
pub use model::{CliOverrides, EffectiveJobConfig, GlobalConfig, JobReport};
pub use orchestrator::{topo_sort, JobOrchestrator, SetOutcome};
pub use strategies::{ArchiveType, OverallStatus, PostRunAction};
pub use transfer::target::TargetProvider;

// vim: ts=4
