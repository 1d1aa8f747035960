use clap::{Parser, Subcommand};
use posh_backup_core::archiver::ArchiverDriver;
use posh_backup_core::config::ConfigResolver;
use posh_backup_core::context::RunContext;
use posh_backup_core::logging::init_tracing;
use posh_backup_core::model::CliOverrides;
use posh_backup_core::orchestrator::{topo_sort, JobOrchestrator};
use posh_backup_core::strategies::{ArchivePasswordSource, PostRunAction};
use posh_backup_core::transfer::providers::local::LocalTargetProvider;
use posh_backup_core::transfer::target::TargetProvider;
use posh_backup_core::utils::lock::FileLock;
use std::path::PathBuf;
use std::process::ExitCode;

mod util;

use util::print_set_summary;

#[derive(Parser)]
#[command(name = "posh-backup", version, author, about = "7-Zip-driven backup engine with VSS, retention and remote transfer")]
struct Cli {
	/// Path to the default configuration file.
	#[arg(long, default_value = "config.default.toml", global = true)]
	config: PathBuf,

	/// Path to a user configuration overlay, merged over `--config`.
	#[arg(long, global = true)]
	user_config: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Run one or more backup jobs, or a named backup set.
	Run {
		/// Job names to run. Ignored when `--set` is given.
		jobs: Vec<String>,

		/// Run every job in this named set instead of the `jobs` positionals.
		#[arg(long)]
		set: Option<String>,

		/// Resolve and print the effective configuration, touching nothing.
		#[arg(long)]
		simulate: bool,

		#[arg(long, value_enum)]
		archive_password_source: Option<CliPasswordSource>,
		#[arg(long)]
		archive_password_plain: Option<String>,
		#[arg(long)]
		archive_password_secret_name: Option<String>,
		#[arg(long)]
		local_retention_count: Option<u32>,
		#[arg(long)]
		post_run_action: Option<String>,
		#[arg(long)]
		log_retention_count: Option<u32>,
	},
	/// Load and validate configuration without running anything.
	TestConfig,
	/// List the job and set names known to the loaded configuration.
	ListJobs,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliPasswordSource {
	None,
	Plain,
	Secret,
	Interactive,
}

impl From<CliPasswordSource> for ArchivePasswordSource {
	fn from(v: CliPasswordSource) -> Self {
		match v {
			CliPasswordSource::None => ArchivePasswordSource::None,
			CliPasswordSource::Plain => ArchivePasswordSource::Plain,
			CliPasswordSource::Secret => ArchivePasswordSource::Secret,
			CliPasswordSource::Interactive => ArchivePasswordSource::Interactive,
		}
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	init_tracing();
	let cli = Cli::parse();

	match run(cli).await {
		Ok(code) => code,
		Err(e) => {
			tracing::error!("{}", e);
			ExitCode::from(3)
		}
	}
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
	let (global, unknown_keys) =
		ConfigResolver::load(&cli.config, cli.user_config.as_deref())?;
	for key in &unknown_keys {
		tracing::warn!("unrecognised configuration key '{}', ignoring", key);
	}

	match cli.command {
		Commands::TestConfig => {
			tracing::info!(
				"configuration loaded: {} job(s), {} target(s), {} set(s)",
				global.backup_locations.len(),
				global.backup_targets.len(),
				global.backup_sets.len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Commands::ListJobs => {
			for name in global.backup_locations.keys() {
				println!("job: {}", name);
			}
			for name in global.backup_sets.keys() {
				println!("set: {}", name);
			}
			Ok(ExitCode::SUCCESS)
		}
		Commands::Run {
			jobs,
			set,
			simulate,
			archive_password_source,
			archive_password_plain,
			archive_password_secret_name,
			local_retention_count,
			post_run_action,
			log_retention_count,
		} => {
			let job_names = match &set {
				Some(set_name) => match global.backup_sets.get(set_name) {
					Some(set_def) => set_def.job_names.clone(),
					None => {
						tracing::error!("unknown backup set '{}'", set_name);
						return Ok(ExitCode::from(3));
					}
				},
				None => jobs,
			};
			if job_names.is_empty() {
				tracing::error!("no job names given and no --set selected");
				return Ok(ExitCode::from(3));
			}

			// §4.9: the orchestrator receives an already "enabled, in
			// dependency order" list; filter out Enabled=false jobs here,
			// the way a scheduler invocation over a set would.
			let job_names: Vec<String> = job_names
				.into_iter()
				.filter(|name| match global.backup_locations.get(name) {
					Some(job) if job.enabled == Some(false) => {
						tracing::info!("skipping disabled job '{}'", name);
						false
					}
					_ => true,
				})
				.collect();
			if job_names.is_empty() {
				tracing::error!("no enabled jobs to run");
				return Ok(ExitCode::from(3));
			}

			let depends_on = global
				.backup_locations
				.iter()
				.map(|(name, job)| (name.clone(), job.depends_on_jobs.clone()))
				.collect();
			let ordered_jobs = topo_sort(&job_names, &depends_on)?;

			let post_run_action = match post_run_action {
				Some(raw) => Some(raw.parse::<PostRunAction>().map_err(posh_backup_core::error::PoshBackupError::config)?),
				None => None,
			};
			let cli_overrides = CliOverrides {
				archive_password_source: archive_password_source.map(Into::into),
				archive_password_plain,
				archive_password_secret_name,
				local_retention_count,
				post_run_action,
				log_retention_count,
				simulate,
			};

			let ctx = RunContext::new(simulate);

			let seven_zip_path = global.seven_zip_path.clone().unwrap_or_else(|| PathBuf::from("7z"));
			let archiver = ArchiverDriver::new(seven_zip_path);

			let local = LocalTargetProvider;
			let providers: Vec<(&str, &dyn TargetProvider)> = vec![("local", &local)];

			let lock_dir = global.default_destination_dir.clone().unwrap_or_else(std::env::temp_dir);
			std::fs::create_dir_all(&lock_dir)?;
			let _lock = FileLock::acquire(&lock_dir)?;

			let outcome = JobOrchestrator::run_set(
				&ctx,
				&global,
				&ordered_jobs,
				&cli_overrides,
				set.as_deref(),
				&archiver,
				&providers,
			)
			.await;

			print_set_summary(&outcome);

			Ok(exit_code_for(&outcome))
		}
	}
}

fn exit_code_for(outcome: &posh_backup_core::orchestrator::SetOutcome) -> ExitCode {
	use posh_backup_core::strategies::OverallStatus;
	match outcome.overall_status {
		OverallStatus::Success | OverallStatus::SimulatedComplete => ExitCode::SUCCESS,
		OverallStatus::Warnings => ExitCode::from(1),
		OverallStatus::Failure | OverallStatus::Skipped => ExitCode::from(2),
	}
}

// vim: ts=4
