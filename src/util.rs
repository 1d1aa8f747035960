//! CLI-only helpers, not part of the library surface.

use posh_backup_core::orchestrator::SetOutcome;

/// Print a short per-job summary line plus the aggregate status, the way an
/// operator watching a scheduled run would want to see it scroll by.
pub fn print_set_summary(outcome: &SetOutcome) {
	for report in &outcome.job_reports {
		println!("{}: {}", report.job_name, report.overall_status);
		for transfer in &report.target_transfers {
			println!("  -> {} ({}): {:?}", transfer.target_name, transfer.target_type, transfer.status);
		}
	}
	if outcome.stopped_early {
		println!("set stopped early due to StopSet policy");
	}
	println!("overall: {}", outcome.overall_status);
	if outcome.post_run_action.is_enabled() {
		println!("post-run action requested: {}", outcome.post_run_action);
	}
}

// vim: ts=4
