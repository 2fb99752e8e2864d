use anyhow::Result;

use podium::config::Config;
use podium::models::{Category, RunStatus};
use podium::scheduler::CategoryOutcome;

use super::{build_scheduler, open_store};

pub fn run(config: &Config, categories: &[Category], triggered_by: &str, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let scheduler = build_scheduler(config, store, categories)?;

    let report = scheduler.run(triggered_by);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Leaderboard Snapshot Run");
        println!("========================");
        println!("  Run ID:       {}", report.run_id);
        println!("  Triggered by: {}", report.triggered_by);
        println!("  Status:       {}", report.status);
        println!(
            "  Written:      {}/{}",
            report.snapshots_written(),
            report.outcomes.len()
        );
        println!();
        for outcome in &report.outcomes {
            match outcome {
                CategoryOutcome::Persisted { category, entries } => {
                    println!("  ✓ {:<24} {entries} ranked", category.id());
                }
                CategoryOutcome::Failed(failure) => {
                    println!(
                        "  ✗ {:<24} {:?}: {}",
                        failure.category.id(),
                        failure.stage,
                        failure.error
                    );
                }
            }
        }
    }

    if report.status == RunStatus::Failed {
        anyhow::bail!("snapshot run failed for every category");
    }
    Ok(())
}
