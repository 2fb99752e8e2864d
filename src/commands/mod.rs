pub mod activity;
pub mod digest;
pub mod query;
pub mod run;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};

use podium::config::Config;
use podium::models::Category;
use podium::ranking::{RankingComputer, SqliteActivitySource};
use podium::scheduler::SnapshotScheduler;
use podium::storage::{create_sqlite_store, SharedSnapshotStore};

// Re-export command functions for convenience
pub use activity::{record_activity, upsert_subject, ActivityParams, SubjectParams};
pub use digest::digest;
pub use query::{badges, deltas, runlog};
pub use run::run;
pub use serve::serve;

/// Open the snapshot store named in the config
pub fn open_store(config: &Config) -> Result<SharedSnapshotStore> {
    create_sqlite_store(&config.database.snapshot_path).with_context(|| {
        format!(
            "Failed to open snapshot store at {}",
            config.database.snapshot_path.display()
        )
    })
}

/// Open the activity source named in the config
pub fn open_activity(config: &Config) -> Result<Arc<SqliteActivitySource>> {
    let source = SqliteActivitySource::new(&config.database.activity_path).with_context(|| {
        format!(
            "Failed to open activity database at {}",
            config.database.activity_path.display()
        )
    })?;
    Ok(Arc::new(source))
}

/// Parse a comma-separated category list; empty means "use the config"
pub fn parse_categories(list: Option<&str>) -> Result<Vec<Category>> {
    let Some(list) = list else {
        return Ok(Vec::new());
    };
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Category>().map_err(anyhow::Error::from))
        .collect()
}

/// Build a scheduler from config, optionally narrowed to `categories`
pub fn build_scheduler(
    config: &Config,
    store: SharedSnapshotStore,
    categories: &[Category],
) -> Result<SnapshotScheduler> {
    let categories = if categories.is_empty() {
        config.leaderboard.active_categories()
    } else {
        categories.to_vec()
    };

    let computer = RankingComputer::new(open_activity(config)?).only(&categories);

    Ok(SnapshotScheduler::new(store, computer)
        .with_task_name(config.leaderboard.task_name.clone())
        .with_parallel(config.leaderboard.parallel))
}
