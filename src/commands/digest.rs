use anyhow::Result;
use chrono::Utc;

use podium::cache::SnapshotCache;
use podium::config::Config;
use podium::digest::{DigestDispatcher, DigestPlanner, LogSink};
use podium::models::SubjectId;

use super::{open_activity, open_store};

/// Build (and optionally deliver) rank digests
///
/// Without explicit subjects every subject in the activity database is
/// considered; those with no ranked activity are skipped.
pub async fn digest(config: &Config, subjects: Vec<i64>, deliver: bool, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let subjects: Vec<SubjectId> = if subjects.is_empty() {
        open_activity(config)?.subject_ids()?
    } else {
        subjects.into_iter().map(SubjectId).collect()
    };

    let cache = SnapshotCache::loaded(
        store.as_ref(),
        &config.leaderboard.active_categories(),
        config.leaderboard.freshness_window_days,
        Utc::now(),
    )?;
    let plan = DigestPlanner::new(&cache).plan(subjects)?;

    if json {
        for entry in &plan.entries {
            println!("{}", serde_json::to_string(entry)?);
        }
        return Ok(());
    }

    println!("Rank Digest");
    println!("===========");
    println!("  Subjects with activity: {}", plan.entries.len());
    println!("  Skipped (no activity):  {}", plan.skipped);

    if deliver {
        let dispatcher = DigestDispatcher::new(config.digest.subjects_per_second);
        let stats = dispatcher.dispatch(&plan, &LogSink).await;
        println!("  Delivered:              {}", stats.delivered);
        println!("  Failed:                 {}", stats.failed);
    }
    Ok(())
}
