use anyhow::Result;
use chrono::Utc;

use podium::badges::BadgeExtractor;
use podium::cache::SnapshotCache;
use podium::config::Config;
use podium::delta::RankDeltaEngine;
use podium::models::SubjectId;
use podium::storage::SnapshotStore;

use super::open_store;

/// Print a subject's current podium badges
pub fn badges(config: &Config, subject: i64, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let extractor = BadgeExtractor::new(store)
        .with_window_days(config.leaderboard.badge_window_days)
        .with_categories(config.leaderboard.active_categories());

    let badges = extractor.badges_for(SubjectId(subject), Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&badges)?);
        return Ok(());
    }

    if badges.is_empty() {
        println!("Subject {subject} holds no podium positions.");
        return Ok(());
    }
    println!("Badges for subject {subject}:");
    for badge in &badges {
        println!(
            "  #{} {:<7} {} (as of {})",
            badge.rank,
            badge.medal.as_str(),
            badge.title,
            badge.taken_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Print a subject's rank movement in every category
pub fn deltas(config: &Config, subjects: &[i64], json: bool) -> Result<()> {
    let store = open_store(config)?;
    let cache = SnapshotCache::loaded(
        store.as_ref(),
        &config.leaderboard.active_categories(),
        config.leaderboard.freshness_window_days,
        Utc::now(),
    )?;
    let engine = RankDeltaEngine::new(&cache);

    for &subject in subjects {
        let deltas = engine.deltas_for(SubjectId(subject))?;

        if json {
            println!(
                "{}",
                serde_json::json!({ "subjectId": subject, "deltas": deltas })
            );
            continue;
        }

        println!("Subject {subject}");
        for entry in deltas.iter().filter(|d| d.delta.has_activity()) {
            let d = &entry.delta;
            let movement = if d.is_new {
                "new".to_string()
            } else if d.dropped_out {
                "dropped out".to_string()
            } else if d.change > 0 {
                format!("▲{}", d.change)
            } else if d.change < 0 {
                format!("▼{}", -d.change)
            } else {
                "=".to_string()
            };
            println!(
                "  {:<24} now {:>5}  before {:>5}  {}",
                entry.category.id(),
                d.current_rank.map_or("-".to_string(), |r| r.to_string()),
                d.previous_rank.map_or("-".to_string(), |r| r.to_string()),
                movement
            );
        }
    }
    Ok(())
}

/// Print the last run log entry
pub fn runlog(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let Some(entry) = store.get_run_log(&config.leaderboard.task_name)? else {
        println!("No run recorded for '{}'.", config.leaderboard.task_name);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("Task:     {}", entry.task_name);
        println!("Last run: {}", entry.last_run_at.to_rfc3339());
        println!("By:       {}", entry.last_run_by);
        println!("Status:   {}", entry.status);
        println!("Details:  {}", serde_json::to_string_pretty(&entry.details)?);
    }
    Ok(())
}
