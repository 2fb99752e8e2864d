//! Daily wall-clock trigger
//!
//! Used by the server to run the snapshot job once a day. The core scheduler
//! stays a plain blocking call; this loop only decides *when* to call it.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};

use super::SnapshotScheduler;

// ============================================================================
// Trigger Configuration
// ============================================================================

/// Configuration for the daily trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Whether the server runs the job on its own
    pub enabled: bool,

    /// Time of day to run, UTC, 24h "HH:MM"
    pub run_time: String,

    /// Also run once immediately at startup
    pub run_on_startup: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            run_time: "03:00".to_string(),
            run_on_startup: false,
        }
    }
}

impl TriggerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.parse_run_time().map(|_| ())
    }

    /// Parse the run time
    pub fn parse_run_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.run_time, "%H:%M").map_err(|_| {
            Error::config(format!(
                "Invalid run_time '{}'. Expected HH:MM",
                self.run_time
            ))
        })
    }
}

// ============================================================================
// Daily Trigger
// ============================================================================

/// Fires the snapshot scheduler once a day
#[derive(Debug, Clone)]
pub struct DailyTrigger {
    config: TriggerConfig,
    run_time: NaiveTime,
}

impl DailyTrigger {
    pub fn new(config: TriggerConfig) -> Result<Self> {
        let run_time = config.parse_run_time()?;
        Ok(Self { config, run_time })
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Next firing time strictly after `now`
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(self.run_time));
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Time left until the next firing
    pub fn duration_until_next(&self, now: DateTime<Utc>) -> Duration {
        self.next_fire_after(now) - now
    }

    /// Run until `shutdown` flips to `true`
    pub async fn run(self, scheduler: SnapshotScheduler, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            run_time = %self.config.run_time,
            run_on_startup = self.config.run_on_startup,
            "Daily snapshot trigger started"
        );

        if self.config.run_on_startup {
            fire(&scheduler).await;
        }

        loop {
            let sleep = self
                .duration_until_next(Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(60));

            tokio::select! {
                _ = tokio::time::sleep(sleep) => {
                    fire(&scheduler).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Daily snapshot trigger stopped");
    }
}

async fn fire(scheduler: &SnapshotScheduler) {
    let scheduler = scheduler.clone();
    match tokio::task::spawn_blocking(move || scheduler.run("scheduler")).await {
        Ok(report) => tracing::info!(
            run_id = %report.run_id,
            status = %report.status,
            "Scheduled snapshot run complete"
        ),
        Err(e) => tracing::error!(error = %e, "Scheduled snapshot run aborted"),
    }
}
