use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use podium::config::Config;
use podium::models::SubjectId;
use podium::ranking::ActivityKind;

use super::open_activity;

/// Arguments for registering a subject
pub struct SubjectParams {
    pub subject: i64,
    pub teacher: bool,
    pub inactive: bool,
    pub joined_at: Option<String>,
}

/// Arguments for recording an activity event
pub struct ActivityParams {
    pub subject: i64,
    pub kind: String,
    pub amount: i64,
    pub at: Option<String>,
}

fn parse_time(value: Option<&str>) -> Result<DateTime<Utc>> {
    match value {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid RFC 3339 timestamp: {s}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Insert or update a subject in the activity database
pub fn upsert_subject(config: &Config, params: SubjectParams) -> Result<()> {
    let joined_at = parse_time(params.joined_at.as_deref())?;
    let source = open_activity(config)?;

    source.upsert_subject(
        SubjectId(params.subject),
        !params.inactive,
        params.teacher,
        joined_at,
    )?;

    println!(
        "Subject {} saved (active: {}, teacher: {})",
        params.subject, !params.inactive, params.teacher
    );
    Ok(())
}

/// Append an event to the activity log
pub fn record_activity(config: &Config, params: ActivityParams) -> Result<()> {
    let kind = ActivityKind::from_id(&params.kind).with_context(|| {
        let known: Vec<&str> = ActivityKind::all().iter().map(|k| k.as_str()).collect();
        format!("Unknown activity kind '{}'. Known: {}", params.kind, known.join(", "))
    })?;
    let occurred_at = parse_time(params.at.as_deref())?;
    let source = open_activity(config)?;

    source.record_event(SubjectId(params.subject), kind, params.amount, occurred_at)?;

    tracing::debug!(subject = params.subject, kind = kind.as_str(), "Activity recorded");
    println!(
        "Recorded {} x{} for subject {}",
        kind.as_str(),
        params.amount,
        params.subject
    );
    Ok(())
}
