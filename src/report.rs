use crate::diff::{self, ChangeKind, DiffResult};
use crate::error::AppError;
use crate::index::SnapshotIndex;
use crate::models::{Snapshot, KNOWN_PROVIDERS};
use crate::period;
use crate::uptime::{self, UptimeStat};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub models_added: usize,
    pub models_removed: usize,
    pub providers_added: usize,
    pub providers_removed: usize,
    pub price_changes: usize,
    pub speed_changes: usize,
    pub status_changes: usize,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub week: String,
    pub period: Period,
    pub generated: DateTime<Utc>,
    pub snapshots_used: usize,
    pub summary: Summary,
    #[serde(flatten)]
    pub diff: DiffResult,
    pub uptime: BTreeMap<String, UptimeStat>,
}

pub fn assemble(
    week: String,
    period: Period,
    diff: DiffResult,
    uptime: BTreeMap<String, UptimeStat>,
    snapshots_used: usize,
    generated: DateTime<Utc>,
) -> Report {
    let summary = Summary {
        models_added: diff.models_added.len(),
        models_removed: diff.models_removed.len(),
        providers_added: diff
            .provider_changes
            .iter()
            .filter(|c| c.change == ChangeKind::Added)
            .count(),
        providers_removed: diff
            .provider_changes
            .iter()
            .filter(|c| c.change == ChangeKind::Removed)
            .count(),
        price_changes: diff.price_changes.len(),
        speed_changes: diff.speed_changes.len(),
        status_changes: diff.status_changes.len(),
    };

    Report {
        week,
        period,
        generated,
        snapshots_used,
        summary,
        diff,
        uptime,
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Written { path: PathBuf, report: Report },
    AlreadyExists(PathBuf),
}

/// Generate the weekly report. Reports are write-once: an existing output
/// for the target week short-circuits before any snapshot is read. A
/// snapshot file that fails to parse is dropped with a warning; the run
/// only fails when fewer than two usable snapshots remain.
pub fn generate(
    snapshot_dir: &Path,
    report_dir: &Path,
    week: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RunOutcome, AppError> {
    let (year, number) = match week {
        Some(raw) => period::parse_week(raw)?,
        None => period::previous_complete_week(now),
    };
    let week_id = format!("{year}-W{number:02}");
    let (start, end) = period::week_boundaries(year, number)?;

    let out_path = report_dir.join(format!("{week_id}.json"));
    if out_path.exists() {
        return Ok(RunOutcome::AlreadyExists(out_path));
    }

    let files = period::find_snapshot_files(snapshot_dir, start, end)?;

    let mut snapshots = Vec::new();
    for file in &files {
        match Snapshot::load(&file.path) {
            Ok(snapshot) if snapshot.entries.is_empty() => {}
            Ok(snapshot) => snapshots.push(snapshot),
            Err(err @ AppError::MalformedSnapshot { .. }) => eprintln!("warning: {err}"),
            Err(err) => return Err(err),
        }
    }

    if snapshots.len() < 2 {
        return Err(AppError::InsufficientData(format!(
            "found {} usable snapshot(s) for {week_id}, need at least 2",
            snapshots.len()
        )));
    }

    let indices: Vec<SnapshotIndex> = snapshots
        .iter()
        .map(|s| SnapshotIndex::build(&s.entries))
        .collect();

    let diff = diff::diff(&indices[0], &indices[indices.len() - 1]);
    let uptime = uptime::aggregate(&indices);

    let unlisted: Vec<&str> = uptime
        .keys()
        .map(String::as_str)
        .filter(|p| !KNOWN_PROVIDERS.contains(p))
        .collect();
    if !unlisted.is_empty() {
        println!("note: providers outside the known roster: {}", unlisted.join(", "));
    }

    let report = assemble(
        week_id,
        Period { from: start, to: end },
        diff,
        uptime,
        indices.len(),
        Utc::now(),
    );

    fs::create_dir_all(report_dir)?;
    fs::write(&out_path, serde_json::to_string_pretty(&report)?)?;

    Ok(RunOutcome::Written { path: out_path, report })
}
