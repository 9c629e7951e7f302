//! Filesystem sweeper - deletes aged files from temp directories.
//!
//! Best effort over a filesystem that changes under us: missing or
//! unreadable directories are skipped, and per-file failures (in use,
//! permission denied, already gone) are counted but never abort the pass.
//! Only direct entries that are regular files are considered.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tidy_common::{RunOutcome, SweepSpec, TidyError};
use tokio::fs;
use tracing::{debug, info};

/// A file seen during one sweep pass
#[derive(Debug, Clone)]
pub struct SweepCandidate {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl SweepCandidate {
    /// Age relative to `now`; files stamped in the future count as new
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.modified).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted_count: u64,
    pub freed_bytes: u64,
    /// Old enough but could not be removed
    pub skipped: u64,
}

impl From<SweepReport> for RunOutcome {
    fn from(report: SweepReport) -> Self {
        RunOutcome::swept(report.deleted_count, report.freed_bytes)
    }
}

pub async fn sweep(spec: &SweepSpec) -> SweepReport {
    sweep_at(&spec.directories, spec.min_age, SystemTime::now()).await
}

/// Sweep `directories` in order, deleting files older than `min_age` at `now`
pub async fn sweep_at(directories: &[PathBuf], min_age: Duration, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::default();

    for dir in directories {
        sweep_dir(dir, min_age, now, &mut report).await;
    }

    info!(
        "Sweep finished: {} deleted, {} bytes freed, {} skipped",
        report.deleted_count, report.freed_bytes, report.skipped
    );
    report
}

async fn sweep_dir(dir: &Path, min_age: Duration, now: SystemTime, report: &mut SweepReport) {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping {}: {}", dir.display(), e);
            return;
        }
    };

    let mut expired = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!("Stopped reading {}: {}", dir.display(), e);
                break;
            }
        };

        if let Some(candidate) = inspect(&entry).await {
            if candidate.age(now) > min_age {
                expired.push(candidate);
            }
        }
    }

    remove_all(expired, report).await;
}

/// Delete each candidate; a failure is counted in `skipped` and the pass goes on
async fn remove_all(candidates: Vec<SweepCandidate>, report: &mut SweepReport) {
    for candidate in candidates {
        match fs::remove_file(&candidate.path).await {
            Ok(()) => {
                debug!("Deleted: {}", candidate.path.display());
                report.deleted_count += 1;
                report.freed_bytes += candidate.size;
            }
            Err(source) => {
                let err = TidyError::FilesystemEntry {
                    path: candidate.path,
                    source,
                };
                debug!("{}", err);
                report.skipped += 1;
            }
        }
    }
}

/// Regular files only; symlinks and directories are never candidates
async fn inspect(entry: &fs::DirEntry) -> Option<SweepCandidate> {
    let meta = entry.metadata().await.ok()?;
    if !meta.file_type().is_file() {
        return None;
    }
    Some(SweepCandidate {
        path: entry.path(),
        size: meta.len(),
        modified: meta.modified().ok()?,
    })
}
