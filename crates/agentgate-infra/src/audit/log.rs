//! JSONL audit log with daily files and size rotation.
//!
//! Each routed message appends one JSON line to `a2a-YYYY-MM-DD.jsonl` in
//! the log directory. When the active file would exceed the size cap the
//! log moves on to `a2a-YYYY-MM-DD.1.jsonl`, then `.2`, and so on; existing
//! files are never rewritten or renamed.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use agentgate_types::audit::{AuditEntry, AuditMeta, DeliveryStatus};
use agentgate_types::error::AuditError;
use agentgate_types::route::{RouteResult, RouteStatus};

use agentgate_core::port::Audit;

/// Default size cap per log file: 50 MB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

const FILE_PREFIX: &str = "a2a-";
const FILE_SUFFIX: &str = ".jsonl";

/// Append-only JSONL audit log rooted at one directory.
///
/// Writers across tasks share the log through `&self`; the append path is
/// serialized by an async mutex so concurrent records never interleave
/// within a line or race the rotation check. Reads take no lock.
pub struct JsonlAuditLog {
    dir: PathBuf,
    max_file_bytes: u64,
    writer: Mutex<WriterState>,
}

/// Which file appends currently go to. The directory is scanned only on
/// the first append and whenever the entry date changes; rotation within
/// a date advances the cached index without another scan.
#[derive(Debug, Default)]
struct WriterState {
    active: Option<(NaiveDate, u32)>,
}

impl JsonlAuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_max_file_bytes(dir, DEFAULT_MAX_FILE_BYTES)
    }

    /// A log whose files rotate after `max_file_bytes` bytes.
    pub fn with_max_file_bytes(dir: impl Into<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes,
            writer: Mutex::new(WriterState::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one entry to the active file for its date.
    pub async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let date = entry.meta.received_at.date_naive();

        let mut writer = self.writer.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Highest-index file for the date, advanced by one when the cap
        // would be crossed.
        let mut index = match writer.active {
            Some((active_date, index)) if active_date == date => index,
            _ => self.highest_index_for(date).await?,
        };
        let path = self.file_path(date, index);
        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.len() + line.len() as u64 > self.max_file_bytes {
                index += 1;
            }
        }

        let path = self.file_path(date, index);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        writer.active = Some((date, index));
        Ok(())
    }

    async fn highest_index_for(&self, date: NaiveDate) -> Result<u32, AuditError> {
        Ok(self
            .log_files()
            .await?
            .into_iter()
            .filter(|(d, _, _)| *d == date)
            .map(|(_, idx, _)| idx)
            .max()
            .unwrap_or(0))
    }

    fn file_path(&self, date: NaiveDate, index: u32) -> PathBuf {
        let name = if index == 0 {
            format!("{FILE_PREFIX}{date}{FILE_SUFFIX}")
        } else {
            format!("{FILE_PREFIX}{date}.{index}{FILE_SUFFIX}")
        };
        self.dir.join(name)
    }

    /// All log files in chronological order: by date, then rotation index.
    pub async fn list_log_files(&self) -> Result<Vec<PathBuf>, AuditError> {
        Ok(self
            .log_files()
            .await?
            .into_iter()
            .map(|(_, _, path)| path)
            .collect())
    }

    pub(crate) async fn log_files(&self) -> Result<Vec<(NaiveDate, u32, PathBuf)>, AuditError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut files = Vec::new();
        while let Some(dent) = dir.next_entry().await? {
            let name = dent.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((date, index)) = parse_file_name(name) {
                files.push((date, index, dent.path()));
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read every entry in one log file. A missing file reads as empty;
    /// lines that no longer parse are skipped, not fatal.
    pub async fn read_log_file(&self, path: &Path) -> Result<Vec<AuditEntry>, AuditError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unparseable audit line");
                }
            }
        }
        Ok(entries)
    }
}

/// Parse `a2a-YYYY-MM-DD.jsonl` or `a2a-YYYY-MM-DD.N.jsonl` into its date
/// and rotation index (0 for the base file).
fn parse_file_name(name: &str) -> Option<(NaiveDate, u32)> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    match stem.split_once('.') {
        None => {
            let date = NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()?;
            Some((date, 0))
        }
        Some((date, index)) => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let index: u32 = index.parse().ok()?;
            // Index 0 is spelled without a suffix.
            (index > 0).then_some((date, index))
        }
    }
}

impl Audit for JsonlAuditLog {
    /// Record the terminal result of one route. Anything short of
    /// `delivered` is logged as a failure.
    async fn record(
        &self,
        message: &serde_json::Value,
        result: &RouteResult,
    ) -> Result<(), AuditError> {
        let delivery_status = if result.status == RouteStatus::Delivered {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Failed
        };
        let entry = AuditEntry {
            message: message.clone(),
            meta: AuditMeta {
                received_at: chrono::Utc::now(),
                delivery_status,
                processing_time_ms: None,
                processed_by: None,
            },
        };
        self.append(&entry).await
    }
}

impl std::fmt::Debug for JsonlAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlAuditLog")
            .field("dir", &self.dir)
            .field("max_file_bytes", &self.max_file_bytes)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn entry_at(received_at: &str, message_id: &str) -> AuditEntry {
        AuditEntry {
            message: json!({"messageId": message_id, "type": "status_update"}),
            meta: AuditMeta {
                received_at: received_at.parse::<DateTime<Utc>>().unwrap(),
                delivery_status: DeliveryStatus::Delivered,
                processing_time_ms: None,
                processed_by: None,
            },
        }
    }

    #[test]
    fn file_name_parsing() {
        assert_eq!(
            parse_file_name("a2a-2026-02-21.jsonl"),
            Some(("2026-02-21".parse().unwrap(), 0))
        );
        assert_eq!(
            parse_file_name("a2a-2026-02-21.3.jsonl"),
            Some(("2026-02-21".parse().unwrap(), 3))
        );
        assert_eq!(parse_file_name("a2a-2026-02-21.0.jsonl"), None);
        assert_eq!(parse_file_name("notes.txt"), None);
        assert_eq!(parse_file_name("a2a-yesterday.jsonl"), None);
    }

    #[tokio::test]
    async fn append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path());

        log.append(&entry_at("2026-02-21T10:00:00Z", "m-1")).await.unwrap();
        log.append(&entry_at("2026-02-21T10:00:01Z", "m-2")).await.unwrap();

        let files = log.list_log_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a2a-2026-02-21.jsonl"));

        let entries = log.read_log_file(&files[0]).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message["messageId"], "m-1");
        assert_eq!(entries[1].message["messageId"], "m-2");
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path());

        let entries = log
            .read_log_file(&dir.path().join("a2a-2026-01-01.jsonl"))
            .await
            .unwrap();
        assert!(entries.is_empty());
        assert!(log.list_log_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_from_different_days_land_in_different_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path());

        log.append(&entry_at("2026-02-21T23:59:59Z", "m-1")).await.unwrap();
        log.append(&entry_at("2026-02-22T00:00:01Z", "m-2")).await.unwrap();

        let files = log.list_log_files().await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a2a-2026-02-21.jsonl"));
        assert!(files[1].ends_with("a2a-2026-02-22.jsonl"));
    }

    #[tokio::test]
    async fn interleaved_dates_target_the_right_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path());

        // Date changes between appends must not stick to the cached file.
        log.append(&entry_at("2026-02-21T10:00:00Z", "m-1")).await.unwrap();
        log.append(&entry_at("2026-02-22T10:00:00Z", "m-2")).await.unwrap();
        log.append(&entry_at("2026-02-21T11:00:00Z", "m-3")).await.unwrap();

        let files = log.list_log_files().await.unwrap();
        assert_eq!(files.len(), 2);
        let first_day = log.read_log_file(&files[0]).await.unwrap();
        assert_eq!(first_day.len(), 2);
        assert_eq!(first_day[1].message["messageId"], "m-3");
        assert_eq!(log.read_log_file(&files[1]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn size_cap_rotates_to_indexed_files() {
        let dir = tempfile::tempdir().unwrap();
        // Cap small enough that each file holds roughly two entries.
        let log = JsonlAuditLog::with_max_file_bytes(dir.path(), 400);

        for i in 0..6 {
            log.append(&entry_at("2026-02-21T10:00:00Z", &format!("m-{i}")))
                .await
                .unwrap();
        }

        let files = log.list_log_files().await.unwrap();
        assert!(files.len() >= 2, "expected rotation, got {files:?}");
        assert!(files[0].ends_with("a2a-2026-02-21.jsonl"));
        assert!(files[1].ends_with("a2a-2026-02-21.1.jsonl"));

        // No entry was lost across the rotation boundary.
        let mut total = 0;
        for file in &files {
            total += log.read_log_file(file).await.unwrap().len();
        }
        assert_eq!(total, 6);
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = std::sync::Arc::new(JsonlAuditLog::new(dir.path()));

        let tasks: Vec<_> = (0..8)
            .map(|worker| {
                let log = std::sync::Arc::clone(&log);
                tokio::spawn(async move {
                    for i in 0..20 {
                        log.append(&entry_at(
                            "2026-02-21T10:00:00Z",
                            &format!("w{worker}-m{i}"),
                        ))
                        .await
                        .unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let files = log.list_log_files().await.unwrap();
        assert_eq!(files.len(), 1);
        // Every line parses; interleaved writes would corrupt some.
        let entries = log.read_log_file(&files[0]).await.unwrap();
        assert_eq!(entries.len(), 160);
    }

    #[tokio::test]
    async fn unparseable_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path());

        log.append(&entry_at("2026-02-21T10:00:00Z", "m-1")).await.unwrap();
        let path = log.list_log_files().await.unwrap().remove(0);
        tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .unwrap()
            .write_all(b"{ this is not json\n")
            .await
            .unwrap();
        log.append(&entry_at("2026-02-21T10:00:02Z", "m-2")).await.unwrap();

        let entries = log.read_log_file(&path).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn audit_trait_maps_terminal_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path());

        let raw = json!({"messageId": "m-1"});
        log.record(&raw, &RouteResult::delivered(Some("m-1".into()), Some(9)))
            .await
            .unwrap();
        log.record(
            &raw,
            &RouteResult::rejected(
                Some("m-1".into()),
                RouteStatus::RateLimited,
                "rate limit exceeded for sender alice",
            ),
        )
        .await
        .unwrap();

        let files = log.list_log_files().await.unwrap();
        let entries = log.read_log_file(&files[0]).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].meta.delivery_status, DeliveryStatus::Delivered);
        assert_eq!(entries[1].meta.delivery_status, DeliveryStatus::Failed);
        assert_eq!(entries[1].message["messageId"], "m-1");
    }
}
