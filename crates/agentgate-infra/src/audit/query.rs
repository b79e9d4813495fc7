//! Filtered reads over the JSONL audit trail.
//!
//! Queries work on the raw stored JSON, so entries whose messages never
//! validated are still searchable. Date bounds prune whole files by their
//! filename before any line is parsed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use agentgate_types::audit::AuditEntry;
use agentgate_types::error::AuditError;

use super::log::JsonlAuditLog;

/// Which audit entries to return. All criteria are conjunctive; an empty
/// filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditFilter {
    /// Matches messages the agent sent or received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Inclusive lower bound on `meta.receivedAt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `meta.receivedAt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// One page of matching entries plus the filter that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub entries: Vec<AuditEntry>,
    /// Matches before pagination was applied.
    pub total_count: usize,
    pub filter: AuditFilter,
}

impl JsonlAuditLog {
    /// Run one query over the stored entries, oldest first.
    pub async fn query(&self, filter: &AuditFilter) -> Result<QueryResult, AuditError> {
        let since_date = filter.since.map(|t| t.date_naive());
        let until_date = filter.until.map(|t| t.date_naive());

        let mut matches = Vec::new();
        for (date, _, path) in self.log_files().await? {
            if since_date.is_some_and(|since| date < since)
                || until_date.is_some_and(|until| date > until)
            {
                continue;
            }
            for entry in self.read_log_file(&path).await? {
                if entry_matches(&entry, filter) {
                    matches.push(entry);
                }
            }
        }

        let total_count = matches.len();
        let offset = filter.offset.unwrap_or(0);
        let entries: Vec<AuditEntry> = matches
            .into_iter()
            .skip(offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(QueryResult {
            entries,
            total_count,
            filter: filter.clone(),
        })
    }
}

fn entry_matches(entry: &AuditEntry, filter: &AuditFilter) -> bool {
    let message = &entry.message;

    if let Some(agent_id) = &filter.agent_id {
        let from = field_str(message, &["from", "agentId"]);
        let to = field_str(message, &["to", "agentId"]);
        if from != Some(agent_id.as_str()) && to != Some(agent_id.as_str()) {
            return false;
        }
    }
    if let Some(kind) = &filter.kind {
        if field_str(message, &["type"]) != Some(kind.as_str()) {
            return false;
        }
    }
    if let Some(priority) = &filter.priority {
        if field_str(message, &["priority"]) != Some(priority.as_str()) {
            return false;
        }
    }
    if let Some(correlation_id) = &filter.correlation_id {
        if field_str(message, &["correlationId"]) != Some(correlation_id.as_str()) {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if entry.meta.received_at < since {
            return false;
        }
    }
    if let Some(until) = filter.until {
        if entry.meta.received_at > until {
            return false;
        }
    }
    true
}

fn field_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
