//! Schema validation for the A2A v1 envelope and its payloads.
//!
//! `ProtocolValidator` checks a raw JSON input field by field, producing
//! JSON-pointer style issues, before handing back a typed `A2aMessage`.
//! Envelope rules are common to all messages; each of the seven message
//! types then gets its own payload rules.

use chrono::DateTime;
use serde_json::{Map, Value};

use agentgate_types::message::{A2aMessage, MessageType, PROTOCOL_VERSION, Priority};
use agentgate_types::route::ValidationIssue;

use crate::port::{Validate, ValidationOutcome};

const TASK_TYPES: [&str; 5] = [
    "implementation",
    "research",
    "review",
    "testing",
    "documentation",
];
const COMPLEXITIES: [&str; 3] = ["low", "medium", "high"];
const TASK_ACTIONS: [&str; 5] = ["accepted", "declined", "completed", "failed", "blocked"];
const VERDICTS: [&str; 3] = ["approved", "changes_requested", "rejected"];
const NEXT_ACTIONS: [&str; 3] = ["push_and_close", "send_back_to_worker", "escalate"];
const STATUSES: [&str; 4] = ["in_progress", "blocked", "completed", "idle"];
const SCOPES: [&str; 2] = ["org", "team"];
const URGENCIES: [&str; 3] = ["fyi", "attention_needed", "action_required"];

/// Validator for the A2A v1 wire contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolValidator;

impl Validate for ProtocolValidator {
    fn validate(&self, raw: &Value) -> ValidationOutcome {
        validate_message(raw)
    }
}

/// Validate one raw input against the protocol schema.
pub fn validate_message(raw: &Value) -> ValidationOutcome {
    let Some(obj) = raw.as_object() else {
        return ValidationOutcome::Invalid(vec![ValidationIssue::new(
            "/",
            "message must be a JSON object",
            "type",
        )]);
    };

    let mut issues = Vec::new();
    check_envelope(obj, &mut issues);
    check_payload(obj, &mut issues);

    if !issues.is_empty() {
        return ValidationOutcome::Invalid(issues);
    }

    match serde_json::from_value::<A2aMessage>(raw.clone()) {
        Ok(message) => ValidationOutcome::Valid(message),
        // Field checks passed but the typed envelope still refused the
        // input (e.g. an out-of-range timestamp component).
        Err(err) => ValidationOutcome::Invalid(vec![ValidationIssue::new(
            "/",
            err.to_string(),
            "deserialize",
        )]),
    }
}

fn check_envelope(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    match nonempty_str(obj, "protocol") {
        Some(protocol) if protocol == PROTOCOL_VERSION => {}
        Some(protocol) => issues.push(ValidationIssue::new(
            "/protocol",
            format!("unsupported protocol version '{protocol}', expected '{PROTOCOL_VERSION}'"),
            "protocol_version",
        )),
        None => issues.push(required("/protocol")),
    }

    if nonempty_str(obj, "messageId").is_none() {
        issues.push(required("/messageId"));
    }

    match nonempty_str(obj, "timestamp") {
        Some(timestamp) => {
            if DateTime::parse_from_rfc3339(timestamp).is_err() {
                issues.push(ValidationIssue::new(
                    "/timestamp",
                    "timestamp must be an RFC 3339 date-time",
                    "format",
                ));
            }
        }
        None => issues.push(required("/timestamp")),
    }

    check_agent_ref(obj, "from", issues);
    check_agent_ref(obj, "to", issues);

    match nonempty_str(obj, "type") {
        Some(kind) => {
            if !MessageType::ALL.iter().any(|t| t.as_str() == kind) {
                issues.push(ValidationIssue::new(
                    "/type",
                    format!("unknown message type '{kind}'"),
                    "enum",
                ));
            }
        }
        None => issues.push(required("/type")),
    }

    match nonempty_str(obj, "priority") {
        Some(priority) => {
            if !Priority::ALL.iter().any(|p| p.as_str() == priority) {
                issues.push(ValidationIssue::new(
                    "/priority",
                    format!("unknown priority '{priority}'"),
                    "enum",
                ));
            }
        }
        None => issues.push(required("/priority")),
    }

    match obj.get("payload") {
        Some(Value::Object(_)) => {}
        Some(_) => issues.push(ValidationIssue::new(
            "/payload",
            "payload must be a JSON object",
            "type",
        )),
        None => issues.push(required("/payload")),
    }

    // correlationId is optional; null is treated as absent.
    match obj.get("correlationId") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push(ValidationIssue::new(
            "/correlationId",
            "correlationId must be a string when present",
            "type",
        )),
    }
}

fn check_agent_ref(obj: &Map<String, Value>, field: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(value) = obj.get(field) else {
        issues.push(required(&format!("/{field}")));
        return;
    };
    let Some(agent) = value.as_object() else {
        issues.push(ValidationIssue::new(
            format!("/{field}"),
            format!("{field} must be an object"),
            "type",
        ));
        return;
    };

    if nonempty_str(agent, "agentId").is_none() {
        issues.push(required(&format!("/{field}/agentId")));
    }
    if nonempty_str(agent, "role").is_none() {
        issues.push(required(&format!("/{field}/role")));
    }
    if let Some(session_key) = agent.get("sessionKey") {
        if !session_key.is_string() && !session_key.is_null() {
            issues.push(ValidationIssue::new(
                format!("/{field}/sessionKey"),
                "sessionKey must be a string when present",
                "type",
            ));
        }
    }
}

fn check_payload(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    // Per-type rules only apply once the envelope gave us a known type and
    // an object payload; envelope issues were already reported.
    let Some(kind) = obj.get("type").and_then(Value::as_str) else {
        return;
    };
    let Some(payload) = obj.get("payload").and_then(Value::as_object) else {
        return;
    };

    match kind {
        "task_request" => {
            require_string(payload, "taskId", issues);
            require_string(payload, "title", issues);
            require_string(payload, "description", issues);
            require_enum(payload, "taskType", &TASK_TYPES, issues);
            require_enum(payload, "complexity", &COMPLEXITIES, issues);
        }
        "task_response" => {
            require_string(payload, "taskId", issues);
            require_enum(payload, "action", &TASK_ACTIONS, issues);
            // Negative outcomes must say why; a whitespace reason counts
            // as missing.
            if matches!(
                payload.get("action").and_then(Value::as_str),
                Some("declined" | "failed" | "blocked")
            ) {
                match payload.get("reason").and_then(Value::as_str) {
                    Some(reason) if !reason.trim().is_empty() => {}
                    _ => issues.push(ValidationIssue::new(
                        "/payload/reason",
                        "a declined, failed, or blocked response must carry a reason",
                        "required",
                    )),
                }
            }
        }
        "review_request" => {
            require_string(payload, "taskId", issues);
            require_string(payload, "title", issues);
            require_string(payload, "branch", issues);
            require_string(payload, "worktree", issues);
            require_string_array(payload, "filesForReview", issues);
            require_string(payload, "authorAgent", issues);
            require_string(payload, "authorTier", issues);
            require_string(payload, "reviewLevel", issues);
        }
        "review_response" => {
            require_string(payload, "taskId", issues);
            require_enum(payload, "verdict", &VERDICTS, issues);
            require_string(payload, "branch", issues);
            require_string(payload, "worktree", issues);
            require_enum(payload, "nextAction", &NEXT_ACTIONS, issues);
            // Requesting changes without naming them leaves the author
            // with nothing to act on.
            if payload.get("verdict").and_then(Value::as_str) == Some("changes_requested") {
                match payload.get("unresolvedConcerns").and_then(Value::as_array) {
                    Some(items) if !items.is_empty() && items.iter().all(Value::is_string) => {}
                    _ => issues.push(ValidationIssue::new(
                        "/payload/unresolvedConcerns",
                        "changes_requested must list the unresolved concerns",
                        "array",
                    )),
                }
            }
        }
        "status_update" => {
            require_enum(payload, "status", &STATUSES, issues);
            require_string(payload, "progress", issues);
        }
        "knowledge_share" => {
            require_string(payload, "topic", issues);
            require_string(payload, "discovery", issues);
            require_string(payload, "source", issues);
            require_bool(payload, "actionable", issues);
        }
        "broadcast" => {
            require_enum(payload, "scope", &SCOPES, issues);
            require_string(payload, "topic", issues);
            require_string(payload, "message", issues);
            require_enum(payload, "urgency", &URGENCIES, issues);
        }
        _ => {}
    }
}

fn nonempty_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn required(path: &str) -> ValidationIssue {
    ValidationIssue::new(path, "required field is missing or empty", "required")
}

fn require_string(payload: &Map<String, Value>, field: &str, issues: &mut Vec<ValidationIssue>) {
    if nonempty_str(payload, field).is_none() {
        issues.push(required(&format!("/payload/{field}")));
    }
}

fn require_enum(
    payload: &Map<String, Value>,
    field: &str,
    allowed: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    match nonempty_str(payload, field) {
        Some(value) if allowed.contains(&value) => {}
        Some(value) => issues.push(ValidationIssue::new(
            format!("/payload/{field}"),
            format!("'{value}' is not one of {allowed:?}"),
            "enum",
        )),
        None => issues.push(required(&format!("/payload/{field}"))),
    }
}

fn require_bool(payload: &Map<String, Value>, field: &str, issues: &mut Vec<ValidationIssue>) {
    match payload.get(field) {
        Some(Value::Bool(_)) => {}
        Some(_) => issues.push(ValidationIssue::new(
            format!("/payload/{field}"),
            format!("{field} must be a boolean"),
            "type",
        )),
        None => issues.push(required(&format!("/payload/{field}"))),
    }
}

fn require_string_array(
    payload: &Map<String, Value>,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match payload.get(field).and_then(Value::as_array) {
        Some(items) if !items.is_empty() && items.iter().all(Value::is_string) => {}
        _ => issues.push(ValidationIssue::new(
            format!("/payload/{field}"),
            format!("{field} must be a non-empty array of strings"),
            "array",
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
