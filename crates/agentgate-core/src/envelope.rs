//! Construction helpers for protocol-conformant messages.
//!
//! `EnvelopeBuilder` fills in the envelope fields the sender should never
//! hand-roll (protocol tag, v7 message id, timestamp) and the per-type
//! constructors take strongly typed payload vocabularies, so anything built
//! here passes `ProtocolValidator` by construction.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use agentgate_types::message::{A2aMessage, AgentRef, MessageType, PROTOCOL_VERSION, Priority};

/// What kind of work a task request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Implementation,
    Research,
    Review,
    Testing,
    Documentation,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Implementation => "implementation",
            TaskType::Research => "research",
            TaskType::Review => "review",
            TaskType::Testing => "testing",
            TaskType::Documentation => "documentation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

/// How the recipient answered a task request. Negative outcomes carry the
/// reason the protocol requires of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Accepted,
    Completed,
    Declined { reason: String },
    Failed { reason: String },
    Blocked { reason: String },
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Accepted => "accepted",
            TaskAction::Completed => "completed",
            TaskAction::Declined { .. } => "declined",
            TaskAction::Failed { .. } => "failed",
            TaskAction::Blocked { .. } => "blocked",
        }
    }

    fn reason(&self) -> Option<&str> {
        match self {
            TaskAction::Accepted | TaskAction::Completed => None,
            TaskAction::Declined { reason }
            | TaskAction::Failed { reason }
            | TaskAction::Blocked { reason } => Some(reason),
        }
    }
}

/// Review outcome. Requesting changes means naming them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    ChangesRequested { unresolved_concerns: Vec<String> },
    Rejected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::ChangesRequested { .. } => "changes_requested",
            Verdict::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    PushAndClose,
    SendBackToWorker,
    Escalate,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::PushAndClose => "push_and_close",
            NextAction::SendBackToWorker => "send_back_to_worker",
            NextAction::Escalate => "escalate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    InProgress,
    Blocked,
    Completed,
    Idle,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Blocked => "blocked",
            WorkStatus::Completed => "completed",
            WorkStatus::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastScope {
    Org,
    Team,
}

impl BroadcastScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastScope::Org => "org",
            BroadcastScope::Team => "team",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Fyi,
    AttentionNeeded,
    ActionRequired,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Fyi => "fyi",
            Urgency::AttentionNeeded => "attention_needed",
            Urgency::ActionRequired => "action_required",
        }
    }
}

/// Payload of a `task_request` message.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub complexity: Complexity,
}

/// Payload of a `review_request` message.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub task_id: String,
    pub title: String,
    pub branch: String,
    pub worktree: String,
    pub files_for_review: Vec<String>,
    pub author_agent: String,
    pub author_tier: String,
    pub review_level: String,
}

/// Payload of a `review_response` message.
#[derive(Debug, Clone)]
pub struct ReviewResponse {
    pub task_id: String,
    pub verdict: Verdict,
    pub branch: String,
    pub worktree: String,
    pub next_action: NextAction,
}

/// Builder for one outgoing message between a fixed sender/recipient pair.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    from: AgentRef,
    to: AgentRef,
    priority: Priority,
    correlation_id: Option<String>,
}

impl EnvelopeBuilder {
    pub fn new(from: AgentRef, to: AgentRef) -> Self {
        Self {
            from,
            to,
            priority: Priority::Normal,
            correlation_id: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Link this message into the conversation `parent` belongs to.
    pub fn in_reply_to(self, parent: &A2aMessage) -> Self {
        let correlation_id = derive_correlation_id(parent);
        self.correlation_id(correlation_id)
    }

    pub fn task_request(self, request: TaskRequest) -> A2aMessage {
        self.build(
            MessageType::TaskRequest,
            json!({
                "taskId": request.task_id,
                "title": request.title,
                "description": request.description,
                "taskType": request.task_type.as_str(),
                "complexity": request.complexity.as_str(),
            }),
        )
    }

    pub fn task_response(self, task_id: impl Into<String>, action: TaskAction) -> A2aMessage {
        let mut payload = json!({
            "taskId": task_id.into(),
            "action": action.as_str(),
        });
        if let Some(reason) = action.reason() {
            payload["reason"] = json!(reason);
        }
        self.build(MessageType::TaskResponse, payload)
    }

    pub fn review_request(self, request: ReviewRequest) -> A2aMessage {
        self.build(
            MessageType::ReviewRequest,
            json!({
                "taskId": request.task_id,
                "title": request.title,
                "branch": request.branch,
                "worktree": request.worktree,
                "filesForReview": request.files_for_review,
                "authorAgent": request.author_agent,
                "authorTier": request.author_tier,
                "reviewLevel": request.review_level,
            }),
        )
    }

    pub fn review_response(self, response: ReviewResponse) -> A2aMessage {
        let mut payload = json!({
            "taskId": response.task_id,
            "verdict": response.verdict.as_str(),
            "branch": response.branch,
            "worktree": response.worktree,
            "nextAction": response.next_action.as_str(),
        });
        if let Verdict::ChangesRequested { unresolved_concerns } = &response.verdict {
            payload["unresolvedConcerns"] = json!(unresolved_concerns);
        }
        self.build(MessageType::ReviewResponse, payload)
    }

    pub fn status_update(self, status: WorkStatus, progress: impl Into<String>) -> A2aMessage {
        self.build(
            MessageType::StatusUpdate,
            json!({
                "status": status.as_str(),
                "progress": progress.into(),
            }),
        )
    }

    pub fn knowledge_share(
        self,
        topic: impl Into<String>,
        discovery: impl Into<String>,
        source: impl Into<String>,
        actionable: bool,
    ) -> A2aMessage {
        self.build(
            MessageType::KnowledgeShare,
            json!({
                "topic": topic.into(),
                "discovery": discovery.into(),
                "source": source.into(),
                "actionable": actionable,
            }),
        )
    }

    pub fn broadcast(
        self,
        scope: BroadcastScope,
        topic: impl Into<String>,
        message: impl Into<String>,
        urgency: Urgency,
    ) -> A2aMessage {
        self.build(
            MessageType::Broadcast,
            json!({
                "scope": scope.as_str(),
                "topic": topic.into(),
                "message": message.into(),
                "urgency": urgency.as_str(),
            }),
        )
    }

    fn build(self, kind: MessageType, payload: serde_json::Value) -> A2aMessage {
        A2aMessage {
            protocol: PROTOCOL_VERSION.to_string(),
            message_id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            from: self.from,
            to: self.to,
            kind,
            priority: self.priority,
            payload,
            correlation_id: self.correlation_id,
        }
    }
}

/// Conversation id for replies to `message`.
///
/// A message that already carries a correlation id stays in that thread;
/// otherwise it starts one, identified by its own message id.
pub fn derive_correlation_id(message: &A2aMessage) -> String {
    message
        .correlation_id
        .clone()
        .unwrap_or_else(|| message.message_id.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
