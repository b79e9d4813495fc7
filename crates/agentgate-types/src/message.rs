//! A2A protocol message envelope types.
//!
//! Defines the `A2aMessage` envelope exchanged between agents, with the
//! camelCase field names of the wire protocol. The router only ever reads
//! `from.agent_id`, `to.agent_id`, and `correlation_id`; everything else is
//! carried opaquely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Protocol version tag every valid message must carry.
pub const PROTOCOL_VERSION: &str = "agentgate.a2a.v1";

/// A structured message exchanged between two agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aMessage {
    /// Wire contract version tag (see [`PROTOCOL_VERSION`]).
    pub protocol: String,
    /// Caller-supplied unique identifier, used for audit correlation only.
    pub message_id: String,
    /// Caller-supplied creation time. Informational; never used for
    /// window math.
    pub timestamp: DateTime<Utc>,
    /// Sending agent.
    pub from: AgentRef,
    /// Receiving agent.
    pub to: AgentRef,
    /// Message intent.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Advisory priority hint. The router performs no reordering.
    pub priority: Priority,
    /// Arbitrary structured payload, opaque to the router.
    pub payload: serde_json::Value,
    /// Identifies a causal chain of messages. Consumed only by the circuit
    /// breaker's depth guard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Identity of one side of an agent-to-agent exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRef {
    /// Stable agent identifier. This is the routing key.
    pub agent_id: String,
    /// Descriptive role metadata (e.g. "Engineer"). Not used in routing
    /// decisions.
    pub role: String,
    /// Optional session the agent is speaking from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

impl AgentRef {
    pub fn new(agent_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            role: role.into(),
            session_key: None,
        }
    }
}

/// Closed vocabulary of message intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TaskRequest,
    TaskResponse,
    ReviewRequest,
    ReviewResponse,
    StatusUpdate,
    KnowledgeShare,
    Broadcast,
}

impl MessageType {
    /// All known message types, in wire order.
    pub const ALL: [MessageType; 7] = [
        MessageType::TaskRequest,
        MessageType::TaskResponse,
        MessageType::ReviewRequest,
        MessageType::ReviewResponse,
        MessageType::StatusUpdate,
        MessageType::KnowledgeShare,
        MessageType::Broadcast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TaskRequest => "task_request",
            MessageType::TaskResponse => "task_response",
            MessageType::ReviewRequest => "review_request",
            MessageType::ReviewResponse => "review_response",
            MessageType::StatusUpdate => "status_update",
            MessageType::KnowledgeShare => "knowledge_share",
            MessageType::Broadcast => "broadcast",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
