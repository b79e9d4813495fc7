use thiserror::Error;

/// Errors surfaced by a delivery collaborator.
///
/// The router maps any of these to a `delivery_failed` result; it never
/// distinguishes transient from permanent failures and never retries.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("agent {0} is not registered")]
    NotRegistered(String),

    #[error("mailbox full for agent {0}")]
    MailboxFull(String),

    #[error("{0}")]
    Transport(String),
}

/// Errors surfaced by an audit sink.
///
/// The router swallows these; they never affect the routing result.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit io error: {0}")]
    Io(String),

    #[error("audit serialization error: {0}")]
    Serialize(String),
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Serialize(err.to_string())
    }
}
