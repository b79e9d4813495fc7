//! In-process delivery over per-agent mailboxes.
//!
//! Each registered agent owns a bounded `mpsc` channel; delivery is a
//! non-blocking `try_send` so a slow consumer surfaces as `MailboxFull`
//! instead of stalling the router.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use agentgate_types::error::DeliveryError;
use agentgate_types::message::A2aMessage;

use crate::port::Deliver;

/// Messages buffered per agent before the mailbox refuses new ones.
pub const MAILBOX_BUFFER: usize = 256;

/// Registry of agent mailboxes implementing [`Deliver`].
pub struct MailboxDeliverer {
    mailboxes: DashMap<String, mpsc::Sender<A2aMessage>>,
    buffer: usize,
}

impl MailboxDeliverer {
    pub fn new() -> Self {
        Self::with_buffer(MAILBOX_BUFFER)
    }

    /// A deliverer whose mailboxes hold at most `buffer` messages.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            mailboxes: DashMap::new(),
            buffer,
        }
    }

    /// Register an agent and hand back the receiving end of its mailbox.
    ///
    /// Re-registering replaces the old mailbox; the previous receiver sees
    /// the channel close.
    pub fn register(&self, agent_id: impl Into<String>) -> mpsc::Receiver<A2aMessage> {
        let agent_id = agent_id.into();
        let (tx, rx) = mpsc::channel(self.buffer);
        self.mailboxes.insert(agent_id.clone(), tx);
        debug!(agent_id = %agent_id, "agent mailbox registered");
        rx
    }

    pub fn unregister(&self, agent_id: &str) {
        if self.mailboxes.remove(agent_id).is_some() {
            debug!(agent_id = %agent_id, "agent mailbox unregistered");
        }
    }

    pub fn is_registered(&self, agent_id: &str) -> bool {
        self.mailboxes.contains_key(agent_id)
    }

    pub fn registered_count(&self) -> usize {
        self.mailboxes.len()
    }
}

impl Default for MailboxDeliverer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deliver for MailboxDeliverer {
    async fn deliver(&self, to: &str, message: &A2aMessage) -> Result<(), DeliveryError> {
        let Some(sender) = self.mailboxes.get(to).map(|tx| tx.clone()) else {
            return Err(DeliveryError::NotRegistered(to.to_string()));
        };

        match sender.try_send(message.clone()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(DeliveryError::MailboxFull(to.to_string()))
            }
            // Receiver dropped without unregistering.
            Err(mpsc::error::TrySendError::Closed(_)) => Err(DeliveryError::Transport(format!(
                "mailbox closed for agent {to}"
            ))),
        }
    }
}

impl std::fmt::Debug for MailboxDeliverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxDeliverer")
            .field("registered", &self.mailboxes.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
