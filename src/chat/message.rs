//! Chat message and conversation types

use crate::{
    models::{User, UserId},
    receipt::{normalize_receipt, Receipt},
    Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of message content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    /// Plain text
    #[default]
    Text,
    /// Image URL returned by the upload endpoint
    Image,
    /// Serialized receipt
    Receipt,
}

impl MessageType {
    /// Parse a wire name, ignoring case
    pub fn from_wire(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TEXT" => Some(MessageType::Text),
            "IMAGE" => Some(MessageType::Image),
            "RECEIPT" => Some(MessageType::Receipt),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::Image => "IMAGE",
            MessageType::Receipt => "RECEIPT",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation the user is looking at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Conversation {
    /// Broadcast channel seen by all staff
    #[default]
    General,
    /// Direct conversation with one user
    Direct(UserId),
}

impl Conversation {
    /// Recipient for outbound messages; `None` is broadcast
    pub fn recipient(&self) -> Option<UserId> {
        match self {
            Conversation::General => None,
            Conversation::Direct(id) => Some(*id),
        }
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversation::General => write!(f, "general"),
            Conversation::Direct(id) => write!(f, "user {}", id),
        }
    }
}

/// Chat message
///
/// Optimistic messages are local placeholders shown before the server
/// echoes the message back; they carry a locally generated id.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Server id, or a local id while optimistic
    pub id: i64,
    /// Text, image URL or serialized receipt
    pub content: String,
    /// Content kind
    pub msg_type: MessageType,
    /// Sender
    pub sender_id: Option<UserId>,
    /// Sender display name
    pub sender_name: Option<String>,
    /// Recipient; `None` for broadcast
    pub recipient_id: Option<UserId>,
    /// Sort key for the log
    pub created_at: DateTime<Utc>,
    /// Whether this is a local placeholder awaiting the server echo
    pub is_optimistic: bool,
}

impl ChatMessage {
    /// Local placeholder for a message the user just sent
    pub fn optimistic(
        local_id: i64,
        sender: &User,
        content: impl Into<String>,
        msg_type: MessageType,
        recipient_id: Option<UserId>,
    ) -> Self {
        Self {
            id: local_id,
            content: content.into(),
            msg_type,
            sender_id: Some(sender.id),
            sender_name: Some(sender.display_name().to_string()),
            recipient_id,
            created_at: Utc::now(),
            is_optimistic: true,
        }
    }

    /// Conversation this message belongs to, as seen by user `me`
    ///
    /// Broadcasts belong to general. A direct message belongs to the
    /// conversation with the other party.
    pub fn conversation(&self, me: Option<UserId>) -> Conversation {
        match self.recipient_id {
            None => Conversation::General,
            Some(recipient) if self.sender_id.is_some() && self.sender_id == me => {
                Conversation::Direct(recipient)
            }
            Some(recipient) => match self.sender_id {
                Some(sender) => Conversation::Direct(sender),
                None => Conversation::Direct(recipient),
            },
        }
    }

    /// Whether the message shows in `conversation` for user `me`
    pub fn is_visible_in(&self, conversation: Conversation, me: Option<UserId>) -> bool {
        self.conversation(me) == conversation
    }

    /// Whether user `me` sent this message
    pub fn is_from(&self, me: Option<UserId>) -> bool {
        me.is_some() && self.sender_id == me
    }

    /// Decode the receipt carried by a RECEIPT message
    pub fn receipt(&self) -> Option<Result<Receipt>> {
        (self.msg_type == MessageType::Receipt).then(|| normalize_receipt(&self.content))
    }
}
