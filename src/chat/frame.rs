//! Chat wire frames
//!
//! Inbound frames are either a presence snapshot or a message. Message
//! fields have been sent under two names each over the life of the
//! backend; the decoder reads both, newest name first.

use crate::{
    chat::message::{ChatMessage, MessageType},
    decode::{as_i64, first_i64, first_set, first_text},
    models::UserId,
    Error, Result,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Frame type tag of presence snapshots
pub const PRESENCE_FRAME: &str = "online_users";

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Full set of users currently online
    Presence(HashSet<UserId>),
    /// A confirmed message
    Message(ChatMessage),
}

/// Outbound message frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame<'a> {
    /// Text, image URL or serialized receipt
    pub content: &'a str,
    /// Content kind
    pub msg_type: MessageType,
    /// Recipient; `None` for broadcast
    pub recipient_id: Option<UserId>,
}

impl OutboundFrame<'_> {
    /// Encode as socket text
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode one text frame from the chat socket
pub fn decode_chat_frame(raw: &str) -> Result<InboundFrame> {
    let value: Value = serde_json::from_str(raw)?;

    if value.get("type").and_then(Value::as_str) == Some(PRESENCE_FRAME) {
        let users = value
            .get("users")
            .and_then(Value::as_array)
            .map(|users| users.iter().filter_map(as_i64).collect())
            .unwrap_or_default();
        return Ok(InboundFrame::Presence(users));
    }

    decode_message(&value).map(InboundFrame::Message)
}

/// Decode a message object from a frame or the history endpoint
pub fn decode_message(value: &Value) -> Result<ChatMessage> {
    if !value.is_object() {
        return Err(Error::Transport(format!("Chat message is not an object: {}", value)));
    }

    let created_at = first_set(value, &["/created_at", "/timestamp"])
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    // Zero is a valid id
    let id = value
        .get("id")
        .and_then(as_i64)
        .ok_or_else(|| Error::Transport("Chat message has no id".to_string()))?;

    let content = match value.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        // Receipts are sometimes sent as a nested object
        Some(other) => other.to_string(),
    };

    let msg_type = first_text(value, &["/msg_type", "/type"])
        .and_then(|name| MessageType::from_wire(&name))
        .unwrap_or_default();

    Ok(ChatMessage {
        id,
        content,
        msg_type,
        sender_id: first_i64(value, &["/sender_id", "/senderId"]),
        sender_name: first_text(value, &["/sender_name", "/sender"]),
        recipient_id: first_i64(value, &["/recipient_id", "/recipientId"]),
        created_at,
        is_optimistic: false,
    })
}

/// RFC 3339, naive ISO datetimes (taken as UTC) or epoch milliseconds
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            }),
        Value::Number(_) => as_i64(value).and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
