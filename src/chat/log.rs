//! Ordered message log

use crate::{chat::message::ChatMessage, models::UserId};
use std::collections::HashSet;

/// Messages of the active conversation, ascending by `created_at`
///
/// The order is re-established after every insertion instead of trusting
/// delivery order. The sort is stable, so messages with equal timestamps
/// keep their arrival order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in display order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a message with `id` is present
    pub fn contains(&self, id: i64) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Insert a message and restore timestamp order
    pub fn insert(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.sort();
    }

    fn sort(&mut self) {
        self.messages.sort_by_key(|m| m.created_at);
    }

    /// Drop the oldest optimistic placeholder matching `confirmed`
    ///
    /// Placeholders match on content and type only; there is no
    /// correlation id. Returns whether one was removed.
    pub fn reconcile(&mut self, confirmed: &ChatMessage) -> bool {
        let position = self.messages.iter().position(|m| {
            m.is_optimistic && m.content == confirmed.content && m.msg_type == confirmed.msg_type
        });

        match position {
            Some(index) => {
                self.messages.remove(index);
                true
            }
            None => false,
        }
    }

    /// Add a confirmed message from the server
    ///
    /// The user's own messages first replace their optimistic placeholder.
    /// Returns whether a placeholder was replaced.
    pub fn receive(&mut self, message: ChatMessage, me: Option<UserId>) -> bool {
        let replaced = message.is_from(me) && self.reconcile(&message);
        self.insert(message);
        replaced
    }

    /// Remove the optimistic placeholder with local id `id`
    pub fn remove_optimistic(&mut self, id: i64) {
        if let Some(index) = self.messages.iter().position(|m| m.is_optimistic && m.id == id) {
            self.messages.remove(index);
        }
    }

    /// Merge a history page into the log
    ///
    /// Messages already present (received while the page was in flight)
    /// are kept; history entries with the same id are skipped.
    pub fn load_history(&mut self, history: Vec<ChatMessage>) {
        let present: HashSet<i64> = self
            .messages
            .iter()
            .filter(|m| !m.is_optimistic)
            .map(|m| m.id)
            .collect();
        self.messages
            .extend(history.into_iter().filter(|m| !present.contains(&m.id)));
        self.sort();
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
