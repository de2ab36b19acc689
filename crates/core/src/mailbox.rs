// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker mailbox messages with at-least-once delivery tracking.
//!
//! A message records when it was queued for notification (`notified_at_ms`)
//! and when delivery was verified via the dispatch engine
//! (`delivered_at_ms`). Until `delivered_at_ms` is set the message is a
//! candidate for re-dispatch; the dedupe key keeps re-dispatch idempotent.

use serde::{Deserialize, Serialize};

use crate::worker::WorkerName;

crate::define_id! {
    /// Unique identifier for a mailbox message, also its dedupe key.
    pub struct MessageId;
}

/// A single message addressed to one worker's mailbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxMessage {
    pub id: MessageId,
    pub from: WorkerName,
    pub to: WorkerName,
    pub body: String,
    pub created_at_ms: u64,
    /// Set once this message has been queued as a dispatch request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at_ms: Option<u64>,
    /// Set once the dispatch engine has verified delivery into the pane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at_ms: Option<u64>,
}

impl MailboxMessage {
    pub fn new(
        id: MessageId,
        from: WorkerName,
        to: WorkerName,
        body: String,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            from,
            to,
            body,
            created_at_ms,
            notified_at_ms: None,
            delivered_at_ms: None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_at_ms.is_some()
    }

    pub fn needs_notify(&self) -> bool {
        self.notified_at_ms.is_none()
    }
}

/// One worker's mailbox: an append-only, ordered list of messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mailbox {
    pub messages: Vec<MailboxMessage>,
}

impl Mailbox {
    pub fn push(&mut self, message: MailboxMessage) {
        self.messages.push(message);
    }

    pub fn undelivered(&self) -> impl Iterator<Item = &MailboxMessage> {
        self.messages.iter().filter(|m| !m.is_delivered())
    }

    pub fn find_mut(&mut self, id: &MessageId) -> Option<&mut MailboxMessage> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
