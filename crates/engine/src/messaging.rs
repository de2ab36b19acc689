// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox, broadcast, and inbox messaging, plus the dispatch queueing glue
//! that turns a message into a pane nudge (§4.4).

use omx_core::{
    DispatchRequest, DispatchRequestKind, DispatchRequestStatus, Mailbox, MailboxMessage, MessageId,
    RequestId, TeamEvent, TeamName, WorkerName,
};
use omx_storage::{with_file_lock, StateStore};

use crate::error::EngineError;

/// At-least-once guarantee: after this many unconfirmed send attempts the
/// request is promoted to `notified` anyway rather than retried forever.
pub const MAX_UNCONFIRMED_ATTEMPTS: u32 = 3;

/// Outcome of calling the runtime's `notify` callback for a dispatch
/// request, modeled as an explicit tagged variant rather than ambient
/// exception flow (§9 design note).
#[derive(Debug, Clone)]
pub enum NotifyOutcome {
    /// Delivery confirmed (e.g. `"sent"`, `"confirmed"`).
    Confirmed,
    /// Sent but not yet verified in the pane's input area.
    Unconfirmed,
    /// The transport reported a non-retriable failure.
    Failed(String),
    /// The notify callback raised instead of returning.
    Threw(String),
}

fn mailbox_path(store: &StateStore, team: &TeamName, worker: &WorkerName) -> Result<std::path::PathBuf, EngineError> {
    omx_storage::mailbox_path(&store.state_root(), team.as_str(), worker.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
}

fn load_mailbox(store: &StateStore, team: &TeamName, worker: &WorkerName) -> Result<Mailbox, EngineError> {
    let path = mailbox_path(store, team, worker)?;
    Ok(store.read_path(&path)?.unwrap_or_default())
}

fn save_mailbox(store: &StateStore, team: &TeamName, worker: &WorkerName, mailbox: &Mailbox) -> Result<(), EngineError> {
    let path = mailbox_path(store, team, worker)?;
    store.write_path(&path, mailbox)?;
    Ok(())
}

/// Append a direct message to `to`'s mailbox. Does not itself trigger
/// delivery — callers pair this with [`enqueue_mailbox_dispatch`].
pub fn send(
    store: &StateStore,
    team: &TeamName,
    from: &WorkerName,
    to: &WorkerName,
    body: impl Into<String>,
    message_id: MessageId,
    now_ms: u64,
) -> Result<MailboxMessage, EngineError> {
    let path = mailbox_path(store, team, to)?;
    with_file_lock(&path, || {
        let mut mailbox: Mailbox = store
            .read_path(&path)
            .map_err(|e| std::io::Error::other(e.to_string()))?
            .unwrap_or_default();
        let message = MailboxMessage::new(message_id, from.clone(), to.clone(), body.into(), now_ms);
        mailbox.push(message.clone());
        store
            .write_path(&path, &mailbox)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(message)
    })
    .map_err(|e| EngineError::MalformedState(e.to_string()))
}

/// Append a message to every recipient except `from` (§4.4.2).
pub fn broadcast(
    store: &StateStore,
    team: &TeamName,
    from: &WorkerName,
    recipients: &[WorkerName],
    body: impl Into<String>,
    mut next_id: impl FnMut() -> MessageId,
    now_ms: u64,
) -> Result<Vec<MailboxMessage>, EngineError> {
    let body = body.into();
    let mut sent = Vec::new();
    for to in recipients.iter().filter(|w| *w != from) {
        sent.push(send(store, team, from, to, body.clone(), next_id(), now_ms)?);
    }
    Ok(sent)
}

/// Replace a worker's `inbox.md` with a new instruction frame (§4.4.3).
pub fn replace_inbox(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    content: &str,
) -> Result<(), EngineError> {
    let path = omx_storage::worker_inbox_path(&store.state_root(), team.as_str(), worker.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    store.write_text(&path, content)?;
    Ok(())
}

fn append_event(store: &StateStore, team: &TeamName, event: &TeamEvent) -> Result<(), EngineError> {
    let path = omx_storage::team_events_path(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    store.append_jsonl(&path, event)?;
    Ok(())
}

pub(crate) fn dispatch_requests(store: &StateStore, team: &TeamName) -> Result<Vec<DispatchRequest>, EngineError> {
    let dir = omx_storage::dispatch_dir(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut requests = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| EngineError::MalformedState(e.to_string()))? {
        let entry = entry.map_err(|e| EngineError::MalformedState(e.to_string()))?;
        if let Some(req) = store.read_path::<DispatchRequest>(&entry.path())? {
            requests.push(req);
        }
    }
    requests.sort_by_key(|r| r.created_at_ms);
    Ok(requests)
}

fn find_pending_by_dedupe_key(
    store: &StateStore,
    team: &TeamName,
    dedupe_key: &str,
) -> Result<Option<DispatchRequest>, EngineError> {
    Ok(dispatch_requests(store, team)?
        .into_iter()
        .find(|r| r.dedupe_key == dedupe_key && r.status != DispatchRequestStatus::Failed))
}

/// Requests still eligible for draining: freshly queued or previously sent
/// but not yet confirmed in the pane (§4.6).
pub(crate) fn pending_requests(store: &StateStore, team: &TeamName) -> Result<Vec<DispatchRequest>, EngineError> {
    Ok(dispatch_requests(store, team)?
        .into_iter()
        .filter(|r| matches!(r.status, DispatchRequestStatus::Queued | DispatchRequestStatus::Unconfirmed))
        .collect())
}

pub(crate) fn dispatch_request_path(store: &StateStore, team: &TeamName, id: &RequestId) -> Result<std::path::PathBuf, EngineError> {
    omx_storage::dispatch_request_path(&store.state_root(), team.as_str(), id.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
}

/// Queue a mailbox-kind dispatch request. Idempotent by `message_id`: a
/// second call for the same message that still has a non-failed request
/// returns the existing id (§4.4 round-trip law).
pub fn enqueue_mailbox_dispatch(
    store: &StateStore,
    team: &TeamName,
    to_worker: &WorkerName,
    worker_index: u32,
    message_id: &MessageId,
    trigger_message: impl Into<String>,
    next_request_id: impl FnOnce() -> RequestId,
    now_ms: u64,
) -> Result<DispatchRequest, EngineError> {
    if let Some(existing) = find_pending_by_dedupe_key(store, team, message_id.as_str())? {
        return Ok(existing);
    }
    enqueue(
        store,
        team,
        to_worker,
        worker_index,
        DispatchRequestKind::Mailbox,
        message_id.as_str().to_string(),
        trigger_message,
        next_request_id,
        now_ms,
    )
}

/// Queue an inbox-kind dispatch request, deduped by a caller-supplied key
/// (typically `<worker>:<inbox-write-generation>`).
pub fn enqueue_inbox_dispatch(
    store: &StateStore,
    team: &TeamName,
    to_worker: &WorkerName,
    worker_index: u32,
    dedupe_key: impl Into<String>,
    trigger_message: impl Into<String>,
    next_request_id: impl FnOnce() -> RequestId,
    now_ms: u64,
) -> Result<DispatchRequest, EngineError> {
    let dedupe_key = dedupe_key.into();
    if let Some(existing) = find_pending_by_dedupe_key(store, team, &dedupe_key)? {
        return Ok(existing);
    }
    enqueue(
        store,
        team,
        to_worker,
        worker_index,
        DispatchRequestKind::Inbox,
        dedupe_key,
        trigger_message,
        next_request_id,
        now_ms,
    )
}

#[allow(clippy::too_many_arguments)]
fn enqueue(
    store: &StateStore,
    team: &TeamName,
    to_worker: &WorkerName,
    _worker_index: u32,
    kind: DispatchRequestKind,
    dedupe_key: String,
    trigger_message: impl Into<String>,
    next_request_id: impl FnOnce() -> RequestId,
    now_ms: u64,
) -> Result<DispatchRequest, EngineError> {
    let request = DispatchRequest::new(
        next_request_id(),
        team.clone(),
        to_worker.clone(),
        kind,
        trigger_message.into(),
        dedupe_key,
        now_ms,
    )
    .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    let path = dispatch_request_path(store, team, &request.id)?;
    store.write_path(&path, &request)?;
    Ok(request)
}

/// Apply a [`NotifyOutcome`] to a queued request, updating its status and
/// the originating mailbox message's `notified_at`/`delivered_at` per the
/// outcome table in §4.4.
pub fn apply_notify_outcome(
    store: &StateStore,
    team: &TeamName,
    request: &mut DispatchRequest,
    outcome: NotifyOutcome,
    now_ms: u64,
) -> Result<(), EngineError> {
    request.attempts += 1;
    request.last_attempt_at_ms = Some(now_ms);

    let mark_notified = match &outcome {
        NotifyOutcome::Confirmed => true,
        NotifyOutcome::Unconfirmed => {
            if request.attempts >= MAX_UNCONFIRMED_ATTEMPTS {
                true
            } else {
                request.status = DispatchRequestStatus::Unconfirmed;
                false
            }
        }
        NotifyOutcome::Failed(_) | NotifyOutcome::Threw(_) => {
            request.status = DispatchRequestStatus::Failed;
            false
        }
    };

    if mark_notified {
        request.status = DispatchRequestStatus::Sent;
        if request.kind == DispatchRequestKind::Mailbox {
            let message_id = MessageId::new(request.dedupe_key.clone());
            mark_notified_at(store, team, &request.target_worker, &message_id, now_ms)?;
        }
        append_event(
            store,
            team,
            &TeamEvent::MessageReceived {
                to_worker: request.target_worker.clone(),
                message_id: request.dedupe_key.clone(),
                at_ms: now_ms,
            },
        )?;
    }

    let path = dispatch_request_path(store, team, &request.id)?;
    store.write_path(&path, request)?;
    Ok(())
}

/// Record that the notify-hook drainer queued/delivered a mailbox message,
/// independent of the worker having read it (`delivered_at`).
pub fn mark_notified_at(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    message_id: &MessageId,
    now_ms: u64,
) -> Result<(), EngineError> {
    let path = mailbox_path(store, team, worker)?;
    with_file_lock(&path, || {
        let mut mailbox: Mailbox = store
            .read_path(&path)
            .map_err(|e| std::io::Error::other(e.to_string()))?
            .unwrap_or_default();
        if let Some(msg) = mailbox.find_mut(message_id) {
            msg.notified_at_ms = Some(now_ms);
        }
        store
            .write_path(&path, &mailbox)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(())
    })
    .map_err(|e| EngineError::MalformedState(e.to_string()))
}

/// Mark a mailbox message delivered (read) by its recipient.
pub fn mark_delivered(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    message_id: &MessageId,
    now_ms: u64,
) -> Result<(), EngineError> {
    let path = mailbox_path(store, team, worker)?;
    with_file_lock(&path, || {
        let mut mailbox: Mailbox = store
            .read_path(&path)
            .map_err(|e| std::io::Error::other(e.to_string()))?
            .unwrap_or_default();
        if let Some(msg) = mailbox.find_mut(message_id) {
            msg.delivered_at_ms = Some(now_ms);
        }
        store
            .write_path(&path, &mailbox)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(())
    })
    .map_err(|e| EngineError::MalformedState(e.to_string()))
}

/// List a worker's mailbox, optionally excluding already-delivered
/// messages (`mailbox_list`, §4.4).
pub fn list_mailbox(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    include_delivered: bool,
) -> Result<Vec<MailboxMessage>, EngineError> {
    let mailbox = load_mailbox(store, team, worker)?;
    Ok(if include_delivered {
        mailbox.messages
    } else {
        mailbox.messages.into_iter().filter(|m| !m.is_delivered()).collect()
    })
}

#[cfg(test)]
#[path = "messaging_tests.rs"]
mod tests;
