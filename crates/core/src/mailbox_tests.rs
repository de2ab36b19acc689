use super::*;
use crate::worker::WorkerName;

fn worker(name: &str) -> WorkerName {
    WorkerName::parse(name).unwrap()
}

#[test]
fn fresh_message_needs_notify_and_is_not_delivered() {
    let msg = MailboxMessage::new(
        MessageId::new("m1"),
        worker("leader-fixed"),
        worker("worker-1"),
        "hi".into(),
        100,
    );
    assert!(msg.needs_notify());
    assert!(!msg.is_delivered());
}

#[test]
fn mailbox_filters_undelivered() {
    let mut mailbox = Mailbox::default();
    let mut delivered = MailboxMessage::new(
        MessageId::new("m1"),
        worker("leader-fixed"),
        worker("worker-1"),
        "a".into(),
        100,
    );
    delivered.delivered_at_ms = Some(200);
    let pending = MailboxMessage::new(
        MessageId::new("m2"),
        worker("leader-fixed"),
        worker("worker-1"),
        "b".into(),
        150,
    );
    mailbox.push(delivered);
    mailbox.push(pending);

    let undelivered: Vec<_> = mailbox.undelivered().collect();
    assert_eq!(undelivered.len(), 1);
    assert_eq!(undelivered[0].id, MessageId::new("m2"));
}

#[test]
fn find_mut_allows_marking_delivered() {
    let mut mailbox = Mailbox::default();
    mailbox.push(MailboxMessage::new(
        MessageId::new("m1"),
        worker("leader-fixed"),
        worker("worker-1"),
        "a".into(),
        100,
    ));
    let msg = mailbox.find_mut(&MessageId::new("m1")).unwrap();
    msg.delivered_at_ms = Some(300);
    assert!(mailbox.messages[0].is_delivered());
}
