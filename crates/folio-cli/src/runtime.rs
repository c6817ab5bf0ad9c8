// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use folio_app::{
    InternalEvent, Notification, NotificationKind, NotificationSink, RefreshTicket, RefreshTimer,
    ViewEvent,
};
use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Upper bound on waiting for a refresh to settle before giving up.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Sleeps on a worker thread, then posts the ticket's elapsed event unless
/// the ticket was cancelled in the meantime.
pub struct ThreadTimer {
    internal_tx: Sender<InternalEvent>,
}

impl ThreadTimer {
    pub fn new(internal_tx: Sender<InternalEvent>) -> Self {
        Self { internal_tx }
    }
}

impl RefreshTimer for ThreadTimer {
    fn schedule(&mut self, ticket: RefreshTicket, after: Duration) {
        let sender = self.internal_tx.clone();
        thread::spawn(move || {
            thread::sleep(after);
            if ticket.is_cancelled() {
                return;
            }
            let _ = sender.send(ticket.elapsed_event());
        });
    }
}

/// Writes notifications to a stream, one line each.
pub struct TerminalNotifier<W> {
    out: W,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> NotificationSink for TerminalNotifier<W> {
    fn notify(&mut self, notification: Notification) {
        let prefix = match notification.kind {
            NotificationKind::Info => "info",
            NotificationKind::Error => "error",
        };
        let _ = writeln!(
            self.out,
            "{prefix}: {}: {}",
            notification.title, notification.message
        );
    }
}

/// Blocks until the coordinator reports a settled refresh. Events for stale
/// tokens are handed to `handle` too and simply produce nothing.
pub fn wait_for_settle<F>(internal_rx: &Receiver<InternalEvent>, mut handle: F) -> Result<()>
where
    F: FnMut(InternalEvent) -> Vec<ViewEvent>,
{
    loop {
        let event = match internal_rx.recv_timeout(SETTLE_TIMEOUT) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                bail!("refresh did not settle within {}s", SETTLE_TIMEOUT.as_secs())
            }
            Err(RecvTimeoutError::Disconnected) => bail!("refresh timer channel closed"),
        };
        debug!(?event, "internal event received");
        if handle(event)
            .iter()
            .any(|event| matches!(event, ViewEvent::RefreshSettled))
        {
            return Ok(());
        }
    }
}
