// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{Notification, NotificationSink, RecordSource};

/// Floor on how long the loading state stays up after a refresh starts.
pub const MIN_REFRESH_DURATION: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    RefreshElapsed { token: u64 },
}

/// Handed to the timer; fires back into [`RefreshCoordinator::complete`].
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    token: u64,
    cancelled: Arc<AtomicBool>,
}

impl RefreshTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn elapsed_event(&self) -> InternalEvent {
        InternalEvent::RefreshElapsed { token: self.token }
    }
}

pub trait RefreshTimer {
    fn schedule(&mut self, ticket: RefreshTicket, after: Duration);
}

#[derive(Debug)]
struct RefreshHandle {
    token: u64,
    cancelled: Arc<AtomicBool>,
}

impl RefreshHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Started { token: u64 },
    AlreadyPending,
    Failed,
    TornDown,
}

#[derive(Debug)]
pub struct RefreshCoordinator<T> {
    timer: T,
    min_duration: Duration,
    live: Option<RefreshHandle>,
    last_token: u64,
    torn_down: bool,
}

impl<T: RefreshTimer> RefreshCoordinator<T> {
    pub fn new(timer: T) -> Self {
        Self::with_min_duration(timer, MIN_REFRESH_DURATION)
    }

    pub fn with_min_duration(timer: T, min_duration: Duration) -> Self {
        Self {
            timer,
            min_duration,
            live: None,
            last_token: 0,
            torn_down: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.live.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn request_refresh<S, N>(&mut self, source: &mut S, notifier: &mut N) -> RefreshOutcome
    where
        S: RecordSource + ?Sized,
        N: NotificationSink + ?Sized,
    {
        if self.torn_down {
            return RefreshOutcome::TornDown;
        }
        if let Some(live) = &self.live {
            debug!(token = live.token, "refresh already pending");
            return RefreshOutcome::AlreadyPending;
        }

        self.last_token = self.last_token.saturating_add(1);
        let token = self.last_token;
        let cancelled = Arc::new(AtomicBool::new(false));
        self.live = Some(RefreshHandle {
            token,
            cancelled: Arc::clone(&cancelled),
        });

        if let Err(error) = source.request_repopulate() {
            let reason = format!("{error:#}");
            warn!(token, %reason, "refresh signal failed");
            self.cancel_live();
            notifier.notify(Notification::error(
                "Could not load data",
                "The investments could not be refreshed -- try again",
            ));
            return RefreshOutcome::Failed;
        }

        info!(token, "refresh started");
        self.timer
            .schedule(RefreshTicket { token, cancelled }, self.min_duration);
        RefreshOutcome::Started { token }
    }

    /// Clears the pending flag. Stale, cancelled or post-teardown tokens do nothing.
    pub fn complete(&mut self, token: u64) -> bool {
        if self.torn_down {
            return false;
        }
        match &self.live {
            Some(live) if live.token == token => {
                self.live = None;
                info!(token, "refresh settled");
                true
            }
            _ => {
                debug!(token, "ignoring stale refresh completion");
                false
            }
        }
    }

    pub fn handle_internal(&mut self, event: InternalEvent) -> bool {
        match event {
            InternalEvent::RefreshElapsed { token } => self.complete(token),
        }
    }

    pub fn teardown(&mut self) {
        self.cancel_live();
        self.torn_down = true;
    }

    fn cancel_live(&mut self) {
        if let Some(live) = self.live.take() {
            live.cancel();
        }
    }
}
