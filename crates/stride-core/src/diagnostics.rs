//! Non-fatal failures.
//!
//! Several operations deliberately swallow errors (history mirroring, stats
//! publication, notification delivery). They are routed through a
//! [`Diagnostics`] sink instead of being dropped silently, so callers can
//! observe them and tests can assert on them.

use crate::error::{DeliveryError, RemoteError};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NonFatal {
    #[error("remote {operation} failed, switched to local mode: {source}")]
    RemoteFallback {
        operation: &'static str,
        source: RemoteError,
    },

    #[error("could not mirror completion history for {owner}: {source}")]
    HistorySync { owner: String, source: RemoteError },

    #[error("could not publish stats for team {team_id}: {source}")]
    StatsSync { team_id: String, source: RemoteError },

    #[error("could not publish activity for member {member_id}: {source}")]
    ActivitySync { member_id: String, source: RemoteError },

    #[error("notification delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("falling back to the default notification message: {0}")]
    MessageFallback(String),
}

pub trait Diagnostics: Send + Sync {
    fn report(&self, event: NonFatal);
}

/// Default sink: every event becomes a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, event: NonFatal) {
        tracing::warn!(target: "stride::nonfatal", "{}", event);
    }
}

/// Keeps every event in memory. Also forwards to tracing.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<NonFatal>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NonFatal> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, event: NonFatal) {
        TracingDiagnostics.report(event.clone());
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}
