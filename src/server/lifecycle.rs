use crate::server::InstanceId;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const MAX_EVENTS: usize = 1000;

/// Instance lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceEventKind {
    /// A new instance was launched and became healthy
    Spawned,
    /// A healthy instance was handed out again
    Reused,
    /// A dead instance was replaced by a new one
    Respawned,
    /// A launch failed or never became healthy
    SpawnFailed,
    /// An instance was terminated
    Killed,
}

/// Instance lifecycle event
#[derive(Debug, Clone)]
pub struct InstanceEvent {
    /// Instance the event concerns, if one existed
    pub id: Option<InstanceId>,
    /// Port involved
    pub port: u16,
    /// Event type
    pub kind: InstanceEventKind,
    /// Event timestamp
    pub timestamp: Instant,
    /// Event details
    pub details: Option<String>,
}

/// Bounded history of instance lifecycle events
#[derive(Clone, Default)]
pub struct InstanceLifecycle {
    events: Arc<Mutex<VecDeque<InstanceEvent>>>,
}

impl InstanceLifecycle {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, dropping the oldest once the history is full
    pub fn record(
        &self,
        id: Option<InstanceId>,
        port: u16,
        kind: InstanceEventKind,
        details: Option<String>,
    ) {
        let event = InstanceEvent {
            id,
            port,
            kind,
            timestamp: Instant::now(),
            details,
        };

        // A poisoned lock only means a panic elsewhere mid-push; the queue is still usable.
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() == MAX_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Recent events, newest first
    pub fn recent(&self, limit: Option<usize>) -> Vec<InstanceEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let limit = limit.unwrap_or(events.len());
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Number of recorded events of `kind`
    pub fn count(&self, kind: InstanceEventKind) -> usize {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.iter().filter(|e| e.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_is_newest_first() {
        let lifecycle = InstanceLifecycle::new();
        let id = InstanceId::new();

        lifecycle.record(Some(id), 8080, InstanceEventKind::Spawned, None);
        lifecycle.record(Some(id), 8080, InstanceEventKind::Reused, None);
        lifecycle.record(Some(id), 8080, InstanceEventKind::Killed, Some("shutdown".to_string()));

        let events = lifecycle.recent(Some(2));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, InstanceEventKind::Killed);
        assert_eq!(events[0].details.as_deref(), Some("shutdown"));
        assert_eq!(events[1].kind, InstanceEventKind::Reused);
        assert_eq!(lifecycle.count(InstanceEventKind::Spawned), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let lifecycle = InstanceLifecycle::new();
        for port in 0..(MAX_EVENTS as u16 + 5) {
            lifecycle.record(None, port, InstanceEventKind::SpawnFailed, None);
        }

        let events = lifecycle.recent(None);
        assert_eq!(events.len(), MAX_EVENTS);
        assert_eq!(events.last().map(|e| e.port), Some(5));
    }
}
