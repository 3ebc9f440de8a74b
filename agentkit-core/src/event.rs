//! The event bus: a single producer (the `Orchestrator`), a single consumer
//! (whichever front-end is attached). Spec §4.5 / §9 — represented as a
//! tagged variant internally even though the wire form (NDJSON, spec §6) is
//! string-typed.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::value::Value;

/// Reference capacity from spec §4.5: chosen to exceed the maximum events
/// emitted by any single prompt so sends back-pressure rather than drop.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequestData {
    pub tool: String,
    pub description: String,
    pub parameters: Value,
}

/// One observable step of a prompt's progress, emitted in causal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Plan {
        content: String,
    },
    RunTool {
        content: String,
    },
    Observation {
        content: String,
    },
    Final {
        content: String,
    },
    PermissionRequest {
        content: String,
        data: PermissionRequestData,
    },
    Error {
        content: String,
    },
}

impl Event {
    /// `final` and `error` end the current prompt from the front-end's
    /// perspective; `permission_request` only ends it in interactive mode
    /// (the caller decides that distinction, not this type).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Final { .. } | Event::Error { .. })
    }
}

/// Sole-sender half of the event bus, owned by the `Orchestrator`.
#[derive(Clone)]
pub struct EventSender(mpsc::Sender<Event>);

/// Sole-receiver half of the event bus, owned by the attached front-end.
pub struct EventReceiver(mpsc::Receiver<Event>);

pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSender(tx), EventReceiver(rx))
}

impl EventSender {
    /// Sends block (rather than drop) when the channel is full, which
    /// back-pressures the orchestrator by design (spec §4.5).
    pub async fn send(&self, event: Event) {
        if self.0.send(event).await.is_err() {
            tracing::warn!("event receiver dropped; front-end stopped reading");
        }
    }
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<Event> {
        self.0.recv().await
    }

    /// Drains whatever is already queued without waiting for more. Safe to
    /// call right after an `Orchestrator` call returns: every event it sent
    /// this call has already been delivered to the channel by then.
    pub fn drain_ready(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.0.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn event_round_trips_through_json() {
        let event = Event::PermissionRequest {
            content: "needs permission".into(),
            data: PermissionRequestData {
                tool: "cli".into(),
                description: "run a shell command".into(),
                parameters: Value::from_json(&serde_json::json!({"command": "ls"})),
            },
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["type"], "permission_request");
        assert_eq!(parsed["data"]["tool"], "cli");
    }

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (tx, mut rx) = event_channel();
        tx.send(Event::Plan {
            content: "thinking".into(),
        })
        .await;
        tx.send(Event::Final {
            content: "done".into(),
        })
        .await;

        assert!(matches!(rx.recv().await, Some(Event::Plan { .. })));
        assert!(matches!(rx.recv().await, Some(Event::Final { .. })));
    }
}
