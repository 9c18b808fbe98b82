//! Broadcast fan-out of session and planning events, one channel per topic.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{PlanningEvent, SessionEvent};

/// Channel an event is delivered on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Session lifecycle, applied and rejected moves, graph reloads
    Session,
    /// Plan resolution and deviation assessments
    Planning,
}

/// Any event the runtime publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Session(SessionEvent),
    Planning(PlanningEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Session(_) => Topic::Session,
            Event::Planning(_) => Topic::Planning,
        }
    }
}

/// Cloning the bus shares its channels. Slow subscribers lag and skip
/// events; publishing never blocks.
#[derive(Clone)]
pub struct EventBus {
    session: broadcast::Sender<Event>,
    planning: broadcast::Sender<Event>,
}

impl EventBus {
    /// 100 buffered events per topic.
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            session: broadcast::channel(capacity).0,
            planning: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Session => &self.session,
            Topic::Planning => &self.planning,
        }
    }

    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!(?topic, "event dropped, no subscribers");
        }
    }

    /// Receives events published after this call.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionId;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut session_rx = bus.subscribe(Topic::Session);
        let mut planning_rx = bus.subscribe(Topic::Planning);

        bus.publish(Event::Session(SessionEvent::Closed {
            session: SessionId(1),
        }));

        assert!(matches!(
            session_rx.recv().await,
            Ok(Event::Session(SessionEvent::Closed { .. }))
        ));
        assert!(planning_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        EventBus::new().publish(Event::Session(SessionEvent::GraphReloaded { generation: 1 }));
    }
}
