//! Plugin events, the pub/sub bus and host notification

use log::trace;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle and cross-plugin events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginEvent {
    Registered { plugin: String },
    Unregistered { plugin: String },
    Enabled { plugin: String },
    Disabled { plugin: String },
    Mounted { plugin: String },
    Unmounted { plugin: String },
    /// A lifecycle hook failed; the registry kept running
    Error { plugin: String, hook: String, message: String },
    /// Plugin-to-plugin notification
    Message { source: String, topic: String, payload: serde_json::Value },
}

impl PluginEvent {
    pub fn topic(&self) -> &str {
        match self {
            PluginEvent::Registered { .. } => "plugin:registered",
            PluginEvent::Unregistered { .. } => "plugin:unregistered",
            PluginEvent::Enabled { .. } => "plugin:enabled",
            PluginEvent::Disabled { .. } => "plugin:disabled",
            PluginEvent::Mounted { .. } => "plugin:mounted",
            PluginEvent::Unmounted { .. } => "plugin:unmounted",
            PluginEvent::Error { .. } => "plugin:error",
            PluginEvent::Message { topic, .. } => topic,
        }
    }
}

/// One-way callback surfacing events to the embedding application
pub trait HostNotifier: Send + Sync {
    fn notify_host(&self, event: &PluginEvent);
}

/// Notifier that buffers events for later inspection
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    events: Mutex<Vec<PluginEvent>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PluginEvent> {
        self.events.lock().clone()
    }

    pub fn drain(&self) -> Vec<PluginEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl HostNotifier for CollectingNotifier {
    fn notify_host(&self, event: &PluginEvent) {
        self.events.lock().push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&PluginEvent) + Send>;

/// Topic-keyed pub/sub bus
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: HashMap<String, Vec<(SubscriptionId, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, topic: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&PluginEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers
            .entry(topic.to_string())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.subscribers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sub, _)| *sub == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Delivers `event` to every subscriber of its topic; returns the count
    pub fn emit(&mut self, event: &PluginEvent) -> usize {
        let Some(handlers) = self.subscribers.get_mut(event.topic()) else {
            return 0;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(event);
        }
        trace!("event {} delivered to {} subscribers", event.topic(), handlers.len());
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.get(topic).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = bus.subscribe("plugin:mounted", move |event| {
            sink.lock().push(event.clone());
        });

        let event = PluginEvent::Mounted { plugin: "fps".into() };
        assert_eq!(bus.emit(&event), 1);
        assert_eq!(bus.emit(&PluginEvent::Enabled { plugin: "fps".into() }), 0);
        assert_eq!(seen.lock().as_slice(), &[event.clone()]);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.emit(&event), 0);
    }

    #[test]
    fn test_message_topic_is_custom() {
        let event = PluginEvent::Message {
            source: "inspector".into(),
            topic: "inspector:selected".into(),
            payload: serde_json::json!({ "node": 4 }),
        };
        assert_eq!(event.topic(), "inspector:selected");
    }

    #[test]
    fn test_collecting_notifier() {
        let notifier = CollectingNotifier::new();
        notifier.notify_host(&PluginEvent::Registered { plugin: "a".into() });

        assert_eq!(notifier.events().len(), 1);
        assert_eq!(notifier.drain().len(), 1);
        assert!(notifier.events().is_empty());
    }
}
