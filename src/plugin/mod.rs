//! Plugin registry
//!
//! Tracks plugin lifecycle (register, enable, mount, unmount, disable),
//! enforces declared dependencies and routes lifecycle events through the
//! [`EventBus`] and an optional [`HostNotifier`]. Hook failures are
//! reported as `plugin:error` events and never propagate.

pub mod bus;
pub mod store;

pub use bus::{CollectingNotifier, EventBus, HostNotifier, PluginEvent, SubscriptionId};
pub use store::{plugin_config_key, FileBackend, KeyValueBackend, MemoryBackend, PluginConfigStore, StoreError};

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Configuration mistakes surfaced to the caller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("plugin '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("plugin '{plugin}' depends on unregistered plugin '{dependency}'")]
    MissingDependency { plugin: String, dependency: String },

    #[error("plugin '{0}' is not registered")]
    NotRegistered(String),

    #[error("plugin '{plugin}' is required by '{dependent}'")]
    HasDependents { plugin: String, dependent: String },
}

/// A devtools extension managed by [`PluginRegistry`]
pub trait Plugin: Send {
    fn id(&self) -> &str;

    /// Ids of plugins that must be registered first
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Platform or environment check, consulted before mounting
    fn is_available(&self) -> bool {
        true
    }

    fn on_enable(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_disable(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_mount(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_unmount(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Registered,
    Enabled,
    Disabled,
    Mounted,
    Unmounted,
}

impl PluginState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PluginState::Enabled | PluginState::Mounted | PluginState::Unmounted)
    }
}

struct PluginEntry {
    plugin: Box<dyn Plugin>,
    state: PluginState,
    dependencies: Vec<String>,
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, PluginEntry>,
    /// Registration order; dependencies always precede dependents
    order: Vec<String>,
    bus: EventBus,
    notifier: Option<Arc<dyn HostNotifier>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifier(notifier: Arc<dyn HostNotifier>) -> Self {
        Self {
            notifier: Some(notifier),
            ..Self::default()
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), PluginError> {
        let id = plugin.id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(PluginError::AlreadyRegistered(id));
        }

        let dependencies = plugin.dependencies();
        if let Some(missing) = dependencies.iter().find(|dep| !self.plugins.contains_key(*dep)) {
            return Err(PluginError::MissingDependency {
                plugin: id,
                dependency: missing.clone(),
            });
        }

        info!("🔌 Registered plugin {}", id);
        self.plugins.insert(
            id.clone(),
            PluginEntry {
                plugin,
                state: PluginState::Registered,
                dependencies,
            },
        );
        self.order.push(id.clone());
        self.publish(PluginEvent::Registered { plugin: id });
        Ok(())
    }

    /// Removes a plugin, disabling (and unmounting) it first; refused while others depend on it
    pub fn unregister(&mut self, id: &str) -> Result<(), PluginError> {
        if !self.plugins.contains_key(id) {
            return Err(PluginError::NotRegistered(id.to_string()));
        }
        if let Some(dependent) = self
            .order
            .iter()
            .find(|other| self.plugins.get(*other).is_some_and(|e| e.dependencies.iter().any(|d| d == id)))
        {
            return Err(PluginError::HasDependents {
                plugin: id.to_string(),
                dependent: dependent.clone(),
            });
        }

        if self.state(id).is_some_and(|state| state.is_enabled()) {
            self.disable(id)?;
        }
        self.plugins.remove(id);
        self.order.retain(|other| other != id);
        info!("🔌 Unregistered plugin {}", id);
        self.publish(PluginEvent::Unregistered { plugin: id.to_string() });
        Ok(())
    }

    /// Returns false when the enable hook fails
    pub fn enable(&mut self, id: &str) -> Result<bool, PluginError> {
        let entry = self
            .plugins
            .get_mut(id)
            .ok_or_else(|| PluginError::NotRegistered(id.to_string()))?;
        if entry.state.is_enabled() {
            return Ok(true);
        }

        if let Err(e) = entry.plugin.on_enable() {
            self.report_failure(id, "enable", e);
            return Ok(false);
        }
        entry.state = PluginState::Enabled;
        debug!("plugin {} enabled", id);
        self.publish(PluginEvent::Enabled { plugin: id.to_string() });
        Ok(true)
    }

    /// Disables a plugin, unmounting it first if needed
    pub fn disable(&mut self, id: &str) -> Result<(), PluginError> {
        let state = self.state(id).ok_or_else(|| PluginError::NotRegistered(id.to_string()))?;
        if state == PluginState::Disabled {
            return Ok(());
        }
        if state == PluginState::Mounted {
            self.unmount_plugin(id);
        }

        let Some(entry) = self.plugins.get_mut(id) else {
            return Err(PluginError::NotRegistered(id.to_string()));
        };
        let result = entry.plugin.on_disable();
        entry.state = PluginState::Disabled;
        if let Err(e) = result {
            self.report_failure(id, "disable", e);
        }
        debug!("plugin {} disabled", id);
        self.publish(PluginEvent::Disabled { plugin: id.to_string() });
        Ok(())
    }

    /// Mounts an enabled, available plugin; anything else is a no-op returning false
    pub fn mount_plugin(&mut self, id: &str) -> bool {
        let Some(entry) = self.plugins.get_mut(id) else {
            return false;
        };
        if !matches!(entry.state, PluginState::Enabled | PluginState::Unmounted) {
            return false;
        }
        if !entry.plugin.is_available() {
            debug!("plugin {} unavailable on this platform, not mounting", id);
            return false;
        }

        if let Err(e) = entry.plugin.on_mount() {
            self.report_failure(id, "mount", e);
            return false;
        }
        entry.state = PluginState::Mounted;
        self.publish(PluginEvent::Mounted { plugin: id.to_string() });
        true
    }

    /// Unmounts a mounted plugin; the plugin counts as unmounted even if the hook fails
    pub fn unmount_plugin(&mut self, id: &str) -> bool {
        let Some(entry) = self.plugins.get_mut(id) else {
            return false;
        };
        if entry.state != PluginState::Mounted {
            return false;
        }

        let result = entry.plugin.on_unmount();
        entry.state = PluginState::Unmounted;
        if let Err(e) = result {
            self.report_failure(id, "unmount", e);
        }
        self.publish(PluginEvent::Unmounted { plugin: id.to_string() });
        true
    }

    /// Mounts every mountable plugin in registration order; returns how many mounted
    pub fn mount_all(&mut self) -> usize {
        let order = self.order.clone();
        order.iter().filter(|id| self.mount_plugin(id)).count()
    }

    /// Unmounts in reverse registration order
    pub fn unmount_all(&mut self) -> usize {
        let order = self.order.clone();
        order.iter().rev().filter(|id| self.unmount_plugin(id)).count()
    }

    /// Plugin-to-plugin notification on a custom topic
    pub fn notify(&mut self, source: &str, topic: &str, payload: serde_json::Value) -> usize {
        self.publish(PluginEvent::Message {
            source: source.to_string(),
            topic: topic.to_string(),
            payload,
        })
    }

    pub fn state(&self, id: &str) -> Option<PluginState> {
        self.plugins.get(id).map(|e| e.state)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    pub fn plugin_ids(&self) -> &[String] {
        &self.order
    }

    pub fn mounted(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.state(id) == Some(PluginState::Mounted))
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn report_failure(&mut self, id: &str, hook: &str, error: anyhow::Error) {
        warn!("⚠️ Plugin {} failed during {}: {:#}", id, hook, error);
        self.publish(PluginEvent::Error {
            plugin: id.to_string(),
            hook: hook.to_string(),
            message: format!("{:#}", error),
        });
    }

    fn publish(&mut self, event: PluginEvent) -> usize {
        if let Some(notifier) = &self.notifier {
            notifier.notify_host(&event);
        }
        self.bus.emit(&event)
    }
}
