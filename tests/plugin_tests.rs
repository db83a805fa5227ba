//! Integration tests for the plugin registry and its config store

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempfile::tempdir;

use framescope::plugin::{
    plugin_config_key, CollectingNotifier, FileBackend, Plugin, PluginConfigStore, PluginEvent, PluginRegistry,
    PluginState,
};

/// FPS overlay plugin forwarding samples to subscribers
struct FpsOverlay;

impl Plugin for FpsOverlay {
    fn id(&self) -> &str {
        "fps-overlay"
    }
}

struct JankInspector;

impl Plugin for JankInspector {
    fn id(&self) -> &str {
        "jank-inspector"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["fps-overlay".to_string()]
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct OverlayPosition {
    x: f64,
    y: f64,
}

#[test]
fn test_dependent_plugins_lifecycle() {
    let notifier = Arc::new(CollectingNotifier::new());
    let mut registry = PluginRegistry::with_notifier(notifier.clone());

    registry.register(Box::new(FpsOverlay)).unwrap();
    registry.register(Box::new(JankInspector)).unwrap();
    for id in ["fps-overlay", "jank-inspector"] {
        assert!(registry.enable(id).unwrap());
    }
    assert_eq!(registry.mount_all(), 2);

    // Disabling unmounts first
    registry.disable("jank-inspector").unwrap();
    assert_eq!(registry.state("jank-inspector"), Some(PluginState::Disabled));
    assert_eq!(registry.mounted(), vec!["fps-overlay"]);

    assert!(registry.unregister("fps-overlay").is_err());
    registry.unregister("jank-inspector").unwrap();
    registry.unregister("fps-overlay").unwrap();

    let topics: Vec<String> = notifier.events().iter().map(|e| e.topic().to_string()).collect();
    assert_eq!(topics.first().map(String::as_str), Some("plugin:registered"));
    assert!(topics.iter().any(|t| t == "plugin:unmounted"));
    assert_eq!(topics.last().map(String::as_str), Some("plugin:unregistered"));
    assert!(!topics.iter().any(|t| t == "plugin:error"));
}

#[test]
fn test_plugins_talk_over_the_bus() {
    let notifier = Arc::new(CollectingNotifier::new());
    let mut registry = PluginRegistry::with_notifier(notifier.clone());
    registry.register(Box::new(FpsOverlay)).unwrap();

    let payload = serde_json::json!({ "fps": 42.0, "severity": "moderate" });
    registry.notify("fps-overlay", "jank:detected", payload.clone());

    let forwarded = notifier
        .events()
        .into_iter()
        .find(|e| matches!(e, PluginEvent::Message { .. }))
        .unwrap();
    assert_eq!(
        forwarded,
        PluginEvent::Message {
            source: "fps-overlay".into(),
            topic: "jank:detected".into(),
            payload,
        }
    );
}

#[tokio::test]
async fn test_plugin_config_survives_restart() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("plugins.json");
    let key = plugin_config_key("fps-overlay");

    let store = PluginConfigStore::new(FileBackend::new(&path));
    store.set_json(&key, &OverlayPosition { x: 12.0, y: 48.5 }).await?;
    drop(store);

    let store = PluginConfigStore::new(FileBackend::new(&path));
    let position: Option<OverlayPosition> = store.get_json(&key).await;
    assert_eq!(position, Some(OverlayPosition { x: 12.0, y: 48.5 }));
    assert!(store.is_persistent());

    Ok(())
}
