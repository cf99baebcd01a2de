use std::path::PathBuf;

use serde_json::json;

use crate::kernel::context::{Context, TRACE_ID_KEY};

#[test]
fn test_background_is_empty() {
    let ctx = Context::background();
    assert!(ctx.value("anything").is_none());
    assert!(ctx.trace_id().is_none());
    assert!(ctx.plugin_paths().is_empty());
    assert!(ctx.remote_plugin_locations().is_empty());
}

#[test]
fn test_with_value_leaves_parent_untouched() {
    let parent = Context::background().with_value("tenant", "acme");
    let child = parent.with_value("attempt", 2);

    assert_eq!(child.value("tenant"), Some(&json!("acme")));
    assert_eq!(child.value("attempt"), Some(&json!(2)));
    assert!(parent.value("attempt").is_none());
}

#[test]
fn test_trace_id_round_trip() {
    let ctx = Context::background().with_trace_id("trace-42");
    assert_eq!(ctx.trace_id(), Some("trace-42"));
    assert_eq!(ctx.value(TRACE_ID_KEY), Some(&json!("trace-42")));
}

#[test]
fn test_trace_id_ignores_non_string_values() {
    let ctx = Context::background().with_value(TRACE_ID_KEY, 7);
    assert!(ctx.trace_id().is_none());
}

#[test]
fn test_plugin_locations_survive_value_derivation() {
    let ctx = Context::background()
        .with_plugin_paths(["plugins", "/opt/plugins"])
        .with_remote_plugin_locations(["https://plugins.example.com/index"])
        .with_trace_id("t");

    assert_eq!(
        ctx.plugin_paths(),
        &[PathBuf::from("plugins"), PathBuf::from("/opt/plugins")]
    );
    assert_eq!(ctx.remote_plugin_locations(), &["https://plugins.example.com/index".to_string()]);
    assert_eq!(ctx.trace_id(), Some("t"));
}
