//! WASM-target tests for krishi-types.
//!
//! Mirrors a subset of the native unit tests under wasm32-unknown-unknown
//! via `wasm-pack test --node`. Id generation and timestamps go through
//! `uuid`/`chrono` browser shims there, so those paths get checked too.

use wasm_bindgen_test::*;

use krishi_types::message::*;
use krishi_types::conversation::*;
use krishi_types::wire::*;
use krishi_types::config::*;
use krishi_types::error::*;

#[wasm_bindgen_test]
fn local_ids_are_unique() {
    let a = LocalId::new();
    let b = LocalId::new();
    assert_ne!(a, b);
}

#[wasm_bindgen_test]
fn message_timestamps_are_set() {
    let msg = Message::user(MessageId::Pending(LocalId::new()), "hi");
    assert!(!msg.created_at.is_empty());
}

#[wasm_bindgen_test]
fn conversation_record_turn() {
    let mut conv = Conversation::new("c1", "Rice", "2026-01-01T00:00:00Z");
    conv.record_turn("Transplant after 25 days.");
    assert_eq!(conv.message_count, 2);
    assert!(conv.updated_at.is_some());
}

#[wasm_bindgen_test]
fn stream_frame_parses() {
    let frame: StreamFrame =
        serde_json::from_str(r#"{"chunk":"","done":true,"full_text":"ok"}"#).unwrap();
    assert!(frame.done);
    assert_eq!(frame.full_text.as_deref(), Some("ok"));
}

#[wasm_bindgen_test]
fn endpoints_use_configured_origin() {
    let config = ClientConfig {
        api_base: "https://krishi.example".to_string(),
        ..ClientConfig::default()
    };
    assert!(config.endpoints().send_stream().starts_with("https://krishi.example/"));
}

#[wasm_bindgen_test]
fn error_from_http() {
    let err = ChatError::from_http(403, r#"{"detail":"Not authorized"}"#);
    assert_eq!(err.to_string(), "Not authorized");
}
