//! WASM-target tests for krishi-platform (Node.js runtime).
//!
//! Covers the pieces that need no server: unpacking stream reads, adapter
//! construction, request aborts. Live fetch paths are exercised in the
//! browser.

use wasm_bindgen_test::*;

use js_sys::{Object, Reflect, Uint8Array};
use wasm_bindgen::JsValue;

use krishi_core::ports::{ConversationBackend, StreamTransport};
use krishi_platform::http::stream::{abort_on_release, decode_read_result};
use krishi_platform::{FetchStreamTransport, HttpConversationBackend};
use krishi_types::config::ClientConfig;
use krishi_types::ChatError;
use tokio_util::sync::CancellationToken;

fn read_result(done: bool, value: &JsValue) -> JsValue {
    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("done"), &JsValue::from_bool(done)).unwrap();
    Reflect::set(&result, &JsValue::from_str("value"), value).unwrap();
    result.into()
}

#[wasm_bindgen_test]
fn read_result_with_bytes() {
    let bytes = Uint8Array::from(&b"data: {\"chunk\":\"hi\"}\n"[..]);
    let decoded = decode_read_result(&read_result(false, &bytes.into())).unwrap();
    assert_eq!(decoded, Some(b"data: {\"chunk\":\"hi\"}\n".to_vec()));
}

#[wasm_bindgen_test]
fn read_result_done() {
    let decoded = decode_read_result(&read_result(true, &JsValue::UNDEFINED)).unwrap();
    assert_eq!(decoded, None);
}

#[wasm_bindgen_test]
fn read_result_with_wrong_value_type() {
    let result = decode_read_result(&read_result(false, &JsValue::from_str("text")));
    assert!(matches!(result, Err(ChatError::JsInterop(_))));
}

#[wasm_bindgen_test]
fn adapters_construct() {
    let backend = HttpConversationBackend::new(ClientConfig::default());
    assert_eq!(backend.backend_name(), "http");
    let transport: &dyn StreamTransport = &FetchStreamTransport::new();
    let _ = transport;
}

// ─── Abort guard ───

/// Let queued `spawn_local` tasks run.
async fn yield_to_tasks() {
    for _ in 0..2 {
        let _ = wasm_bindgen_futures::JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL)).await;
    }
}

#[wasm_bindgen_test]
async fn dropping_guard_aborts_request() {
    let controller = web_sys::AbortController::new().unwrap();
    let signal = controller.signal();
    let token = CancellationToken::new();
    let guard = abort_on_release(controller, &token);
    yield_to_tasks().await;
    assert!(!signal.aborted());

    drop(guard);
    yield_to_tasks().await;
    assert!(signal.aborted());
    assert!(!token.is_cancelled());
}

#[wasm_bindgen_test]
async fn cancelling_token_aborts_request() {
    let controller = web_sys::AbortController::new().unwrap();
    let signal = controller.signal();
    let token = CancellationToken::new();
    let _guard = abort_on_release(controller, &token);

    token.cancel();
    yield_to_tasks().await;
    assert!(signal.aborted());
}
