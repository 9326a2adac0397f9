//! HTTP adapters over the browser `fetch()` API.
//! Uses gloo-net for requests and web-sys for the streamed body.

pub mod backend;
pub mod stream;

pub use backend::HttpConversationBackend;
pub use stream::FetchStreamTransport;

use gloo_net::http::Response;
use krishi_types::ChatError;
use wasm_bindgen::JsValue;

/// Turn a non-success response into an error carrying the server's message
pub(crate) async fn error_from_response(response: Response) -> ChatError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ChatError::from_http(status, &body)
}

pub(crate) fn network_error(e: gloo_net::Error) -> ChatError {
    ChatError::Network(e.to_string())
}

pub(crate) fn js_error(value: JsValue) -> ChatError {
    ChatError::JsInterop(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}
