//! Streaming POST over `fetch()` and `ReadableStream`.
//!
//! Every request owns an `AbortController`. It fires when the cancel
//! token does, and also as soon as the body stream (or the pending open
//! future) is dropped, so a reply that ended on a terminal frame does not
//! keep its connection open.

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{self, Either};
use futures::stream;
use gloo_net::http::Request;
use js_sys::{Reflect, Uint8Array};
use tokio_util::sync::CancellationToken;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{AbortController, ReadableStream, ReadableStreamDefaultReader};

use krishi_core::ports::{ByteStream, StreamTransport};
use krishi_types::{ChatError, Result};
use super::{error_from_response, js_error, network_error};

/// Browser transport for the streaming send endpoints
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchStreamTransport;

impl FetchStreamTransport {
    pub fn new() -> Self {
        Self
    }
}

/// Held for as long as the request is in use. Dropping it aborts the fetch.
pub struct AbortGuard {
    _release: oneshot::Sender<()>,
}

/// Abort `controller` once the token is cancelled or the guard is dropped
pub fn abort_on_release(controller: AbortController, cancel: &CancellationToken) -> AbortGuard {
    let (release, released) = oneshot::channel::<()>();
    let token = cancel.clone();
    spawn_local(async move {
        let cancelled = Box::pin(token.cancelled());
        match future::select(cancelled, released).await {
            Either::Left(_) => log::debug!("Stream request cancelled"),
            Either::Right(_) => log::debug!("Stream request released"),
        }
        controller.abort();
    });
    AbortGuard { _release: release }
}

#[async_trait(?Send)]
impl StreamTransport for FetchStreamTransport {
    async fn open(
        &self,
        url: &str,
        body: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ByteStream> {
        let controller = AbortController::new().map_err(js_error)?;
        let signal = controller.signal();
        let guard = abort_on_release(controller, cancel);

        let response = Request::post(url)
            .header("Accept", "text/event-stream")
            .abort_signal(Some(&signal))
            .json(body)
            .map_err(network_error)?
            .send()
            .await
            .map_err(|e| {
                if cancel.is_cancelled() {
                    ChatError::Cancelled
                } else {
                    network_error(e)
                }
            })?;

        if !response.ok() {
            return Err(error_from_response(response).await);
        }
        let body = response.body().ok_or(ChatError::EmptyBody)?;
        log::debug!("Stream open: {} ({})", url, response.status());
        Ok(byte_stream(body, guard))
    }
}

/// Adapt a body to the core's byte stream; ends after the first read error.
/// The guard lives in the stream state, so the fetch is aborted when the
/// stream ends or is dropped early.
fn byte_stream(body: ReadableStream, guard: AbortGuard) -> ByteStream {
    let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
    Box::pin(stream::unfold(Some((reader, guard)), |state| async move {
        let (reader, guard) = state?;
        match read_chunk(&reader).await {
            Ok(Some(bytes)) => Some((Ok(bytes), Some((reader, guard)))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    }))
}

/// One `reader.read()`. `Ok(None)` once the body is exhausted.
async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>> {
    let result = JsFuture::from(reader.read())
        .await
        .map_err(|e| ChatError::Network(format!("stream read failed: {:?}", e)))?;
    decode_read_result(&result)
}

/// Unpack the `{ done, value }` object a read resolves to
pub fn decode_read_result(result: &JsValue) -> Result<Option<Vec<u8>>> {
    let done = Reflect::get(result, &JsValue::from_str("done"))
        .map_err(js_error)?
        .as_bool()
        .unwrap_or(false);
    if done {
        return Ok(None);
    }
    let value = Reflect::get(result, &JsValue::from_str("value")).map_err(js_error)?;
    let chunk: Uint8Array = value
        .dyn_into()
        .map_err(|_| ChatError::JsInterop("stream chunk is not a Uint8Array".to_string()))?;
    Ok(Some(chunk.to_vec()))
}
