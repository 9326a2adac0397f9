//! KrishiGPT App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the HTTP adapters, the chat session and the conversation
//! directory, and hands them to the egui UI.

mod app;
mod settings;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CANVAS_ID: &str = "krishi_canvas";

/// WASM entry point, called from index.html
#[wasm_bindgen(start)]
pub async fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("KrishiGPT WASM starting...");

    let Some(canvas) = find_canvas() else {
        log::error!("No canvas element with id '{}'", CANVAS_ID);
        return;
    };
    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async move {
        let started = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(app::KrishiApp::new(cc)))),
            )
            .await;
        if let Err(e) = started {
            log::error!("Failed to start eframe: {:?}", e);
        }
    });
}

fn find_canvas() -> Option<web_sys::HtmlCanvasElement> {
    gloo_utils::document()
        .get_element_by_id(CANVAS_ID)?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .ok()
}
