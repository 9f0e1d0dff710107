pub mod api;
pub mod app;
pub mod engine;
pub mod error;
pub mod model;
pub mod storage;
pub mod submit;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
