use js_sys::Array;
use moin2md_core::config::Config;
use moin2md_core::selfcheck;
use wasm_bindgen::prelude::*;

/// Translate a Moin page. `options` has the same shape and snake_case keys
/// as the TOML config, e.g. `{ options: { strict: true }, links: { base_url: "..." } }`.
#[wasm_bindgen]
pub fn translate(source: &str, options: JsValue) -> Result<String, JsError> {
    let config = parse_options(options)?;
    moin2md_core::translate(source, &config).map_err(|e| JsError::new(&e.to_string()))
}

/// Run the grammar self-test. Returns one message per failure; empty means
/// everything passed.
#[wasm_bindgen(js_name = selfTest)]
pub fn self_test() -> Array {
    selfcheck::run_all()
        .failures
        .iter()
        .map(|failure| JsValue::from_str(&failure.to_string()))
        .collect()
}

fn parse_options(options: JsValue) -> Result<Config, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(Config::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| JsError::new(&format!("invalid options: {e}")))
}
