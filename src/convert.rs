//! Moving serde values across the JS boundary.
//!
//! Values go through JSON text: `serde_json` on the Rust side, `JSON.parse` / `JSON.stringify`
//! on the JS side. That keeps records plain objects, which is what key paths and indexes need.

use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::JsValue;

use crate::error::{Error, Result};

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    let json = serde_json::to_string(value)?;
    js_sys::JSON::parse(&json).map_err(Error::Write)
}

pub(crate) fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T> {
    let json = js_sys::JSON::stringify(value)
        .map(String::from)
        .map_err(Error::Read)?;
    Ok(serde_json::from_str(&json)?)
}
