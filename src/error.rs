use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong talking to the object store.
///
/// Errors raised by IndexedDB itself are kept as the `JsValue` the browser handed us (normally a
/// `DOMException`), so callers can inspect them exactly as they would in JavaScript.
#[derive(Debug, Error)]
pub enum Error {
    /// There is no `indexedDB` factory on the global object.
    #[error("indexedDB is not available: {0}")]
    NotAvailable(String),

    /// The database could not be opened or upgraded.
    #[error("failed to open database: {}", describe(.0))]
    Open(JsValue),

    /// An add, put or delete (or the transaction around it) failed.
    #[error("write failed: {}", describe(.0))]
    Write(JsValue),

    /// A get, getAll or index lookup failed.
    #[error("read failed: {}", describe(.0))]
    Read(JsValue),

    /// A record or key could not be converted to or from a JS value.
    #[error("can't convert value: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// The error object produced by the browser, if this error came from IndexedDB.
    pub fn js_value(&self) -> Option<&JsValue> {
        match self {
            Error::Open(e) | Error::Write(e) | Error::Read(e) => Some(e),
            Error::NotAvailable(_) | Error::Serde(_) => None,
        }
    }

    /// Hand the error back to JavaScript, unchanged where it originated there.
    pub fn into_js_value(self) -> JsValue {
        match self {
            Error::Open(e) | Error::Write(e) | Error::Read(e) => e,
            other => JsValue::from_str(&other.to_string()),
        }
    }
}

impl From<Error> for JsValue {
    fn from(err: Error) -> JsValue {
        err.into_js_value()
    }
}

fn describe(val: &JsValue) -> String {
    if let Some(exception) = val.dyn_ref::<web_sys::DomException>() {
        format!("{}: {}", exception.name(), exception.message())
    } else if let Some(s) = val.as_string() {
        s
    } else {
        format!("{:?}", val)
    }
}
