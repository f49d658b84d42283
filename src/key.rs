use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};

/// A primary or index key.
///
/// IndexedDB also accepts dates and binary keys; those are not representable here.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Number(f64),
    String(String),
    Array(Vec<Key>),
}

impl Key {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Key::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn to_js(&self) -> JsValue {
        match self {
            Key::Number(n) => JsValue::from_f64(*n),
            Key::String(s) => JsValue::from_str(s),
            Key::Array(keys) => keys
                .iter()
                .map(Key::to_js)
                .collect::<js_sys::Array>()
                .into(),
        }
    }

    /// Read back a key the store produced. Returns `None` for key types we can't represent.
    pub(crate) fn from_js(val: &JsValue) -> Option<Key> {
        if let Some(n) = val.as_f64() {
            Some(Key::Number(n))
        } else if let Some(s) = val.as_string() {
            Some(Key::String(s))
        } else if let Some(arr) = val.dyn_ref::<js_sys::Array>() {
            arr.iter()
                .map(|el| Key::from_js(&el))
                .collect::<Option<Vec<_>>>()
                .map(Key::Array)
        } else {
            None
        }
    }
}

macro_rules! number_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(n: $ty) -> Key {
                    Key::Number(n as f64)
                }
            }
        )*
    };
}

number_key!(i32, u32, f32, f64);

/// The largest integer an `f64` holds exactly (`Number.MAX_SAFE_INTEGER`).
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// 64-bit integers only convert when no precision is lost; the error hands the value back.
impl TryFrom<u64> for Key {
    type Error = u64;

    fn try_from(n: u64) -> Result<Key, u64> {
        if n <= MAX_SAFE_INTEGER {
            Ok(Key::Number(n as f64))
        } else {
            Err(n)
        }
    }
}

impl TryFrom<i64> for Key {
    type Error = i64;

    fn try_from(n: i64) -> Result<Key, i64> {
        if n.unsigned_abs() <= MAX_SAFE_INTEGER {
            Ok(Key::Number(n as f64))
        } else {
            Err(n)
        }
    }
}

impl From<String> for Key {
    fn from(s: String) -> Key {
        Key::String(s)
    }
}

impl<'a> From<&'a str> for Key {
    fn from(s: &'a str) -> Key {
        Key::String(s.to_owned())
    }
}

impl<K: Into<Key>> From<Vec<K>> for Key {
    fn from(keys: Vec<K>) -> Key {
        Key::Array(keys.into_iter().map(Into::into).collect())
    }
}

/// A record together with its primary key.
///
/// Leave `id` as `None` to have the store assign one: the field is left out of the stored object
/// entirely, which is what an auto-incrementing key path needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyed<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Key>,
    #[serde(flatten)]
    pub value: T,
}

impl<T> Keyed<T> {
    pub fn new(value: T) -> Self {
        Keyed { id: None, value }
    }

    pub fn with_id(id: impl Into<Key>, value: T) -> Self {
        Keyed {
            id: Some(id.into()),
            value,
        }
    }
}
