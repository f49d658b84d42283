/// Copy a `DOMStringList` into a rust collection, e.g.
/// `to_collection!(list => Vec<String> : push)`.
macro_rules! to_collection {
    ($list:expr => $coll:ty : $method:ident) => {{
        let list: web_sys::DomStringList = $list;
        let mut out = <$coll>::new();
        for idx in 0..list.length() {
            if let Some(item) = list.item(idx) {
                out.$method(item);
            }
        }
        out
    }};
}

/// Build a JS array of strings from anything iterable over `AsRef<str>`.
macro_rules! from_collection {
    ($coll:expr) => {
        $coll
            .iter()
            .map(|s| wasm_bindgen::JsValue::from_str(AsRef::<str>::as_ref(s)))
            .collect::<js_sys::Array>()
    };
}
