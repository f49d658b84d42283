use std::{marker::PhantomData, ops::Deref};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use wasm_bindgen::{prelude::*, JsCast};

use crate::{
    convert,
    db::DbDuringUpgrade,
    error::{Error, Result},
    key::Key,
    request::IndexedDbRequest,
    schema::IndexDescriptor,
    transaction::Transaction,
};

/// An object store that was created during an upgrade.
///
/// Indexes can only be added while the upgrade is running.
#[derive(Debug)]
pub struct ObjectStoreDuringUpgrade<'a> {
    pub(crate) inner: ObjectStore,
    pub(crate) db: PhantomData<&'a DbDuringUpgrade>,
}

impl<'a> ObjectStoreDuringUpgrade<'a> {
    /// Create a secondary index on this store.
    pub fn create_index(
        &self,
        descriptor: &IndexDescriptor,
    ) -> std::result::Result<Index, JsValue> {
        let parameters = web_sys::IdbIndexParameters::new();
        js_sys::Reflect::set(
            &parameters,
            &"unique".into(),
            &descriptor.options.unique.into(),
        )?;
        js_sys::Reflect::set(
            &parameters,
            &"multiEntry".into(),
            &descriptor.options.multi_entry.into(),
        )?;

        let store = &self.inner.inner;
        let index = match &descriptor.key_path {
            KeyPath::Single(path) => store.create_index_with_str_and_optional_parameters(
                &descriptor.name,
                path,
                &parameters,
            )?,
            KeyPath::Multi(paths) => store.create_index_with_str_sequence_and_optional_parameters(
                &descriptor.name,
                &from_collection!(paths).into(),
                &parameters,
            )?,
            KeyPath::None => {
                return Err(format!("index \"{}\" needs a key path", descriptor.name).into())
            }
        };

        Ok(Index { inner: index })
    }
}

impl<'a> Deref for ObjectStoreDuringUpgrade<'a> {
    type Target = ObjectStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// An object store that is bound to a transaction.
#[derive(Debug)]
pub struct TransactionObjectStore<'a> {
    pub(crate) inner: ObjectStore,
    pub(crate) transaction: PhantomData<&'a Transaction<'a>>,
}

impl<'a> Deref for TransactionObjectStore<'a> {
    type Target = ObjectStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Base object store that gathers all the common object store functionality.
#[derive(Debug)]
pub struct ObjectStore {
    pub(crate) inner: web_sys::IdbObjectStore,
}

impl ObjectStore {
    /// The name of the object store.
    pub fn name(&self) -> String {
        self.inner.name()
    }

    /// The key path of the object store. No key path means keys are stored
    /// out-of-tree.
    pub fn key_path(&self) -> KeyPath {
        self.inner
            .key_path()
            .map(KeyPath::from)
            .unwrap_or(KeyPath::None)
    }

    /// Whether the store generates keys for records that don't have one.
    pub fn auto_increment(&self) -> bool {
        self.inner.auto_increment()
    }

    /// The names of the secondary indexes on this store.
    pub fn index_names(&self) -> Vec<String> {
        to_collection!(self.inner.index_names() => Vec<String> : push)
    }

    /// Get the value with the given key.
    ///
    /// # Arguments
    ///
    /// * `key` - The key that should be used to find the associated value in
    /// the store.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use indexeddb_store::{IndexedDb, KeyPath, TransactionMode};
    /// # futures::executor::block_on(async {
    /// # let db = IndexedDb::open("test", 1, |_, db| {
    /// #   db.create_object_store("test", KeyPath::None, false)?;
    /// #   Ok(())
    /// # }).await.expect("Failed to open indexed DB");
    /// let transaction = db.transaction("test", TransactionMode::Readonly).unwrap();
    /// let store = transaction.object_store("test").unwrap();
    ///
    /// let value: Option<String> = store
    ///     .get(&"Hello".into())
    ///     .await
    ///     .expect("Store error while fetching value");
    /// # });
    /// ```
    pub async fn get<V: DeserializeOwned>(&self, key: &Key) -> Result<Option<V>> {
        let request = self.inner.get(&key.to_js()).map_err(Error::Read)?;
        let object = IndexedDbRequest::new(request).await.map_err(Error::Read)?;

        if object.is_undefined() || object.is_null() {
            Ok(None)
        } else {
            Ok(Some(convert::from_js(&object)?))
        }
    }

    /// Get every value in the store, in key order.
    pub async fn get_all<V: DeserializeOwned>(&self) -> Result<Vec<V>> {
        let request = self.inner.get_all().map_err(Error::Read)?;
        let objects = IndexedDbRequest::new(request).await.map_err(Error::Read)?;

        if objects.is_undefined() || objects.is_null() {
            Ok(Vec::new())
        } else {
            convert::from_js(&objects)
        }
    }

    /// Add a value, failing if its key is already taken. Returns the key it was stored under.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use indexeddb_store::{IndexedDb, TransactionMode};
    /// # futures::executor::block_on(async {
    /// # let db = IndexedDb::open("test", 1, |_, db| {
    /// #   db.create_object_store("test", "id", true)?;
    /// #   Ok(())
    /// # }).await.expect("Failed to open indexed DB");
    /// let transaction = db.transaction("test", TransactionMode::ReadWrite).unwrap();
    /// let store = transaction.object_store("test").unwrap();
    ///
    /// let key = store.add(&serde_json::json!({ "name": "world" })).await.unwrap();
    /// transaction.done().await.unwrap();
    /// # });
    /// ```
    pub async fn add<V: Serialize + ?Sized>(&self, value: &V) -> Result<Key> {
        let value = convert::to_js(value)?;
        let request = self.inner.add(&value).map_err(Error::Write)?;
        let key = IndexedDbRequest::new(request).await.map_err(Error::Write)?;

        stored_key(key)
    }

    /// Insert or replace a value. Returns the key it was stored under.
    pub async fn put<V: Serialize + ?Sized>(&self, value: &V) -> Result<Key> {
        let value = convert::to_js(value)?;
        let request = self.inner.put(&value).map_err(Error::Write)?;
        let key = IndexedDbRequest::new(request).await.map_err(Error::Write)?;

        stored_key(key)
    }

    /// Delete the value with the given key. Deleting a key that isn't there succeeds.
    pub async fn delete(&self, key: &Key) -> Result<()> {
        let request = self.inner.delete(&key.to_js()).map_err(Error::Write)?;
        IndexedDbRequest::new(request).await.map_err(Error::Write)?;
        Ok(())
    }

    /// Open a secondary index of this store.
    pub fn index(&self, name: &str) -> Result<Index> {
        let index = self.inner.index(name).map_err(Error::Read)?;
        Ok(Index { inner: index })
    }
}

fn stored_key(key: JsValue) -> Result<Key> {
    Key::from_js(&key).ok_or_else(|| {
        Error::Write(JsValue::from_str(
            "the store returned a key type that can't be represented",
        ))
    })
}

/// A secondary index over one or more fields of the records in a store.
#[derive(Debug)]
pub struct Index {
    pub(crate) inner: web_sys::IdbIndex,
}

impl Index {
    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn key_path(&self) -> KeyPath {
        self.inner
            .key_path()
            .map(KeyPath::from)
            .unwrap_or(KeyPath::None)
    }

    pub fn unique(&self) -> bool {
        self.inner.unique()
    }

    pub fn multi_entry(&self) -> bool {
        self.inner.multi_entry()
    }

    /// The first record, in index order, whose indexed value equals `value`.
    pub async fn get<V: DeserializeOwned>(&self, value: &Key) -> Result<Option<V>> {
        let request = self.inner.get(&value.to_js()).map_err(Error::Read)?;
        let object = IndexedDbRequest::new(request).await.map_err(Error::Read)?;

        if object.is_undefined() || object.is_null() {
            Ok(None)
        } else {
            Ok(Some(convert::from_js(&object)?))
        }
    }
}

/// The path to the key in an object store.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPath {
    /// Keys are stored *out-of-tree*.
    None,
    /// The path to the single key.
    Single(String),
    /// The paths to all the parts of the key.
    Multi(Vec<String>),
}

impl From<KeyPath> for JsValue {
    fn from(key_path: KeyPath) -> JsValue {
        match key_path {
            KeyPath::None => JsValue::NULL,
            KeyPath::Single(path) => JsValue::from(path),
            KeyPath::Multi(paths) => from_collection!(paths).into(),
        }
    }
}

impl From<JsValue> for KeyPath {
    fn from(val: JsValue) -> KeyPath {
        if let Some(s) = val.as_string() {
            KeyPath::Single(s)
        } else if let Some(arr) = val.dyn_ref::<js_sys::Array>() {
            KeyPath::Multi(arr.iter().filter_map(|el| el.as_string()).collect())
        } else {
            KeyPath::None
        }
    }
}

impl From<String> for KeyPath {
    fn from(inner: String) -> KeyPath {
        KeyPath::Single(inner)
    }
}

impl<'a> From<&'a str> for KeyPath {
    fn from(inner: &'a str) -> KeyPath {
        KeyPath::Single(inner.to_owned())
    }
}
