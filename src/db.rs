use std::marker::PhantomData;

use wasm_bindgen::{prelude::*, JsCast};

use crate::{
    error::{Error, Result},
    object_store::{KeyPath, ObjectStore, ObjectStoreDuringUpgrade},
    request::{IdbOpenDbRequest, IndexedDbRequest},
    transaction::{Transaction, TransactionMode},
};

/// A handle on the database during an upgrade.
#[derive(Debug)]
pub struct DbDuringUpgrade {
    db: IndexedDb,
}

impl DbDuringUpgrade {
    pub(crate) fn from_raw_unchecked(raw: JsValue) -> Self {
        let db = IndexedDb {
            inner: web_sys::IdbDatabase::unchecked_from_js(raw),
        };
        DbDuringUpgrade { db }
    }

    /// The name of the database.
    pub fn name(&self) -> String {
        self.db.name()
    }

    /// The version being upgraded to.
    pub fn version(&self) -> u32 {
        self.db.version()
    }

    /// Creates a new object store (roughly equivalent to a table)
    pub fn create_object_store<'a>(
        &'a self,
        name: &str,
        key_path: impl Into<KeyPath>,
        auto_increment: bool,
    ) -> std::result::Result<ObjectStoreDuringUpgrade<'a>, JsValue> {
        let key_path: KeyPath = key_path.into();
        let key_path: JsValue = key_path.into();
        let parameters = web_sys::IdbObjectStoreParameters::new();
        js_sys::Reflect::set(&parameters, &"keyPath".into(), &key_path)?;
        js_sys::Reflect::set(
            &parameters,
            &"autoIncrement".into(),
            &auto_increment.into(),
        )?;

        let store = self
            .db
            .inner
            .create_object_store_with_optional_parameters(name, &parameters)?;

        Ok(ObjectStoreDuringUpgrade {
            inner: ObjectStore { inner: store },
            db: PhantomData,
        })
    }

    /// Is there already a store with the given name?
    pub fn store_exists(&self, name: &str) -> bool {
        self.db.inner.object_store_names().contains(name)
    }
}

/// A handle on the database
///
/// Cloning is cheap and every clone refers to the same connection.
#[derive(Debug, Clone)]
pub struct IndexedDb {
    pub(crate) inner: web_sys::IdbDatabase,
}

impl IndexedDb {
    /// Open the database `name` at `version`.
    ///
    /// `on_upgrade_needed` runs when the database is created or its stored version is older than
    /// `version`, with the old version (0 for a new database). Returning an error aborts the
    /// upgrade and the open fails with that error.
    pub async fn open(
        name: &str,
        version: u32,
        on_upgrade_needed: impl FnOnce(u32, &DbDuringUpgrade) -> std::result::Result<(), JsValue>
            + 'static,
    ) -> Result<IndexedDb> {
        open(name, version, on_upgrade_needed).await
    }

    /// The name of the database.
    pub fn name(&self) -> String {
        self.inner.name()
    }

    /// The current version.
    pub fn version(&self) -> u32 {
        self.inner.version() as u32
    }

    /// Get the names of the object stores in this database.
    pub fn object_store_names(&self) -> Vec<String> {
        to_collection!(self.inner.object_store_names() => Vec<String> : push)
    }

    /// Start a transaction on one object store.
    ///
    /// All operations on data happen within a transaction, including read-only operations.
    /// The browser commits the transaction on its own once no requests are left pending.
    pub fn transaction(
        &self,
        store_name: &str,
        mode: TransactionMode,
    ) -> std::result::Result<Transaction<'_>, JsValue> {
        let inner = self
            .inner
            .transaction_with_str_and_mode(store_name, mode.into())?;

        Ok(Transaction::new(inner))
    }

    /// Close the connection once its pending transactions have finished.
    pub fn close(&self) {
        self.inner.close()
    }
}

/// Open (or create) a database, running `on_upgrade_needed` if the schema needs to be set up.
pub async fn open(
    name: &str,
    version: u32,
    on_upgrade_needed: impl FnOnce(u32, &DbDuringUpgrade) -> std::result::Result<(), JsValue>
        + 'static,
) -> Result<IndexedDb> {
    let request = factory()?
        .open_with_u32(name, version)
        .map_err(Error::Open)?;

    IdbOpenDbRequest::new(request, on_upgrade_needed)
        .await
        .map_err(Error::Open)
}

/// Delete a database and everything in it. Deleting a database that doesn't exist succeeds.
pub async fn delete_database(name: &str) -> Result<()> {
    let request = factory()?.delete_database(name).map_err(Error::Open)?;
    let request: web_sys::IdbRequest = request.unchecked_into();

    IndexedDbRequest::new(request).await.map_err(Error::Open)?;
    Ok(())
}

/// The `indexedDB` factory of the current global scope (window or worker).
fn factory() -> Result<web_sys::IdbFactory> {
    let idb = js_sys::Reflect::get(&js_sys::global(), &"indexedDB".into())
        .map_err(|_| Error::NotAvailable("can't read indexedDB from the global object".into()))?;

    if idb.is_undefined() || idb.is_null() {
        return Err(Error::NotAvailable("indexedDB is null or undefined".into()));
    }

    idb.dyn_into::<web_sys::IdbFactory>()
        .map_err(|_| Error::NotAvailable("indexedDB is not an IDBFactory".into()))
}
