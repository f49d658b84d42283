//! One-call helpers: each opens a single transaction on one store, issues a single request and
//! settles once the browser reports back.

use console_web::println;
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::JsValue;

use crate::{
    db::{self, DbDuringUpgrade, IndexedDb},
    error::{Error, Result},
    key::Key,
    schema::{IndexDescriptor, OpenOptions, PRIMARY_KEY_PATH},
    transaction::TransactionMode,
};

/// Open (or create) the database described by `options`.
///
/// On first creation the store `options.store_name` is created with an auto-incrementing `id`
/// key, along with its indexes. If the store is already there, nothing is changed, even when
/// `options.version` is newer: indexes are only ever created with their store.
pub async fn open_database(options: &OpenOptions) -> Result<IndexedDb> {
    let store_name = options.store_name.clone();
    let indexes = options.index_descriptors();

    db::open(&options.name, options.version, move |old_version, upgrader| {
        println!(
            "upgrading database \"{}\" from version {} to {}",
            upgrader.name(),
            old_version,
            upgrader.version()
        );
        create_store(upgrader, &store_name, &indexes)
    })
    .await
}

fn create_store(
    upgrader: &DbDuringUpgrade,
    store_name: &str,
    indexes: &[IndexDescriptor],
) -> std::result::Result<(), JsValue> {
    if upgrader.store_exists(store_name) {
        println!("object store \"{}\" already exists", store_name);
        return Ok(());
    }

    let store = upgrader.create_object_store(store_name, PRIMARY_KEY_PATH, true)?;
    println!("created object store \"{}\"", store_name);

    for descriptor in indexes {
        store.create_index(descriptor)?;
        println!(
            "created index \"{}\" on {:?}",
            descriptor.name, descriptor.key_path
        );
    }

    Ok(())
}

/// Add `record` to the store. Fails if a record with the same key, or the same value in a unique
/// index, already exists.
pub async fn insert<T: Serialize + ?Sized>(
    db: &IndexedDb,
    store_name: &str,
    record: &T,
) -> Result<()> {
    let transaction = db
        .transaction(store_name, TransactionMode::ReadWrite)
        .map_err(Error::Write)?;
    let store = transaction.object_store(store_name).map_err(Error::Write)?;

    store.add(record).await?;
    transaction.done().await.map_err(Error::Write)
}

/// The result of [`read`].
#[derive(Debug, Clone, PartialEq)]
pub enum Read<T> {
    /// A read by key. `None` when nothing is stored under the key.
    One(Option<T>),
    /// A read of the whole store, in key order.
    All(Vec<T>),
}

impl<T> Read<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            Read::One(record) => record.is_none(),
            Read::All(records) => records.is_empty(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Read::One(record) => record.into_iter().collect(),
            Read::All(records) => records,
        }
    }
}

/// Read the record stored under `key`, or every record when `key` is `None`.
pub async fn read<T: DeserializeOwned>(
    db: &IndexedDb,
    store_name: &str,
    key: Option<Key>,
) -> Result<Read<T>> {
    match key {
        Some(key) => get(db, store_name, key).await.map(Read::One),
        None => get_all(db, store_name).await.map(Read::All),
    }
}

/// Read the record stored under `key`.
pub async fn get<T: DeserializeOwned>(
    db: &IndexedDb,
    store_name: &str,
    key: impl Into<Key>,
) -> Result<Option<T>> {
    let transaction = db
        .transaction(store_name, TransactionMode::Readonly)
        .map_err(Error::Read)?;
    let store = transaction.object_store(store_name).map_err(Error::Read)?;

    store.get(&key.into()).await
}

/// Read every record in the store, in key order.
pub async fn get_all<T: DeserializeOwned>(db: &IndexedDb, store_name: &str) -> Result<Vec<T>> {
    let transaction = db
        .transaction(store_name, TransactionMode::Readonly)
        .map_err(Error::Read)?;
    let store = transaction.object_store(store_name).map_err(Error::Read)?;

    store.get_all().await
}

/// Insert `record`, or replace the record with the same key. Returns the key it was stored under.
pub async fn update<T: Serialize + ?Sized>(
    db: &IndexedDb,
    store_name: &str,
    record: &T,
) -> Result<Key> {
    let transaction = db
        .transaction(store_name, TransactionMode::ReadWrite)
        .map_err(Error::Write)?;
    let store = transaction.object_store(store_name).map_err(Error::Write)?;

    let key = store.put(record).await?;
    transaction.done().await.map_err(Error::Write)?;
    Ok(key)
}

/// Delete the record stored under `key`. Succeeds when there is no such record.
pub async fn remove(db: &IndexedDb, store_name: &str, key: impl Into<Key>) -> Result<()> {
    let transaction = db
        .transaction(store_name, TransactionMode::ReadWrite)
        .map_err(Error::Write)?;
    let store = transaction.object_store(store_name).map_err(Error::Write)?;

    store.delete(&key.into()).await?;
    transaction.done().await.map_err(Error::Write)
}

/// The first record, in index order, whose value in index `index_name` equals `value`.
pub async fn query_by_index<T: DeserializeOwned>(
    db: &IndexedDb,
    store_name: &str,
    index_name: &str,
    value: impl Into<Key>,
) -> Result<Option<T>> {
    let transaction = db
        .transaction(store_name, TransactionMode::Readonly)
        .map_err(Error::Read)?;
    let store = transaction.object_store(store_name).map_err(Error::Read)?;

    store.index(index_name)?.get(&value.into()).await
}
