//! IndexedDB object stores as rust futures.
//!
//! The top-level functions cover the common case of one database with one auto-keyed object store:
//!
//! ```no_run
//! use indexeddb_store::{insert, open_database, query_by_index, remove, OpenOptions};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Item {
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     id: Option<u32>,
//!     name: String,
//! }
//!
//! # async fn run() -> indexeddb_store::Result<()> {
//! let options = OpenOptions::new("demo").store("items").index("name");
//! let db = open_database(&options).await?;
//!
//! insert(&db, "items", &Item { id: None, name: "a".into() }).await?;
//! let item: Option<Item> = query_by_index(&db, "items", "name", "a").await?;
//! remove(&db, "items", item.and_then(|item| item.id).unwrap_or_default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`IndexedDb`], [`Transaction`] and [`ObjectStore`] give direct access when that isn't enough.

#[macro_use]
mod macros;

mod adapter;
mod convert;
mod db;
mod error;
mod key;
mod object_store;
mod request;
mod schema;
mod transaction;

pub use crate::{
    adapter::{
        get, get_all, insert, open_database, query_by_index, read, remove, update, Read,
    },
    db::{delete_database, open, DbDuringUpgrade, IndexedDb},
    error::{Error, Result},
    key::{Key, Keyed},
    object_store::{Index, KeyPath, ObjectStore, ObjectStoreDuringUpgrade, TransactionObjectStore},
    schema::{
        IndexDescriptor, IndexOptions, IndexSpec, OpenOptions, DEFAULT_STORE_NAME,
        PRIMARY_KEY_PATH,
    },
    transaction::{Transaction, TransactionMode},
};
