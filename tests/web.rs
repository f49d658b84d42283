#![cfg(target_arch = "wasm32")]

use indexeddb_store::{
    delete_database, get, get_all, insert, open_database, query_by_index, read, remove, update,
    Error, IndexOptions, IndexSpec, IndexedDb, Key, KeyPath, Keyed, OpenOptions, Read,
    TransactionMode,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

fn item(name: &str) -> Item {
    Item {
        name: name.into(),
        tag: None,
    }
}

async fn fresh(options: OpenOptions) -> IndexedDb {
    delete_database(&options.name)
        .await
        .expect("Failed to delete database");
    open_database(&options)
        .await
        .expect("Failed to open database")
}

#[wasm_bindgen_test]
async fn open_creates_store_and_indexes() {
    let db = fresh(
        OpenOptions::new("web-open")
            .store("items")
            .index("name")
            .index(IndexSpec::detailed(
                "byTag",
                "tag",
                IndexOptions {
                    unique: true,
                    multi_entry: false,
                },
            )),
    )
    .await;

    assert_eq!(db.name(), "web-open");
    assert_eq!(db.version(), 1);
    assert_eq!(db.object_store_names(), vec!["items"]);

    let transaction = db.transaction("items", TransactionMode::Readonly).unwrap();
    let store = transaction.object_store("items").unwrap();
    assert_eq!(store.key_path(), KeyPath::Single("id".into()));
    assert!(store.auto_increment());
    assert_eq!(store.index_names(), vec!["byTag", "name"]);

    let by_tag = store.index("byTag").unwrap();
    assert_eq!(by_tag.key_path(), KeyPath::Single("tag".into()));
    assert!(by_tag.unique());
    assert!(!by_tag.multi_entry());
}

#[wasm_bindgen_test]
async fn default_store_name() {
    let db = fresh(OpenOptions::new("web-default-store")).await;
    assert_eq!(db.object_store_names(), vec!["common_table"]);
}

#[wasm_bindgen_test]
async fn reopening_keeps_the_store() {
    let options = OpenOptions::new("web-reopen").store("items").index("name");
    let first = fresh(options.clone()).await;
    insert(&first, "items", &item("kept")).await.unwrap();
    first.close();

    let second = open_database(&options).await.expect("Failed to reopen");
    let items: Vec<Item> = get_all(&second, "items").await.unwrap();
    assert_eq!(items, vec![item("kept")]);
}

#[wasm_bindgen_test]
async fn version_bump_leaves_existing_store_alone() {
    let options = OpenOptions::new("web-version-bump").store("items");
    let db = fresh(options.clone()).await;
    insert(&db, "items", &item("a")).await.unwrap();
    db.close();

    let db = open_database(&options.version(2).index("name"))
        .await
        .expect("Upgrading an existing store should not fail");
    assert_eq!(db.version(), 2);

    let transaction = db.transaction("items", TransactionMode::Readonly).unwrap();
    let store = transaction.object_store("items").unwrap();
    assert!(store.index_names().is_empty());
}

#[wasm_bindgen_test]
async fn opening_an_older_version_fails() {
    let options = OpenOptions::new("web-older-version").version(2);
    let db = fresh(options.clone()).await;
    db.close();

    let err = open_database(&options.version(1)).await.unwrap_err();
    assert!(matches!(err, Error::Open(_)));
    assert!(err.js_value().is_some());
}

#[wasm_bindgen_test]
async fn empty_reads() {
    let db = fresh(OpenOptions::new("web-empty-reads").store("items")).await;

    let all: Read<Item> = read(&db, "items", None).await.unwrap();
    assert_eq!(all, Read::All(Vec::new()));

    let one: Read<Item> = read(&db, "items", Some(Key::from(42))).await.unwrap();
    assert_eq!(one, Read::One(None));
}

#[wasm_bindgen_test]
async fn insert_then_read_returns_the_assigned_key() {
    let db = fresh(OpenOptions::new("web-round-trip").store("items")).await;

    insert(&db, "items", &Keyed::new(item("a"))).await.unwrap();
    insert(&db, "items", &Keyed::new(item("b"))).await.unwrap();

    let first: Option<Keyed<Item>> = get(&db, "items", 1).await.unwrap();
    assert_eq!(first, Some(Keyed::with_id(1, item("a"))));

    let all: Vec<Keyed<Item>> = read(&db, "items", None).await.unwrap().into_vec();
    assert_eq!(
        all,
        vec![Keyed::with_id(1, item("a")), Keyed::with_id(2, item("b"))]
    );
}

#[wasm_bindgen_test]
async fn insert_rejects_a_duplicate_key() {
    let db = fresh(OpenOptions::new("web-duplicate").store("items")).await;

    insert(&db, "items", &Keyed::with_id(7, item("a"))).await.unwrap();
    let err = insert(&db, "items", &Keyed::with_id(7, item("b")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Write(_)));

    let stored: Option<Keyed<Item>> = get(&db, "items", 7).await.unwrap();
    assert_eq!(stored, Some(Keyed::with_id(7, item("a"))));
}

#[wasm_bindgen_test]
async fn unique_index_rejects_a_duplicate_value() {
    let db = fresh(
        OpenOptions::new("web-unique").store("items").index(IndexSpec::detailed(
            "name",
            "name",
            IndexOptions {
                unique: true,
                multi_entry: false,
            },
        )),
    )
    .await;

    insert(&db, "items", &item("a")).await.unwrap();
    let err = insert(&db, "items", &item("a")).await.unwrap_err();
    assert!(matches!(err, Error::Write(_)));
}

#[wasm_bindgen_test]
async fn update_without_id_inserts() {
    let db = fresh(OpenOptions::new("web-update-insert").store("items")).await;

    let key = update(&db, "items", &Keyed::new(item("a"))).await.unwrap();
    assert_eq!(key, Key::from(1));

    let stored: Option<Keyed<Item>> = get(&db, "items", key).await.unwrap();
    assert_eq!(stored, Some(Keyed::with_id(1, item("a"))));
}

#[wasm_bindgen_test]
async fn update_with_id_overwrites() {
    let db = fresh(OpenOptions::new("web-update-overwrite").store("items")).await;
    insert(&db, "items", &Keyed::new(item("a"))).await.unwrap();

    let changed = Keyed::with_id(
        1,
        Item {
            name: "a".into(),
            tag: Some("changed".into()),
        },
    );
    let key = update(&db, "items", &changed).await.unwrap();
    assert_eq!(key, Key::from(1));

    let all: Vec<Keyed<Item>> = get_all(&db, "items").await.unwrap();
    assert_eq!(all, vec![changed]);
}

#[wasm_bindgen_test]
async fn remove_missing_key_is_a_no_op() {
    let db = fresh(OpenOptions::new("web-remove-missing").store("items")).await;
    insert(&db, "items", &item("a")).await.unwrap();

    remove(&db, "items", 99).await.expect("Removing a missing key");

    let all: Vec<Item> = get_all(&db, "items").await.unwrap();
    assert_eq!(all, vec![item("a")]);
}

#[wasm_bindgen_test]
async fn query_by_index_finds_the_first_match() {
    let db = fresh(OpenOptions::new("web-query").store("items").index("name")).await;

    let missing: Option<Item> = query_by_index(&db, "items", "name", "a").await.unwrap();
    assert_eq!(missing, None);

    let tagged = |tag: &str| Item {
        name: "a".into(),
        tag: Some(tag.into()),
    };
    insert(&db, "items", &tagged("first")).await.unwrap();
    insert(&db, "items", &tagged("second")).await.unwrap();
    insert(&db, "items", &item("b")).await.unwrap();

    let found: Option<Keyed<Item>> = query_by_index(&db, "items", "name", "a").await.unwrap();
    assert_eq!(found, Some(Keyed::with_id(1, tagged("first"))));

    let missing: Option<Item> = query_by_index(&db, "items", "name", "c").await.unwrap();
    assert_eq!(missing, None);
}

#[wasm_bindgen_test]
async fn query_by_unknown_index_fails() {
    let db = fresh(OpenOptions::new("web-query-unknown").store("items")).await;

    let err = query_by_index::<Item>(&db, "items", "nope", "a")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Read(_)));
}

#[wasm_bindgen_test]
async fn unknown_store_fails() {
    let db = fresh(OpenOptions::new("web-unknown-store").store("items")).await;

    assert!(matches!(
        get_all::<Item>(&db, "other").await.unwrap_err(),
        Error::Read(_)
    ));
    assert!(matches!(
        insert(&db, "other", &item("a")).await.unwrap_err(),
        Error::Write(_)
    ));
}

#[wasm_bindgen_test]
async fn demo_scenario() {
    let db = fresh(
        OpenOptions::new("demo")
            .store("items")
            .index(IndexSpec::detailed("byName", "name", IndexOptions::default())),
    )
    .await;

    insert(&db, "items", &item("a")).await.expect("insert");

    let found: Option<Keyed<Item>> = query_by_index(&db, "items", "byName", "a")
        .await
        .expect("query");
    assert_eq!(found, Some(Keyed::with_id(1, item("a"))));

    remove(&db, "items", 1).await.expect("remove");

    let gone: Read<Keyed<Item>> = read(&db, "items", Some(1.into())).await.expect("read");
    assert!(gone.is_empty());
}
