use console_web::println;
use indexeddb_store::{
    insert, open_database, query_by_index, read, remove, IndexOptions, IndexSpec, Keyed,
    OpenOptions, Read,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    name: String,
}

async fn main(version: u32) -> indexeddb_store::Result<()> {
    let options = OpenOptions::new("demo")
        .version(version)
        .store("items")
        .index(IndexSpec::detailed("byName", "name", IndexOptions::default()));

    let db = open_database(&options).await?;
    println!("Opened {} at version {}", db.name(), db.version());

    insert(&db, "items", &Item { name: "a".into() }).await?;

    let found: Option<Keyed<Item>> = query_by_index(&db, "items", "byName", "a").await?;
    println!("Found by name: {:?}", found);

    if let Some(id) = found.and_then(|item| item.id) {
        remove(&db, "items", id.clone()).await?;

        let after: Read<Keyed<Item>> = read(&db, "items", Some(id)).await?;
        println!("After remove: {:?}", after);
    }

    Ok(())
}

#[wasm_bindgen(start)]
pub fn run() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let version = 1;

    spawn_local(async move {
        if let Err(e) = main(version).await {
            println!("Error: {}", e);
        }
    });
}
