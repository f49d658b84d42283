//! What the database should look like when it is first created.

use serde::{Deserialize, Deserializer, Serialize};

use crate::object_store::KeyPath;

/// The store name used when none is given.
pub const DEFAULT_STORE_NAME: &str = "common_table";

/// The key path of the primary key of every store this crate creates.
pub const PRIMARY_KEY_PATH: &str = "id";

/// Options for an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexOptions {
    /// Reject records whose indexed value is already present.
    pub unique: bool,
    /// Index each element of an array value separately.
    pub multi_entry: bool,
}

/// A secondary index to create along with the object store.
///
/// Deserializes from either a bare field name, or an object of the form
/// `{ "name": "byName", "type": "name", "opt": { "unique": true } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexSpec {
    /// Index called `field` over `field`, default options.
    Simple(String),
    Detailed {
        name: String,
        /// Defaults to the index name.
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        key_path: Option<KeyPath>,
        #[serde(rename = "opt", default, deserialize_with = "null_as_default")]
        options: IndexOptions,
    },
}

/// `"opt": null` means default options.
fn null_as_default<'de, D>(deserializer: D) -> Result<IndexOptions, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IndexOptions>::deserialize(deserializer)?.unwrap_or_default())
}

impl IndexSpec {
    pub fn detailed(
        name: impl Into<String>,
        key_path: impl Into<KeyPath>,
        options: IndexOptions,
    ) -> Self {
        IndexSpec::Detailed {
            name: name.into(),
            key_path: Some(key_path.into()),
            options,
        }
    }

    /// Resolve the shorthand forms.
    pub fn normalize(&self) -> IndexDescriptor {
        match self {
            IndexSpec::Simple(field) => IndexDescriptor {
                name: field.clone(),
                key_path: KeyPath::Single(field.clone()),
                options: IndexOptions::default(),
            },
            IndexSpec::Detailed {
                name,
                key_path,
                options,
            } => IndexDescriptor {
                name: name.clone(),
                key_path: match key_path {
                    Some(KeyPath::None) | None => KeyPath::Single(name.clone()),
                    Some(path) => path.clone(),
                },
                options: *options,
            },
        }
    }
}

impl From<&str> for IndexSpec {
    fn from(field: &str) -> Self {
        IndexSpec::Simple(field.to_owned())
    }
}

impl From<String> for IndexSpec {
    fn from(field: String) -> Self {
        IndexSpec::Simple(field)
    }
}

/// A fully resolved index definition.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    pub key_path: KeyPath,
    pub options: IndexOptions,
}

/// Which database to open, and the schema to create if it doesn't exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOptions {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_store_name")]
    pub store_name: String,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

fn default_version() -> u32 {
    1
}

fn default_store_name() -> String {
    DEFAULT_STORE_NAME.to_owned()
}

impl OpenOptions {
    pub fn new(name: impl Into<String>) -> Self {
        OpenOptions {
            name: name.into(),
            version: default_version(),
            store_name: default_store_name(),
            indexes: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn store(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = store_name.into();
        self
    }

    pub fn index(mut self, index: impl Into<IndexSpec>) -> Self {
        self.indexes.push(index.into());
        self
    }

    pub fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes.iter().map(IndexSpec::normalize).collect()
    }
}
