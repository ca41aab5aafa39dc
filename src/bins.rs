// Bin model: the records stored inside a JSONBin document and the list
// wrapper that maps 1:1 onto a bin's JSON content.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::BinError;
use crate::store::Store;

/// A single bin record. Fields left out of a stored document decode to
/// their zero values (empty strings, `false`, the Unix epoch).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Bin {
    /// Build a bin locally with a fresh UUID and the current time.
    /// The name must contain something other than whitespace.
    pub fn new(name: &str, is_private: bool) -> Result<Self, BinError> {
        if name.trim().is_empty() {
            return Err(BinError::EmptyName);
        }
        Ok(Bin {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            is_private,
            created_at: Utc::now(),
        })
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visibility = if self.is_private { "private" } else { "public" };
        write!(
            f,
            "{} [{}] id={} created={}",
            self.name,
            visibility,
            self.id,
            self.created_at.to_rfc3339()
        )
    }
}

/// Ordered list of bins, serialized as `{"bins": [...]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BinList {
    #[serde(default)]
    pub bins: Vec<Bin>,
}

impl BinList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bin: Bin) {
        self.bins.push(bin);
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bin> {
        self.bins.iter()
    }

    /// Serialize to pretty-printed JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BinError> {
        serde_json::to_vec_pretty(self).map_err(BinError::Encode)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Load a local bin-list file. A missing or unreadable file, or one that
    /// does not parse, gives an empty list.
    pub fn load_or_default<S: Store>(store: &S, path: &Path) -> Self {
        let data = match store.read_plain(path) {
            Ok(data) => data,
            Err(err) => {
                if !err.is_not_found() {
                    warn!(path = %path.display(), error = %err, "could not read bin list, starting empty");
                }
                return BinList::new();
            }
        };
        match BinList::from_bytes(&data) {
            Ok(list) => list,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "bin list is not valid JSON, starting empty");
                BinList::new()
            }
        }
    }
}

impl<'a> IntoIterator for &'a BinList {
    type Item = &'a Bin;
    type IntoIter = std::slice::Iter<'a, Bin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

/// Append `bin` to the bin list stored at `path` and write the whole list
/// back. Returns the updated list.
pub fn add_to_file<S: Store>(store: &S, path: &Path, bin: Bin) -> Result<BinList, BinError> {
    let mut list = BinList::load_or_default(store, path);
    list.push(bin);
    let bytes = list.to_bytes()?;
    store.write(path, &bytes).map_err(|source| BinError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(list)
}
