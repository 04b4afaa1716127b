//! In-memory file registry shared by pipeline stages

use crate::config::FilePattern;
use crate::error::Result;
use crate::path::select_keys;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Permission marker given to records created without a base record
pub const DEFAULT_MODE: &str = "0644";

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a [`FileRecord`]
///
/// Allocated once when a record is constructed. Clones of a record share
/// the id, so the id follows a record across registry keys and copies made
/// for inspection, but two records that merely hold the same bytes never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u64);

impl FileId {
    fn next() -> Self {
        Self(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A file in the pipeline's working set: raw contents plus named attributes
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    id: FileId,
    /// File content as bytes
    pub contents: Vec<u8>,
    /// Auxiliary attributes (mode, front-matter, anything other stages attach)
    pub attributes: Map<String, Value>,
}

impl FileRecord {
    /// Create a new record with the default `mode` attribute
    pub fn new(contents: Vec<u8>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("mode".to_string(), Value::from(DEFAULT_MODE));
        Self {
            id: FileId::next(),
            contents,
            attributes,
        }
    }

    /// Create a new record from text
    ///
    /// With a `base`, the attributes are a shallow copy of the base's
    /// attributes instead of the defaults. The new record always gets its
    /// own identity.
    pub fn from_string(contents: &str, base: Option<&FileRecord>) -> Self {
        match base {
            Some(base) => Self {
                id: FileId::next(),
                contents: contents.as_bytes().to_vec(),
                attributes: base.attributes.clone(),
            },
            None => Self::new(contents.as_bytes().to_vec()),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    /// Contents as text, if they are valid UTF-8
    pub fn contents_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    /// Replace the contents with UTF-8 encoded text
    pub fn set_contents_string(&mut self, contents: String) {
        self.contents = contents.into_bytes();
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }
}

/// A value stored in the registry
///
/// Stages other than ours may park directory placeholders or arbitrary
/// data under a key; only [`Entry::File`] carries byte contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    File(FileRecord),
    Data(Value),
}

impl Entry {
    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Data(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileRecord> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Data(_) => None,
        }
    }
}

/// Whether a registry entry is a file record with byte contents
pub fn is_file_record(entry: &Entry) -> bool {
    matches!(entry, Entry::File(_))
}

/// The pipeline's working set, keyed by path relative to the source root
#[derive(Debug, Clone, Default)]
pub struct Files {
    entries: BTreeMap<String, Entry>,
}

impl Files {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert any entry, replacing what was stored under `name`
    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(name.into(), entry)
    }

    /// Insert a file record and return its id
    pub fn insert_file(&mut self, name: impl Into<String>, file: FileRecord) -> FileId {
        let id = file.id();
        self.entries.insert(name.into(), Entry::File(file));
        id
    }

    /// Create a record from text (see [`FileRecord::from_string`]) and insert it
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        contents: &str,
        base: Option<&FileRecord>,
    ) -> FileId {
        self.insert_file(name, FileRecord::from_string(contents, base))
    }

    /// Get an entry by key
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Get a file record by key, ignoring non-file entries
    pub fn get_file(&self, name: &str) -> Option<&FileRecord> {
        self.entries.get(name).and_then(Entry::as_file)
    }

    /// Get a mutable file record by key, ignoring non-file entries
    pub fn get_file_mut(&mut self, name: &str) -> Option<&mut FileRecord> {
        self.entries.get_mut(name).and_then(Entry::as_file_mut)
    }

    /// Remove an entry
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    /// Check if a key exists
    pub fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Snapshot of all current keys
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Keys matching `pattern`, or every key when there is no pattern
    ///
    /// The result is a snapshot: mutating the registry afterwards does not
    /// change it.
    pub fn select(&self, pattern: Option<&FilePattern>) -> Result<Vec<String>> {
        select_keys(self.entries.keys().map(String::as_str), pattern)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries as (key, entry) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Iterate over file records only
    pub fn files(&self) -> impl Iterator<Item = (&String, &FileRecord)> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| entry.as_file().map(|file| (name, file)))
    }
}
