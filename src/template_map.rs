//! Association from file records to their compiled, not yet rendered templates

use std::collections::HashMap;
use std::sync::Mutex;

use crate::engine::CompiledTemplate;
use crate::error::{Error, Result};
use crate::filesystem::{FileId, Files};

/// Links a [`FileId`] to the template compiled for it
///
/// Keys are record identities, not paths or contents, so the link survives
/// renames and in-place content changes between stages. Entries for records
/// that have left the registry are reclaimed by [`release_missing`].
///
/// [`release_missing`]: TemplateMap::release_missing
#[derive(Debug, Default)]
pub struct TemplateMap {
    templates: Mutex<HashMap<FileId, CompiledTemplate>>,
}

impl TemplateMap {
    /// Create a new empty map
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<FileId, CompiledTemplate>>> {
        self.templates.lock().map_err(|_| Error::LockPoisoned {
            context: "template map".to_string(),
        })
    }

    /// Associate a record with its compiled template, replacing any earlier one
    pub fn associate(&self, id: FileId, template: CompiledTemplate) -> Result<()> {
        self.lock()?.insert(id, template);
        Ok(())
    }

    /// Get the template associated with a record
    pub fn lookup(&self, id: FileId) -> Result<Option<CompiledTemplate>> {
        Ok(self.lock()?.get(&id).cloned())
    }

    /// Remove and return the template associated with a record
    pub fn take(&self, id: FileId) -> Result<Option<CompiledTemplate>> {
        Ok(self.lock()?.remove(&id))
    }

    /// Drop every association whose record is no longer in `files`
    ///
    /// Returns the number of associations released.
    pub fn release_missing(&self, files: &Files) -> Result<usize> {
        let live: std::collections::HashSet<FileId> =
            files.files().map(|(_, file)| file.id()).collect();
        let mut templates = self.lock()?;
        let before = templates.len();
        templates.retain(|id, _| live.contains(id));
        Ok(before - templates.len())
    }

    /// Get the number of associations
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Check if there are no associations
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}
