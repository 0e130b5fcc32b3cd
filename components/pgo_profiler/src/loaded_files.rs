//! Registry of files currently loaded by the VM.

use std::collections::HashMap;

use bytecode_system::FileId;

/// Strips the directory part and a trailing `.abc` from a file name.
///
/// # Examples
///
/// ```
/// use pgo_profiler::normalize_file_desc;
///
/// assert_eq!(normalize_file_desc("/data/app/entry.abc"), "entry");
/// assert_eq!(normalize_file_desc("entry"), "entry");
/// ```
pub fn normalize_file_desc(desc: &str) -> &str {
    let base = desc.rsplit_once('/').map_or(desc, |(_, tail)| tail);
    base.strip_suffix(".abc").unwrap_or(base)
}

/// Files the VM has loaded, keyed by normalized name.
#[derive(Debug, Default, Clone)]
pub struct LoadedFiles {
    files: HashMap<String, FileId>,
}

impl LoadedFiles {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `desc` as loaded under `id`.
    pub fn load(&mut self, desc: &str, id: FileId) {
        self.files.insert(normalize_file_desc(desc).to_string(), id);
    }

    /// Forgets a file.
    pub fn unload(&mut self, desc: &str) -> Option<FileId> {
        self.files.remove(normalize_file_desc(desc))
    }

    /// Id of a loaded file.
    pub fn file_id(&self, desc: &str) -> Option<FileId> {
        self.files.get(normalize_file_desc(desc)).copied()
    }

    /// Whether a file with the same normalized name is loaded.
    pub fn is_loaded(&self, desc: &str) -> bool {
        self.files.contains_key(normalize_file_desc(desc))
    }
}
