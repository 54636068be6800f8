use std::{
    collections::BTreeMap,
    io::{Cursor, Read},
    path::Path,
};

use anyhow::Context;
use bytes::Bytes;

use crate::foundation::error::{EpubError, EpubResult};

/// Upper bound on the preallocation taken from a zip header's declared size.
const MAX_PREALLOC_BYTES: u64 = 1 << 20;

/// Preallocation for an entry whose header declares `declared` bytes. Headers are untrusted.
fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC_BYTES) as usize
}

/// Mapping from archive path to entry bytes.
///
/// Paths are unique keys; iteration is ordered by path, which keeps packaging deterministic.
/// Bytes are reference-counted so untouched entries pass through a render without copying.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: BTreeMap<String, Bytes>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack an `.epub` (zip) buffer. Directory records are skipped.
    pub fn from_epub_bytes(bytes: &[u8]) -> EpubResult<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| EpubError::decode(format!("open template archive: {e}")))?;

        let mut out = Self::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| EpubError::decode(format!("read template entry #{i}: {e}")))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            validate_entry_path(&name)?;

            let mut data = Vec::with_capacity(capacity_hint(file.size()));
            file.read_to_end(&mut data)
                .with_context(|| format!("inflate template entry '{name}'"))?;
            out.insert(name, data);
        }

        tracing::debug!(entries = out.len(), "unpacked template archive");
        Ok(out)
    }

    /// Read and unpack a template `.epub` from disk.
    pub async fn load(path: impl AsRef<Path>) -> EpubResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            EpubError::resolve(format!("read template '{}': {e}", path.display()))
        })?;
        Self::from_epub_bytes(&bytes)
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Bytes>) -> Option<Bytes> {
        self.entries.insert(path.into(), bytes.into())
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<Bytes> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Bytes)> for EntrySet {
    fn from_iter<I: IntoIterator<Item = (String, Bytes)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EntrySet {
    type Item = (String, Bytes);
    type IntoIter = std::collections::btree_map::IntoIter<String, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Validate an archive entry path without rewriting it.
///
/// Entries must be relative, `/`-separated, non-empty, and free of `..` traversal.
pub fn validate_entry_path(path: &str) -> EpubResult<()> {
    if path.is_empty() {
        return Err(EpubError::validation("entry path must be non-empty"));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(EpubError::validation(format!(
            "entry path '{path}' must be relative and use '/' separators"
        )));
    }
    if path.ends_with('/') {
        return Err(EpubError::validation(format!(
            "entry path '{path}' must name a file"
        )));
    }
    if path.split('/').any(|part| part == "..") {
        return Err(EpubError::validation(format!(
            "entry path '{path}' must not contain '..'"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/template/entries.rs"]
mod tests;
