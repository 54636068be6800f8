use std::{fmt, sync::Arc};

use bytes::Bytes;
use dashmap::DashMap;
use uuid::Uuid;

use crate::foundation::error::{EpubError, EpubResult};

pub const BLOB_URL_PREFIX: &str = "blob:epubsmith/";

/// Opaque `blob:` reference to bytes held in a [`BlobStore`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Object-URL registry shared between the render worker and its caller.
///
/// Every URL handed out stays resolvable until [`BlobStore::revoke`] is called; the store never
/// evicts on its own, so whoever receives a URL owns its release.
#[derive(Clone, Debug, Default)]
pub struct BlobStore {
    inner: Arc<DashMap<String, Blob>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object_url(
        &self,
        bytes: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> BlobUrl {
        let url = format!("{BLOB_URL_PREFIX}{}", Uuid::new_v4());
        self.inner.insert(
            url.clone(),
            Blob {
                bytes: bytes.into(),
                content_type: content_type.into(),
            },
        );
        BlobUrl(url)
    }

    pub fn fetch(&self, url: &str) -> EpubResult<Blob> {
        self.inner
            .get(url)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EpubError::resolve(format!("unknown or revoked blob url '{url}'")))
    }

    /// Release a URL. Returns whether it was still registered.
    pub fn revoke(&self, url: &str) -> bool {
        self.inner.remove(url).is_some()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.inner.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/blob.rs"]
mod tests;
