use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use bytes::Bytes;

use crate::{
    foundation::error::{EpubError, EpubResult},
    source::blob::BlobStore,
};

/// Fetch-like resolution of a cover reference into image bytes.
#[async_trait]
pub trait CoverSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> EpubResult<Bytes>;
}

/// Resolves `blob:`, `data:`, `file:`, `http(s):` and plain filesystem paths.
#[derive(Clone, Debug)]
pub struct UriResolver {
    blobs: BlobStore,
    http: reqwest::Client,
    base_dir: Option<PathBuf>,
}

impl UriResolver {
    pub fn new(blobs: BlobStore) -> Self {
        Self {
            blobs,
            http: reqwest::Client::new(),
            base_dir: None,
        }
    }

    /// Relative plain paths are joined onto `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    async fn fetch_http(&self, uri: &str) -> EpubResult<Bytes> {
        let resp = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| EpubError::resolve(format!("failed to fetch cover source: {e}")))?;
        let resp = resp.error_for_status().map_err(|e| {
            let status = e
                .status()
                .map(|s| s.to_string())
                .unwrap_or_else(|| e.to_string());
            EpubError::resolve(format!("failed to fetch cover source: {status}"))
        })?;
        resp.bytes()
            .await
            .map_err(|e| EpubError::resolve(format!("failed to fetch cover source: {e}")))
    }

    async fn read_path(&self, path: &Path) -> EpubResult<Bytes> {
        let path = match (&self.base_dir, path.is_relative()) {
            (Some(base), true) => base.join(path),
            _ => path.to_path_buf(),
        };
        let data = tokio::fs::read(&path).await.map_err(|e| {
            EpubError::resolve(format!("read cover source '{}': {e}", path.display()))
        })?;
        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl CoverSource for UriResolver {
    #[tracing::instrument(skip(self, uri), fields(scheme = tracing::field::Empty))]
    async fn fetch(&self, uri: &str) -> EpubResult<Bytes> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(EpubError::resolve("empty cover source"));
        }

        let bytes = if uri.starts_with("blob:") {
            tracing::Span::current().record("scheme", "blob");
            self.blobs.fetch(uri)?.bytes
        } else if let Some(rest) = uri.strip_prefix("data:") {
            tracing::Span::current().record("scheme", "data");
            decode_data_uri(rest)?
        } else if uri.starts_with("http://") || uri.starts_with("https://") {
            tracing::Span::current().record("scheme", "http");
            self.fetch_http(uri).await?
        } else if uri.starts_with("file:") {
            tracing::Span::current().record("scheme", "file");
            let path = url::Url::parse(uri)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| EpubError::resolve(format!("invalid file url '{uri}'")))?;
            self.read_path(&path).await?
        } else {
            // Single-letter schemes are drive letters, not URLs.
            match url::Url::parse(uri) {
                Ok(u) if u.scheme().len() > 1 => {
                    return Err(EpubError::resolve(format!(
                        "unsupported cover source scheme '{}'",
                        u.scheme()
                    )));
                }
                _ => {
                    tracing::Span::current().record("scheme", "path");
                    self.read_path(Path::new(uri)).await?
                }
            }
        };

        if bytes.is_empty() {
            return Err(EpubError::resolve("cover source is empty"));
        }
        tracing::debug!(len = bytes.len(), "resolved cover source");
        Ok(bytes)
    }
}

/// Decode the part of a `data:` URI after the scheme: `[<mediatype>][;base64],<payload>`.
pub fn decode_data_uri(rest: &str) -> EpubResult<Bytes> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| EpubError::resolve("data uri is missing ','"))?;

    if meta.ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = percent_encoding::percent_decode_str(&compact).decode_utf8_lossy();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map(Bytes::from)
            .map_err(|e| EpubError::resolve(format!("data uri base64: {e}")))
    } else {
        Ok(Bytes::from(
            percent_encoding::percent_decode_str(payload).collect::<Vec<u8>>(),
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/resolve.rs"]
mod tests;
