use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::Mutex;

use crate::{
    settings::model::GenerationSettings,
    source::blob::{BlobStore, BlobUrl},
    template::entries::EntrySet,
    worker::handle::RenderHandle,
};

/// Snapshot of what a preview surface should show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewState {
    /// Latest successfully applied package. Kept across failures.
    pub url: Option<BlobUrl>,
    pub loading: bool,
    pub error: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    state: PreviewState,
    applied: u64,
    in_flight: usize,
}

/// Caller-side render session over one template.
///
/// Every [`refresh`](Preview::refresh) is numbered. A result is applied only when it is newer
/// than the last applied one, so the newest request wins no matter the order renders settle in.
#[derive(Debug)]
pub struct Preview {
    handle: RenderHandle,
    blobs: BlobStore,
    template: EntrySet,
    next_generation: AtomicU64,
    inner: Mutex<Inner>,
}

impl Preview {
    /// `blobs` must be the store the worker behind `handle` registers into.
    pub fn new(handle: RenderHandle, blobs: BlobStore, template: EntrySet) -> Self {
        Self {
            handle,
            blobs,
            template,
            next_generation: AtomicU64::new(0),
            inner: Mutex::new(Inner::default()),
        }
    }

    #[tracing::instrument(skip_all, fields(generation = tracing::field::Empty))]
    pub async fn refresh(&self, settings: impl Into<Arc<GenerationSettings>>) -> PreviewState {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("generation", generation);
        {
            let mut inner = self.inner.lock().await;
            inner.in_flight += 1;
            inner.state.loading = true;
            inner.state.error = false;
            inner.state.error_message = None;
        }

        let result = self.handle.render(self.template.clone(), settings).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight -= 1;
        if generation < inner.applied {
            if let Ok(url) = result {
                self.blobs.revoke(url.as_str());
            }
            tracing::warn!(applied = inner.applied, "discarded stale preview");
        } else {
            inner.applied = generation;
            match result {
                Ok(url) => {
                    if let Some(previous) = inner.state.url.replace(url) {
                        self.blobs.revoke(previous.as_str());
                    }
                    inner.state.error = false;
                    inner.state.error_message = None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "preview render failed");
                    inner.state.error = true;
                    inner.state.error_message = Some(e.to_string());
                }
            }
        }
        inner.state.loading = inner.in_flight > 0;
        inner.state.clone()
    }

    pub async fn state(&self) -> PreviewState {
        self.inner.lock().await.state.clone()
    }

    /// Revoke the current URL and reset the visible state.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(url) = inner.state.url.take() {
            self.blobs.revoke(url.as_str());
        }
        inner.state = PreviewState::default();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/session.rs"]
mod tests;
