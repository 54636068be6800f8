use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::{
    foundation::error::{EpubError, EpubResult},
    package::archive::EPUB_MIMETYPE,
    pipeline::{options::RenderOptions, orchestrate::render_epub},
    settings::model::GenerationSettings,
    source::{
        blob::{BlobStore, BlobUrl},
        resolve::CoverSource,
    },
    template::entries::EntrySet,
};

/// Pending requests the worker accepts before `render` callers wait for capacity.
pub const WORKER_QUEUE_DEPTH: usize = 16;

/// One render job. Only owned data crosses the channel.
struct RenderRequest {
    entries: EntrySet,
    settings: Arc<GenerationSettings>,
    reply: oneshot::Sender<EpubResult<BlobUrl>>,
}

/// Caller side of the render worker. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RenderHandle {
    tx: mpsc::Sender<RenderRequest>,
}

impl RenderHandle {
    /// Render a package and register it in the worker's [`BlobStore`].
    ///
    /// The returned URL belongs to the caller, who must revoke it once it is replaced.
    pub async fn render(
        &self,
        entries: EntrySet,
        settings: impl Into<Arc<GenerationSettings>>,
    ) -> EpubResult<BlobUrl> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RenderRequest {
                entries,
                settings: settings.into(),
                reply,
            })
            .await
            .map_err(|_| EpubError::worker("render worker is not running"))?;
        rx.await
            .map_err(|_| EpubError::worker("render worker dropped the request"))?
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for RenderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRequest")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Isolated render loop. Each request runs as its own task; overlapping requests never share
/// state beyond the blob store.
pub struct RenderWorker {
    rx: mpsc::Receiver<RenderRequest>,
    blobs: BlobStore,
    source: Arc<dyn CoverSource>,
    options: Arc<RenderOptions>,
}

impl RenderWorker {
    pub fn new(
        blobs: BlobStore,
        source: Arc<dyn CoverSource>,
        options: RenderOptions,
    ) -> (Self, RenderHandle) {
        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        let worker = Self {
            rx,
            blobs,
            source,
            options: Arc::new(options),
        };
        (worker, RenderHandle { tx })
    }

    /// Start the loop on the current tokio runtime. It ends when every handle is dropped.
    pub fn spawn(
        blobs: BlobStore,
        source: Arc<dyn CoverSource>,
        options: RenderOptions,
    ) -> RenderHandle {
        let (worker, handle) = Self::new(blobs, source, options);
        tokio::spawn(worker.run());
        handle
    }

    pub async fn run(mut self) {
        tracing::debug!("render worker started");
        while let Some(req) = self.rx.recv().await {
            let blobs = self.blobs.clone();
            let source = Arc::clone(&self.source);
            let options = Arc::clone(&self.options);
            tokio::spawn(async move {
                let result = render_epub(req.entries, req.settings, source.as_ref(), &options)
                    .await
                    .map(|pkg| blobs.create_object_url(pkg.archive, EPUB_MIMETYPE));
                if let Err(unsent) = req.reply.send(result) {
                    // Nobody will ever revoke a URL the caller never saw.
                    if let Ok(url) = unsent {
                        blobs.revoke(url.as_str());
                    }
                    tracing::debug!("render caller went away before the reply");
                }
            });
        }
        tracing::debug!("render worker stopped");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/handle.rs"]
mod tests;
