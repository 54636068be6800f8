use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use super::*;
use crate::{
    cover::{
        style::{CoverFormat, CoverStyle},
        typeset::{CaptionTypesetter, TypesetterProvider},
        wrap::TextMeasure,
    },
    foundation::{
        core::{Point, Rgba8},
        error::{EpubError, EpubResult},
    },
    pipeline::options::RenderOptions,
    source::resolve::CoverSource,
    worker::handle::RenderWorker,
};

/// Serves a tiny PNG for `gated:` URIs once the gate opens; everything else fails.
struct GatedSource {
    gate: Arc<Notify>,
}

#[async_trait]
impl CoverSource for GatedSource {
    async fn fetch(&self, uri: &str) -> EpubResult<Bytes> {
        if !uri.starts_with("gated:") {
            return Err(EpubError::resolve(format!("cannot resolve '{uri}'")));
        }
        self.gate.notified().await;
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Ok(Bytes::from(buf))
    }
}

struct Silent;

impl TextMeasure for Silent {
    fn measure(&mut self, text: &str) -> EpubResult<f64> {
        Ok(text.len() as f64)
    }
}

impl CaptionTypesetter for Silent {
    fn draw_line(
        &mut self,
        _ctx: &mut vello_cpu::RenderContext,
        _line: &str,
        _origin: Point,
        _color: Rgba8,
    ) -> EpubResult<()> {
        Ok(())
    }
}

struct SilentProvider;

impl TypesetterProvider for SilentProvider {
    fn typesetter(&self, _style: &CoverStyle) -> EpubResult<Box<dyn CaptionTypesetter>> {
        Ok(Box::new(Silent))
    }
}

fn setup() -> (Preview, BlobStore, Arc<Notify>) {
    let blobs = BlobStore::new();
    let gate = Arc::new(Notify::new());
    let options = RenderOptions::default()
        .with_cover_style(CoverStyle {
            width: 16,
            height: 16,
            format: CoverFormat::Png,
            ..CoverStyle::default()
        })
        .with_typesetter(SilentProvider);
    let handle = RenderWorker::spawn(
        blobs.clone(),
        Arc::new(GatedSource {
            gate: Arc::clone(&gate),
        }),
        options,
    );

    let mut template = EntrySet::new();
    template.insert("mimetype", b"application/epub+zip".to_vec());
    template.insert("OEBPS/t.xhtml", b"<h1>{{ title }}</h1>".to_vec());
    (Preview::new(handle, blobs.clone(), template), blobs, gate)
}

fn settings(title: &str, cover: &str) -> GenerationSettings {
    GenerationSettings {
        title: title.to_string(),
        cover_image_uri: cover.to_string(),
        ..GenerationSettings::default()
    }
}

#[tokio::test]
async fn success_replaces_and_revokes_previous_url() {
    let (preview, blobs, _gate) = setup();

    let first = preview.refresh(settings("One", "")).await;
    let first_url = first.url.clone().unwrap();
    assert!(!first.loading && !first.error);

    let second = preview.refresh(settings("Two", "")).await;
    let second_url = second.url.unwrap();
    assert_ne!(first_url, second_url);
    assert!(!blobs.contains(first_url.as_str()));
    assert!(blobs.contains(second_url.as_str()));
    assert_eq!(blobs.len(), 1);
}

#[tokio::test]
async fn failure_keeps_stale_url_and_reports_message() {
    let (preview, blobs, _gate) = setup();
    let ok = preview.refresh(settings("One", "")).await;
    let url = ok.url.unwrap();

    let failed = preview
        .refresh(settings("Two", "https://example.invalid/x.jpg"))
        .await;
    assert!(failed.error);
    assert!(!failed.loading);
    assert_eq!(failed.url.as_ref(), Some(&url));
    assert!(
        failed
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("resolve error:")
    );
    assert!(blobs.contains(url.as_str()));

    let recovered = preview.refresh(settings("Three", "")).await;
    assert!(!recovered.error);
    assert_eq!(recovered.error_message, None);
    assert!(!blobs.contains(url.as_str()));
}

#[tokio::test]
async fn newest_request_wins_when_older_settles_last() {
    let (preview, blobs, gate) = setup();

    let older = preview.refresh(settings("Old", "gated:cover"));
    let newer = async {
        let state = preview.refresh(settings("New", "")).await;
        assert!(state.loading, "older render is still in flight");
        gate.notify_one();
        state
    };
    let (older_state, newer_state) = tokio::join!(older, newer);

    let url = newer_state.url.unwrap();
    assert_eq!(older_state.url.as_ref(), Some(&url));
    assert!(!older_state.loading);
    assert_eq!(blobs.len(), 1);

    let bytes = blobs.fetch(url.as_str()).unwrap().bytes;
    let entries = EntrySet::from_epub_bytes(&bytes).unwrap();
    assert_eq!(
        entries.get("OEBPS/t.xhtml").unwrap().as_ref(),
        b"<h1>New</h1>"
    );
}

#[tokio::test]
async fn close_revokes_current_url() {
    let (preview, blobs, _gate) = setup();
    preview.refresh(settings("One", "")).await;
    assert_eq!(blobs.len(), 1);

    preview.close().await;
    assert!(blobs.is_empty());
    assert_eq!(preview.state().await, PreviewState::default());
}

#[tokio::test]
async fn new_attempt_clears_previous_error_while_loading() {
    let (preview, _blobs, gate) = setup();
    let failed = preview
        .refresh(settings("One", "https://example.invalid/x.jpg"))
        .await;
    assert!(failed.error);

    let pending = preview.refresh(settings("Two", "gated:cover"));
    let observe = async {
        // Let the pending refresh take its lock and reach the worker.
        tokio::task::yield_now().await;
        let during = preview.state().await;
        gate.notify_one();
        during
    };
    let (settled, during) = tokio::join!(pending, observe);

    assert!(during.loading);
    assert!(!during.error);
    assert_eq!(during.error_message, None);
    assert!(!settled.error && settled.url.is_some());
}
