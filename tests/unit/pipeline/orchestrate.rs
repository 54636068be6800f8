use std::collections::HashMap;

use async_trait::async_trait;
use time::macros::date;

use super::*;
use crate::{
    cover::{
        style::{CoverFormat, CoverStyle},
        typeset::{CaptionTypesetter, TypesetterProvider},
        wrap::TextMeasure,
    },
    foundation::core::{Point, Rgba8},
    settings::model::GlossaryItem,
};

struct StaticSource(HashMap<&'static str, Bytes>);

#[async_trait]
impl CoverSource for StaticSource {
    async fn fetch(&self, uri: &str) -> EpubResult<Bytes> {
        self.0
            .get(uri)
            .cloned()
            .ok_or_else(|| EpubError::resolve(format!("no such source '{uri}'")))
    }
}

struct Blocks;

impl TextMeasure for Blocks {
    fn measure(&mut self, text: &str) -> EpubResult<f64> {
        Ok(text.chars().count() as f64 * 8.0)
    }
}

impl CaptionTypesetter for Blocks {
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

struct BlockProvider;

impl TypesetterProvider for BlockProvider {
    fn typesetter(&self, _style: &CoverStyle) -> EpubResult<Box<dyn CaptionTypesetter>> {
        Ok(Box::new(Blocks))
    }
}

struct NoFonts;

impl TypesetterProvider for NoFonts {
    fn typesetter(&self, _style: &CoverStyle) -> EpubResult<Box<dyn CaptionTypesetter>> {
        Err(EpubError::resolve("no fonts"))
    }
}

fn png_bytes() -> Bytes {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

fn options() -> RenderOptions {
    RenderOptions::default()
        .with_cover_style(CoverStyle {
            width: 64,
            height: 64,
            format: CoverFormat::Png,
            ..CoverStyle::default()
        })
        .with_typesetter(BlockProvider)
}

fn template() -> EntrySet {
    let mut entries = EntrySet::new();
    entries.insert("mimetype", b"application/epub+zip".to_vec());
    entries.insert(
        "OEBPS/title.xhtml",
        b"<h1>{{ title }}</h1><p>{{ currentDate }}</p>".to_vec(),
    );
    entries
}

fn settings(cover: &str) -> GenerationSettings {
    GenerationSettings {
        title: "Guide".to_string(),
        cover_image_uri: cover.to_string(),
        ..GenerationSettings::default()
    }
}

#[tokio::test]
async fn context_date_is_shared_by_every_entry() {
    let mut entries = template();
    entries.insert("OEBPS/date.txt", b"{{ context.currentDate }}".to_vec());
    let ctx = RenderContext::build_at(Arc::new(settings("")), date!(2024 - 02 - 29));
    let source = StaticSource(HashMap::new());

    let out = render_epub_with_context(entries, ctx, &source, &options())
        .await
        .unwrap();
    assert_eq!(
        out.entries.get("OEBPS/title.xhtml").unwrap().as_ref(),
        b"<h1>Guide</h1><p>2024-02-29</p>"
    );
    assert_eq!(
        out.entries.get("OEBPS/date.txt").unwrap().as_ref(),
        b"2024-02-29"
    );
    assert_eq!(
        EntrySet::from_epub_bytes(&out.archive).unwrap(),
        out.entries
    );
}

#[tokio::test]
async fn cover_replaces_template_entry_at_cover_path() {
    let mut entries = template();
    entries.insert(crate::pipeline::options::COVER_PATH, b"placeholder".to_vec());
    let source = StaticSource(HashMap::from([("mem:cover", png_bytes())]));

    let out = render_epub(
        entries.clone(),
        Arc::new(settings("mem:cover")),
        &source,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(out.entries.len(), entries.len());
    let cover = out
        .entries
        .get(crate::pipeline::options::COVER_PATH)
        .unwrap();
    assert_ne!(cover.as_ref(), b"placeholder");
    let decoded = image::load_from_memory(cover).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
}

#[tokio::test]
async fn duplicate_glossary_ids_are_rejected() {
    let mut s = settings("");
    s.glossary = vec![
        GlossaryItem {
            id: 1,
            term: "a".into(),
            description: "b".into(),
        },
        GlossaryItem {
            id: 1,
            term: "c".into(),
            description: "d".into(),
        },
    ];
    let err = render_epub(
        template(),
        Arc::new(s),
        &StaticSource(HashMap::new()),
        &options(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EpubError::Validation(_)));
}

#[tokio::test]
async fn typesetter_failure_fails_the_render() {
    let source = StaticSource(HashMap::from([("mem:cover", png_bytes())]));
    let opts = options().with_typesetter(NoFonts);
    let err = render_epub(template(), Arc::new(settings("mem:cover")), &source, &opts)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no fonts"));
}

#[tokio::test]
async fn template_failure_skips_cover_resolution() {
    let mut entries = template();
    entries.insert("OEBPS/bad.xhtml", b"{{ nope }}".to_vec());
    // The source is empty, so reaching it would surface a resolve error instead.
    let err = render_epub(
        entries,
        Arc::new(settings("mem:missing")),
        &StaticSource(HashMap::new()),
        &options(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EpubError::Template(_)), "{err}");
}

#[tokio::test]
async fn invalid_cover_path_is_rejected() {
    let source = StaticSource(HashMap::from([("mem:cover", png_bytes())]));
    let mut opts = options();
    opts.cover_path = "../cover.jpg".to_string();
    let err = render_epub(template(), Arc::new(settings("mem:cover")), &source, &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, EpubError::Validation(_)));
}
