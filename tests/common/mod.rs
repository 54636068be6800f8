#![allow(dead_code)]

use std::io::{Cursor, Write};

use bytes::Bytes;
use epubsmith::{
    CaptionTypesetter, CoverStyle, EpubResult, Point, Rgba8, TextMeasure, TypesetterProvider,
};
use zip::write::SimpleFileOptions;

/// Fixed-advance typesetter: 10px per char, each glyph an 8x16 block.
pub struct BlockTypesetter;

impl TextMeasure for BlockTypesetter {
    fn measure(&mut self, text: &str) -> EpubResult<f64> {
        Ok(text.chars().count() as f64 * 10.0)
    }
}

impl CaptionTypesetter for BlockTypesetter {
    fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &str,
        origin: Point,
        color: Rgba8,
    ) -> EpubResult<()> {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        for (i, ch) in line.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = origin.x + i as f64 * 10.0;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                x,
                origin.y,
                x + 8.0,
                origin.y + 16.0,
            ));
        }
        Ok(())
    }
}

pub struct BlockProvider;

impl TypesetterProvider for BlockProvider {
    fn typesetter(&self, _style: &CoverStyle) -> EpubResult<Box<dyn CaptionTypesetter>> {
        Ok(Box::new(BlockTypesetter))
    }
}

pub const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata><dc:title>{{ title }}</dc:title><dc:creator>{{ author }}</dc:creator></metadata>
</package>
"#;

pub const GLOSSARY_XHTML: &str = r#"<html><body>
<h1>{{ title }}</h1>
<dl>{% for item in glossary %}<dt>{{ item.term }}</dt><dd>{{ item.description }}</dd>{% endfor %}</dl>
<p>{{ helpers.getUrlHost(patternUrl) }}</p>
</body></html>
"#;

pub const LOGO_PNG: &[u8] = b"\x89PNG\r\n\x1a\n{{ not a template }}\x00\xff";

/// Template entries shaped like a small guide package.
pub fn template_files() -> Vec<(&'static str, Bytes)> {
    vec![
        ("mimetype", Bytes::from_static(b"application/epub+zip")),
        (
            "META-INF/container.xml",
            Bytes::from_static(b"<container/>\n"),
        ),
        ("OEBPS/content.opf", Bytes::from_static(OPF.as_bytes())),
        (
            "OEBPS/Text/glossary.xhtml",
            Bytes::from_static(GLOSSARY_XHTML.as_bytes()),
        ),
        (
            "OEBPS/Styles/book.css",
            Bytes::from_static(b"body { margin: 0; }\n"),
        ),
        ("OEBPS/Images/logo.png", Bytes::from_static(LOGO_PNG)),
    ]
}

pub fn template_epub() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.add_directory("OEBPS/", deflated).unwrap();
    for (name, data) in template_files() {
        let opts = if name == "mimetype" { stored } else { deflated };
        zip.start_file(name, opts).unwrap();
        zip.write_all(&data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// 500x1000 portrait PNG, blue over yellow.
pub fn portrait_png() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(500, 1000, |_, y| {
        if y < 500 {
            image::Rgba([0, 0, 255, 255])
        } else {
            image::Rgba([255, 255, 0, 255])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
