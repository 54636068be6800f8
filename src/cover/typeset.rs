use std::{borrow::Cow, sync::Arc};

use crate::{
    cover::{style::CoverStyle, wrap::TextMeasure},
    foundation::{
        core::{Point, Rgba8},
        error::{EpubError, EpubResult},
    },
};

/// Measures and draws caption lines onto a CPU render context.
pub trait CaptionTypesetter: TextMeasure {
    /// Draw `line` with its top-left corner at `origin`.
    fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &str,
        origin: Point,
        color: Rgba8,
    ) -> EpubResult<()>;
}

/// Builds a fresh typesetter for each cover.
///
/// Typesetters own per-render shaping caches, so they are created on the thread that composites
/// and never shared between renders.
pub trait TypesetterProvider: Send + Sync {
    fn typesetter(&self, style: &CoverStyle) -> EpubResult<Box<dyn CaptionTypesetter>>;
}

/// Where caption glyphs come from.
#[derive(Clone, Debug, Default)]
pub enum FontSource {
    /// The host's default sans-serif face, looked up through `fontdb`.
    #[default]
    SystemSansSerif,
    /// A TrueType/OpenType font file supplied by the caller.
    Bytes(Arc<Vec<u8>>),
}

impl TypesetterProvider for FontSource {
    fn typesetter(&self, style: &CoverStyle) -> EpubResult<Box<dyn CaptionTypesetter>> {
        let t = match self {
            Self::SystemSansSerif => ParleyTypesetter::system_sans_serif(style.font_size_px)?,
            Self::Bytes(bytes) => {
                ParleyTypesetter::from_font_bytes(bytes.as_ref().clone(), style.font_size_px)?
            }
        };
        Ok(Box::new(t))
    }
}

/// Parley shaping + vello glyph rendering for a single font face at a fixed size.
pub struct ParleyTypesetter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
}

impl ParleyTypesetter {
    pub fn from_font_bytes(font_bytes: Vec<u8>, size_px: f32) -> EpubResult<Self> {
        Self::new_inner(font_bytes, 0, None, size_px)
    }

    /// Resolve the system sans-serif face the way a browser canvas resolves `sans-serif`.
    pub fn system_sans_serif(size_px: f32) -> EpubResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        let families = [usvg::fontdb::Family::SansSerif];
        let query = usvg::fontdb::Query {
            families: &families,
            ..Default::default()
        };
        let id = db
            .query(&query)
            .or_else(|| db.faces().next().map(|f| f.id))
            .ok_or_else(|| EpubError::resolve("no system font available for cover caption"))?;

        let family = db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()));
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| EpubError::resolve("system font data is not readable"))?;

        tracing::debug!(family = ?family, index, "resolved system caption font");
        Self::new_inner(bytes, index, family, size_px)
    }

    fn new_inner(
        font_bytes: Vec<u8>,
        index: u32,
        family_hint: Option<String>,
        size_px: f32,
    ) -> EpubResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(EpubError::validation(
                "caption font size must be finite and > 0",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| EpubError::decode("no font families registered from font bytes"))?;

        let family_name = match family_hint {
            Some(name) => name,
            None => font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| EpubError::decode("registered font family has no name"))?
                .to_string(),
        };

        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), index);

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            size_px,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout_line(&mut self, text: &str) -> parley::Layout<()> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl TextMeasure for ParleyTypesetter {
    fn measure(&mut self, text: &str) -> EpubResult<f64> {
        Ok(f64::from(self.layout_line(text).width()))
    }
}

impl CaptionTypesetter for ParleyTypesetter {
    fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &str,
        origin: Point,
        color: Rgba8,
    ) -> EpubResult<()> {
        let layout = self.layout_line(line);

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
        ctx.set_paint(color.to_vello());

        for layout_line in layout.lines() {
            for item in layout_line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                // Positioned glyphs carry the run advance and the line baseline, so `origin` is
                // the top-left of the line box.
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cover/typeset.rs"]
mod tests;
