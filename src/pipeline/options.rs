use std::{fmt, sync::Arc};

use crate::cover::{
    style::CoverStyle,
    typeset::{FontSource, TypesetterProvider},
};

/// Archive path the composited cover is written to.
pub const COVER_PATH: &str = "OEBPS/Images/cover.jpg";

/// Options for [`render_epub`](crate::render_epub).
#[derive(Clone)]
pub struct RenderOptions {
    /// Geometry, colors, and output format of the generated cover.
    pub cover: CoverStyle,
    /// Entry path the cover is inserted at, replacing any template entry there.
    pub cover_path: String,
    /// Builds the caption typesetter on the compositing thread.
    pub typesetter: Arc<dyn TypesetterProvider>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cover: CoverStyle::default(),
            cover_path: COVER_PATH.to_string(),
            typesetter: Arc::new(FontSource::SystemSansSerif),
        }
    }
}

impl RenderOptions {
    pub fn with_cover_style(mut self, style: CoverStyle) -> Self {
        self.cover = style;
        self
    }

    pub fn with_typesetter(mut self, provider: impl TypesetterProvider + 'static) -> Self {
        self.typesetter = Arc::new(provider);
        self
    }

    pub fn with_font_bytes(self, font: Vec<u8>) -> Self {
        self.with_typesetter(FontSource::Bytes(Arc::new(font)))
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("cover", &self.cover)
            .field("cover_path", &self.cover_path)
            .finish_non_exhaustive()
    }
}
