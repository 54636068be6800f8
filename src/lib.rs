//! epubsmith renders EPUB documents from a template package and a settings snapshot.
//!
//! # Pipeline overview
//!
//! 1. **Context**: `GenerationSettings -> RenderContext` (settings plus `currentDate` and URL
//!    helpers, built once per render)
//! 2. **Templates**: text entries (`xhtml`, `html`, `opf`, `ncx`, `xml`, `txt`, `css`, `json`) are
//!    evaluated against the context; every other entry passes through byte-for-byte
//! 3. **Cover** (optional): the cover source is resolved, cover-filled onto a fixed canvas,
//!    captioned with the title, and inserted at [`COVER_PATH`]
//! 4. **Package**: the final entry set is zipped with `mimetype` first and stored
//!
//! [`render_epub`] runs these steps directly. [`RenderWorker`] runs them behind a message-passing
//! boundary and hands back `blob:` URLs from a [`BlobStore`]; [`Preview`] layers newest-wins
//! refresh semantics on top of a worker handle.
#![forbid(unsafe_code)]

mod cover;
mod foundation;
mod package;
mod pipeline;
mod preview;
mod settings;
mod source;
mod template;
mod worker;

pub use cover::compose::compose_cover;
pub use cover::decode::{PreparedImage, decode_image};
pub use cover::fit::CoverFit;
pub use cover::style::{
    BAND_COLOR, BAND_TOP_PX, CoverFormat, CoverStyle, FONT_SIZE_PX, JPEG_QUALITY, LINE_HEIGHT_PX,
    PADDING_X_PX, PADDING_Y_PX, TARGET_HEIGHT_PX, TARGET_WIDTH_PX, TEXT_COLOR, TEXT_WIDTH_RATIO,
};
pub use cover::typeset::{CaptionTypesetter, FontSource, ParleyTypesetter, TypesetterProvider};
pub use cover::wrap::{
    CaptionLayout, MeasureFn, PlacedLine, TextMeasure, layout_caption, wrap_caption,
};
pub use foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Vec2};
pub use foundation::error::{EpubError, EpubResult};
pub use package::archive::{EPUB_MIMETYPE, MIMETYPE_PATH, write_epub};
pub use pipeline::options::{COVER_PATH, RenderOptions};
pub use pipeline::orchestrate::{RenderedPackage, render_epub, render_epub_with_context};
pub use preview::session::{Preview, PreviewState};
pub use settings::context::{RenderContext, get_url_host};
pub use settings::model::{Content, GenerationSettings, GlossaryItem, RequiredToolsItem};
pub use source::blob::{BLOB_URL_PREFIX, Blob, BlobStore, BlobUrl};
pub use source::resolve::{CoverSource, UriResolver, decode_data_uri};
pub use template::classify::{
    EntryKind, MARKUP_EXTENSIONS, TEXT_EXTENSIONS, classify_entry, entry_extension,
    is_template_text,
};
pub use template::entries::{EntrySet, validate_entry_path};
pub use template::render::{TemplateRenderer, render_template};
pub use worker::handle::{RenderHandle, RenderWorker, WORKER_QUEUE_DEPTH};
