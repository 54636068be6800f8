use std::sync::Arc;

use bytes::Bytes;

use crate::{
    cover::compose::compose_cover,
    foundation::error::{EpubError, EpubResult},
    package::archive::write_epub,
    pipeline::options::RenderOptions,
    settings::{context::RenderContext, model::GenerationSettings},
    source::resolve::CoverSource,
    template::{
        entries::{EntrySet, validate_entry_path},
        render::render_template,
    },
};

/// Output of one successful render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPackage {
    /// Final entry set: rendered text, untouched opaque entries, and the cover if one was made.
    pub entries: EntrySet,
    /// The zipped EPUB.
    pub archive: Bytes,
}

/// Render `entries` against `settings` and package the result.
///
/// Settings are validated first. The render context (and with it the current date) is built
/// once. The cover compositor only runs when `settings.cover_image_uri` is non-empty. Any
/// failure aborts the whole render.
pub async fn render_epub(
    entries: EntrySet,
    settings: Arc<GenerationSettings>,
    source: &dyn CoverSource,
    options: &RenderOptions,
) -> EpubResult<RenderedPackage> {
    let context = RenderContext::build(settings);
    render_epub_with_context(entries, context, source, options).await
}

/// Same as [`render_epub`] with a caller-built context.
#[tracing::instrument(
    skip_all,
    fields(entries = entries.len(), cover = context.settings().has_cover())
)]
pub async fn render_epub_with_context(
    entries: EntrySet,
    context: RenderContext,
    source: &dyn CoverSource,
    options: &RenderOptions,
) -> EpubResult<RenderedPackage> {
    context.settings().validate()?;
    let cover_uri = context.settings().cover_image_uri.clone();
    let caption = context.settings().title.clone();

    let mut rendered =
        run_blocking("render templates", move || render_template(entries, &context)).await?;

    if !cover_uri.is_empty() {
        validate_entry_path(&options.cover_path)?;
        let source_bytes = source.fetch(&cover_uri).await?;

        let style = options.cover.clone();
        let provider = Arc::clone(&options.typesetter);
        let cover = run_blocking("compose cover", move || {
            let mut typesetter = provider.typesetter(&style)?;
            compose_cover(&source_bytes, &caption, &style, typesetter.as_mut())
        })
        .await?;

        if rendered
            .insert(options.cover_path.clone(), cover)
            .is_some()
        {
            tracing::debug!(path = %options.cover_path, "replaced template cover entry");
        }
    }

    let (entries, archive) = run_blocking("package", move || {
        let archive = write_epub(&rendered)?;
        Ok((rendered, Bytes::from(archive)))
    })
    .await?;

    tracing::info!(
        entries = entries.len(),
        bytes = archive.len(),
        "rendered epub"
    );
    Ok(RenderedPackage { entries, archive })
}

async fn run_blocking<T, F>(stage: &'static str, f: F) -> EpubResult<T>
where
    F: FnOnce() -> EpubResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EpubError::worker(format!("{stage} task failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrate.rs"]
mod tests;
