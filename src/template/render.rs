
use bytes::Bytes;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Output, State, UndefinedBehavior, Value};

use crate::{
    foundation::error::{EpubError, EpubResult},
    settings::context::{RenderContext, template_get_url_host},
    template::{
        classify::{EntryKind, MARKUP_EXTENSIONS, classify_entry, entry_extension},
        entries::EntrySet,
    },
};

const MARKUP_ESCAPE: &str = "xml";

/// Evaluates template-text entries against one [`RenderContext`].
///
/// Missing fields are errors, never empty strings. Interpolations inside markup entries are
/// XML-escaped; other text entries receive values verbatim.
pub struct TemplateRenderer {
    env: Environment<'static>,
    ctx: Value,
}

impl TemplateRenderer {
    pub fn new(context: &RenderContext) -> EpubResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|name| match entry_extension(name) {
            Some(ext) if MARKUP_EXTENSIONS.contains(&ext) => AutoEscape::Custom(MARKUP_ESCAPE),
            _ => AutoEscape::None,
        });
        env.set_formatter(markup_formatter);
        env.add_function("getUrlHost", template_get_url_host);

        Ok(Self {
            env,
            ctx: context.to_template_value()?,
        })
    }

    /// Render one template source. `path` selects escaping and appears in error messages.
    pub fn render_text(&self, path: &str, source: &str) -> EpubResult<String> {
        self.env
            .render_named_str(path, source, &self.ctx)
            .map_err(|e| EpubError::template(format!("'{path}': {e:#}")))
    }

    /// Render every template-text entry; opaque entries are carried over untouched.
    #[tracing::instrument(skip_all, fields(entries = entries.len()))]
    pub fn render_entries(&self, entries: EntrySet) -> EpubResult<EntrySet> {
        entries
            .into_iter()
            .map(|(path, bytes)| {
                let rendered = match classify_entry(&path) {
                    EntryKind::Opaque => bytes,
                    EntryKind::Markup | EntryKind::Text => {
                        let text = std::str::from_utf8(&bytes).map_err(|e| {
                            EpubError::decode(format!("'{path}' is not valid UTF-8: {e}"))
                        })?;
                        let out = self.render_text(&path, text)?;
                        tracing::debug!(
                            path = %path,
                            in_len = bytes.len(),
                            out_len = out.len(),
                            "rendered entry"
                        );
                        Bytes::from(out.into_bytes())
                    }
                };
                Ok::<_, EpubError>((path, rendered))
            })
            .collect()
    }
}

/// Render all template-text entries of `entries` against `context`.
pub fn render_template(entries: EntrySet, context: &RenderContext) -> EpubResult<EntrySet> {
    TemplateRenderer::new(context)?.render_entries(entries)
}

fn markup_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), Error> {
    if !matches!(state.auto_escape(), AutoEscape::Custom(MARKUP_ESCAPE)) {
        return minijinja::escape_formatter(out, state, value);
    }

    let text = value.to_string();
    let written = if value.is_safe() {
        out.write_str(&text)
    } else {
        out.write_str(&quick_xml::escape::escape(text.as_str()))
    };
    written.map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write template output"))
}

#[cfg(test)]
#[path = "../../tests/unit/template/render.rs"]
mod tests;
