/// Extensions whose entries are evaluated as templates. Matched exactly and case-sensitively.
pub const TEXT_EXTENSIONS: &[&str] = &["xhtml", "html", "opf", "ncx", "xml", "txt", "css", "json"];

/// Extensions whose template output is XML-escaped at interpolation sites.
pub const MARKUP_EXTENSIONS: &[&str] = &["xhtml", "html", "opf", "ncx", "xml"];

/// How an archive entry is treated by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Markup evaluated as a template with escaped interpolation.
    Markup,
    /// Non-markup text evaluated as a template verbatim.
    Text,
    /// Copied byte-for-byte.
    Opaque,
}

impl EntryKind {
    pub fn is_template(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// Extension of the final path segment, if any.
///
/// Dots inside directory names never count: `OEBPS.css/font.ttf` has extension `ttf`.
pub fn entry_extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn classify_entry(path: &str) -> EntryKind {
    match entry_extension(path) {
        Some(ext) if MARKUP_EXTENSIONS.contains(&ext) => EntryKind::Markup,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => EntryKind::Text,
        _ => EntryKind::Opaque,
    }
}

pub fn is_template_text(path: &str) -> bool {
    classify_entry(path).is_template()
}

#[cfg(test)]
#[path = "../../tests/unit/template/classify.rs"]
mod tests;
