use std::io::{Cursor, Write};

use anyhow::Context;
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    foundation::error::{EpubError, EpubResult},
    template::entries::{EntrySet, validate_entry_path},
};

pub const EPUB_MIMETYPE: &str = "application/epub+zip";
pub const MIMETYPE_PATH: &str = "mimetype";

/// Compress `entries` into one EPUB (zip) buffer.
///
/// `mimetype`, when present, is written first and stored uncompressed; everything else follows in
/// path order, deflated. Entry bytes are written exactly as given.
#[tracing::instrument(skip_all, fields(entries = entries.len()))]
pub fn write_epub(entries: &EntrySet) -> EpubResult<Vec<u8>> {
    for path in entries.paths() {
        validate_entry_path(path).map_err(|e| EpubError::package(e.to_string()))?;
    }

    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    if let Some(mimetype) = entries.get(MIMETYPE_PATH) {
        write_entry(&mut zip, MIMETYPE_PATH, mimetype, stored)?;
    }
    for (path, bytes) in entries.iter() {
        if path == MIMETYPE_PATH {
            continue;
        }
        write_entry(&mut zip, path, bytes, deflated)?;
    }

    let out = zip
        .finish()
        .map_err(|e| EpubError::package(format!("finish archive: {e}")))?
        .into_inner();
    tracing::debug!(bytes = out.len(), "packaged epub");
    Ok(out)
}

fn write_entry(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    path: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> EpubResult<()> {
    zip.start_file(path, options)
        .map_err(|e| EpubError::package(format!("start entry '{path}': {e}")))?;
    zip.write_all(bytes)
        .with_context(|| format!("write entry '{path}'"))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/package/archive.rs"]
mod tests;
