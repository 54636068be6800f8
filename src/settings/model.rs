use std::collections::HashSet;

use crate::foundation::error::{EpubError, EpubResult};

/// Snapshot of everything the user configured for one render.
///
/// Field names serialize in camelCase; templates see them under the same names.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub title: String,
    pub author: String,
    pub pattern_url: String,
    /// Reference to the cover source image. Empty means "no cover step".
    pub cover_image_uri: String,
    pub glossary: Vec<GlossaryItem>,
    pub content: Content,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GlossaryItem {
    pub id: u64,
    pub term: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequiredToolsItem {
    pub id: u64,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    pub required_items: Vec<RequiredToolsItem>,
    pub body: String,
}

impl GenerationSettings {
    /// Whether the compositor should run for these settings.
    pub fn has_cover(&self) -> bool {
        !self.cover_image_uri.is_empty()
    }

    /// Check per-list id uniqueness. Order is never touched.
    pub fn validate(&self) -> EpubResult<()> {
        ensure_unique_ids("glossary", self.glossary.iter().map(|g| g.id))?;
        ensure_unique_ids(
            "content.requiredItems",
            self.content.required_items.iter().map(|r| r.id),
        )?;
        Ok(())
    }
}

fn ensure_unique_ids(list: &str, ids: impl Iterator<Item = u64>) -> EpubResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EpubError::validation(format!(
                "duplicate id {id} in {list}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/settings/model.rs"]
mod tests;
