use std::{collections::BTreeMap, sync::Arc};

use minijinja::Value;
use time::{Date, OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::{
    foundation::error::{EpubError, EpubResult},
    settings::model::GenerationSettings,
};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Read-only view handed to the template evaluator for one render.
///
/// The date is captured once at construction so every entry of a render sees the same value,
/// while separate renders each read the clock again.
#[derive(Clone, Debug)]
pub struct RenderContext {
    settings: Arc<GenerationSettings>,
    current_date: Date,
}

impl RenderContext {
    /// Build a context stamped with today's UTC date.
    pub fn build(settings: Arc<GenerationSettings>) -> Self {
        Self::build_at(settings, OffsetDateTime::now_utc().date())
    }

    pub fn build_at(settings: Arc<GenerationSettings>, current_date: Date) -> Self {
        Self {
            settings,
            current_date,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn current_date(&self) -> Date {
        self.current_date
    }

    /// `YYYY-MM-DD`.
    pub fn current_date_iso(&self) -> String {
        self.current_date
            .format(ISO_DATE)
            .unwrap_or_else(|_| self.current_date.to_string())
    }

    /// Settings keys at the top level, plus `currentDate`, `context.currentDate`, and
    /// `helpers.getUrlHost`.
    pub(crate) fn to_template_value(&self) -> EpubResult<Value> {
        let serde_json::Value::Object(fields) = serde_json::to_value(self.settings.as_ref())
            .map_err(|e| EpubError::template(format!("serialize settings: {e}")))?
        else {
            return Err(EpubError::template("settings did not serialize to a map"));
        };

        let mut root: BTreeMap<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k, Value::from_serialize(&v)))
            .collect();

        let date = self.current_date_iso();
        root.insert("currentDate".to_string(), Value::from(date.clone()));

        let mut nested = BTreeMap::new();
        nested.insert("currentDate".to_string(), Value::from(date));
        root.insert("context".to_string(), Value::from(nested));

        let mut helpers = BTreeMap::new();
        helpers.insert(
            "getUrlHost".to_string(),
            Value::from_function(template_get_url_host),
        );
        root.insert("helpers".to_string(), Value::from(helpers));

        Ok(Value::from(root))
    }
}

/// Host component of `url`, including the port when it is not the scheme default.
///
/// URLs without a host (e.g. `mailto:`) yield an empty string.
pub fn get_url_host(url: &str) -> EpubResult<String> {
    let parsed = url::Url::parse(url)
        .map_err(|e| EpubError::template(format!("getUrlHost: invalid URL '{url}': {e}")))?;
    let host = parsed.host_str().unwrap_or_default();
    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

pub(crate) fn template_get_url_host(url: &str) -> Result<String, minijinja::Error> {
    get_url_host(url)
        .map_err(|e| minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/settings/context.rs"]
mod tests;
