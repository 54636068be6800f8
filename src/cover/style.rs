use std::path::Path;

use anyhow::Context;

use crate::foundation::{
    core::{Canvas, Rgba8},
    error::{EpubError, EpubResult},
};

pub const TARGET_WIDTH_PX: u32 = 1000;
pub const TARGET_HEIGHT_PX: u32 = 1000;
pub const FONT_SIZE_PX: f32 = 80.0;
pub const LINE_HEIGHT_PX: f64 = 110.0;
pub const PADDING_X_PX: f64 = 20.0;
pub const PADDING_Y_PX: f64 = 20.0;
pub const BAND_TOP_PX: f64 = 10.0;
/// Share of the canvas width available to caption text.
pub const TEXT_WIDTH_RATIO: f64 = 0.8;
pub const BAND_COLOR: Rgba8 = Rgba8::new(0, 0, 0, 128);
pub const TEXT_COLOR: Rgba8 = Rgba8::opaque(255, 255, 255);
pub const JPEG_QUALITY: u8 = 90;

/// Encoded format of the generated cover asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverFormat {
    #[default]
    Jpeg,
    Png,
}

/// Tunable constants of the cover compositor.
///
/// Every field has a named default above; JSON overrides may set any subset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverStyle {
    pub width: u32,
    pub height: u32,
    pub font_size_px: f32,
    pub line_height_px: f64,
    pub padding_x_px: f64,
    pub padding_y_px: f64,
    pub band_top_px: f64,
    pub text_width_ratio: f64,
    pub band_color: Rgba8,
    pub text_color: Rgba8,
    pub format: CoverFormat,
    pub jpeg_quality: u8,
}

impl Default for CoverStyle {
    fn default() -> Self {
        Self {
            width: TARGET_WIDTH_PX,
            height: TARGET_HEIGHT_PX,
            font_size_px: FONT_SIZE_PX,
            line_height_px: LINE_HEIGHT_PX,
            padding_x_px: PADDING_X_PX,
            padding_y_px: PADDING_Y_PX,
            band_top_px: BAND_TOP_PX,
            text_width_ratio: TEXT_WIDTH_RATIO,
            band_color: BAND_COLOR,
            text_color: TEXT_COLOR,
            format: CoverFormat::Jpeg,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl CoverStyle {
    /// Load overrides from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> EpubResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read cover style '{}'", path.display()))?;
        let style: Self = serde_json::from_str(&text)
            .map_err(|e| EpubError::validation(format!("parse cover style: {e}")))?;
        style.validate()?;
        Ok(style)
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Width budget for one caption line.
    pub fn text_budget_px(&self) -> f64 {
        self.canvas().width_f64() * self.text_width_ratio
    }

    pub fn validate(&self) -> EpubResult<()> {
        self.canvas().validate()?;
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(EpubError::validation("font_size_px must be finite and > 0"));
        }
        if !self.line_height_px.is_finite() || self.line_height_px <= 0.0 {
            return Err(EpubError::validation(
                "line_height_px must be finite and > 0",
            ));
        }
        for (name, v) in [
            ("padding_x_px", self.padding_x_px),
            ("padding_y_px", self.padding_y_px),
            ("band_top_px", self.band_top_px),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(EpubError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !(self.text_width_ratio > 0.0 && self.text_width_ratio <= 1.0) {
            return Err(EpubError::validation("text_width_ratio must be in (0, 1]"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(EpubError::validation("jpeg_quality must be in 1..=100"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cover/style.rs"]
mod tests;
