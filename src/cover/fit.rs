use crate::foundation::{
    core::{Affine, Canvas, Rect, Vec2},
    error::{EpubError, EpubResult},
};

/// Uniform "cover" placement of a source bitmap on a canvas.
///
/// The source is scaled so that it covers the whole canvas and centered; the overflowing axis
/// gets a negative offset and is clipped by the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
    pub offset: Vec2,
}

impl CoverFit {
    pub fn compute(source_width: u32, source_height: u32, target: Canvas) -> EpubResult<Self> {
        if source_width == 0 || source_height == 0 {
            return Err(EpubError::decode("cover source has zero width or height"));
        }
        target.validate()?;

        let (sw, sh) = (f64::from(source_width), f64::from(source_height));
        let (tw, th) = (target.width_f64(), target.height_f64());

        let scale = (tw / sw).max(th / sh);
        let scaled_width = sw * scale;
        let scaled_height = sh * scale;

        Ok(Self {
            scale,
            scaled_width,
            scaled_height,
            offset: Vec2::new((tw - scaled_width) / 2.0, (th - scaled_height) / 2.0),
        })
    }

    /// Maps source pixel space onto the canvas.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Placement of the scaled image in canvas space.
    pub fn dest_rect(&self) -> Rect {
        Rect::new(
            self.offset.x,
            self.offset.y,
            self.offset.x + self.scaled_width,
            self.offset.y + self.scaled_height,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cover/fit.rs"]
mod tests;
