use crate::{
    cover::style::CoverStyle,
    foundation::{
        core::{Point, Rect},
        error::EpubResult,
    },
};

/// Rendered width of a single line of text, in pixels.
///
/// The metric source is platform specific; the compositor only needs this one question answered.
pub trait TextMeasure {
    fn measure(&mut self, text: &str) -> EpubResult<f64>;
}

/// Adapts a plain closure into a [`TextMeasure`].
pub struct MeasureFn<F>(pub F);

impl<F> TextMeasure for MeasureFn<F>
where
    F: FnMut(&str) -> f64,
{
    fn measure(&mut self, text: &str) -> EpubResult<f64> {
        Ok((self.0)(text))
    }
}

/// Greedy word wrap within `budget` pixels.
///
/// Words are appended to the current line while the candidate fits. A word that does not fit
/// starts a new line; a word wider than the whole budget sits alone on its line, unsplit.
pub fn wrap_caption(
    text: &str,
    budget: f64,
    measure: &mut dyn TextMeasure,
) -> EpubResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure.measure(&candidate)? > budget && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    Ok(lines)
}

/// One wrapped caption line and where its top-left corner goes.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub width: f64,
    pub origin: Point,
}

/// Wrapped caption plus the translucent band behind it.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub band: Rect,
    pub lines: Vec<PlacedLine>,
}

/// Wrap `caption` and place the band and lines on the style's canvas.
///
/// The band is anchored at `band_top_px` and grows downward with the line count; it is not
/// clamped to the canvas.
pub fn layout_caption(
    caption: &str,
    style: &CoverStyle,
    measure: &mut dyn TextMeasure,
) -> EpubResult<CaptionLayout> {
    let budget = style.text_budget_px();
    let wrapped = wrap_caption(caption, budget, measure)?;

    let box_width = budget + style.padding_x_px * 2.0;
    let box_height = wrapped.len() as f64 * style.line_height_px + style.padding_y_px * 2.0;
    let x0 = (style.canvas().width_f64() - box_width) / 2.0;
    let y0 = style.band_top_px;
    let band = Rect::new(x0, y0, x0 + box_width, y0 + box_height);

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = measure.measure(&text)?;
            let origin = Point::new(
                x0 + style.padding_x_px + (budget - width) / 2.0,
                y0 + style.padding_y_px + i as f64 * style.line_height_px,
            );
            Ok(PlacedLine {
                text,
                width,
                origin,
            })
        })
        .collect::<EpubResult<Vec<_>>>()?;

    Ok(CaptionLayout { band, lines })
}

#[cfg(test)]
#[path = "../../tests/unit/cover/wrap.rs"]
mod tests;
