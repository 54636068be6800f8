use std::sync::Arc;

use image::ImageEncoder as _;

use crate::{
    cover::{
        decode::{PreparedImage, decode_image},
        fit::CoverFit,
        style::{CoverFormat, CoverStyle},
        typeset::CaptionTypesetter,
        wrap::layout_caption,
    },
    foundation::{
        core::{Affine, Rect},
        error::{EpubError, EpubResult},
    },
};

/// Composite a cover: cover-fill `source` onto the style's canvas, draw the caption band and
/// wrapped `caption`, and encode the result in the style's format.
#[tracing::instrument(skip_all, fields(source_len = source.len(), caption_len = caption.len()))]
pub fn compose_cover(
    source: &[u8],
    caption: &str,
    style: &CoverStyle,
    typesetter: &mut dyn CaptionTypesetter,
) -> EpubResult<Vec<u8>> {
    style.validate()?;
    let canvas = style.canvas();
    let (width, height) = canvas.dims_u16()?;

    let image = decode_image(source)?;
    let fit = CoverFit::compute(image.width, image.height, canvas)?;
    let paint = image_paint(&image)?;

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    clear_pixmap(&mut pixmap);

    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(fit.transform()));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(image.width),
        f64::from(image.height),
    ));

    let layout = layout_caption(caption, style, typesetter)?;
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(style.band_color.to_vello());
    ctx.fill_rect(&rect_to_cpu(layout.band));

    for line in &layout.lines {
        typesetter.draw_line(&mut ctx, &line.text, line.origin, style.text_color)?;
    }

    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    tracing::debug!(
        scale = fit.scale,
        lines = layout.lines.len(),
        "composited cover"
    );

    encode_pixmap(&pixmap, style)
}

fn image_paint(image: &PreparedImage) -> EpubResult<vello_cpu::Image> {
    let pixmap = image_premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> EpubResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| EpubError::decode("cover source width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| EpubError::decode("cover source height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(EpubError::decode("cover source byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn encode_pixmap(pixmap: &vello_cpu::Pixmap, style: &CoverStyle) -> EpubResult<Vec<u8>> {
    let premul = pixmap.data_as_u8_slice();
    let (width, height) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
    let mut out = Vec::new();

    match style.format {
        CoverFormat::Jpeg => {
            // JPEG has no alpha; premultiplied channels are the composite over black.
            let rgb: Vec<u8> = premul
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, style.jpeg_quality)
                .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
                .map_err(|e| EpubError::encode(format!("encode jpeg cover: {e}")))?;
        }
        CoverFormat::Png => {
            let mut rgba = premul.to_vec();
            unpremultiply_rgba8_in_place(&mut rgba);
            image::codecs::png::PngEncoder::new(&mut out)
                .write_image(&rgba, width, height, image::ExtendedColorType::Rgba8)
                .map_err(|e| EpubError::encode(format!("encode png cover: {e}")))?;
        }
    }

    if out.is_empty() {
        return Err(EpubError::encode("cover encoder produced no bytes"));
    }
    Ok(out)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/cover/compose.rs"]
mod tests;
