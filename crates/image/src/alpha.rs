//! Alpha flattening for formats without transparency.

use image::{DynamicImage, Rgb, RgbImage};

/// Background used when flattening for JPEG and PDF output.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Check if an image has an alpha channel
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

/// Composite `img` over a solid background and drop the alpha channel.
///
/// Opaque images are converted without blending.
pub fn flatten_alpha(img: &DynamicImage, background: [u8; 3]) -> RgbImage {
    if !has_alpha_channel(img) {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut output = RgbImage::new(rgba.width(), rgba.height());

    for (out, px) in output.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = px.0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8, bg: u8| (c as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        *out = Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ]);
    }

    output
}
