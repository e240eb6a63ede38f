//! Straight-alpha "over" compositing on 8-bit RGBA pixels.
//!
//! `out_a = src_a + dst_a * (1 - src_a)`
//! `out_c = (src_c * src_a + dst_c * dst_a * (1 - src_a)) / out_a`

use image::{Rgba, RgbaImage};

/// Blend `src` over `dst` in place.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src.0[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        *dst = src;
        return;
    }

    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let sc = src.0[c] as f32;
        let dc = dst.0[c] as f32;
        let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        dst.0[c] = out.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Composite a same-sized `overlay` over `base`, returning the new image.
///
/// Both inputs are left untouched; the caller decides what to do with the
/// superseded base.
pub fn composite_over(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());

    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        blend_over(dst, *src);
    }
    out
}
