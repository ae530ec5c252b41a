/// Straight-alpha RGBA8 source.
pub type Rgba8 = [u8; 4];

/// Blend `src` over an opaque RGB destination.
///
/// The effective source weight is `src alpha * opacity`; the result stays
/// opaque. Opacity is clamped to `[0, 1]`.
pub fn over_opaque(dst: [u8; 3], src: Rgba8, opacity: f32) -> [u8; 3] {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }
    let a = f32::from(src[3]) / 255.0 * opacity;
    if a >= 1.0 {
        return [src[0], src[1], src[2]];
    }

    let inv = 1.0 - a;
    let mut out = [0u8; 3];
    for i in 0..3 {
        let v = f32::from(src[i]) * a + f32::from(dst[i]) * inv;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Blend a row of RGBA8 pixels over a row of opaque RGB8 pixels.
pub fn over_row(dst: &mut [u8], src: &[u8], opacity: f32) {
    debug_assert_eq!(dst.len() / 3, src.len() / 4);
    for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
        let out = over_opaque([d[0], d[1], d[2]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
}

/// Accumulate a mask row by per-pixel maximum.
pub fn max_row(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = (*d).max(*s);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
