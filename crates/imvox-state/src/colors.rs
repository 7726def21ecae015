//! Deterministic segment coloring
//!
//! Segments without an explicit color get one derived from their id and the
//! layer's color seed, matching the renderer's own hash so colors computed
//! here agree with what is drawn.

/// One round of the 32-bit murmur3-style mix used for segment colors.
pub fn hash_combine(state: u32, value: u32) -> u32 {
    let mut value = value.wrapping_mul(0xCC9E_2D51);
    value = value.rotate_left(15);
    value = value.wrapping_mul(0x1B87_3593);
    let mut state = state ^ value;
    state = state.rotate_left(13);
    state.wrapping_mul(5).wrapping_add(0xE654_6B64)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let i = (h * 6.0) as i64;
    let f = h * 6.0 - i as f64;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// The `#rrggbb` color a segment renders with under the given color seed.
///
/// The id is hashed 32 bits at a time, low word first; the final state
/// picks a hue and a saturation in `[0.5, 1.0]` at full value.
pub fn hex_string_from_segment_id(color_seed: u32, segment_id: u64) -> String {
    let state = hash_combine(color_seed, segment_id as u32);
    let state = hash_combine(state, (segment_id >> 32) as u32);
    let c0 = (state & 0xFF) as f64 / 255.0;
    let c1 = ((state >> 8) & 0xFF) as f64 / 255.0;
    let (r, g, b) = hsv_to_rgb(c0, 0.5 + 0.5 * c1, 1.0);
    format!(
        "#{:02x}{:02x}{:02x}",
        (r * 255.0) as u8,
        (g * 255.0) as u8,
        (b * 255.0) as u8
    )
}
