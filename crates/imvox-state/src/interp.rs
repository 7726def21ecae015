//! Interpolation primitives for animating between viewer states
//!
//! Every state type that can sit on an animation timeline implements
//! [`Interpolate`]. The free functions here are the building blocks:
//! straight-line blends for positions, logarithmic blends for zoom levels,
//! and spherical blends for orientation quaternions.

/// Blends two values of the same type at parameter `t` in `[0, 1]`.
///
/// Implementations are total: when the endpoints are not blendable (missing
/// fields, mismatched shapes, different variants) the result degrades to a
/// copy of the start value rather than failing.
pub trait Interpolate: Sized {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self;
}

/// Straight-line blend of two scalars.
pub fn interpolate_linear(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Elementwise straight-line blend of two equal-length vectors.
pub fn interpolate_linear_vectors(a: &[f32], b: &[f32], t: f64) -> Vec<f32> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| interpolate_linear(f64::from(x), f64::from(y), t) as f32)
        .collect()
}

/// Straight-line blend that degrades to the start value when either side is
/// absent or the lengths differ.
pub fn interpolate_linear_optional_vectors(
    a: Option<&Vec<f32>>,
    b: Option<&Vec<f32>>,
    t: f64,
) -> Option<Vec<f32>> {
    match (a, b) {
        (Some(a), Some(b)) if a.len() == b.len() => Some(interpolate_linear_vectors(a, b, t)),
        _ => a.cloned(),
    }
}

/// Logarithmic blend of two zoom factors.
///
/// Zoom is perceptually multiplicative, so the blend follows
/// `a * exp(t * ln(b / a))` and moves through equal scale ratios per unit
/// of `t`. Degrades to the start value when either side is absent.
pub fn interpolate_zoom(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a * f64::exp(t * f64::ln(b / a))),
        _ => a,
    }
}

/// The identity rotation in `[x, y, z, w]` form.
pub const UNIT_QUATERNION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Spherical linear interpolation between two unit quaternions.
///
/// An absent endpoint stands in for the identity rotation. When the
/// endpoints point to opposite hemispheres the second is negated so the
/// blend takes the shorter arc, and nearly-parallel endpoints fall back to
/// a straight-line blend where the spherical form loses precision.
pub fn quaternion_slerp(a: Option<&[f32; 4]>, b: Option<&[f32; 4]>, t: f64) -> [f32; 4] {
    let a: [f64; 4] = match a {
        Some(q) => q.map(f64::from),
        None => UNIT_QUATERNION.map(f64::from),
    };
    let mut b: [f64; 4] = match b {
        Some(q) => q.map(f64::from),
        None => UNIT_QUATERNION.map(f64::from),
    };

    let mut cosom = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
    if cosom < 0.0 {
        cosom = -cosom;
        for v in &mut b {
            *v = -*v;
        }
    }

    let (scale0, scale1) = if (1.0 - cosom) > 0.000001 {
        let omega = cosom.acos();
        let sinom = omega.sin();
        (
            ((1.0 - t) * omega).sin() / sinom,
            (t * omega).sin() / sinom,
        )
    } else {
        (1.0 - t, t)
    };

    [
        (scale0 * a[0] + scale1 * b[0]) as f32,
        (scale0 * a[1] + scale1 * b[1]) as f32,
        (scale0 * a[2] + scale1 * b[2]) as f32,
        (scale0 * a[3] + scale1 * b[3]) as f32,
    ]
}

impl Interpolate for f64 {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        interpolate_linear(*a, *b, t)
    }
}

impl Interpolate for Vec<f32> {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        if a.len() == b.len() {
            interpolate_linear_vectors(a, b, t)
        } else {
            a.clone()
        }
    }
}
