//! Helpers for the shared `[0, 1]` intensity signal.

/// Clamp a value into `[0, 1]`.
///
/// `NaN` maps to `0.0` so a corrupted float can never leak downstream.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear interpolation `from + (to - from) * t` with `t` clamped to `[0, 1]`.
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (to - from).mul_add(clamp01(t), from)
}
