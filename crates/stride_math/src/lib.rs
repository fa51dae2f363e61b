//! # stride_math - Planar Math
//!
//! Vector and angle primitives shared by the navigation engine and the
//! simulator. Everything works on the XY plane in `f32`.

pub mod vector;

pub use vector::Vec2;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    /// Magnitude below which a vector is treated as degenerate
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min { min }
    else if value > max { max }
    else { value }
}

/// Wrap an angle into `(-PI, PI]`
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + consts::PI).rem_euclid(consts::TAU) - consts::PI;
    if wrapped <= -consts::PI {
        wrapped + consts::TAU
    } else {
        wrapped
    }
}

pub mod prelude {
    pub use crate::vector::Vec2;
    pub use crate::{clamp, degrees, radians, wrap_angle};
}
