//! Pinhole camera producing image-plane detections

use serde::{Deserialize, Serialize};

use stride_math::Vec2;
use stride_nav::vision::VisionDetection;

/// Forward-looking camera mounted on the agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinholeCamera {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Horizontal field of view in radians
    pub fov: f32,
    /// Closest visible forward distance
    pub near: f32,
    /// Footprint radius of a pedestrian
    pub body_radius: f32,
    /// Height of a pedestrian
    pub body_height: f32,
}

impl Default for PinholeCamera {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fov: 1.0,
            near: 0.05,
            body_radius: 0.25,
            body_height: 1.7,
        }
    }
}

impl PinholeCamera {
    /// Focal length in pixels
    pub fn focal(&self) -> f32 {
        (self.width as f32 / 2.0) / (self.fov / 2.0).tan()
    }

    /// Project a point seen from `eye` looking along `yaw`.
    ///
    /// Returns `None` behind the near plane or outside the image.
    pub fn project(&self, eye: Vec2, yaw: f32, point: Vec2, id: u32) -> Option<VisionDetection> {
        let offset = point - eye;
        let (sin, cos) = yaw.sin_cos();
        let forward = offset.x * cos + offset.y * sin;
        let left = -offset.x * sin + offset.y * cos;
        if forward <= self.near {
            return None;
        }

        let focal = self.focal();
        let half_width = self.width as f32 / 2.0;
        let u = half_width - focal * left / forward;
        if !(0.0..self.width as f32).contains(&u) {
            return None;
        }

        Some(
            VisionDetection::new(
                [u, self.height as f32 / 2.0],
                [
                    2.0 * self.body_radius * focal / forward,
                    self.body_height * focal / forward,
                ],
                offset.length(),
            )
            .with_id(id),
        )
    }
}
