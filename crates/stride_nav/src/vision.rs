//! Image-plane detections and the sidestep they trigger

use serde::{Deserialize, Serialize};

use stride_math::Vec2;

use crate::config::VisionSidestep;

/// One recognized object in the camera image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionDetection {
    /// Recognition id, if the camera reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Center in pixels
    pub center: [f32; 2],
    /// Bounding box size in pixels
    pub size: [f32; 2],
    /// Distance from the camera in meters
    pub depth: f32,
}

impl VisionDetection {
    pub fn new(center: [f32; 2], size: [f32; 2], depth: f32) -> Self {
        Self {
            id: None,
            center,
            size,
            depth,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }
}

impl VisionSidestep {
    /// Horizontal center of the image
    pub fn image_center(&self) -> f32 {
        (self.image_width / 2) as f32
    }

    /// Close enough and inside the central band
    pub fn is_blocking(&self, detection: &VisionDetection) -> bool {
        let center = self.image_center();
        detection.depth < self.max_depth
            && detection.center[0] > center - self.band_half_width
            && detection.center[0] < center + self.band_half_width
    }

    /// Nearest blocking detection
    pub fn blocking<'a>(&self, detections: &'a [VisionDetection]) -> Option<&'a VisionDetection> {
        detections
            .iter()
            .filter(|d| self.is_blocking(d))
            .min_by(|a, b| a.depth.total_cmp(&b.depth))
    }

    /// Lateral unit step in the heading frame away from `detection`
    pub fn sidestep(&self, detection: &VisionDetection, yaw: f32) -> Vec2 {
        let (sin, cos) = yaw.sin_cos();
        if detection.center[0] > self.image_center() {
            // obstacle on the right, step left
            Vec2::new(-sin, cos)
        } else {
            Vec2::new(sin, -cos)
        }
    }
}
