// src/hand.rs - MediaPipe hand landmark model
use nalgebra::Point2;
use thiserror::Error;

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const LANDMARK_COUNT: usize = 21;

/// Bone connections for the overlay, finger chains plus palm links.
pub const HAND_SKELETON: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC),
    (THUMB_CMC, THUMB_MCP),
    (THUMB_MCP, THUMB_IP),
    (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP),
    (INDEX_MCP, INDEX_PIP),
    (INDEX_PIP, INDEX_DIP),
    (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP),
    (MIDDLE_MCP, MIDDLE_PIP),
    (MIDDLE_PIP, MIDDLE_DIP),
    (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP),
    (RING_MCP, RING_PIP),
    (RING_PIP, RING_DIP),
    (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP),
    (WRIST, PINKY_MCP),
    (PINKY_MCP, PINKY_PIP),
    (PINKY_PIP, PINKY_DIP),
    (PINKY_DIP, PINKY_TIP),
];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("hand pose has {got} landmarks, expected 21")]
pub struct InvalidPose {
    pub got: usize,
}

/// One detected hand in one frame, landmarks in pixel space.
///
/// Produced fresh every frame from the detector's normalized output and
/// discarded after the frame has been processed.
#[derive(Debug, Clone)]
pub struct HandPose {
    points: Vec<Point2<f32>>,
}

impl HandPose {
    pub fn from_pixel_points(points: Vec<Point2<f32>>) -> Self {
        Self { points }
    }

    /// Convert the detector's normalized [0, 1] landmarks to pixel space.
    pub fn from_normalized(landmarks: &[[f64; 3]], width: u32, height: u32) -> Self {
        let points = landmarks
            .iter()
            .map(|lm| {
                Point2::new(
                    (lm[0] * width as f64) as f32,
                    (lm[1] * height as f64) as f32,
                )
            })
            .collect();
        Self { points }
    }

    pub fn require_complete(&self) -> Result<(), InvalidPose> {
        if self.points.len() < LANDMARK_COUNT {
            return Err(InvalidPose {
                got: self.points.len(),
            });
        }
        Ok(())
    }

    pub fn landmark(&self, index: usize) -> Option<Point2<f32>> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Point2<f32>] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_landmarks_scale_to_pixels() {
        let landmarks = vec![[0.5, 0.25, 0.0]; LANDMARK_COUNT];
        let pose = HandPose::from_normalized(&landmarks, 640, 480);
        assert!(pose.require_complete().is_ok());
        let p = pose.landmark(WRIST).unwrap();
        assert_eq!(p.x, 320.0);
        assert_eq!(p.y, 120.0);
    }

    #[test]
    fn short_landmark_list_is_rejected() {
        let pose = HandPose::from_pixel_points(vec![Point2::new(0.0, 0.0); 5]);
        assert_eq!(pose.require_complete(), Err(InvalidPose { got: 5 }));
    }
}
