// src/video.rs - camera frame acquisition
use image::{ImageBuffer, RgbaImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device cannot be opened at all. Fatal at startup.
    #[error("camera {index} unavailable: {reason}")]
    Unavailable { index: u32, reason: String },
    /// A single read failed mid-stream. Ends the frame loop gracefully.
    #[error("frame read failed: {0}")]
    FrameRead(String),
}

/// Anything that hands out color frames on demand.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<RgbaImage, CaptureError>;
}

pub struct CameraSource {
    camera: Camera,
    index: u32,
}

impl CameraSource {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let format = CameraFormat::new(Resolution::new(640, 480), FrameFormat::MJPEG, 30);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Exact(format));
        let camera = Camera::new(CameraIndex::Index(index), requested).map_err(|e| {
            CaptureError::Unavailable {
                index,
                reason: e.to_string(),
            }
        })?;
        Ok(Self { camera, index })
    }

    /// Open and immediately drop the device, so missing cameras surface at
    /// startup instead of on the first stream request.
    pub fn probe(index: u32) -> Result<(), CaptureError> {
        Self::open(index).map(|_| ())
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<RgbaImage, CaptureError> {
        if !self.camera.is_stream_open() {
            self.camera
                .open_stream()
                .map_err(|e| CaptureError::Unavailable {
                    index: self.index,
                    reason: format!("failed to open stream: {e}"),
                })?;
        }
        let frame = self
            .camera
            .frame()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::FrameRead(format!("decode failed: {e}")))?;

        let width = decoded.width();
        let height = decoded.height();
        let rgb = decoded.into_vec();
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for chunk in rgb.chunks(3) {
            rgba.push(chunk[0]);
            rgba.push(chunk[1]);
            rgba.push(chunk[2]);
            rgba.push(255);
        }
        let img: RgbaImage = ImageBuffer::from_raw(width, height, rgba)
            .ok_or_else(|| CaptureError::FrameRead("frame buffer size mismatch".to_string()))?;

        // mirror so on-screen motion matches the user's hand
        Ok(image::imageops::flip_horizontal(&img))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}
