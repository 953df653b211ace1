// src/board.rs - whiteboard state: zoom, stroke cursor, persistent canvas
use image::{imageops, Rgba, RgbaImage};
use nalgebra::Point2;

use crate::config::BoardConfig;
use crate::gesture::BoardGesture;
use crate::hand::{HandPose, HAND_SKELETON};

const CANVAS_CLEAR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BONE_COLOR: Rgba<u8> = Rgba([70, 200, 120, 255]);
const JOINT_COLOR: Rgba<u8> = Rgba([230, 70, 70, 255]);

/// What the controller did with the current frame. Mostly useful for debug
/// logging, tests assert on it directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoardEvent {
    Zoomed(f32),
    Erased { at: Point2<f32> },
    StrokeStarted { at: Point2<f32> },
    Stroke { from: Point2<f32>, to: Point2<f32> },
    Idle,
}

/// Per-stream whiteboard state. One controller per viewer connection owns
/// the canvas bitmap, the zoom factor and the stroke cursor; nothing here is
/// shared between frames except through `update`.
pub struct WhiteboardController {
    config: BoardConfig,
    canvas: RgbaImage,
    cursor: Option<Point2<f32>>,
    zoom: f32,
}

impl WhiteboardController {
    pub fn new(config: BoardConfig, width: u32, height: u32) -> Self {
        Self {
            config,
            canvas: RgbaImage::from_pixel(width, height, CANVAS_CLEAR),
            cursor: None,
            zoom: 1.0,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Advance one frame. `observation` carries the classified gesture and
    /// the index fingertip in frame pixels, or `None` when no hand was seen.
    ///
    /// The stroke cursor survives a pinch (erasing mid-stroke does not break
    /// the stroke) but resets on zoom frames, idle frames and lost hands, so
    /// a hand re-entering the frame never connects to a stale point.
    pub fn update(&mut self, observation: Option<(BoardGesture, Point2<f32>)>) -> BoardEvent {
        let Some((gesture, tip)) = observation else {
            self.cursor = None;
            return BoardEvent::Idle;
        };
        match gesture {
            BoardGesture::ZoomIn => {
                self.cursor = None;
                self.zoom = (self.zoom + self.config.zoom_step).min(self.config.max_zoom);
                BoardEvent::Zoomed(self.zoom)
            }
            BoardGesture::ZoomOut => {
                self.cursor = None;
                self.zoom = (self.zoom - self.config.zoom_step).max(self.config.min_zoom);
                BoardEvent::Zoomed(self.zoom)
            }
            BoardGesture::Pinch => {
                fill_circle(&mut self.canvas, tip, self.config.eraser_radius, CANVAS_CLEAR);
                BoardEvent::Erased { at: tip }
            }
            BoardGesture::Draw => match self.cursor.replace(tip) {
                // first contact only seeds the cursor, no segment yet
                None => BoardEvent::StrokeStarted { at: tip },
                Some(prev) => {
                    stamp_line(
                        &mut self.canvas,
                        prev,
                        tip,
                        self.config.stroke_color(),
                        self.config.stroke_width,
                    );
                    BoardEvent::Stroke { from: prev, to: tip }
                }
            },
            BoardGesture::None => {
                self.cursor = None;
                BoardEvent::Idle
            }
        }
    }

    /// Composite the live frame with the canvas: when zoomed past 1.0 the
    /// frame is center-cropped and scaled back up, then blended 50/50 with
    /// the persistent canvas.
    pub fn compose(&self, frame: &RgbaImage) -> RgbaImage {
        let (w, h) = frame.dimensions();
        let mut out = if self.zoom > 1.0 {
            let cw = ((w as f32 / self.zoom) as u32).max(1);
            let ch = ((h as f32 / self.zoom) as u32).max(1);
            let crop = imageops::crop_imm(frame, (w - cw) / 2, (h - ch) / 2, cw, ch).to_image();
            imageops::resize(&crop, w, h, imageops::FilterType::Triangle)
        } else {
            frame.clone()
        };
        for (dst, src) in out.pixels_mut().zip(self.canvas.pixels()) {
            dst[0] = ((dst[0] as u16 + src[0] as u16) / 2) as u8;
            dst[1] = ((dst[1] as u16 + src[1] as u16) / 2) as u8;
            dst[2] = ((dst[2] as u16 + src[2] as u16) / 2) as u8;
            dst[3] = 255;
        }
        out
    }
}

/// Draw the detected hand skeleton onto the live frame before compositing.
pub fn draw_skeleton(frame: &mut RgbaImage, pose: &HandPose) {
    for &(a, b) in HAND_SKELETON.iter() {
        if let (Some(from), Some(to)) = (pose.landmark(a), pose.landmark(b)) {
            stamp_line(frame, from, to, BONE_COLOR, 2.0);
        }
    }
    for point in pose.points() {
        fill_circle(frame, *point, 3.0, JOINT_COLOR);
    }
}

pub(crate) fn fill_circle(img: &mut RgbaImage, center: Point2<f32>, radius: f32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil() as i64).clamp(0, w as i64) as u32;
    let y1 = ((center.y + radius).ceil() as i64).clamp(0, h as i64) as u32;
    let r2 = radius * radius;
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

pub(crate) fn stamp_line(
    img: &mut RgbaImage,
    from: Point2<f32>,
    to: Point2<f32>,
    color: Rgba<u8>,
    width: f32,
) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = (dx.abs().max(dy.abs()).ceil() as u32).max(1);
    let radius = (width / 2.0).max(0.5);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let p = Point2::new(from.x + dx * t, from.y + dy * t);
        fill_circle(img, p, radius, color);
    }
}
