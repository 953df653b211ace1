// src/server.rs - the whiteboard's web surface
//
// Route shapes follow the original board: `/` is the landing page, `/src`
// serves the page's assets, and `/SmartBoard` is an endless multipart JPEG
// stream. Each stream request gets its own capture thread owning camera,
// detector and board state, so the per-frame path never touches shared
// mutable state.
use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::board::{self, BoardEvent, WhiteboardController};
use crate::config::Settings;
use crate::detector;
use crate::gesture::{self, BoardGesture};
use crate::hand::{HandPose, INDEX_TIP};
use crate::video::{CameraSource, CaptureError, FrameSource};

type FramePart = Result<Vec<u8>, Infallible>;

pub fn router(settings: Arc<Settings>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/src/*path", get(asset))
        .route("/SmartBoard", get(feed))
        .with_state(settings)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn asset(
    State(settings): State<Arc<Settings>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    if path.split('/').any(|seg| seg == "..") {
        return StatusCode::NOT_FOUND.into_response();
    }
    let full = settings.asset_dir.join("src").join(&path);
    match tokio::fs::read(&full).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

async fn feed(State(settings): State<Arc<Settings>>) -> Response {
    let (tx, rx) = mpsc::channel::<FramePart>(4);
    std::thread::spawn(move || stream_frames(settings, tx));
    Response::builder()
        .header(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn stream_frames(settings: Arc<Settings>, tx: mpsc::Sender<FramePart>) {
    info!("viewer connected, starting capture loop");
    if let Err(e) = run_board_loop(&settings, &tx) {
        warn!("whiteboard stream ended: {e:#}");
    }
    info!("capture loop finished");
}

fn run_board_loop(settings: &Settings, tx: &mpsc::Sender<FramePart>) -> anyhow::Result<()> {
    let mut camera = CameraSource::open(settings.camera_index)?;
    let mut hand_detector = detector::from_settings(settings);
    let mut controller: Option<WhiteboardController> = None;

    loop {
        let mut frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(CaptureError::FrameRead(reason)) => {
                info!(%reason, "capture ended");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let (width, height) = frame.dimensions();
        let board = controller
            .get_or_insert_with(|| WhiteboardController::new(settings.board.clone(), width, height));

        let hands = match hand_detector.detect(&frame) {
            Ok(hands) => hands,
            Err(e) => {
                warn!("hand detection failed: {e}");
                Vec::new()
            }
        };
        let mut observation = None;
        if let Some(landmarks) = hands.first() {
            let pose = HandPose::from_normalized(landmarks, width, height);
            match gesture::classify_board(&pose, settings.board.pinch_threshold) {
                Ok(label) => {
                    board::draw_skeleton(&mut frame, &pose);
                    if let Some(tip) = pose.landmark(INDEX_TIP) {
                        observation = Some((label, tip));
                    }
                }
                Err(e) => debug!("ignoring malformed pose: {e}"),
            }
        }

        let event = board.update(observation);
        if event != BoardEvent::Idle {
            debug!(?event, "board updated");
        }

        let composed = board.compose(&frame);
        let jpeg = match encode_jpeg(&composed, settings.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("frame encode failed: {e}");
                continue;
            }
        };
        if tx.blocking_send(Ok(jpeg_part(&jpeg))).is_err() {
            info!("viewer disconnected");
            break;
        }
    }
    Ok(())
}

fn encode_jpeg(frame: &RgbaImage, quality: u8) -> anyhow::Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(frame.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(buf)
}

fn jpeg_part(jpeg: &[u8]) -> Vec<u8> {
    let mut part = Vec::with_capacity(jpeg.len() + 64);
    part.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_parts_are_boundary_delimited() {
        let part = jpeg_part(&[0xFF, 0xD8, 0xFF]);
        assert!(part.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
        assert!(part.ends_with(b"\xFF\xD8\xFF\r\n"));
    }

    #[test]
    fn asset_types_cover_the_served_files() {
        assert_eq!(content_type("app.css"), "text/css");
        assert_eq!(content_type("logo.svg"), "image/svg+xml");
        assert_eq!(content_type("nested/main.js"), "text/javascript");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    #[test]
    fn encoded_frames_are_jpeg() {
        let frame = RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]));
        let jpeg = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
