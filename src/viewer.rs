// src/viewer.rs - gesture-controlled PDF viewer window
use std::time::{Duration, Instant};

use eframe::egui;
use nalgebra::Point2;
use tracing::{debug, info, warn};

use crate::board;
use crate::config::Settings;
use crate::detector::HandDetector;
use crate::gesture::{self, PageGesture};
use crate::hand::{HandPose, INDEX_TIP};
use crate::navigator::{AnnotateMode, NavEvent, PageNavigator};
use crate::pdf::PdfPages;
use crate::video::{CaptureError, FrameSource};

pub struct ViewerApp {
    source: Box<dyn FrameSource>,
    hand_detector: Box<dyn HandDetector>,
    pdf: PdfPages,
    navigator: PageNavigator,
    video_texture: Option<egui::TextureHandle>,
    page_texture: Option<egui::TextureHandle>,
    page_size: (u32, u32),
    shown_page: Option<usize>,
    stream_done: bool,
}

impl ViewerApp {
    pub fn new(
        settings: &Settings,
        source: Box<dyn FrameSource>,
        hand_detector: Box<dyn HandDetector>,
        pdf: PdfPages,
    ) -> Self {
        let navigator = PageNavigator::new(settings.navigator.clone(), pdf.page_count());
        Self {
            source,
            hand_detector,
            pdf,
            navigator,
            video_texture: None,
            page_texture: None,
            page_size: (0, 0),
            shown_page: None,
            stream_done: false,
        }
    }

    /// One synchronous frame: capture, detect, classify, advance the
    /// navigator, refresh textures. A failed capture ends the session; any
    /// other per-frame failure is logged and skipped.
    fn tick(&mut self, ctx: &egui::Context) {
        self.ensure_page_texture(ctx);
        if self.stream_done {
            return;
        }
        let mut frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(CaptureError::FrameRead(reason)) => {
                info!(%reason, "capture ended");
                self.stream_done = true;
                return;
            }
            Err(e) => {
                warn!("camera failed: {e}");
                self.stream_done = true;
                return;
            }
        };
        let (fw, fh) = frame.dimensions();
        let hands = match self.hand_detector.detect(&frame) {
            Ok(hands) => hands,
            Err(e) => {
                warn!("hand detection failed: {e}");
                Vec::new()
            }
        };

        let pose = hands
            .first()
            .map(|landmarks| HandPose::from_normalized(landmarks, fw, fh));
        let (label, tip) = match &pose {
            Some(pose) => match gesture::classify_page(pose) {
                Ok(label) => {
                    board::draw_skeleton(&mut frame, pose);
                    (label, pose.landmark(INDEX_TIP))
                }
                Err(e) => {
                    debug!("ignoring malformed pose: {e}");
                    (PageGesture::None, None)
                }
            },
            None => (PageGesture::None, None),
        };

        // fingertips live in camera space, annotations in page-raster space
        let (pw, ph) = if self.page_size.0 > 0 {
            self.page_size
        } else {
            (fw, fh)
        };
        let project = |p: Point2<f32>| {
            Point2::new(p.x * pw as f32 / fw as f32, p.y * ph as f32 / fh as f32)
        };
        let event = self.navigator.update(label, tip.map(project), Instant::now());
        if let NavEvent::PageChanged(page) = event {
            info!(page, "page turned");
        }
        let pointing = pose.as_ref().is_some_and(gesture::index_raised);
        self.navigator
            .set_pointer(tip.filter(|_| pointing).map(project));

        let color = egui::ColorImage::from_rgba_unmultiplied(
            [fw as usize, fh as usize],
            frame.as_raw(),
        );
        match &mut self.video_texture {
            Some(texture) => texture.set(color, Default::default()),
            None => self.video_texture = Some(ctx.load_texture("camera", color, Default::default())),
        }
        self.ensure_page_texture(ctx);
    }

    fn ensure_page_texture(&mut self, ctx: &egui::Context) {
        let page = self.navigator.page();
        if self.shown_page == Some(page) && self.page_texture.is_some() {
            return;
        }
        match self.pdf.render_page(page) {
            Ok(img) => {
                self.page_size = img.dimensions();
                let color = egui::ColorImage::from_rgba_unmultiplied(
                    [img.width() as usize, img.height() as usize],
                    img.as_raw(),
                );
                match &mut self.page_texture {
                    Some(texture) => texture.set(color, Default::default()),
                    None => self.page_texture = Some(ctx.load_texture("page", color, Default::default())),
                }
                self.shown_page = Some(page);
            }
            Err(e) => warn!("page raster failed: {e}"),
        }
    }

    fn render_camera_pane(&self, ui: &mut egui::Ui) {
        ui.heading("Camera");
        if let Some(texture) = &self.video_texture {
            let width = ui.available_width();
            ui.image((texture.id(), egui::vec2(width, width * 0.75)));
        } else {
            ui.label("No video feed available");
        }
        ui.separator();
        ui.label(format!(
            "Page {} / {}",
            self.navigator.page() + 1,
            self.pdf.page_count()
        ));
        let mode = match self.navigator.mode() {
            AnnotateMode::Pen => "Pen",
            AnnotateMode::Eraser => "Eraser",
            AnnotateMode::None => "Idle",
        };
        ui.label(format!("Mode: {mode}"));
        if self.stream_done {
            ui.colored_label(egui::Color32::from_rgb(244, 67, 54), "Camera stream ended");
        }
    }

    fn render_page_pane(&self, ui: &mut egui::Ui) {
        let Some(texture) = &self.page_texture else {
            ui.centered_and_justified(|ui| {
                ui.label("Rendering page...");
            });
            return;
        };
        let (pw, ph) = self.page_size;
        let avail = ui.available_size();
        let scale = (avail.x / pw as f32).min(avail.y / ph as f32);
        let size = egui::vec2(pw as f32 * scale, ph as f32 * scale);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let rect = response.rect;
        painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let to_screen = |p: Point2<f32>| rect.min + egui::vec2(p.x * scale, p.y * scale);
        for mark in self.navigator.annotations().page(self.navigator.page()) {
            painter.line_segment(
                [to_screen(mark.from), to_screen(mark.to)],
                egui::Stroke::new(3.0, egui::Color32::from_rgb(220, 60, 60)),
            );
        }
        if let Some(pointer) = self.navigator.pointer() {
            painter.circle_filled(to_screen(pointer), 6.0, egui::Color32::from_rgb(70, 130, 240));
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick(ctx);

        egui::SidePanel::left("camera_pane")
            .default_width(380.0)
            .show(ctx, |ui| self.render_camera_pane(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.render_page_pane(ui));

        ctx.request_repaint_after(Duration::from_millis(10));
    }
}

pub fn dark_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();
    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(45, 45, 52);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(55, 55, 65);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(70, 130, 240);
    visuals.window_rounding = egui::Rounding::same(12.0);
    visuals
}
