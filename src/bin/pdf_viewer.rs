// src/bin/pdf_viewer.rs - desktop gesture-controlled PDF viewer
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use tracing::info;

use smartboard::config;
use smartboard::detector;
use smartboard::pdf::PdfPages;
use smartboard::video::CameraSource;
use smartboard::viewer::{self, ViewerApp};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let pdf_path = args
        .next()
        .context("usage: pdf_viewer <document.pdf> [settings.json]")?;
    let settings = config::load(args.next().map(PathBuf::from).as_deref())?;

    let pdf = PdfPages::open(&pdf_path, settings.navigator.raster_dpi)?;
    info!(pages = pdf.page_count(), "opened {pdf_path}");

    let source = CameraSource::open(settings.camera_index)
        .with_context(|| format!("camera {} not openable", settings.camera_index))?;
    let hand_detector = detector::from_settings(&settings);
    let app = ViewerApp::new(&settings, Box::new(source), hand_detector, pdf);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([960.0, 640.0]),
        centered: true,
        ..Default::default()
    };
    eframe::run_native(
        "Gesture PDF Viewer",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(viewer::dark_visuals());
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))?;
    Ok(())
}
