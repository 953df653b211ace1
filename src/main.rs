// src/main.rs - browser-served whiteboard
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use smartboard::config;
use smartboard::server;
use smartboard::video::CameraSource;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = Arc::new(config::load(
        std::env::args().nth(1).map(PathBuf::from).as_deref(),
    )?);

    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(cameras) => {
            info!("found {} camera(s)", cameras.len());
            for (i, camera) in cameras.iter().enumerate() {
                info!("  [{}] {}", i, camera.human_name());
            }
        }
        Err(e) => warn!("failed to query cameras: {e}"),
    }

    // an unreachable camera should stop the server before it accepts anyone
    CameraSource::probe(settings.camera_index)
        .with_context(|| format!("camera {} not openable", settings.camera_index))?;

    let app = server::router(settings.clone());
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("cannot listen on {}", settings.listen_addr))?;
    info!("whiteboard running on http://{}", settings.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
