// src/pdf.rs - PDF page counting and rasterization via the poppler tools
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbaImage;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("pdf not found: {0}")]
    NotFound(PathBuf),
    #[error("poppler tools not available ({tool}): {reason}")]
    ToolMissing { tool: &'static str, reason: String },
    #[error("failed to inspect {path}: {reason}")]
    Inspect { path: PathBuf, reason: String },
    #[error("failed to rasterize page {page}: {reason}")]
    Raster { page: usize, reason: String },
}

/// A document opened once at startup: page count from `pdfinfo`, pages
/// rasterized on demand with `pdftoppm` at a fixed DPI and cached for the
/// process lifetime.
pub struct PdfPages {
    path: PathBuf,
    page_count: usize,
    dpi: u32,
    cache: HashMap<usize, RgbaImage>,
}

impl PdfPages {
    pub fn open(path: impl AsRef<Path>, dpi: u32) -> Result<Self, PdfError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(PdfError::NotFound(path));
        }

        let output = Command::new("pdfinfo")
            .arg(&path)
            .output()
            .map_err(|e| PdfError::ToolMissing {
                tool: "pdfinfo",
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(PdfError::Inspect {
                path,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let page_count = stdout
            .lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|rest| rest.trim().parse::<usize>().ok())
            .ok_or_else(|| PdfError::Inspect {
                path: path.clone(),
                reason: "no page count in pdfinfo output".to_string(),
            })?;
        if page_count == 0 {
            return Err(PdfError::Inspect {
                path,
                reason: "document has no pages".to_string(),
            });
        }

        Ok(Self {
            path,
            page_count,
            dpi,
            cache: HashMap::new(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn render_page(&mut self, page: usize) -> Result<&RgbaImage, PdfError> {
        if page >= self.page_count {
            return Err(PdfError::Raster {
                page,
                reason: format!("page out of range (document has {})", self.page_count),
            });
        }
        if !self.cache.contains_key(&page) {
            let img = rasterize(&self.path, page, self.dpi)?;
            debug!(page, width = img.width(), height = img.height(), "page rasterized");
            self.cache.insert(page, img);
        }
        Ok(&self.cache[&page])
    }
}

fn rasterize(path: &Path, page: usize, dpi: u32) -> Result<RgbaImage, PdfError> {
    let stem = std::env::temp_dir().join(format!("smartboard_page_{}", uuid::Uuid::new_v4()));
    // pdftoppm numbers pages from 1
    let pdf_page = (page + 1).to_string();
    let status = Command::new("pdftoppm")
        .args(["-png", "-singlefile", "-r"])
        .arg(dpi.to_string())
        .args(["-f", &pdf_page, "-l", &pdf_page])
        .arg(path)
        .arg(&stem)
        .status()
        .map_err(|e| PdfError::ToolMissing {
            tool: "pdftoppm",
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(PdfError::Raster {
            page,
            reason: format!("pdftoppm exited with {status}"),
        });
    }

    let out = stem.with_extension("png");
    let result = image::open(&out)
        .map(|img| img.to_rgba8())
        .map_err(|e| PdfError::Raster {
            page,
            reason: e.to_string(),
        });
    let _ = std::fs::remove_file(&out);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_fails_fast() {
        let err = PdfPages::open("/no/such/document.pdf", 150).unwrap_err();
        assert!(matches!(err, PdfError::NotFound(_)));
    }
}
