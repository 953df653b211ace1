// src/detector.rs - hand landmark acquisition boundary
//
// The detector stays out of process: `MediaPipeBridge` feeds frames to a
// long-lived helper (scripts/hand_daemon.py) over a line protocol, one temp
// JPEG path in, one JSON line of normalized landmarks out. When no helper
// is configured or it fails to start, `SimulatedHand` keeps both apps
// usable by tracing a slow pointing hand across the frame.
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::{DynamicImage, RgbaImage};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to launch hand detector `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("hand detector process exited")]
    Exited,
    #[error("hand detector io: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame handoff failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("bad detector reply: {0}")]
    Reply(#[from] serde_json::Error),
}

/// Per-frame landmark source. Returns zero or more hands, each a list of
/// normalized [0, 1] landmark triples in MediaPipe order.
pub trait HandDetector {
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<Vec<[f64; 3]>>, DetectorError>;
}

/// Pick the configured bridge, falling back to the simulated hand when the
/// helper cannot be started.
pub fn from_settings(settings: &Settings) -> Box<dyn HandDetector> {
    if let Some(command) = &settings.detector_command {
        match MediaPipeBridge::spawn(command) {
            Ok(bridge) => {
                info!("hand detector running: {command}");
                return Box::new(bridge);
            }
            Err(e) => warn!("hand detector unavailable ({e}), using simulated hand"),
        }
    }
    Box::new(SimulatedHand::new())
}

#[derive(Deserialize)]
struct DetectorReply {
    hands: Vec<Vec<[f64; 3]>>,
}

pub struct MediaPipeBridge {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl MediaPipeBridge {
    pub fn spawn(command: &str) -> Result<Self, DetectorError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| DetectorError::Spawn {
            command: command.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| DetectorError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let stdin = child.stdin.take().ok_or(DetectorError::Exited)?;
        let stdout = child.stdout.take().map(BufReader::new).ok_or(DetectorError::Exited)?;
        Ok(Self { child, stdin, stdout })
    }
}

impl HandDetector for MediaPipeBridge {
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<Vec<[f64; 3]>>, DetectorError> {
        let tmp = std::env::temp_dir().join(format!("smartboard_{}.jpg", uuid::Uuid::new_v4()));
        DynamicImage::ImageRgba8(frame.clone()).to_rgb8().save(&tmp)?;

        let mut line = String::new();
        let exchanged: std::io::Result<usize> = (|| {
            writeln!(self.stdin, "{}", tmp.display())?;
            self.stdin.flush()?;
            self.stdout.read_line(&mut line)
        })();
        let _ = std::fs::remove_file(&tmp);

        if exchanged? == 0 {
            return Err(DetectorError::Exited);
        }
        let reply: DetectorReply = serde_json::from_str(line.trim())?;
        Ok(reply.hands)
    }
}

impl Drop for MediaPipeBridge {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Stand-in detector for machines without the MediaPipe helper: one hand in
/// a pointing shape sweeps an oval path, briefly leaving the frame every
/// few seconds so gesture-loss handling gets exercised too.
pub struct SimulatedHand {
    sim_time: f64,
}

impl SimulatedHand {
    pub fn new() -> Self {
        Self { sim_time: 0.0 }
    }
}

impl Default for SimulatedHand {
    fn default() -> Self {
        Self::new()
    }
}

impl HandDetector for SimulatedHand {
    fn detect(&mut self, _frame: &RgbaImage) -> Result<Vec<Vec<[f64; 3]>>, DetectorError> {
        self.sim_time += 0.033;
        let t = self.sim_time;
        if t % 6.0 > 5.4 {
            return Ok(vec![]);
        }
        let cx = 0.5 + 0.22 * (t * 0.7).cos();
        let cy = 0.45 + 0.18 * (t * 1.1).sin();
        Ok(vec![pointing_hand(cx, cy)])
    }
}

// A hand with the index finger extended toward (cx, cy) and everything else
// folded, in normalized coordinates.
fn pointing_hand(cx: f64, cy: f64) -> Vec<[f64; 3]> {
    let at = |dx: f64, dy: f64| [cx + dx, cy + dy, 0.0];
    vec![
        at(0.02, 0.30),   // wrist
        at(-0.04, 0.25),  // thumb cmc
        at(-0.08, 0.18),  // thumb mcp
        at(-0.10, 0.15),  // thumb ip
        at(-0.11, 0.12),  // thumb tip
        at(0.00, 0.18),   // index mcp
        at(0.00, 0.12),   // index pip
        at(0.00, 0.06),   // index dip
        at(0.00, 0.00),   // index tip
        at(0.03, 0.18),   // middle mcp
        at(0.03, 0.14),   // middle pip
        at(0.03, 0.17),   // middle dip
        at(0.03, 0.20),   // middle tip
        at(0.06, 0.19),   // ring mcp
        at(0.06, 0.15),   // ring pip
        at(0.06, 0.17),   // ring dip
        at(0.06, 0.21),   // ring tip
        at(0.09, 0.20),   // pinky mcp
        at(0.09, 0.17),   // pinky pip
        at(0.09, 0.19),   // pinky dip
        at(0.09, 0.22),   // pinky tip
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{self, BoardGesture, PageGesture};
    use crate::hand::HandPose;

    #[test]
    fn simulated_hand_reads_as_a_pointing_finger() {
        let mut sim = SimulatedHand::new();
        let frame = RgbaImage::new(640, 480);
        let hands = sim.detect(&frame).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].len(), 21);

        let pose = HandPose::from_normalized(&hands[0], 640, 480);
        assert_eq!(
            gesture::classify_board(&pose, gesture::DEFAULT_PINCH_THRESHOLD).unwrap(),
            BoardGesture::Draw
        );
        assert_eq!(gesture::classify_page(&pose).unwrap(), PageGesture::Pen);
        assert!(gesture::index_raised(&pose));
    }

    #[test]
    fn simulated_hand_periodically_leaves_the_frame() {
        let mut sim = SimulatedHand::new();
        let frame = RgbaImage::new(640, 480);
        let mut saw_empty = false;
        for _ in 0..200 {
            if sim.detect(&frame).unwrap().is_empty() {
                saw_empty = true;
            }
        }
        assert!(saw_empty);
    }
}
