// src/navigator.rs - page navigation and annotation state machine
//
// The page-turn logic is deliberately an explicit tagged state plus a frame
// cooldown counter instead of loose flags: a turn commits only after the
// same gesture has been held for the configured time AND the cooldown from
// the previous commit has drained.
use std::collections::HashMap;
use std::time::Instant;

use nalgebra::Point2;
use tracing::debug;

use crate::config::NavigatorConfig;
use crate::gesture::PageGesture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateMode {
    None,
    Pen,
    Eraser,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HoldState {
    Idle,
    Holding { gesture: PageGesture, since: Instant },
}

/// One annotation stroke segment in page-raster pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub from: Point2<f32>,
    pub to: Point2<f32>,
}

/// In-memory annotation marks keyed by page index. Marks are appended by
/// pen strokes and removed by eraser overlap, never mutated in place.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    marks: HashMap<usize, Vec<Mark>>,
}

impl AnnotationStore {
    pub fn page(&self, page: usize) -> &[Mark] {
        self.marks.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    fn push(&mut self, page: usize, mark: Mark) {
        self.marks.entry(page).or_default().push(mark);
    }

    fn erase_near(&mut self, page: usize, at: Point2<f32>, radius: f32) -> usize {
        let Some(marks) = self.marks.get_mut(&page) else {
            return 0;
        };
        let before = marks.len();
        marks.retain(|m| segment_distance(at, m.from, m.to) >= radius);
        before - marks.len()
    }
}

fn segment_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavEvent {
    PageChanged(usize),
    Marked(Mark),
    Erased { removed: usize },
    Idle,
}

pub struct PageNavigator {
    config: NavigatorConfig,
    page_count: usize,
    page: usize,
    hold: HoldState,
    cooldown: u32,
    mode: AnnotateMode,
    cursor: Option<Point2<f32>>,
    pointer: Option<Point2<f32>>,
    annotations: AnnotationStore,
}

impl PageNavigator {
    pub fn new(config: NavigatorConfig, page_count: usize) -> Self {
        Self {
            config,
            page_count,
            page: 0,
            hold: HoldState::Idle,
            cooldown: 0,
            mode: AnnotateMode::None,
            cursor: None,
            pointer: None,
            annotations: AnnotationStore::default(),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn mode(&self) -> AnnotateMode {
        self.mode
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn pointer(&self) -> Option<Point2<f32>> {
        self.pointer
    }

    /// The transient pointer marker, shown while the index finger is
    /// extended and positioned in page-raster space by the caller.
    pub fn set_pointer(&mut self, pointer: Option<Point2<f32>>) {
        self.pointer = pointer;
    }

    /// Advance one frame. `tip` is the index fingertip projected into
    /// page-raster space, absent when no hand was seen.
    pub fn update(
        &mut self,
        gesture: PageGesture,
        tip: Option<Point2<f32>>,
        now: Instant,
    ) -> NavEvent {
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }
        match gesture {
            PageGesture::Pen | PageGesture::Eraser => {
                self.hold = HoldState::Idle;
                let mode = if gesture == PageGesture::Pen {
                    AnnotateMode::Pen
                } else {
                    AnnotateMode::Eraser
                };
                if self.mode != mode {
                    self.mode = mode;
                    self.cursor = None;
                }
                let Some(tip) = tip else {
                    return NavEvent::Idle;
                };
                match self.mode {
                    AnnotateMode::Pen => match self.cursor.replace(tip) {
                        None => NavEvent::Idle,
                        Some(prev) => {
                            let mark = Mark { from: prev, to: tip };
                            self.annotations.push(self.page, mark);
                            NavEvent::Marked(mark)
                        }
                    },
                    AnnotateMode::Eraser => {
                        let removed =
                            self.annotations
                                .erase_near(self.page, tip, self.config.eraser_radius);
                        NavEvent::Erased { removed }
                    }
                    AnnotateMode::None => NavEvent::Idle,
                }
            }
            PageGesture::NextPage | PageGesture::PrevPage => {
                self.mode = AnnotateMode::None;
                self.cursor = None;
                let since = match self.hold {
                    HoldState::Holding { gesture: held, since } if held == gesture => since,
                    _ => {
                        self.hold = HoldState::Holding { gesture, since: now };
                        return NavEvent::Idle;
                    }
                };
                if now.duration_since(since) < self.config.hold_time() || self.cooldown > 0 {
                    return NavEvent::Idle;
                }
                // commit: clamp to the document bounds, a turn at the edge
                // still consumes the gesture and arms the cooldown
                self.page = match gesture {
                    PageGesture::NextPage => {
                        (self.page + 1).min(self.page_count.saturating_sub(1))
                    }
                    _ => self.page.saturating_sub(1),
                };
                self.hold = HoldState::Idle;
                self.cooldown = self.config.cooldown_frames;
                debug!(page = self.page, "page turn committed");
                NavEvent::PageChanged(self.page)
            }
            PageGesture::None => {
                self.hold = HoldState::Idle;
                self.mode = AnnotateMode::None;
                self.cursor = None;
                NavEvent::Idle
            }
        }
    }
}
