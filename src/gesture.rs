// src/gesture.rs - landmark comparisons to gesture labels
//
// Two separate grammars share nothing but the landmark model: the whiteboard
// grammar is an ordered chain of shape tests, the page grammar is an exact
// match on which fingers are raised. They are kept as distinct enums on
// purpose rather than merged into one vocabulary.
use nalgebra::distance;

use crate::hand::{
    HandPose, InvalidPose, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_MCP, PINKY_PIP, PINKY_TIP, RING_MCP, RING_PIP, RING_TIP, THUMB_MCP, THUMB_TIP,
};

/// Thumb tip to index tip pixel distance below which the hand counts as
/// pinching. The comparison is strict, a distance exactly at the threshold
/// does not pinch.
pub const DEFAULT_PINCH_THRESHOLD: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardGesture {
    ZoomIn,
    ZoomOut,
    Pinch,
    Draw,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageGesture {
    Pen,
    Eraser,
    NextPage,
    PrevPage,
    None,
}

/// Whiteboard grammar. Test order is load-bearing: the zoom shapes win over
/// pinch, pinch wins over draw, and only then does the pose fall through to
/// `None`.
pub fn classify_board(pose: &HandPose, pinch_threshold: f32) -> Result<BoardGesture, InvalidPose> {
    pose.require_complete()?;
    let p = pose.points();

    // index and middle raised, ring and pinky curled
    if p[INDEX_TIP].y < p[INDEX_PIP].y
        && p[MIDDLE_TIP].y < p[MIDDLE_PIP].y
        && p[RING_TIP].y > p[RING_PIP].y
        && p[PINKY_TIP].y > p[PINKY_PIP].y
    {
        return Ok(BoardGesture::ZoomIn);
    }

    // "hang loose": thumb and pinky stick out sideways, the rest curled
    if p[THUMB_TIP].x < p[THUMB_MCP].x
        && p[PINKY_TIP].x > p[PINKY_PIP].x
        && p[INDEX_TIP].y > p[INDEX_PIP].y
        && p[MIDDLE_TIP].y > p[MIDDLE_PIP].y
        && p[RING_TIP].y > p[RING_PIP].y
    {
        return Ok(BoardGesture::ZoomOut);
    }

    if distance(&p[THUMB_TIP], &p[INDEX_TIP]) < pinch_threshold {
        return Ok(BoardGesture::Pinch);
    }

    // classic single-finger point: index raised, middle curled
    if p[INDEX_TIP].y < p[INDEX_PIP].y && p[MIDDLE_TIP].y > p[MIDDLE_PIP].y {
        return Ok(BoardGesture::Draw);
    }

    Ok(BoardGesture::None)
}

/// Page grammar: each fingertip is compared against its MCP base joint and
/// the raised set must match exactly. The thumb never participates.
pub fn classify_page(pose: &HandPose) -> Result<PageGesture, InvalidPose> {
    pose.require_complete()?;
    let p = pose.points();
    let raised = [
        p[INDEX_TIP].y < p[INDEX_MCP].y,
        p[MIDDLE_TIP].y < p[MIDDLE_MCP].y,
        p[RING_TIP].y < p[RING_MCP].y,
        p[PINKY_TIP].y < p[PINKY_MCP].y,
    ];
    Ok(match raised {
        [true, false, false, false] => PageGesture::Pen,
        [true, true, false, false] => PageGesture::Eraser,
        [true, true, true, false] => PageGesture::NextPage,
        [true, true, true, true] => PageGesture::PrevPage,
        _ => PageGesture::None,
    })
}

/// Whether the index finger is extended, used for the viewer's on-screen
/// pointer marker. Incomplete poses simply report no pointer.
pub fn index_raised(pose: &HandPose) -> bool {
    match (pose.landmark(INDEX_TIP), pose.landmark(INDEX_MCP)) {
        (Some(tip), Some(base)) => tip.y < base.y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{
        InvalidPose, INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP,
    };
    use nalgebra::Point2;

    // A relaxed hand around (320, 360): every finger curled, thumb tucked,
    // nothing pinching. Individual tests override the landmarks they need.
    fn neutral_points() -> Vec<Point2<f32>> {
        let raw: [(f32, f32); LANDMARK_COUNT] = [
            (320.0, 400.0), // wrist
            (290.0, 370.0), // thumb cmc
            (260.0, 340.0), // thumb mcp
            (255.0, 335.0), // thumb ip
            (250.0, 330.0), // thumb tip
            (300.0, 340.0), // index mcp
            (300.0, 300.0), // index pip
            (303.0, 315.0), // index dip
            (305.0, 330.0), // index tip
            (320.0, 340.0), // middle mcp
            (320.0, 300.0), // middle pip
            (321.0, 316.0), // middle dip
            (322.0, 332.0), // middle tip
            (340.0, 340.0), // ring mcp
            (340.0, 300.0), // ring pip
            (341.0, 315.0), // ring dip
            (342.0, 330.0), // ring tip
            (360.0, 345.0), // pinky mcp
            (360.0, 310.0), // pinky pip
            (359.0, 320.0), // pinky dip
            (358.0, 335.0), // pinky tip
        ];
        raw.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn pose_with(overrides: &[(usize, (f32, f32))]) -> HandPose {
        let mut points = neutral_points();
        for &(i, (x, y)) in overrides {
            points[i] = Point2::new(x, y);
        }
        HandPose::from_pixel_points(points)
    }

    fn board(pose: &HandPose) -> BoardGesture {
        classify_board(pose, DEFAULT_PINCH_THRESHOLD).unwrap()
    }

    #[test]
    fn relaxed_hand_is_no_gesture() {
        assert_eq!(board(&pose_with(&[])), BoardGesture::None);
    }

    #[test]
    fn pointing_index_is_draw() {
        let pose = pose_with(&[(INDEX_TIP, (305.0, 270.0))]);
        assert_eq!(board(&pose), BoardGesture::Draw);
    }

    #[test]
    fn index_and_middle_raised_is_zoom_in() {
        let pose = pose_with(&[(INDEX_TIP, (305.0, 270.0)), (MIDDLE_TIP, (322.0, 268.0))]);
        assert_eq!(board(&pose), BoardGesture::ZoomIn);
    }

    #[test]
    fn hang_loose_is_zoom_out() {
        // thumb already points left of its mcp in the neutral pose; flare
        // the pinky outward and keep the other fingers curled
        let pose = pose_with(&[(PINKY_TIP, (370.0, 305.0))]);
        assert_eq!(board(&pose), BoardGesture::ZoomOut);
    }

    #[test]
    fn thumb_touching_index_is_pinch() {
        let pose = pose_with(&[(THUMB_TIP, (300.0, 328.0))]);
        assert_eq!(board(&pose), BoardGesture::Pinch);
    }

    #[test]
    fn reference_pinch_distance_classifies() {
        // thumb (100,100) to index (110,105) is about 11.2 px apart
        let pose = pose_with(&[(THUMB_TIP, (100.0, 100.0)), (INDEX_TIP, (110.0, 105.0))]);
        assert_eq!(board(&pose), BoardGesture::Pinch);
    }

    #[test]
    fn pinch_threshold_is_strict() {
        // exactly 30 px apart: not a pinch
        let at = pose_with(&[(THUMB_TIP, (275.0, 330.0)), (INDEX_TIP, (305.0, 330.0))]);
        assert_eq!(board(&at), BoardGesture::None);
        // one pixel closer: pinch
        let inside = pose_with(&[(THUMB_TIP, (276.0, 330.0)), (INDEX_TIP, (305.0, 330.0))]);
        assert_eq!(board(&inside), BoardGesture::Pinch);
    }

    #[test]
    fn pinch_wins_over_draw() {
        // index raised (draw shape) while the thumb touches the fingertip
        let pose = pose_with(&[(INDEX_TIP, (305.0, 270.0)), (THUMB_TIP, (300.0, 272.0))]);
        assert_eq!(board(&pose), BoardGesture::Pinch);
    }

    #[test]
    fn zoom_wins_over_pinch() {
        let pose = pose_with(&[
            (INDEX_TIP, (305.0, 270.0)),
            (MIDDLE_TIP, (322.0, 268.0)),
            (THUMB_TIP, (303.0, 268.0)),
        ]);
        assert_eq!(board(&pose), BoardGesture::ZoomIn);
    }

    #[test]
    fn short_pose_is_refused() {
        let pose = HandPose::from_pixel_points(vec![Point2::new(0.0, 0.0); 5]);
        assert_eq!(
            classify_board(&pose, DEFAULT_PINCH_THRESHOLD),
            Err(InvalidPose { got: 5 })
        );
        assert_eq!(classify_page(&pose), Err(InvalidPose { got: 5 }));
    }

    // Page grammar helpers: tips go well above the mcp when raised and well
    // below when folded.
    fn fingers(index: bool, middle: bool, ring: bool, pinky: bool) -> HandPose {
        let y = |up: bool| if up { 280.0 } else { 380.0 };
        pose_with(&[
            (INDEX_TIP, (300.0, y(index))),
            (MIDDLE_TIP, (320.0, y(middle))),
            (RING_TIP, (340.0, y(ring))),
            (PINKY_TIP, (360.0, y(pinky))),
        ])
    }

    #[test]
    fn page_grammar_matches_exact_finger_sets() {
        assert_eq!(
            classify_page(&fingers(true, false, false, false)).unwrap(),
            PageGesture::Pen
        );
        assert_eq!(
            classify_page(&fingers(true, true, false, false)).unwrap(),
            PageGesture::Eraser
        );
        assert_eq!(
            classify_page(&fingers(true, true, true, false)).unwrap(),
            PageGesture::NextPage
        );
        assert_eq!(
            classify_page(&fingers(true, true, true, true)).unwrap(),
            PageGesture::PrevPage
        );
    }

    #[test]
    fn page_grammar_rejects_other_combinations() {
        assert_eq!(
            classify_page(&fingers(false, false, false, false)).unwrap(),
            PageGesture::None
        );
        assert_eq!(
            classify_page(&fingers(true, false, true, false)).unwrap(),
            PageGesture::None
        );
        assert_eq!(
            classify_page(&fingers(false, true, true, true)).unwrap(),
            PageGesture::None
        );
    }

    #[test]
    fn pointer_follows_index_extension() {
        assert!(index_raised(&fingers(true, false, false, false)));
        assert!(!index_raised(&fingers(false, true, true, true)));
    }
}
