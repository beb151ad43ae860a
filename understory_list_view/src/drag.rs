// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-and-drop: sessions, drop-target picking, and edge auto-scroll.
//!
//! A [`DragSession`] starts when the host reports a long press on a row. The dragged
//! view is pinned (it survives reconciliation) and follows the pointer. On every move:
//!
//! - the live row whose frame overlaps the dragged frame the most becomes the drop
//!   candidate ([`pick_drop_target`]) and is drawn dimmed;
//! - if the dragged frame overlaps the strip at the top or bottom edge of the viewport,
//!   the viewport scrolls by a step proportional to the overlap
//!   ([`auto_scroll_delta`]). The same step is re-evaluated on every tick, so holding
//!   a row at an edge keeps scrolling until it leaves the strip or the content ends.
//!
//! On release the drop handler decides; a refused drop (or a release over nothing)
//! animates the view back to its slot without touching the identity map.
//!
//! Pointer positions are in viewport coordinates, so a stationary pointer keeps the
//! dragged view at the same place on screen while the content scrolls under it.

use kurbo::{Point, Rect, Size, Vec2};

use crate::identity::{Renumbered, Tag, follow};

/// Where a drag session stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    /// Following the pointer.
    Dragging,
    /// Released over a target; waiting for a deferred drop outcome.
    AwaitingDrop,
    /// Animating back to its slot.
    Returning,
}

/// State of one drag gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    tag: Tag,
    phase: DragPhase,
    /// Frame at gesture start; refused drops return here.
    origin: Rect,
    /// Pointer position relative to the dragged frame's origin.
    grab: Vec2,
    /// Last pointer position, in viewport coordinates.
    pointer: Point,
    candidate: Option<Tag>,
}

impl DragSession {
    pub(crate) fn new(tag: Tag, frame: Rect, pointer: Point, offset: f64) -> Self {
        let content = pointer + Vec2::new(0.0, offset);
        Self {
            tag,
            phase: DragPhase::Dragging,
            origin: frame,
            grab: content - frame.origin(),
            pointer,
            candidate: None,
        }
    }

    /// Tag of the dragged view.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Frame of the dragged view when the gesture started.
    #[must_use]
    pub const fn origin(&self) -> Rect {
        self.origin
    }

    /// Current drop-target candidate.
    #[must_use]
    pub const fn candidate(&self) -> Option<Tag> {
        self.candidate
    }

    /// Last pointer position, in viewport coordinates.
    #[must_use]
    pub const fn pointer(&self) -> Point {
        self.pointer
    }

    pub(crate) fn set_phase(&mut self, phase: DragPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_pointer(&mut self, pointer: Point) {
        self.pointer = pointer;
    }

    pub(crate) fn set_candidate(&mut self, candidate: Option<Tag>) {
        self.candidate = candidate;
    }

    /// Content-space frame of a view of `size` held by the pointer at scroll `offset`.
    #[must_use]
    pub fn frame_at(&self, size: Size, offset: f64) -> Rect {
        let content = self.pointer + Vec2::new(0.0, offset);
        Rect::from_origin_size(content - self.grab, size)
    }

    /// Follows the dragged view and the candidate through a renumbering pass.
    pub(crate) fn follow(&mut self, report: &[Renumbered]) {
        self.tag = follow(report, self.tag);
        self.candidate = self.candidate.map(|tag| follow(report, tag));
    }
}

/// The candidate whose frame overlaps `dragged` with the largest area.
///
/// Ties go to the first candidate yielded. Candidates that only touch `dragged` do
/// not count.
#[must_use]
pub fn pick_drop_target(
    dragged: Rect,
    candidates: impl IntoIterator<Item = (Tag, Rect)>,
) -> Option<Tag> {
    let mut best: Option<(Tag, f64)> = None;
    for (tag, frame) in candidates {
        let area = dragged.intersect(frame).area();
        if area > 0.0 && best.is_none_or(|(_, a)| area > a) {
            best = Some((tag, area));
        }
    }
    best.map(|(tag, _)| tag)
}

/// Scroll step for a dragged frame near the edges of `viewport` (content coordinates).
///
/// Each edge strip of height `strip` contributes `step * overlap_area / strip_area`,
/// negative for the top strip and positive for the bottom one. Returns `0.0` when the
/// frame overlaps neither.
#[must_use]
pub fn auto_scroll_delta(viewport: Rect, dragged: Rect, strip: f64, step: f64) -> f64 {
    let strip = strip.min(viewport.height() / 2.0);
    if strip <= 0.0 || viewport.width() <= 0.0 {
        return 0.0;
    }
    let top = Rect::new(viewport.x0, viewport.y0, viewport.x1, viewport.y0 + strip);
    let bottom = Rect::new(viewport.x0, viewport.y1 - strip, viewport.x1, viewport.y1);
    let strip_area = top.area();
    let up = dragged.intersect(top).area() / strip_area;
    let down = dragged.intersect(bottom).area() / strip_area;
    (down - up) * step
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Size};

    use super::{DragSession, auto_scroll_delta, pick_drop_target};
    use crate::identity::{Renumbered, Tag};

    #[test]
    fn largest_overlap_wins() {
        let dragged = Rect::new(0.0, 30.0, 100.0, 70.0);
        let candidates = [
            (Tag(1), Rect::new(0.0, 0.0, 100.0, 40.0)),   // 10 tall overlap
            (Tag(2), Rect::new(0.0, 40.0, 100.0, 80.0)),  // 30 tall overlap
            (Tag(3), Rect::new(0.0, 70.0, 100.0, 110.0)), // touching only
        ];
        assert_eq!(pick_drop_target(dragged, candidates), Some(Tag(2)));
        assert_eq!(
            pick_drop_target(dragged, [(Tag(3), Rect::new(0.0, 70.0, 100.0, 110.0))]),
            None
        );
    }

    #[test]
    fn auto_scroll_is_proportional_to_strip_overlap() {
        let viewport = Rect::new(0.0, 100.0, 320.0, 500.0);
        // Fully covering the bottom strip.
        let dragged = Rect::new(0.0, 450.0, 320.0, 520.0);
        assert_eq!(auto_scroll_delta(viewport, dragged, 40.0, 12.0), 12.0);
        // Half of the top strip, full width.
        let dragged = Rect::new(0.0, 80.0, 320.0, 120.0);
        assert_eq!(auto_scroll_delta(viewport, dragged, 40.0, 12.0), -6.0);
        // Middle of the viewport.
        let dragged = Rect::new(0.0, 250.0, 320.0, 300.0);
        assert_eq!(auto_scroll_delta(viewport, dragged, 40.0, 12.0), 0.0);
    }

    #[test]
    fn session_tracks_pointer_scroll_and_renumbering() {
        let frame = Rect::new(0.0, 200.0, 320.0, 240.0);
        // Grabbed 10 below the top edge at offset 100.
        let mut session = DragSession::new(Tag(5), frame, Point::new(20.0, 110.0), 100.0);
        assert_eq!(session.frame_at(Size::new(320.0, 40.0), 100.0), frame);
        // Content scrolled by 30 under a stationary pointer.
        assert_eq!(
            session.frame_at(Size::new(320.0, 40.0), 130.0).y0,
            frame.y0 + 30.0
        );
        session.set_candidate(Some(Tag(7)));
        session.follow(&[
            Renumbered {
                from: Tag(5),
                to: Tag(6),
            },
            Renumbered {
                from: Tag(7),
                to: Tag(8),
            },
        ]);
        assert_eq!(session.tag(), Tag(6));
        assert_eq!(session.candidate(), Some(Tag(8)));
    }
}
