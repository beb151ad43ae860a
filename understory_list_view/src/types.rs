// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live view records, their flags, and the motions that animate them.

use kurbo::Rect;

bitflags::bitflags! {
    /// Per-view state bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ViewFlags: u8 {
        /// A motion is in flight; the view must not be destroyed by reconciliation.
        const ANIMATING   = 0b0000_0001;
        /// The view is being dragged and follows the pointer.
        const DRAGGING    = 0b0000_0010;
        /// The view is the current drop-target candidate and is drawn dimmed.
        const DIMMED      = 0b0000_0100;
        /// The view's action drawer is open.
        const DRAWER_OPEN = 0b0000_1000;
    }
}

impl ViewFlags {
    /// Flags that protect a view from being destroyed when it leaves the window.
    pub const PINNED: Self = Self::ANIMATING.union(Self::DRAGGING);
}

/// A linear interpolation of frame and opacity over time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Frame at `start`.
    pub from: Rect,
    /// Frame once finished.
    pub to: Rect,
    /// Opacity at `start`.
    pub from_alpha: f64,
    /// Opacity once finished.
    pub to_alpha: f64,
    /// Host time the motion started at.
    pub start: f64,
    /// Length in the host's time unit.
    pub duration: f64,
}

impl Motion {
    /// Fraction of the motion elapsed at `now`, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    /// Frame and opacity at `now`.
    #[must_use]
    pub fn sample(&self, now: f64) -> (Rect, f64) {
        let t = self.progress(now);
        let frame = Rect::new(
            lerp(self.from.x0, self.to.x0, t),
            lerp(self.from.y0, self.to.y0, t),
            lerp(self.from.x1, self.to.x1, t),
            lerp(self.from.y1, self.to.y1, t),
        );
        (frame, lerp(self.from_alpha, self.to_alpha, t))
    }

    /// Returns `true` once `now` has reached the end of the motion.
    #[must_use]
    pub fn is_finished(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// A materialized view together with the state the engine tracks for it.
#[derive(Clone, Debug)]
pub struct LiveView<H> {
    /// Renderer handle.
    pub handle: H,
    /// Current frame in content coordinates.
    pub frame: Rect,
    /// Current opacity.
    pub alpha: f64,
    /// State bits.
    pub flags: ViewFlags,
    pub(crate) motion: Option<Motion>,
}

impl<H> LiveView<H> {
    pub(crate) fn new(handle: H, frame: Rect, alpha: f64) -> Self {
        Self {
            handle,
            frame,
            alpha,
            flags: ViewFlags::empty(),
            motion: None,
        }
    }

    /// The motion currently animating this view, if any.
    #[must_use]
    pub fn motion(&self) -> Option<&Motion> {
        self.motion.as_ref()
    }

    /// Frame the view is heading to: the motion target, or the current frame.
    #[must_use]
    pub fn target_frame(&self) -> Rect {
        self.motion.map_or(self.frame, |m| m.to)
    }

    /// Opacity the view is heading to.
    #[must_use]
    pub fn target_alpha(&self) -> f64 {
        self.motion.map_or(self.alpha, |m| m.to_alpha)
    }

    /// Returns `true` if the view may be destroyed when it leaves the window.
    #[must_use]
    pub fn is_disposable(&self) -> bool {
        !self.flags.intersects(ViewFlags::PINNED)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::{LiveView, Motion, ViewFlags};

    #[test]
    fn motion_interpolates_linearly_and_clamps() {
        let m = Motion {
            from: Rect::new(0.0, 0.0, 10.0, 10.0),
            to: Rect::new(0.0, 100.0, 10.0, 110.0),
            from_alpha: 0.0,
            to_alpha: 1.0,
            start: 1.0,
            duration: 2.0,
        };
        let (frame, alpha) = m.sample(2.0);
        assert_eq!(frame.y0, 50.0);
        assert_eq!(alpha, 0.5);
        assert!(!m.is_finished(2.9));
        assert!(m.is_finished(3.0));
        assert_eq!(m.sample(10.0).0, m.to);
        assert_eq!(m.sample(0.0).0, m.from);
    }

    #[test]
    fn zero_duration_is_immediately_finished() {
        let m = Motion {
            from: Rect::ZERO,
            to: Rect::new(0.0, 0.0, 1.0, 1.0),
            from_alpha: 1.0,
            to_alpha: 1.0,
            start: 5.0,
            duration: 0.0,
        };
        assert!(m.is_finished(5.0));
    }

    #[test]
    fn pinned_views_are_not_disposable() {
        let mut view = LiveView::new((), Rect::ZERO, 1.0);
        assert!(view.is_disposable());
        view.flags |= ViewFlags::DRAGGING;
        assert!(!view.is_disposable());
        view.flags = ViewFlags::DIMMED | ViewFlags::DRAWER_OPEN;
        assert!(view.is_disposable());
    }
}
