// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll position and size of the visible rectangle.

use kurbo::{Rect, Size};

/// Alignment mode when scrolling a frame into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    /// Align the top of the frame with the top of the viewport.
    Start,
    /// Center the frame within the viewport.
    Center,
    /// Align the bottom of the frame with the bottom of the viewport.
    End,
    /// Move just enough to make the frame fully visible, preferring the
    /// smallest change from the current scroll offset.
    Nearest,
}

/// Vertical scroll state over a content strip.
///
/// The offset is deliberately not clamped at zero: a negative offset models the
/// rubber-band overscroll a pull gesture produces. Use
/// [`clamp_to_content`](Self::clamp_to_content) to snap back into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollViewport {
    offset: f64,
    size: Size,
    content_height: f64,
}

impl ScrollViewport {
    /// Creates a viewport of `size` scrolled to the top.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            offset: 0.0,
            size,
            content_height: size.height + 1.0,
        }
    }

    /// The visible rectangle in content coordinates.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size((0.0, self.offset), self.size)
    }

    /// Current vertical offset.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Sets the vertical offset. Returns `true` if it changed.
    pub fn set_offset(&mut self, offset: f64) -> bool {
        debug_assert!(
            offset.is_finite(),
            "scroll offset must be finite; got {offset:?}"
        );
        if offset == self.offset {
            return false;
        }
        self.offset = offset;
        true
    }

    /// Adjusts the offset by `delta`. Returns `true` if it changed.
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.set_offset(self.offset + delta)
    }

    /// Viewport size.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Sets the viewport size.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Height of the scrollable content.
    #[must_use]
    pub const fn content_height(&self) -> f64 {
        self.content_height
    }

    /// Sets the height of the scrollable content.
    pub fn set_content_height(&mut self, height: f64) {
        self.content_height = height;
    }

    /// Largest offset that keeps the viewport inside the content.
    #[must_use]
    pub fn max_offset(&self) -> f64 {
        (self.content_height - self.size.height).max(0.0)
    }

    /// Clamps `offset` into `0..=max_offset`.
    #[must_use]
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        offset.max(0.0).min(self.max_offset())
    }

    /// Clamps the current offset so that the viewport stays within the content.
    pub fn clamp_to_content(&mut self) -> bool {
        self.set_offset(self.clamp_offset(self.offset))
    }

    /// Returns `true` if `frame` lies entirely inside the viewport.
    #[must_use]
    pub fn is_fully_visible(&self, frame: Rect) -> bool {
        let view = self.rect();
        frame.y0 >= view.y0 && frame.y1 <= view.y1
    }

    /// Returns `true` if `frame` overlaps the viewport at all.
    #[must_use]
    pub fn is_partially_visible(&self, frame: Rect) -> bool {
        let view = self.rect();
        frame.y1 > view.y0 && frame.y0 < view.y1
    }

    /// The offset that brings `frame` into view with the given alignment.
    #[must_use]
    pub fn offset_revealing(&self, frame: Rect, align: ScrollAlign) -> f64 {
        let height = self.size.height;
        let target = match align {
            ScrollAlign::Start => frame.y0,
            ScrollAlign::End => frame.y1 - height,
            ScrollAlign::Center => (frame.y0 + frame.y1) / 2.0 - height / 2.0,
            ScrollAlign::Nearest => {
                if self.is_fully_visible(frame) {
                    self.offset
                } else if frame.y0 < self.offset {
                    frame.y0
                } else {
                    frame.y1 - height
                }
            }
        };
        self.clamp_offset(target)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use super::{ScrollAlign, ScrollViewport};

    #[test]
    fn reveal_alignment_behaves_as_expected() {
        let mut viewport = ScrollViewport::new(Size::new(100.0, 30.0));
        viewport.set_content_height(100.0);
        let item = Rect::new(0.0, 30.0, 100.0, 40.0);

        assert_eq!(viewport.offset_revealing(item, ScrollAlign::Start), 30.0);
        assert_eq!(viewport.offset_revealing(item, ScrollAlign::End), 10.0);
        assert_eq!(viewport.offset_revealing(item, ScrollAlign::Center), 20.0);

        viewport.set_offset(20.0);
        assert_eq!(viewport.offset_revealing(item, ScrollAlign::Nearest), 20.0);
        viewport.set_offset(50.0);
        assert_eq!(viewport.offset_revealing(item, ScrollAlign::Nearest), 30.0);
    }

    #[test]
    fn clamp_keeps_viewport_inside_content() {
        let mut viewport = ScrollViewport::new(Size::new(100.0, 30.0));
        viewport.set_content_height(50.0);
        assert_eq!(viewport.max_offset(), 20.0);

        viewport.set_offset(100.0);
        assert!(viewport.clamp_to_content());
        assert_eq!(viewport.offset(), 20.0);

        viewport.set_offset(-15.0);
        assert_eq!(viewport.rect().y0, -15.0);
        viewport.clamp_to_content();
        assert_eq!(viewport.offset(), 0.0);
    }

    #[test]
    fn visibility_queries_for_frames() {
        let viewport = ScrollViewport::new(Size::new(100.0, 30.0));
        let inside = Rect::new(0.0, 0.0, 100.0, 10.0);
        let straddling = Rect::new(0.0, 25.0, 100.0, 35.0);
        let below = Rect::new(0.0, 40.0, 100.0, 50.0);
        assert!(viewport.is_fully_visible(inside));
        assert!(!viewport.is_fully_visible(straddling));
        assert!(viewport.is_partially_visible(straddling));
        assert!(!viewport.is_partially_visible(below));
    }
}
