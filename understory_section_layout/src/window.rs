// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which linear indices should currently be materialized.

use core::ops::Range;

use kurbo::Rect;

use crate::{LayoutMode, LinearIndex, SectionLayout};

/// A contiguous range of linear indices that should have a live view.
///
/// The range is half-open, `[start, end)`; [`first`](Self::first) and
/// [`last`](Self::last) give the inclusive bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibleWindow {
    /// First index in the window (inclusive).
    pub start: usize,
    /// One past the last index in the window (exclusive).
    pub end: usize,
}

impl VisibleWindow {
    /// A window with no indices.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Returns `true` if the window holds no indices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of indices in the window.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if `index` lies in the window.
    #[must_use]
    pub const fn contains(&self, index: LinearIndex) -> bool {
        self.start <= index.0 && index.0 < self.end
    }

    /// First index (inclusive lower bound), if any.
    #[must_use]
    pub const fn first(&self) -> Option<LinearIndex> {
        if self.is_empty() {
            None
        } else {
            Some(LinearIndex(self.start))
        }
    }

    /// Last index (inclusive upper bound), if any.
    #[must_use]
    pub const fn last(&self) -> Option<LinearIndex> {
        if self.is_empty() {
            None
        } else {
            Some(LinearIndex(self.end - 1))
        }
    }

    /// Iterates the indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = LinearIndex> + use<> {
        self.range().map(LinearIndex)
    }

    /// The window as a raw range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Extends the end of the window by `extra` indices, clamped to `total`.
    #[must_use]
    pub fn extended(self, extra: usize, total: usize) -> Self {
        if self.is_empty() {
            return self;
        }
        Self {
            start: self.start,
            end: self.end.saturating_add(extra).min(total),
        }
    }
}

/// Vertical band, in content coordinates, whose intersecting items form the window.
///
/// The viewport is inflated by `prefetch_margin` lines above and below. In
/// [`LayoutMode::Collection`] the band additionally reaches one more viewport height
/// down, so roughly twice the strictly visible cells are prefetched and fast scrolling
/// does not pop in empty cells.
#[must_use]
pub fn prefetch_band(layout: &SectionLayout, viewport: Rect, prefetch_margin: usize) -> (f64, f64) {
    let margin = prefetch_margin as f64 * layout.line_height();
    let mut bottom = viewport.y1 + margin;
    if layout.mode() == LayoutMode::Collection {
        bottom += viewport.height();
    }
    (viewport.y0 - margin, bottom)
}

/// Computes the linear indices that should be materialized for `viewport`.
///
/// - `viewport`: the visible rectangle in content coordinates.
/// - `prefetch_margin`: extra lines to keep alive before and after the viewport.
///
/// The result is contiguous and clamped to `0..total_count`. An index is in the window
/// exactly when its frame vertically intersects [`prefetch_band`]. An empty data set
/// yields [`VisibleWindow::EMPTY`] without touching any geometry.
#[must_use]
pub fn visible_linear_indices(
    layout: &SectionLayout,
    viewport: Rect,
    prefetch_margin: usize,
) -> VisibleWindow {
    if layout.total_count() == 0 {
        return VisibleWindow::EMPTY;
    }
    let (top, bottom) = prefetch_band(layout, viewport, prefetch_margin);
    if bottom <= top {
        return VisibleWindow::EMPTY;
    }
    let (Some(first), Some(last)) = (
        layout.first_index_ending_after(top),
        layout.last_index_starting_before(bottom),
    ) else {
        return VisibleWindow::EMPTY;
    };
    if first > last {
        return VisibleWindow::EMPTY;
    }
    VisibleWindow {
        start: first.0,
        end: last.0 + 1,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::Rect;

    use super::{VisibleWindow, prefetch_band, visible_linear_indices};
    use crate::{CellMetrics, HeaderMetrics, LayoutMode, LinearIndex, SectionLayout};

    fn layout(mode: LayoutMode, counts: Vec<usize>) -> SectionLayout {
        SectionLayout::from_counts(
            counts,
            mode,
            320.0,
            CellMetrics::new(100.0, 64.0, 12.0),
            HeaderMetrics::new(0.0, 32.0),
        )
    }

    #[test]
    fn empty_data_yields_empty_window() {
        let layout = layout(LayoutMode::Table, Vec::new());
        let window = visible_linear_indices(&layout, Rect::new(0.0, 0.0, 320.0, 600.0), 2);
        assert_eq!(window, VisibleWindow::EMPTY);
        assert_eq!(window.first(), None);

        let all_empty = layout_with_empty_sections();
        let window = visible_linear_indices(&all_empty, Rect::new(0.0, 0.0, 320.0, 600.0), 2);
        assert!(window.is_empty());
    }

    fn layout_with_empty_sections() -> SectionLayout {
        layout(LayoutMode::Table, vec![0, 0, 0])
    }

    #[test]
    fn table_window_at_top() {
        // 3 sections of 10, line height 76, header 32, viewport 600.
        let layout = layout(LayoutMode::Table, vec![10, 10, 10]);
        let viewport = Rect::new(0.0, 0.0, 320.0, 600.0);
        let strict = visible_linear_indices(&layout, viewport, 0);
        assert_eq!(strict.first(), Some(LinearIndex(0)));
        assert_eq!(strict.len(), 8);

        let prefetched = visible_linear_indices(&layout, viewport, 1);
        assert_eq!(prefetched.first(), Some(LinearIndex(0)));
        assert_eq!(prefetched.last(), Some(LinearIndex(8)));
    }

    #[test]
    fn window_crosses_section_headers() {
        let layout = layout(LayoutMode::Table, vec![10, 10, 10]);
        // Row 8 spans 640..704, section 1's header 792..824, its row 1 starts at 900.
        let viewport = Rect::new(0.0, 700.0, 320.0, 900.0);
        let window = visible_linear_indices(&layout, viewport, 0);
        assert_eq!(window.first(), Some(LinearIndex(8)));
        assert_eq!(window.last(), Some(LinearIndex(10)));
    }

    #[test]
    fn window_matches_frame_intersection() {
        for mode in [LayoutMode::Table, LayoutMode::Collection] {
            let layout = layout(mode, vec![7, 0, 12, 1, 30]);
            for step in 0..40 {
                let top = step as f64 * 53.0 - 100.0;
                let viewport = Rect::new(0.0, top, 320.0, top + 400.0);
                for margin in [0, 2] {
                    let window = visible_linear_indices(&layout, viewport, margin);
                    let (band_top, band_bottom) = prefetch_band(&layout, viewport, margin);
                    for i in 0..layout.total_count() {
                        let frame = layout.frame_for_index(LinearIndex(i)).unwrap();
                        let hit = frame.y0 < band_bottom && frame.y1 > band_top;
                        assert_eq!(
                            window.contains(LinearIndex(i)),
                            hit,
                            "{mode:?} index {i} at top {top} margin {margin}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn collection_window_prefetches_about_twice_the_visible_cells() {
        let layout = layout(LayoutMode::Collection, vec![300]);
        let viewport = Rect::new(0.0, 0.0, 320.0, 600.0);
        let window = visible_linear_indices(&layout, viewport, 0);
        // 3 columns; lines start at 32 + 76k. 8 lines start above 600, 16 above 1200.
        assert_eq!(window.first(), Some(LinearIndex(0)));
        assert_eq!(window.len(), 16 * 3);
    }

    #[test]
    fn extended_window_is_clamped() {
        let window = VisibleWindow { start: 2, end: 5 };
        assert_eq!(window.extended(10, 8), VisibleWindow { start: 2, end: 8 });
        assert_eq!(VisibleWindow::EMPTY.extended(3, 8), VisibleWindow::EMPTY);
    }
}
