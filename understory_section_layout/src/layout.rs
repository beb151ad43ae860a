// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel geometry for sectioned rows in either layout mode.

use alloc::vec::Vec;
use core::ops::Range;

use kurbo::Rect;

use crate::source::non_negative;
use crate::{
    CellMetrics, Columns, HeaderMetrics, LayoutMode, LinearIndex, SectionRow, SectionSource,
};

/// A snapshot of section geometry for one layout mode and viewport width.
///
/// `SectionLayout` is a pure function of its inputs: the per-section item counts,
/// the mode's cell and header metrics, and the viewport width. It precomputes the
/// cumulative item count and the top edge of every section so that frame and index
/// queries are `O(1)` or `O(log sections)`.
///
/// Snapshots are meant to live for a single operation. Counts can change between
/// operations, so capture a fresh one with [`SectionLayout::capture`] each time.
///
/// Per section, the content is a header of `header.height` followed by
/// `lines * (cell.height + cell.padding)` of body, where `lines` is the row count in
/// [`LayoutMode::Table`] and `ceil(rows / columns)` in [`LayoutMode::Collection`].
/// A section with zero items still reserves its header.
#[derive(Clone, Debug)]
pub struct SectionLayout {
    mode: LayoutMode,
    viewport_width: f64,
    cell: CellMetrics,
    header: HeaderMetrics,
    columns: Columns,
    counts: Vec<usize>,
    /// First linear index of each section, followed by the total count.
    first_index: Vec<usize>,
    /// Top edge of each section's header, followed by the end of the last body.
    section_top: Vec<f64>,
}

impl SectionLayout {
    /// Reads counts and metrics from `source` for `mode`.
    #[must_use]
    pub fn capture<S: SectionSource + ?Sized>(
        source: &S,
        mode: LayoutMode,
        viewport_width: f64,
    ) -> Self {
        let counts = (0..source.section_count())
            .map(|s| source.item_count(s))
            .collect();
        Self::from_counts(
            counts,
            mode,
            viewport_width,
            source.cell_metrics(mode),
            source.header_metrics(mode),
        )
    }

    /// Builds a layout from explicit counts and metrics.
    #[must_use]
    pub fn from_counts(
        counts: Vec<usize>,
        mode: LayoutMode,
        viewport_width: f64,
        cell: CellMetrics,
        header: HeaderMetrics,
    ) -> Self {
        let viewport_width = non_negative(viewport_width);
        let cell = cell.sanitized();
        let header = header.sanitized();
        let columns = Columns::for_mode(mode, viewport_width, cell.width);
        let line_height = cell.line_height();

        let mut first_index = Vec::with_capacity(counts.len() + 1);
        let mut section_top = Vec::with_capacity(counts.len() + 1);
        let mut index = 0_usize;
        let mut top = 0.0_f64;
        for &count in &counts {
            first_index.push(index);
            section_top.push(top);
            index += count;
            top += header.height + columns.lines_for(count) as f64 * line_height;
        }
        first_index.push(index);
        section_top.push(top);

        Self {
            mode,
            viewport_width,
            cell,
            header,
            columns,
            counts,
            first_index,
            section_top,
        }
    }

    /// The layout mode this snapshot was computed for.
    #[must_use]
    pub const fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// The viewport width this snapshot was computed for.
    #[must_use]
    pub const fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    /// Cell metrics (negative values clamped to zero).
    #[must_use]
    pub const fn cell_metrics(&self) -> CellMetrics {
        self.cell
    }

    /// Header metrics (negative values clamped to zero).
    #[must_use]
    pub const fn header_metrics(&self) -> HeaderMetrics {
        self.header
    }

    /// Column arrangement.
    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Distance between consecutive lines.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.cell.line_height()
    }

    /// Per-section item counts.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Number of sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all section counts.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.first_index.last().copied().unwrap_or(0)
    }

    /// Linear indices belonging to `section`, or an empty range past the end.
    #[must_use]
    pub fn section_range(&self, section: usize) -> Range<usize> {
        if section >= self.counts.len() {
            let total = self.total_count();
            return total..total;
        }
        self.first_index[section]..self.first_index[section + 1]
    }

    /// Maps a linear index to its `(section, row)`.
    ///
    /// Returns `None` when `index` is past the total count.
    #[must_use]
    pub fn section_row_for(&self, index: LinearIndex) -> Option<SectionRow> {
        let i = index.get();
        if i >= self.total_count() {
            return None;
        }
        // Smallest section whose cumulative count exceeds `i`.
        let section = self.first_index[1..].partition_point(|&end| end <= i);
        Some(SectionRow::new(section, i - self.first_index[section]))
    }

    /// Maps a `(section, row)` to its linear index.
    ///
    /// Returns `None` when the position does not name an existing item.
    #[must_use]
    pub fn linear_index_for(&self, at: SectionRow) -> Option<LinearIndex> {
        let count = *self.counts.get(at.section)?;
        (at.row < count).then(|| LinearIndex(self.first_index[at.section] + at.row))
    }

    /// Like [`linear_index_for`](Self::linear_index_for), but also accepts the
    /// one-past-the-end row of a section (an insertion point).
    #[must_use]
    pub fn insertion_index_for(&self, at: SectionRow) -> Option<LinearIndex> {
        let count = *self.counts.get(at.section)?;
        (at.row <= count).then(|| LinearIndex(self.first_index[at.section] + at.row))
    }

    fn top_of(&self, section: usize) -> f64 {
        debug_assert!(
            section <= self.counts.len(),
            "SectionLayout section out of bounds: section={section}, len={}",
            self.counts.len()
        );
        let clamped = section.min(self.counts.len());
        self.section_top[clamped]
    }

    /// Frame of the cell at `(section, row)`.
    ///
    /// Rows past the end of a section are laid out as if the section were longer,
    /// which is where an inserted row would land.
    #[must_use]
    pub fn frame_for(&self, at: SectionRow) -> Rect {
        let body_top = self.top_of(at.section) + self.header.height;
        let line = self.columns.line_of(at.row);
        let x = self.columns.x_of(self.columns.column_of(at.row));
        let y = body_top + line as f64 * self.line_height();
        Rect::from_origin_size((x, y), (self.cell.width, self.cell.height))
    }

    /// Frame of the cell at a linear index, if it exists.
    #[must_use]
    pub fn frame_for_index(&self, index: LinearIndex) -> Option<Rect> {
        self.section_row_for(index).map(|at| self.frame_for(at))
    }

    /// Frame of the header of `section`.
    #[must_use]
    pub fn frame_for_header(&self, section: usize) -> Rect {
        let width = if self.header.width > 0.0 {
            self.header.width
        } else {
            self.viewport_width
        };
        let x = (self.viewport_width - width).max(0.0) / 2.0;
        Rect::from_origin_size((x, self.top_of(section)), (width, self.header.height))
    }

    /// Accumulated height of all sections, without the trailing margin.
    #[must_use]
    pub fn body_height(&self) -> f64 {
        self.section_top.last().copied().unwrap_or(0.0)
    }

    /// Scrollable content height for a viewport of `viewport_height`.
    ///
    /// This is the body height plus a trailing margin of one cell padding. When that
    /// fits inside the viewport the content is forced to `viewport_height + 1.0`, so
    /// the viewport can always be scrolled (and pulled).
    #[must_use]
    pub fn content_height(&self, viewport_height: f64) -> f64 {
        let height = self.body_height() + self.cell.padding;
        if height <= viewport_height {
            viewport_height + 1.0
        } else {
            height
        }
    }

    /// First item whose frame ends strictly below `y`, in index order.
    ///
    /// Frames are ordered by linear index, so every later item also ends below `y`.
    #[must_use]
    pub fn first_index_ending_after(&self, y: f64) -> Option<LinearIndex> {
        let sections = self.counts.len();
        let line_height = self.line_height();
        let start = self.section_top[..sections]
            .partition_point(|&top| top <= y)
            .saturating_sub(1);
        for section in start..sections {
            let count = self.counts[section];
            if count == 0 {
                continue;
            }
            let rel = y - (self.section_top[section] + self.header.height);
            let line = if rel <= 0.0 || line_height <= 0.0 {
                0
            } else {
                let line = floor_ratio(rel, line_height);
                if line as f64 * line_height + self.cell.height <= rel {
                    line + 1
                } else {
                    line
                }
            };
            if line < self.columns.lines_for(count) {
                return Some(LinearIndex(
                    self.first_index[section] + line * self.columns.count(),
                ));
            }
        }
        None
    }

    /// Last item whose frame starts strictly above `y`, in index order.
    ///
    /// Frames are ordered by linear index, so every earlier item also starts above `y`.
    #[must_use]
    pub fn last_index_starting_before(&self, y: f64) -> Option<LinearIndex> {
        let sections = self.counts.len();
        let line_height = self.line_height();
        let end = self.section_top[..sections].partition_point(|&top| top < y);
        for section in (0..end).rev() {
            let count = self.counts[section];
            if count == 0 {
                continue;
            }
            let rel = y - (self.section_top[section] + self.header.height);
            if rel <= 0.0 {
                continue;
            }
            let lines = self.columns.lines_for(count);
            let started = if line_height <= 0.0 {
                lines
            } else {
                ceil_ratio(rel, line_height).min(lines)
            };
            let last = (self.first_index[section] + started * self.columns.count())
                .min(self.first_index[section + 1]);
            return Some(LinearIndex(last - 1));
        }
        None
    }

    /// Sections touched by the inclusive index range `first..=last`.
    ///
    /// Empty sections lying between two touched sections are included.
    #[must_use]
    pub fn sections_spanning(&self, first: LinearIndex, last: LinearIndex) -> Range<usize> {
        match (self.section_row_for(first), self.section_row_for(last)) {
            (Some(a), Some(b)) if a.section <= b.section => a.section..b.section + 1,
            _ => 0..0,
        }
    }
}

/// `floor(a / b)` for `a >= 0`, `b > 0`.
fn floor_ratio(a: f64, b: f64) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Truncation is the intended floor for a non-negative ratio"
    )]
    let q = (a / b) as usize;
    q
}

/// `ceil(a / b)` for `a >= 0`, `b > 0`.
fn ceil_ratio(a: f64, b: f64) -> usize {
    let q = floor_ratio(a, b);
    if (q as f64) * b < a { q + 1 } else { q }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::SectionLayout;
    use crate::{CellMetrics, HeaderMetrics, LayoutMode, LinearIndex, SectionRow};

    fn table(counts: Vec<usize>) -> SectionLayout {
        SectionLayout::from_counts(
            counts,
            LayoutMode::Table,
            320.0,
            CellMetrics::new(320.0, 64.0, 12.0),
            HeaderMetrics::new(0.0, 32.0),
        )
    }

    fn grid(counts: Vec<usize>) -> SectionLayout {
        SectionLayout::from_counts(
            counts,
            LayoutMode::Collection,
            320.0,
            CellMetrics::new(100.0, 100.0, 10.0),
            HeaderMetrics::new(0.0, 20.0),
        )
    }

    #[test]
    fn table_rows_stack_below_headers() {
        let layout = table(vec![10, 10, 10]);
        assert_eq!(layout.frame_for(SectionRow::new(0, 0)).y0, 32.0);
        assert_eq!(layout.frame_for(SectionRow::new(0, 1)).y0, 32.0 + 76.0);
        // Section 1 starts after header + 10 lines.
        let section_1 = 32.0 + 10.0 * 76.0;
        assert_eq!(layout.frame_for_header(1).y0, section_1);
        assert_eq!(layout.frame_for(SectionRow::new(1, 0)).y0, section_1 + 32.0);
        assert_eq!(layout.frame_for(SectionRow::new(1, 0)).height(), 64.0);
    }

    #[test]
    fn table_frames_are_monotonic_within_a_section() {
        let layout = table(vec![3, 7, 0, 5]);
        for section in 0..layout.section_count() {
            let range = layout.section_range(section);
            let ys: Vec<f64> = range
                .map(|i| layout.frame_for_index(LinearIndex(i)).unwrap().y0)
                .collect();
            assert!(
                ys.windows(2).all(|w| w[0] < w[1]),
                "section {section}: {ys:?}"
            );
        }
    }

    #[test]
    fn narrow_table_cells_are_centered() {
        let layout = SectionLayout::from_counts(
            vec![1],
            LayoutMode::Table,
            320.0,
            CellMetrics::new(300.0, 40.0, 0.0),
            HeaderMetrics::new(0.0, 0.0),
        );
        assert_eq!(layout.frame_for(SectionRow::new(0, 0)).x0, 10.0);
    }

    #[test]
    fn collection_tiles_rows_into_lines() {
        let layout = grid(vec![10]);
        assert_eq!(layout.columns().count(), 3);
        let frame = layout.frame_for(SectionRow::new(0, 4));
        // Line 1, column 1.
        assert_eq!(frame.y0, 20.0 + 110.0);
        assert_eq!(frame.x0, 110.0);
        // Four lines for ten items; the last line holds a single cell.
        assert_eq!(layout.body_height(), 20.0 + 4.0 * 110.0);
    }

    #[test]
    fn empty_sections_reserve_only_their_header() {
        let layout = table(vec![2, 0, 1]);
        let after_first = 32.0 + 2.0 * 76.0;
        assert_eq!(layout.frame_for_header(1).y0, after_first);
        assert_eq!(layout.frame_for_header(2).y0, after_first + 32.0);
        assert_eq!(layout.section_range(1), 2..2);
    }

    #[test]
    fn linear_index_round_trips_through_sections() {
        let layout = table(vec![3, 0, 4, 2]);
        for i in 0..layout.total_count() {
            let at = layout.section_row_for(LinearIndex(i)).unwrap();
            assert_eq!(layout.linear_index_for(at), Some(LinearIndex(i)));
        }
        assert_eq!(
            layout.section_row_for(LinearIndex(3)),
            Some(SectionRow::new(2, 0))
        );
        assert_eq!(layout.section_row_for(LinearIndex(9)), None);
        assert_eq!(layout.linear_index_for(SectionRow::new(1, 0)), None);
        assert_eq!(
            layout.insertion_index_for(SectionRow::new(1, 0)),
            Some(LinearIndex(3))
        );
    }

    #[test]
    fn short_content_is_forced_scrollable() {
        let layout = table(vec![2]);
        assert_eq!(layout.content_height(600.0), 601.0);
        let long = table(vec![100]);
        assert_eq!(long.content_height(600.0), 32.0 + 100.0 * 76.0 + 12.0);
    }

    #[test]
    fn empty_layout_has_no_indices() {
        let layout = table(Vec::new());
        assert_eq!(layout.total_count(), 0);
        assert_eq!(layout.first_index_ending_after(0.0), None);
        assert_eq!(layout.last_index_starting_before(100.0), None);
        assert_eq!(layout.content_height(600.0), 601.0);
    }

    #[test]
    fn offset_queries_skip_padding_and_headers() {
        let layout = table(vec![10, 10]);
        // Inside the padding after row 0: row 0 has ended, row 1 is next.
        assert_eq!(
            layout.first_index_ending_after(32.0 + 70.0),
            Some(LinearIndex(1))
        );
        assert_eq!(
            layout.first_index_ending_after(32.0 + 10.0),
            Some(LinearIndex(0))
        );
        // Inside section 1's header: the first row of section 1.
        let section_1 = 32.0 + 10.0 * 76.0;
        assert_eq!(
            layout.first_index_ending_after(section_1 + 5.0),
            Some(LinearIndex(10))
        );
        assert_eq!(
            layout.last_index_starting_before(section_1 + 5.0),
            Some(LinearIndex(9))
        );
        assert_eq!(layout.last_index_starting_before(32.0), None);
        assert_eq!(
            layout.last_index_starting_before(33.0),
            Some(LinearIndex(0))
        );
    }
}
