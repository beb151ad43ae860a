// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout modes, per-mode metrics, and the data-source trait.

/// How rows are arranged on screen.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// One item per line, stacked vertically with section headers interleaved.
    #[default]
    Table,
    /// As many items per line as fit the viewport width, tiled row-major.
    ///
    /// The last line of a section may be partially filled; its remaining cells stay empty.
    Collection,
}

impl LayoutMode {
    /// Returns the other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Table => Self::Collection,
            Self::Collection => Self::Table,
        }
    }
}

/// Size and spacing of a single cell in one layout mode.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CellMetrics {
    /// Cell width.
    pub width: f64,
    /// Cell height.
    pub height: f64,
    /// Vertical gap after each line of cells.
    pub padding: f64,
}

impl CellMetrics {
    /// Creates new cell metrics.
    #[must_use]
    pub const fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    /// Distance between the tops of two consecutive lines: `height + padding`.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.height + self.padding
    }

    pub(crate) fn sanitized(self) -> Self {
        Self {
            width: non_negative(self.width),
            height: non_negative(self.height),
            padding: non_negative(self.padding),
        }
    }
}

/// Size of a section header in one layout mode.
///
/// A width of `0.0` means the header spans the full viewport width.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HeaderMetrics {
    /// Header width, or `0.0` for full width.
    pub width: f64,
    /// Header height.
    pub height: f64,
}

impl HeaderMetrics {
    /// Creates new header metrics.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub(crate) fn sanitized(self) -> Self {
        Self {
            width: non_negative(self.width),
            height: non_negative(self.height),
        }
    }
}

/// Read-only view of the host's sectioned data.
///
/// The host application owns the items; the layout only ever asks for counts and
/// dimensions. Counts are re-read for every operation, so implementations are free
/// to change them between calls (as long as whoever drives the list is told about
/// the change).
pub trait SectionSource {
    /// Number of sections.
    fn section_count(&self) -> usize;

    /// Number of items in `section`. Zero is allowed.
    fn item_count(&self, section: usize) -> usize;

    /// Cell size and padding for `mode`.
    fn cell_metrics(&self, mode: LayoutMode) -> CellMetrics;

    /// Header size for `mode`.
    fn header_metrics(&self, mode: LayoutMode) -> HeaderMetrics;

    /// Sum of all section counts.
    fn total_count(&self) -> usize {
        (0..self.section_count()).map(|s| self.item_count(s)).sum()
    }
}

impl<S: SectionSource + ?Sized> SectionSource for &S {
    fn section_count(&self) -> usize {
        (**self).section_count()
    }

    fn item_count(&self, section: usize) -> usize {
        (**self).item_count(section)
    }

    fn cell_metrics(&self, mode: LayoutMode) -> CellMetrics {
        (**self).cell_metrics(mode)
    }

    fn header_metrics(&self, mode: LayoutMode) -> HeaderMetrics {
        (**self).header_metrics(mode)
    }
}

/// Clamps finite negative values to `0.0`.
pub(crate) fn non_negative(v: f64) -> f64 {
    // Dimensions are expected to be finite. Catch NaNs (and infinities) in
    // debug builds so misuse does not go unnoticed.
    debug_assert!(v.is_finite(), "layout dimensions must be finite; got {v:?}");
    if v.is_sign_negative() { 0.0 } else { v }
}

#[cfg(test)]
mod tests {
    use super::{CellMetrics, HeaderMetrics, LayoutMode};

    #[test]
    fn negative_dimensions_are_clamped_to_zero() {
        let cell = CellMetrics::new(-1.0, 10.0, -2.0).sanitized();
        assert_eq!(cell, CellMetrics::new(0.0, 10.0, 0.0));
        let header = HeaderMetrics::new(-5.0, -5.0).sanitized();
        assert_eq!(header, HeaderMetrics::new(0.0, 0.0));
    }

    #[test]
    fn modes_toggle() {
        assert_eq!(LayoutMode::Table.toggled(), LayoutMode::Collection);
        assert_eq!(LayoutMode::Collection.toggled(), LayoutMode::Table);
    }
}
