// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping rows of a section onto lines of cells.
//!
//! In [`LayoutMode::Collection`] each section's rows are tiled row-major into
//! *lines* of `count` cells, where `count = floor(viewport_width / cell_width)`
//! (at least one). [`LayoutMode::Table`] is the degenerate case of a single column.
//!
//! - The line of row `r` is `r / count`, its column is `r % count`.
//! - A section with `n` rows occupies `ceil(n / count)` lines.
//! - Horizontal leftover space is split into `count + 1` equal gaps, so a single
//!   column ends up centered.

use core::num::NonZeroUsize;

use crate::LayoutMode;

/// Column arrangement for one layout mode at one viewport width.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Columns {
    count: NonZeroUsize,
    cell_width: f64,
    viewport_width: f64,
}

impl Columns {
    /// Computes the columns for `mode` at the given viewport and cell widths.
    #[must_use]
    pub fn for_mode(mode: LayoutMode, viewport_width: f64, cell_width: f64) -> Self {
        let count = match mode {
            LayoutMode::Table => 1,
            LayoutMode::Collection if cell_width <= 0.0 => 1,
            LayoutMode::Collection => {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Truncation is the intended floor for a non-negative ratio"
                )]
                let fit = (viewport_width.max(0.0) / cell_width) as usize;
                fit
            }
        };
        Self {
            count: NonZeroUsize::new(count).unwrap_or(NonZeroUsize::MIN),
            cell_width,
            viewport_width,
        }
    }

    /// Number of cells per line (always at least one).
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count.get()
    }

    /// The line containing `row` within its section.
    #[must_use]
    pub const fn line_of(&self, row: usize) -> usize {
        row / self.count.get()
    }

    /// The column of `row` within its line.
    #[must_use]
    pub const fn column_of(&self, row: usize) -> usize {
        row % self.count.get()
    }

    /// Number of lines needed to hold `rows` cells.
    #[must_use]
    pub const fn lines_for(&self, rows: usize) -> usize {
        rows.div_ceil(self.count.get())
    }

    /// Horizontal gap between columns (and at both edges).
    #[must_use]
    pub fn gap(&self) -> f64 {
        let cells = self.count.get() as f64 * self.cell_width;
        (self.viewport_width - cells).max(0.0) / (self.count.get() + 1) as f64
    }

    /// Left edge of `column`.
    #[must_use]
    pub fn x_of(&self, column: usize) -> f64 {
        let gap = self.gap();
        gap + column as f64 * (self.cell_width + gap)
    }
}

#[cfg(test)]
mod tests {
    use super::Columns;
    use crate::LayoutMode;

    #[test]
    fn table_is_a_single_centered_column() {
        let cols = Columns::for_mode(LayoutMode::Table, 320.0, 100.0);
        assert_eq!(cols.count(), 1);
        assert_eq!(cols.line_of(4), 4);
        assert_eq!(cols.column_of(4), 0);
        assert_eq!(cols.x_of(0), 110.0);
    }

    #[test]
    fn collection_fits_floor_of_width_ratio() {
        let cols = Columns::for_mode(LayoutMode::Collection, 320.0, 100.0);
        assert_eq!(cols.count(), 3);
        assert_eq!(cols.line_of(4), 1);
        assert_eq!(cols.column_of(4), 1);
        assert_eq!(cols.lines_for(10), 4);
        assert_eq!(cols.lines_for(0), 0);
        // 20 leftover pixels split into 4 gaps.
        assert_eq!(cols.gap(), 5.0);
        assert_eq!(cols.x_of(0), 5.0);
        assert_eq!(cols.x_of(1), 110.0);
        assert_eq!(cols.x_of(2), 215.0);
    }

    #[test]
    fn at_least_one_column() {
        let narrow = Columns::for_mode(LayoutMode::Collection, 50.0, 100.0);
        assert_eq!(narrow.count(), 1);
        assert_eq!(narrow.x_of(0), 0.0);
        let degenerate = Columns::for_mode(LayoutMode::Collection, 320.0, 0.0);
        assert_eq!(degenerate.count(), 1);
    }
}
