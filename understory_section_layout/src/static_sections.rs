// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple in-memory section source.

use alloc::vec::Vec;

use crate::{CellMetrics, HeaderMetrics, LayoutMode, SectionSource};

/// A [`SectionSource`] backed by a vector of counts and fixed per-mode metrics.
///
/// Useful for hosts whose items all share one cell size per mode, and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSections {
    counts: Vec<usize>,
    table: CellMetrics,
    collection: CellMetrics,
    header: HeaderMetrics,
}

impl StaticSections {
    /// Creates a source with the given counts and metrics.
    #[must_use]
    pub fn new(
        counts: impl Into<Vec<usize>>,
        table: CellMetrics,
        collection: CellMetrics,
        header: HeaderMetrics,
    ) -> Self {
        Self {
            counts: counts.into(),
            table,
            collection,
            header,
        }
    }

    /// Current per-section counts.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Replaces the count of `section`.
    pub fn set_count(&mut self, section: usize, count: usize) {
        self.counts[section] = count;
    }

    /// Adds `n` rows to `section`.
    pub fn grow(&mut self, section: usize, n: usize) {
        self.counts[section] += n;
    }

    /// Removes `n` rows from `section`, saturating at zero.
    pub fn shrink(&mut self, section: usize, n: usize) {
        self.counts[section] = self.counts[section].saturating_sub(n);
    }

    /// Appends a section with `count` rows.
    pub fn push_section(&mut self, count: usize) {
        self.counts.push(count);
    }

    /// Replaces the cell metrics used for `mode`.
    pub fn set_cell_metrics(&mut self, mode: LayoutMode, metrics: CellMetrics) {
        match mode {
            LayoutMode::Table => self.table = metrics,
            LayoutMode::Collection => self.collection = metrics,
        }
    }

    /// Replaces the header metrics (shared by both modes).
    pub fn set_header_metrics(&mut self, metrics: HeaderMetrics) {
        self.header = metrics;
    }
}

impl SectionSource for StaticSections {
    fn section_count(&self) -> usize {
        self.counts.len()
    }

    fn item_count(&self, section: usize) -> usize {
        self.counts.get(section).copied().unwrap_or(0)
    }

    fn cell_metrics(&self, mode: LayoutMode) -> CellMetrics {
        match mode {
            LayoutMode::Table => self.table,
            LayoutMode::Collection => self.collection,
        }
    }

    fn header_metrics(&self, _mode: LayoutMode) -> HeaderMetrics {
        self.header
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::StaticSections;
    use crate::{CellMetrics, HeaderMetrics, LayoutMode, SectionSource};

    #[test]
    fn counts_and_metrics_are_reported_per_mode() {
        let table = CellMetrics::new(320.0, 64.0, 12.0);
        let grid = CellMetrics::new(100.0, 100.0, 10.0);
        let header = HeaderMetrics::new(0.0, 32.0);
        let mut source = StaticSections::new(vec![3, 0], table, grid, header);
        assert_eq!(source.section_count(), 2);
        assert_eq!(source.total_count(), 3);
        assert_eq!(source.item_count(7), 0);
        assert_eq!(source.cell_metrics(LayoutMode::Collection), grid);

        source.grow(1, 4);
        source.shrink(0, 5);
        source.push_section(2);
        assert_eq!(source.counts(), &[0, 4, 2]);
    }
}
