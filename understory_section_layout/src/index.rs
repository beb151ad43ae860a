// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed row identities.

/// A row ordinal flattened across all sections, row-major in section order.
///
/// For a given set of section counts, index `i` belongs to the smallest section `s`
/// whose cumulative count exceeds `i`. The mapping depends on the counts at the time
/// of the query, so a `LinearIndex` should not be held across data changes without
/// being renumbered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinearIndex(pub usize);

impl LinearIndex {
    /// Returns the raw ordinal.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Shifts this index by `delta`, returning `None` on underflow or overflow.
    #[must_use]
    pub const fn checked_offset(self, delta: isize) -> Option<Self> {
        match self.0.checked_add_signed(delta) {
            Some(i) => Some(Self(i)),
            None => None,
        }
    }
}

/// A `(section, row)` pair addressing one item in the data source.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionRow {
    /// Zero-based section ordinal.
    pub section: usize,
    /// Zero-based row within the section.
    pub row: usize,
}

impl SectionRow {
    /// Creates a new `(section, row)` pair.
    #[must_use]
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearIndex, SectionRow};

    #[test]
    fn offsets_are_checked() {
        assert_eq!(LinearIndex(5).checked_offset(2), Some(LinearIndex(7)));
        assert_eq!(LinearIndex(5).checked_offset(-5), Some(LinearIndex(0)));
        assert_eq!(LinearIndex(0).checked_offset(-1), None);
    }

    #[test]
    fn section_rows_order_section_major() {
        assert!(SectionRow::new(0, 9) < SectionRow::new(1, 0));
        assert!(SectionRow::new(1, 0) < SectionRow::new(1, 1));
    }
}
