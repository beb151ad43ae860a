// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Faults reported by the list view.

use alloc::vec::Vec;
use core::fmt;

use understory_section_layout::SectionRow;

/// A contract violation between the list view and its collaborators.
///
/// Every variant is sticky: once returned, the list view keeps returning the same
/// error from every operation until [`ListView::reload_data`] succeeds.
///
/// [`ListView::reload_data`]: crate::ListView::reload_data
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListViewError {
    /// The renderer produced no view for a row.
    MissingRow(SectionRow),
    /// The renderer produced no view for a section header.
    MissingHeader {
        /// Section whose header was requested.
        section: usize,
    },
    /// Item counts changed without a matching mutation.
    CountsChanged {
        /// Per-section counts implied by the mutations seen so far.
        expected: Vec<usize>,
        /// Per-section counts the source reports.
        actual: Vec<usize>,
    },
    /// A mutation named a position that does not exist.
    InvalidPosition(SectionRow),
}

impl fmt::Display for ListViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRow(at) => write!(
                f,
                "renderer returned no view for section {} row {}",
                at.section, at.row
            ),
            Self::MissingHeader { section } => {
                write!(f, "renderer returned no header view for section {section}")
            }
            Self::CountsChanged { expected, actual } => write!(
                f,
                "item counts changed outside a mutation: expected {expected:?}, found {actual:?}"
            ),
            Self::InvalidPosition(at) => write!(
                f,
                "no item at section {} row {}",
                at.section, at.row
            ),
        }
    }
}

impl core::error::Error for ListViewError {}
