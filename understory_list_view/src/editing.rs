// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Editing mode and multi-selection.

use alloc::collections::BTreeSet;

use understory_section_layout::LinearIndex;

use crate::identity::{index_after_insert, index_after_remove};

/// Editing flag and the set of selected rows.
///
/// Selection is kept by linear index in the same space as the live tags, and is
/// renumbered alongside them, so it survives rows scrolling out of the window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditingState {
    editing: bool,
    selected: BTreeSet<LinearIndex>,
}

impl EditingState {
    /// Returns `true` while editing.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// Enters or leaves editing mode. Leaving clears the selection.
    ///
    /// Returns `true` if the mode changed.
    pub fn set_editing(&mut self, editing: bool) -> bool {
        if self.editing == editing {
            return false;
        }
        self.editing = editing;
        if !editing {
            self.selected.clear();
        }
        true
    }

    /// Flips the selection of `index` and returns its new state.
    ///
    /// Outside editing mode nothing is selectable and this returns `false`.
    pub fn toggle(&mut self, index: LinearIndex) -> bool {
        if !self.editing {
            return false;
        }
        if self.selected.remove(&index) {
            false
        } else {
            self.selected.insert(index);
            true
        }
    }

    /// Returns `true` if `index` is selected.
    #[must_use]
    pub fn is_selected(&self, index: LinearIndex) -> bool {
        self.selected.contains(&index)
    }

    /// Selected indices, ascending.
    pub fn selected(&self) -> impl Iterator<Item = LinearIndex> + '_ {
        self.selected.iter().copied()
    }

    /// Follows rows inserted at the final positions `inserted`.
    pub fn expand(&mut self, inserted: &[LinearIndex]) {
        self.selected = self
            .selected
            .iter()
            .map(|i| LinearIndex(index_after_insert(i.0, inserted)))
            .collect();
    }

    /// Follows rows removed from the old positions `removed`; removed rows are
    /// deselected.
    pub fn compact(&mut self, removed: &[LinearIndex]) {
        self.selected = self
            .selected
            .iter()
            .filter_map(|i| index_after_remove(i.0, removed).map(LinearIndex))
            .collect();
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}
