// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host-side view factory.

use kurbo::Rect;
use understory_section_layout::SectionRow;

/// Creates, updates, places, and destroys the host's views.
///
/// The list view never inspects a handle; it only passes it back. Frames are in
/// content coordinates.
pub trait RowRenderer {
    /// Host view handle.
    type Handle;

    /// Creates the view for `at`, initially placed at `frame` and fully transparent.
    ///
    /// Returning `None` is a contract violation and faults the list view.
    fn make_row(&mut self, at: SectionRow, frame: Rect) -> Option<Self::Handle>;

    /// Rebinds an existing view to `at` after renumbering.
    fn update_row(&mut self, handle: &Self::Handle, at: SectionRow);

    /// Creates the header view of `section`.
    ///
    /// Returning `None` is a contract violation and faults the list view.
    fn make_header(&mut self, section: usize, frame: Rect) -> Option<Self::Handle>;

    /// Moves a view and sets its opacity.
    fn place(&mut self, handle: &Self::Handle, frame: Rect, alpha: f64) {
        let _ = (handle, frame, alpha);
    }

    /// Shows or hides the action drawer of a row.
    fn set_drawer_open(&mut self, handle: &Self::Handle, open: bool) {
        let _ = (handle, open);
    }

    /// Releases a view. Called at most once per handle.
    fn destroy(&mut self, handle: Self::Handle) {
        drop(handle);
    }
}
