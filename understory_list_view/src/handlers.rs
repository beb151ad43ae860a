// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optional host callbacks for drops, taps, and editing actions.

use understory_section_layout::SectionRow;

/// Immediate answer of a [`DropHandler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReply {
    /// The drop was accepted and the dragged item has been removed from the data.
    Succeeded,
    /// The drop was refused; the dragged view returns to its slot.
    Failed,
    /// The outcome is not known yet; the host reports it later through
    /// [`ListView::complete_drop`](crate::ListView::complete_drop).
    Deferred,
}

/// Final outcome of a deferred drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// See [`DropReply::Succeeded`].
    Succeeded,
    /// See [`DropReply::Failed`].
    Failed,
}

/// A drop of one row onto another.
#[derive(Debug)]
pub struct DropRequest<'a, H> {
    /// View being dragged.
    pub dragged: &'a H,
    /// View it was released over.
    pub target: &'a H,
    /// Data position of the dragged row.
    pub from: SectionRow,
    /// Data position of the target row.
    pub onto: SectionRow,
}

/// Decides what happens when a dragged row is released over another row.
///
/// On [`DropReply::Succeeded`] the host must already have removed the dragged item
/// from its data; the list view then removes its row with the usual animation.
pub trait DropHandler<H> {
    /// Handles a drop.
    fn on_drop(&mut self, request: DropRequest<'_, H>) -> DropReply;
}

impl<H, F> DropHandler<H> for F
where
    F: FnMut(DropRequest<'_, H>) -> DropReply,
{
    fn on_drop(&mut self, request: DropRequest<'_, H>) -> DropReply {
        self(request)
    }
}

/// Receives taps and editing actions, in data coordinates.
///
/// Every method defaults to doing nothing.
pub trait SelectionHandler {
    /// A row was tapped outside editing mode.
    fn cell_tapped(&mut self, at: SectionRow) {
        let _ = at;
    }

    /// A row's checkbox changed while editing.
    fn checkbox_toggled(&mut self, at: SectionRow, selected: bool) {
        let _ = (at, selected);
    }

    /// A button in an open drawer was pressed.
    fn drawer_button_pressed(&mut self, at: SectionRow, button: usize) {
        let _ = (at, button);
    }

    /// A pull-to-refresh gesture was released past the threshold.
    fn refresh_requested(&mut self) {}
}
