// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_list_view --heading-base-level=0

//! Understory List View: a virtualized table and grid controller.
//!
//! A [`ListView`] presents a sectioned data set through a bounded pool of host views.
//! Geometry comes from [`understory_section_layout`]; this crate adds everything that
//! has state:
//!
//! - [`IdentityMap`]: live views keyed by a [`Tag`] that is always
//!   `tag_base + linear index`, renumbered in place when rows are inserted or removed
//!   so that tags keep resolving to the data position their view displays.
//! - [`Lifecycle`]: creates, recycles, animates, and destroys views so that exactly the
//!   [`VisibleWindow`] is materialized, plus any view that is animating or being
//!   dragged.
//! - [`Sequencer`]: serializes inserts, removals, and layout-mode transforms through
//!   the [`Phase`]s Shifting, Renumbering, and Reconciling, waiting for animations to
//!   settle before each renumber.
//! - Gestures: drag-and-drop with drop-target picking and edge auto-scroll
//!   ([`DragSession`]), pull-to-refresh ([`RefreshState`]), multi-selection while
//!   editing ([`EditingState`]), and per-row action drawers.
//!
//! The host supplies three collaborators: a [`SectionSource`] with the counts and
//! metrics, a [`RowRenderer`] that makes and positions views, and optionally a
//! [`DropHandler`] and a [`SelectionHandler`]. Time is host-driven: call
//! [`ListView::tick`] from the frame loop with a monotonic clock.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_list_view::{ListView, ListViewOptions, RowRenderer};
//! use understory_section_layout::{CellMetrics, HeaderMetrics, SectionRow, StaticSections};
//!
//! #[derive(Default)]
//! struct Labels {
//!     next: u32,
//!     live: usize,
//! }
//!
//! impl RowRenderer for Labels {
//!     type Handle = u32;
//!
//!     fn make_row(&mut self, _at: SectionRow, _frame: Rect) -> Option<u32> {
//!         self.next += 1;
//!         self.live += 1;
//!         Some(self.next)
//!     }
//!
//!     fn update_row(&mut self, _handle: &u32, _at: SectionRow) {}
//!
//!     fn make_header(&mut self, _section: usize, _frame: Rect) -> Option<u32> {
//!         self.next += 1;
//!         self.live += 1;
//!         Some(self.next)
//!     }
//!
//!     fn destroy(&mut self, _handle: u32) {
//!         self.live -= 1;
//!     }
//! }
//!
//! let cell = CellMetrics::new(320.0, 64.0, 12.0);
//! let source = StaticSections::new(vec![10, 10, 10], cell, cell, HeaderMetrics::new(0.0, 32.0));
//! let options = ListViewOptions::default().with_prefetch_margin(0);
//! let mut list = ListView::new(source, Labels::default(), options);
//!
//! list.attach(Rect::new(0.0, 0.0, 320.0, 600.0)).unwrap();
//! // Eight rows and the first header.
//! assert_eq!(list.rows().count(), 8);
//! assert_eq!(list.renderer().live, 9);
//!
//! // The host changes its data first, then reports the change.
//! list.source_mut().grow(0, 1);
//! list.insert_rows(&[SectionRow::new(0, 0)]).unwrap();
//! list.tick(1.0).unwrap();
//! assert_eq!(list.pending_mutations(), 0);
//!
//! list.detach();
//! assert_eq!(list.renderer().live, 0);
//! ```
//!
//! [`VisibleWindow`]: understory_section_layout::VisibleWindow
//! [`SectionSource`]: understory_section_layout::SectionSource
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod drag;
mod editing;
mod engine;
mod error;
mod handlers;
mod identity;
mod lifecycle;
mod options;
mod refresh;
mod renderer;
mod sequencer;
mod types;
mod view;

#[cfg(test)]
mod testing;

pub use drag::{DragPhase, DragSession, auto_scroll_delta, pick_drop_target};
pub use editing::EditingState;
pub use error::ListViewError;
pub use handlers::{DropHandler, DropOutcome, DropReply, DropRequest, SelectionHandler};
pub use identity::{IdentityMap, MAX_TAG_BASE, RenumberReport, Renumbered, Tag, follow};
pub use lifecycle::{Lifecycle, ReconcileReport};
pub use options::ListViewOptions;
pub use refresh::RefreshState;
pub use renderer::RowRenderer;
pub use sequencer::{IndexBatch, Mutation, MutationHost, MutationKind, Phase, Sequencer};
pub use types::{LiveView, Motion, ViewFlags};
pub use view::ListView;

pub use understory_section_layout;
