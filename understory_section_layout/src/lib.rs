// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_section_layout --heading-base-level=0

//! Understory Section Layout: geometry and visibility for sectioned lists and grids.
//!
//! This crate computes where the items of a sectioned data set go on screen, in one of
//! two [`LayoutMode`]s, and which of them should currently be materialized. It is pure:
//! no views, no animation, no mutable state beyond a per-operation snapshot.
//!
//! The core concepts are:
//!
//! - [`SectionSource`]: the host's read-only view of its data (section count, item count
//!   per section, per-mode [`CellMetrics`] and [`HeaderMetrics`]).
//! - [`LinearIndex`] and [`SectionRow`]: a flattened row ordinal and the `(section, row)`
//!   pair it stands for.
//! - [`SectionLayout`]: a snapshot of section geometry for one mode and viewport width.
//!   It maps `(section, row)` to frames, headers to frames, linear indices to
//!   `(section, row)`, and vertical offsets back to indices.
//! - [`Columns`]: how a section's rows tile into lines in [`LayoutMode::Collection`]
//!   (`floor(viewport_width / cell_width)` cells per line, at least one).
//! - [`visible_linear_indices`]: the contiguous [`VisibleWindow`] of indices whose frames
//!   intersect the viewport plus a prefetch margin.
//! - [`ScrollViewport`]: scroll offset, viewport size, content height, and
//!   frame-revealing scroll targets via [`ScrollAlign`].
//!
//! This crate deliberately does **not** know about views or widgets. Host code is
//! responsible for creating and destroying views for the indices in the window; see
//! `understory_list_view` for a full controller built on top of it.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_section_layout::{
//!     CellMetrics, HeaderMetrics, LayoutMode, LinearIndex, SectionLayout, SectionRow,
//!     StaticSections, visible_linear_indices,
//! };
//!
//! // Three sections of ten rows: 64 tall, 12 apart, under 32-tall headers.
//! let cell = CellMetrics::new(320.0, 64.0, 12.0);
//! let source = StaticSections::new(vec![10, 10, 10], cell, cell, HeaderMetrics::new(0.0, 32.0));
//!
//! let layout = SectionLayout::capture(&source, LayoutMode::Table, 320.0);
//! assert_eq!(layout.frame_for(SectionRow::new(0, 1)).y0, 32.0 + 76.0);
//!
//! let window = visible_linear_indices(&layout, Rect::new(0.0, 0.0, 320.0, 600.0), 0);
//! assert_eq!(window.first(), Some(LinearIndex(0)));
//! assert_eq!(window.len(), 8);
//! ```
//!
//! ## Collection mode
//!
//! ```rust
//! use understory_section_layout::{
//!     CellMetrics, HeaderMetrics, LayoutMode, SectionLayout, SectionRow,
//! };
//!
//! // Ten cells, 100 wide, in a 320-wide viewport: three columns.
//! let layout = SectionLayout::from_counts(
//!     vec![10],
//!     LayoutMode::Collection,
//!     320.0,
//!     CellMetrics::new(100.0, 100.0, 10.0),
//!     HeaderMetrics::default(),
//! );
//! assert_eq!(layout.columns().count(), 3);
//! // Row 4 sits on line 1, column 1.
//! let frame = layout.frame_for(SectionRow::new(0, 4));
//! assert_eq!((frame.x0, frame.y0), (110.0, 110.0));
//! ```
//!
//! All geometry lives in content coordinates (origin at the top-left of the
//! scrollable content) and is expected to be finite and non-negative.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod columns;
mod index;
mod layout;
mod source;
mod static_sections;
mod viewport;
mod window;

pub use columns::Columns;
pub use index::{LinearIndex, SectionRow};
pub use layout::SectionLayout;
pub use source::{CellMetrics, HeaderMetrics, LayoutMode, SectionSource};
pub use static_sections::StaticSections;
pub use viewport::{ScrollAlign, ScrollViewport};
pub use window::{VisibleWindow, prefetch_band, visible_linear_indices};
