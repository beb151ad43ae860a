// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View lifecycle: materialize, recycle, place, and animate live views.
//!
//! [`Lifecycle`] owns the pool of live row views (an [`IdentityMap`]) and the header
//! views (one per section). Reconciliation against a [`VisibleWindow`] is a
//! three-pass affair:
//!
//! 1. destroy every row outside the window, unless it is pinned by an in-flight
//!    animation or an active drag;
//! 2. create a view for every index in the window that has none, fading it in;
//! 3. materialize headers for the sections the window touches and snap settled views
//!    to their layout frames.
//!
//! Headers are never destroyed by scrolling; they only go away on [`Lifecycle::clear`].
//!
//! Motions are advanced explicitly by [`Lifecycle::tick`], which samples every
//! in-flight [`Motion`](crate::Motion) at the host's clock and pushes the result to the
//! renderer.

use alloc::collections::BTreeSet;

use hashbrown::HashMap;
use kurbo::Rect;
use smallvec::SmallVec;
use understory_section_layout::{LinearIndex, SectionLayout, SectionRow, VisibleWindow};

use crate::error::ListViewError;
use crate::identity::{
    IdentityMap, RenumberReport, Tag, index_after_insert, index_after_remove,
};
use crate::renderer::RowRenderer;
use crate::types::{LiveView, Motion, ViewFlags};

/// What one reconciliation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Row views created.
    pub created: usize,
    /// Row views destroyed.
    pub destroyed: usize,
    /// Header views created.
    pub headers_created: usize,
}

/// Pool of live row and header views.
#[derive(Debug)]
pub struct Lifecycle<H> {
    rows: IdentityMap<LiveView<H>>,
    headers: HashMap<usize, LiveView<H>>,
    /// Indices whose next materialization appears at full opacity.
    placeholders: BTreeSet<LinearIndex>,
    duration: f64,
    now: f64,
}

impl<H> Lifecycle<H> {
    /// Creates an empty pool.
    ///
    /// - `tag_base`: tag of linear index zero.
    /// - `duration`: length of every animation; `0.0` applies changes immediately.
    #[must_use]
    pub fn new(tag_base: u64, duration: f64) -> Self {
        Self {
            rows: IdentityMap::new(tag_base),
            headers: HashMap::new(),
            placeholders: BTreeSet::new(),
            duration: duration.max(0.0),
            now: 0.0,
        }
    }

    /// Live row views.
    #[must_use]
    pub fn rows(&self) -> &IdentityMap<LiveView<H>> {
        &self.rows
    }

    /// A live row view.
    #[must_use]
    pub fn row(&self, tag: Tag) -> Option<&LiveView<H>> {
        self.rows.get(tag)
    }

    /// The header view of `section`, if materialized.
    #[must_use]
    pub fn header(&self, section: usize) -> Option<&LiveView<H>> {
        self.headers.get(&section)
    }

    /// Materialized headers, in no particular order.
    pub fn headers(&self) -> impl Iterator<Item = (usize, &LiveView<H>)> {
        self.headers.iter().map(|(&s, v)| (s, v))
    }

    /// Last time passed to [`tick`](Self::tick).
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Returns `true` if no row or header is animating.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let animating = |v: &LiveView<H>| v.flags.contains(ViewFlags::ANIMATING);
        !self.rows.iter().any(|(_, _, v)| animating(v)) && !self.headers.values().any(animating)
    }

    /// Makes the next view created for `index` appear without a fade.
    pub fn mark_placeholder(&mut self, index: LinearIndex) {
        self.placeholders.insert(index);
    }

    /// Sets or clears `flags` on a live row. Returns `false` if `tag` is not live.
    pub fn set_flags(&mut self, tag: Tag, flags: ViewFlags, on: bool) -> bool {
        match self.rows.get_mut(tag) {
            Some(view) => {
                view.flags.set(flags, on);
                true
            }
            None => false,
        }
    }

    /// Brings the pool in line with `window` under `layout`.
    pub fn reconcile<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        layout: &SectionLayout,
        window: VisibleWindow,
    ) -> Result<ReconcileReport, ListViewError> {
        let mut report = ReconcileReport::default();

        let doomed: SmallVec<[Tag; 16]> = self
            .rows
            .iter()
            .filter(|&(_, index, view)| !window.contains(index) && view.is_disposable())
            .map(|(tag, _, _)| tag)
            .collect();
        for tag in doomed {
            if self.destroy(renderer, tag) {
                report.destroyed += 1;
            }
        }

        for index in window.indices() {
            if !self.rows.contains_index(index) {
                self.materialize(renderer, layout, index, None)?;
                report.created += 1;
            }
        }

        if let (Some(first), Some(last)) = (window.first(), window.last()) {
            for section in layout.sections_spanning(first, last) {
                if !self.headers.contains_key(&section) {
                    self.materialize_header(renderer, layout, section, None)?;
                    report.headers_created += 1;
                }
            }
        }
        self.placeholders.clear();

        for (_, index, view) in self.rows.iter_mut() {
            if !view.is_disposable() {
                continue;
            }
            if let Some(frame) = layout.frame_for_index(index) {
                snap(view, renderer, frame);
            }
        }
        for (&section, view) in &mut self.headers {
            if section < layout.section_count() && view.is_disposable() {
                snap(view, renderer, layout.frame_for_header(section));
            }
        }

        if report != ReconcileReport::default() {
            log::trace!(
                "reconciled window {:?}: +{} -{} rows, +{} headers",
                window.range(),
                report.created,
                report.destroyed,
                report.headers_created
            );
        }
        Ok(report)
    }

    /// Creates the view for `index` and fades it in towards its layout frame.
    ///
    /// The view starts at `from` when given, otherwise at its layout frame. A view
    /// whose index was [marked as a placeholder](Self::mark_placeholder) starts fully
    /// opaque.
    pub fn materialize<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        layout: &SectionLayout,
        index: LinearIndex,
        from: Option<Rect>,
    ) -> Result<Tag, ListViewError> {
        debug_assert!(
            !self.rows.contains_index(index),
            "{index:?} is already materialized"
        );
        let Some(at) = layout.section_row_for(index) else {
            return Err(ListViewError::InvalidPosition(SectionRow::new(
                layout.section_count(),
                index.0,
            )));
        };
        let target = layout.frame_for(at);
        let start = from.unwrap_or(target);
        let alpha = if self.placeholders.remove(&index) {
            1.0
        } else {
            0.0
        };
        let handle = renderer
            .make_row(at, start)
            .ok_or(ListViewError::MissingRow(at))?;
        let mut view = LiveView::new(handle, start, alpha);
        renderer.place(&view.handle, start, alpha);
        start_motion(&mut view, renderer, target, 1.0, self.now, self.duration);
        Ok(self.rows.insert(index, view))
    }

    /// Creates the header view of `section`, starting at `from` when given.
    pub fn materialize_header<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        layout: &SectionLayout,
        section: usize,
        from: Option<Rect>,
    ) -> Result<(), ListViewError> {
        let target = layout.frame_for_header(section);
        let start = from.unwrap_or(target);
        let handle = renderer
            .make_header(section, start)
            .ok_or(ListViewError::MissingHeader { section })?;
        let mut view = LiveView::new(handle, start, 0.0);
        renderer.place(&view.handle, start, 0.0);
        start_motion(&mut view, renderer, target, 1.0, self.now, self.duration);
        self.headers.insert(section, view);
        Ok(())
    }

    /// Destroys a live row. Returns `false` if `tag` was not live.
    pub fn destroy<R: RowRenderer<Handle = H>>(&mut self, renderer: &mut R, tag: Tag) -> bool {
        match self.rows.remove(tag) {
            Some(view) => {
                renderer.destroy(view.handle);
                true
            }
            None => false,
        }
    }

    /// Destroys every row and header.
    pub fn clear<R: RowRenderer<Handle = H>>(&mut self, renderer: &mut R) {
        for view in self.rows.drain() {
            renderer.destroy(view.handle);
        }
        for (_, view) in self.headers.drain() {
            renderer.destroy(view.handle);
        }
        self.placeholders.clear();
    }

    /// Animates a row from where it is now to `to` at opacity `alpha`.
    pub fn animate<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
        to: Rect,
        alpha: f64,
    ) -> bool {
        let (now, duration) = (self.now, self.duration);
        match self.rows.get_mut(tag) {
            Some(view) => {
                start_motion(view, renderer, to, alpha, now, duration);
                true
            }
            None => false,
        }
    }

    /// Animates a header to `to`. Returns `false` if it is not materialized.
    pub fn animate_header<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        section: usize,
        to: Rect,
    ) -> bool {
        let (now, duration) = (self.now, self.duration);
        match self.headers.get_mut(&section) {
            Some(view) => {
                start_motion(view, renderer, to, view.target_alpha(), now, duration);
                true
            }
            None => false,
        }
    }

    /// Places a row immediately, cancelling any motion.
    pub fn place<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
        frame: Rect,
        alpha: f64,
    ) -> bool {
        match self.rows.get_mut(tag) {
            Some(view) => {
                view.motion = None;
                view.flags.remove(ViewFlags::ANIMATING);
                view.frame = frame;
                view.alpha = alpha;
                renderer.place(&view.handle, frame, alpha);
                true
            }
            None => false,
        }
    }

    /// Changes a row's opacity without disturbing its frame or motion.
    pub fn set_alpha<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
        alpha: f64,
    ) -> bool {
        let Some(view) = self.rows.get_mut(tag) else {
            return false;
        };
        match &mut view.motion {
            Some(motion) => motion.to_alpha = alpha,
            None => {
                view.alpha = alpha;
                renderer.place(&view.handle, view.frame, alpha);
            }
        }
        true
    }

    /// Renumbers for rows inserted at the final positions `inserted`, then rebinds every
    /// moved view to its new position under `layout`.
    pub fn expand<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        layout: &SectionLayout,
        inserted: &[LinearIndex],
    ) -> RenumberReport {
        let report = self.rows.expand(inserted);
        self.placeholders = self
            .placeholders
            .iter()
            .map(|i| LinearIndex(index_after_insert(i.0, inserted)))
            .collect();
        self.rebind(renderer, layout, &report);
        report
    }

    /// Renumbers for the removed old positions `removed`, whose views must already be
    /// destroyed, then rebinds every moved view.
    pub fn compact<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        layout: &SectionLayout,
        removed: &[LinearIndex],
    ) -> RenumberReport {
        let report = self.rows.compact(removed);
        self.placeholders = self
            .placeholders
            .iter()
            .filter_map(|i| index_after_remove(i.0, removed).map(LinearIndex))
            .collect();
        self.rebind(renderer, layout, &report);
        report
    }

    fn rebind<R: RowRenderer<Handle = H>>(
        &self,
        renderer: &mut R,
        layout: &SectionLayout,
        report: &RenumberReport,
    ) {
        for moved in report {
            let Some(view) = self.rows.get(moved.to) else {
                continue;
            };
            if let Some(at) = self.rows.section_row_for(moved.to, layout) {
                renderer.update_row(&view.handle, at);
            }
        }
    }

    /// Advances every motion to `now` and pushes the sampled frames to the renderer.
    ///
    /// Returns the rows whose motion finished during this tick.
    pub fn tick<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        now: f64,
    ) -> SmallVec<[Tag; 4]> {
        self.now = now;
        let mut finished = SmallVec::new();
        for (tag, _, view) in self.rows.iter_mut() {
            if advance(view, renderer, now) {
                finished.push(tag);
            }
        }
        for view in self.headers.values_mut() {
            advance(view, renderer, now);
        }
        finished
    }
}

/// Starts moving `view` towards `to`/`alpha`, or applies it at once for a zero duration.
fn start_motion<H, R: RowRenderer<Handle = H>>(
    view: &mut LiveView<H>,
    renderer: &mut R,
    to: Rect,
    alpha: f64,
    now: f64,
    duration: f64,
) {
    if view.frame == to && view.alpha == alpha {
        view.motion = None;
        view.flags.remove(ViewFlags::ANIMATING);
        return;
    }
    if duration <= 0.0 {
        view.motion = None;
        view.flags.remove(ViewFlags::ANIMATING);
        view.frame = to;
        view.alpha = alpha;
        renderer.place(&view.handle, to, alpha);
        return;
    }
    view.motion = Some(Motion {
        from: view.frame,
        to,
        from_alpha: view.alpha,
        to_alpha: alpha,
        start: now,
        duration,
    });
    view.flags.insert(ViewFlags::ANIMATING);
}

/// Moves a settled view to `frame` without animation.
fn snap<H, R: RowRenderer<Handle = H>>(view: &mut LiveView<H>, renderer: &mut R, frame: Rect) {
    if view.frame != frame {
        view.frame = frame;
        renderer.place(&view.handle, frame, view.alpha);
    }
}

/// Samples `view`'s motion at `now`. Returns `true` if it finished.
fn advance<H, R: RowRenderer<Handle = H>>(
    view: &mut LiveView<H>,
    renderer: &mut R,
    now: f64,
) -> bool {
    let Some(motion) = view.motion else {
        return false;
    };
    let (frame, alpha) = motion.sample(now);
    view.frame = frame;
    view.alpha = alpha;
    renderer.place(&view.handle, frame, alpha);
    if motion.is_finished(now) {
        view.motion = None;
        view.flags.remove(ViewFlags::ANIMATING);
        true
    } else {
        false
    }
}
