// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attached state of a list view and the steps that drive it.

use alloc::vec::Vec;

use kurbo::{Point, Rect};
use smallvec::SmallVec;
use understory_section_layout::{
    LayoutMode, LinearIndex, ScrollViewport, SectionLayout, SectionRow, SectionSource,
    VisibleWindow, visible_linear_indices,
};

use crate::drag::{DragPhase, DragSession, auto_scroll_delta, pick_drop_target};
use crate::editing::EditingState;
use crate::error::ListViewError;
use crate::handlers::DropOutcome;
use crate::identity::{Tag, index_after_insert, index_after_remove};
use crate::lifecycle::{Lifecycle, ReconcileReport};
use crate::options::ListViewOptions;
use crate::refresh::RefreshState;
use crate::renderer::RowRenderer;
use crate::sequencer::{IndexBatch, Mutation, MutationHost, MutationKind, Sequencer};
use crate::types::ViewFlags;

/// A discrete event for the selection collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Routed {
    Tapped(SectionRow),
    Toggled(SectionRow, bool),
    DrawerButton(SectionRow, usize),
    Refresh,
}

/// A released drag waiting for the drop collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PendingDrop {
    pub(crate) dragged: Tag,
    pub(crate) target: Tag,
    pub(crate) from: SectionRow,
    pub(crate) onto: SectionRow,
}

/// Per-section counts currently reported by `source`.
pub(crate) fn source_counts<S: SectionSource + ?Sized>(source: &S) -> Vec<usize> {
    (0..source.section_count())
        .map(|s| source.item_count(s))
        .collect()
}

/// Everything that exists only while a list view is attached to a viewport.
#[derive(Debug)]
pub(crate) struct Engine<H> {
    pub(crate) viewport: ScrollViewport,
    /// Mode of the geometry currently on screen.
    pub(crate) mode: LayoutMode,
    /// Mode once every queued transform has run.
    pub(crate) requested_mode: LayoutMode,
    pub(crate) lifecycle: Lifecycle<H>,
    pub(crate) sequencer: Sequencer,
    /// Counts once every queued mutation has run; must match the source.
    pub(crate) counts: Vec<usize>,
    pub(crate) drag: Option<DragSession>,
    pub(crate) editing: EditingState,
    pub(crate) refresh: RefreshState,
    tracking: bool,
    reconcile_pending: bool,
}

impl<H> Engine<H> {
    pub(crate) fn new(options: &ListViewOptions, viewport: Rect, counts: Vec<usize>) -> Self {
        let mut scroll = ScrollViewport::new(viewport.size());
        scroll.set_offset(viewport.y0);
        Self {
            viewport: scroll,
            mode: options.layout_mode,
            requested_mode: options.layout_mode,
            lifecycle: Lifecycle::new(options.tag_base, options.row_animation_duration),
            sequencer: Sequencer::new(),
            counts,
            drag: None,
            editing: EditingState::default(),
            refresh: RefreshState::Idle,
            tracking: false,
            reconcile_pending: false,
        }
    }

    fn layout_for<S: SectionSource>(
        &self,
        source: &S,
        counts: &[usize],
        mode: LayoutMode,
    ) -> SectionLayout {
        SectionLayout::from_counts(
            counts.to_vec(),
            mode,
            self.viewport.size().width,
            source.cell_metrics(mode),
            source.header_metrics(mode),
        )
    }

    fn check_counts<S: SectionSource>(&self, source: &S) -> Result<(), ListViewError> {
        let actual = source_counts(source);
        if actual == self.counts {
            Ok(())
        } else {
            Err(ListViewError::CountsChanged {
                expected: self.counts.clone(),
                actual,
            })
        }
    }

    /// Geometry of the settled state.
    pub(crate) fn layout<S: SectionSource>(&self, source: &S) -> SectionLayout {
        self.layout_for(source, &self.counts, self.mode)
    }

    pub(crate) fn window(
        &self,
        layout: &SectionLayout,
        options: &ListViewOptions,
    ) -> VisibleWindow {
        visible_linear_indices(layout, self.viewport.rect(), options.prefetch_margin)
    }

    /// Data position of a live index once every pending mutation has run.
    pub(crate) fn data_position(&self, index: LinearIndex) -> Option<SectionRow> {
        let index = self.sequencer.project(index)?.0;
        let mut first = 0;
        for (section, &count) in self.counts.iter().enumerate() {
            if index < first + count {
                return Some(SectionRow::new(section, index - first));
            }
            first += count;
        }
        None
    }

    /// Data position of the row a live tag displays.
    pub(crate) fn tag_position(&self, tag: Tag) -> Option<SectionRow> {
        let index = self.lifecycle.rows().linear_index_for(tag)?;
        self.data_position(index)
    }

    pub(crate) fn reconcile<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<ReconcileReport, ListViewError> {
        self.check_counts(source)?;
        let layout = self.layout(source);
        self.viewport
            .set_content_height(layout.content_height(self.viewport.size().height));
        let window = self.window(&layout, options);
        self.reconcile_pending = false;
        let report = self.lifecycle.reconcile(renderer, &layout, window)?;
        self.refresh_candidate(renderer, options);
        Ok(report)
    }

    /// Reconciles now, or once the sequencer is idle.
    fn request_reconcile<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        if self.sequencer.is_idle() {
            self.reconcile(source, renderer, options)?;
        } else {
            log::trace!("reconcile deferred until the sequencer is idle");
            self.reconcile_pending = true;
        }
        Ok(())
    }

    /// Advances the sequencer and runs any deferred reconcile.
    pub(crate) fn pump<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        let mut sequencer = core::mem::take(&mut self.sequencer);
        let result = sequencer.advance(&mut Stage {
            engine: self,
            source,
            renderer,
            options,
        });
        self.sequencer = sequencer;
        result?;
        if self.reconcile_pending && self.sequencer.is_idle() {
            self.reconcile(source, renderer, options)?;
        }
        Ok(())
    }

    fn enqueue<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        kind: MutationKind,
        counts: Vec<usize>,
    ) -> Result<(), ListViewError> {
        let actual = source_counts(source);
        if actual != counts {
            return Err(ListViewError::CountsChanged {
                expected: counts,
                actual,
            });
        }
        self.counts.clone_from(&counts);
        self.sequencer.enqueue(Mutation { kind, counts });
        self.pump(source, renderer, options)
    }

    /// Queues an insert. Each position is read against the counts left by the
    /// positions before it.
    pub(crate) fn insert<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        rows: &[SectionRow],
        placeholder: bool,
    ) -> Result<(), ListViewError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut counts = self.counts.clone();
        let mut finals: Vec<usize> = Vec::with_capacity(rows.len());
        for &at in rows {
            match counts.get(at.section) {
                Some(&count) if at.row <= count => {}
                _ => return Err(ListViewError::InvalidPosition(at)),
            }
            let index = counts[..at.section].iter().sum::<usize>() + at.row;
            counts[at.section] += 1;
            for earlier in &mut finals {
                if *earlier >= index {
                    *earlier += 1;
                }
            }
            finals.push(index);
        }
        finals.sort_unstable();
        let at = finals.into_iter().map(LinearIndex).collect();
        self.enqueue(
            source,
            renderer,
            options,
            MutationKind::Insert { at, placeholder },
            counts,
        )
    }

    /// Queues an insert right after the row `tag` displays.
    pub(crate) fn insert_after<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        tag: Tag,
    ) -> Result<(), ListViewError> {
        let Some(at) = self.tag_position(tag) else {
            log::warn!("insert after {tag:?} ignored: its row is gone");
            return Ok(());
        };
        self.insert(
            source,
            renderer,
            options,
            &[SectionRow::new(at.section, at.row + 1)],
            false,
        )
    }

    /// Queues a batch removal of existing positions.
    pub(crate) fn remove<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        rows: &[SectionRow],
    ) -> Result<(), ListViewError> {
        let mut rows: SmallVec<[SectionRow; 4]> = rows.iter().copied().collect();
        rows.sort_unstable();
        rows.dedup();
        if rows.is_empty() {
            return Ok(());
        }
        let mut counts = self.counts.clone();
        let mut at = IndexBatch::new();
        for &pos in &rows {
            match self.counts.get(pos.section) {
                Some(&count) if pos.row < count => {}
                _ => return Err(ListViewError::InvalidPosition(pos)),
            }
            let first: usize = self.counts[..pos.section].iter().sum();
            at.push(LinearIndex(first + pos.row));
            counts[pos.section] -= 1;
        }
        self.enqueue(
            source,
            renderer,
            options,
            MutationKind::Remove { at },
            counts,
        )
    }

    /// Queues an animated switch to `mode`.
    pub(crate) fn transform<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        mode: LayoutMode,
    ) -> Result<(), ListViewError> {
        if mode == self.requested_mode {
            return Ok(());
        }
        self.requested_mode = mode;
        let counts = self.counts.clone();
        self.enqueue(
            source,
            renderer,
            options,
            MutationKind::Transform { to: mode },
            counts,
        )
    }

    /// Destroys every view, forgets pending work, and rebuilds from the source.
    pub(crate) fn reload<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        self.lifecycle.clear(renderer);
        self.sequencer.clear();
        self.drag = None;
        self.editing.clear_selection();
        self.mode = self.requested_mode;
        self.counts = source_counts(source);
        log::debug!("reloaded with counts {:?}", self.counts);
        self.reconcile(source, renderer, options).map(drop)
    }

    /// Destroys every view.
    pub(crate) fn teardown<R: RowRenderer<Handle = H>>(&mut self, renderer: &mut R) {
        self.lifecycle.clear(renderer);
        self.sequencer.clear();
        self.drag = None;
    }

    // Scrolling.

    fn after_scroll<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        if let Some(threshold) = options.refresh_threshold {
            let next = self
                .refresh
                .on_scroll(self.viewport.offset(), threshold, self.tracking);
            if next != self.refresh {
                log::debug!("refresh {:?} -> {next:?}", self.refresh);
                self.refresh = next;
            }
        }
        self.close_drawer(renderer);
        if self.is_dragging() {
            self.follow_pointer(renderer, options);
        }
        self.request_reconcile(source, renderer, options)
    }

    pub(crate) fn scroll_to<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        offset: f64,
    ) -> Result<(), ListViewError> {
        if self.viewport.set_offset(offset) {
            self.after_scroll(source, renderer, options)?;
        }
        Ok(())
    }

    pub(crate) fn set_viewport<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        viewport: Rect,
    ) -> Result<(), ListViewError> {
        let resized = viewport.size() != self.viewport.size();
        self.viewport.set_size(viewport.size());
        let moved = self.viewport.set_offset(viewport.y0);
        if moved {
            self.after_scroll(source, renderer, options)
        } else if resized {
            self.request_reconcile(source, renderer, options)
        } else {
            Ok(())
        }
    }

    pub(crate) fn scroll_began<R: RowRenderer<Handle = H>>(&mut self, renderer: &mut R) {
        self.tracking = true;
        self.close_drawer(renderer);
    }

    /// The user let go of the viewport. Without deceleration this also runs the
    /// cleanup pass.
    pub(crate) fn scroll_ended<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        decelerating: bool,
    ) -> Result<Option<Routed>, ListViewError> {
        self.tracking = false;
        let before = self.refresh;
        self.refresh = before.on_release();
        let routed = (before != RefreshState::Refreshing
            && self.refresh == RefreshState::Refreshing)
            .then_some(Routed::Refresh);
        if before != self.refresh {
            log::debug!("refresh {before:?} -> {:?}", self.refresh);
        }
        if !decelerating {
            self.request_reconcile(source, renderer, options)?;
        }
        Ok(routed)
    }

    pub(crate) fn deceleration_ended<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        self.request_reconcile(source, renderer, options)
    }

    pub(crate) fn end_refresh(&mut self) {
        self.refresh = self.refresh.on_finished();
    }

    pub(crate) fn tick<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        now: f64,
    ) -> Result<(), ListViewError> {
        if !self.lifecycle.tick(renderer, now).is_empty() {
            // Settled views outside the window can go now.
            self.reconcile_pending = true;
        }
        if let Some(session) = &self.drag {
            let tag = session.tag();
            let returned = session.phase() == DragPhase::Returning
                && self
                    .lifecycle
                    .row(tag)
                    .is_none_or(|view| !view.flags.contains(ViewFlags::ANIMATING));
            if returned {
                self.finish_return();
            }
        }
        self.auto_scroll(source, renderer, options)?;
        self.pump(source, renderer, options)
    }

    // Drawers and editing.

    pub(crate) fn open_drawer_tag(&self) -> Option<Tag> {
        self.lifecycle
            .rows()
            .iter()
            .find(|(_, _, view)| view.flags.contains(ViewFlags::DRAWER_OPEN))
            .map(|(tag, _, _)| tag)
    }

    pub(crate) fn open_drawer<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
    ) -> bool {
        if self.drag.is_some()
            || self.editing.is_editing()
            || !self.lifecycle.rows().contains(tag)
        {
            return false;
        }
        if self.open_drawer_tag() == Some(tag) {
            return true;
        }
        self.close_drawer(renderer);
        self.lifecycle.set_flags(tag, ViewFlags::DRAWER_OPEN, true);
        if let Some(view) = self.lifecycle.row(tag) {
            renderer.set_drawer_open(&view.handle, true);
        }
        true
    }

    pub(crate) fn close_drawer<R: RowRenderer<Handle = H>>(&mut self, renderer: &mut R) -> bool {
        let Some(tag) = self.open_drawer_tag() else {
            return false;
        };
        self.lifecycle.set_flags(tag, ViewFlags::DRAWER_OPEN, false);
        if let Some(view) = self.lifecycle.row(tag) {
            renderer.set_drawer_open(&view.handle, false);
        }
        true
    }

    pub(crate) fn drawer_button_pressed<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
        button: usize,
    ) -> Option<Routed> {
        if self.open_drawer_tag() != Some(tag) {
            return None;
        }
        let at = self.tag_position(tag);
        self.close_drawer(renderer);
        at.map(|at| Routed::DrawerButton(at, button))
    }

    pub(crate) fn set_editing<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        editing: bool,
    ) -> bool {
        if editing {
            self.close_drawer(renderer);
        }
        self.editing.set_editing(editing)
    }

    /// A tap on a row: closes an open drawer, toggles selection while editing, or
    /// reports the tap.
    pub(crate) fn tap<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
    ) -> Option<Routed> {
        if self.close_drawer(renderer) {
            return None;
        }
        let index = self.lifecycle.rows().linear_index_for(tag)?;
        let at = self.data_position(index)?;
        if self.editing.is_editing() {
            let selected = self.editing.toggle(index);
            Some(Routed::Toggled(at, selected))
        } else {
            Some(Routed::Tapped(at))
        }
    }

    pub(crate) fn selected_rows(&self) -> Vec<SectionRow> {
        self.editing
            .selected()
            .filter_map(|index| self.data_position(index))
            .collect()
    }

    // Drag and drop.

    fn is_dragging(&self) -> bool {
        self.drag
            .as_ref()
            .is_some_and(|s| s.phase() == DragPhase::Dragging)
    }

    pub(crate) fn begin_drag<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        tag: Tag,
        pointer: Point,
    ) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(view) = self.lifecycle.row(tag) else {
            log::warn!("drag on {tag:?} ignored: not a live row");
            return false;
        };
        let (frame, alpha) = (view.target_frame(), view.target_alpha());
        self.close_drawer(renderer);
        self.lifecycle.place(renderer, tag, frame, alpha);
        self.lifecycle.set_flags(tag, ViewFlags::DRAGGING, true);
        let session = DragSession::new(tag, frame, pointer, self.viewport.offset());
        self.drag = Some(session);
        log::debug!("drag began on {tag:?} at {frame:?}");
        true
    }

    pub(crate) fn move_drag<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        pointer: Point,
    ) -> Result<(), ListViewError> {
        if !self.is_dragging() {
            return Ok(());
        }
        if let Some(session) = &mut self.drag {
            session.set_pointer(pointer);
        }
        self.follow_pointer(renderer, options);
        self.auto_scroll(source, renderer, options)
    }

    /// Moves the dragged view under the pointer and re-picks the drop candidate.
    fn follow_pointer<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        options: &ListViewOptions,
    ) {
        let Some(session) = &self.drag else {
            return;
        };
        let tag = session.tag();
        let Some(view) = self.lifecycle.row(tag) else {
            return;
        };
        let frame = session.frame_at(view.frame.size(), self.viewport.offset());
        let alpha = view.alpha;
        let previous = session.candidate();
        let candidate = pick_drop_target(
            frame,
            self.lifecycle
                .rows()
                .iter()
                .filter(|&(other, _, _)| other != tag)
                .map(|(other, _, view)| (other, view.frame)),
        );
        self.lifecycle.place(renderer, tag, frame, alpha);
        if candidate != previous {
            self.set_candidate(renderer, options, candidate);
        }
    }

    /// Forgets a drop candidate whose view is gone and, while dragging, picks again
    /// among the rows now live.
    fn refresh_candidate<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        options: &ListViewOptions,
    ) {
        if let Some(candidate) = self.drag.as_ref().and_then(DragSession::candidate)
            && !self.lifecycle.rows().contains(candidate)
        {
            log::trace!("drop candidate {candidate:?} left the pool");
            self.set_candidate(renderer, options, None);
        }
        if self.is_dragging() {
            self.follow_pointer(renderer, options);
        }
    }

    fn set_candidate<R: RowRenderer<Handle = H>>(
        &mut self,
        renderer: &mut R,
        options: &ListViewOptions,
        candidate: Option<Tag>,
    ) {
        let Some(session) = &mut self.drag else {
            return;
        };
        let previous = session.candidate();
        session.set_candidate(candidate);
        if let Some(old) = previous
            && self.lifecycle.set_flags(old, ViewFlags::DIMMED, false)
        {
            self.lifecycle.set_alpha(renderer, old, 1.0);
        }
        if let Some(new) = candidate {
            self.lifecycle.set_flags(new, ViewFlags::DIMMED, true);
            self.lifecycle.set_alpha(renderer, new, options.drag_dim_alpha);
        }
        log::trace!("drop candidate {previous:?} -> {candidate:?}");
    }

    /// One auto-scroll increment for a dragged view touching an edge strip.
    fn auto_scroll<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        if !self.is_dragging() {
            return Ok(());
        }
        let Some(tag) = self.drag.as_ref().map(DragSession::tag) else {
            return Ok(());
        };
        let Some(view) = self.lifecycle.row(tag) else {
            return Ok(());
        };
        let delta = auto_scroll_delta(
            self.viewport.rect(),
            view.frame,
            options.auto_scroll_strip,
            options.auto_scroll_step,
        );
        if delta == 0.0 {
            return Ok(());
        }
        let offset = self.viewport.clamp_offset(self.viewport.offset() + delta);
        if self.viewport.set_offset(offset) {
            self.after_scroll(source, renderer, options)?;
        }
        Ok(())
    }

    /// Releases the dragged view. Returns the drop to resolve, if it was released
    /// over a candidate; otherwise the view starts returning to its slot.
    pub(crate) fn release_drag<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<Option<PendingDrop>, ListViewError> {
        if !self.is_dragging() {
            return Ok(None);
        }
        let candidate = self
            .drag
            .as_ref()
            .and_then(DragSession::candidate)
            .filter(|&tag| self.lifecycle.rows().contains(tag));
        self.set_candidate(renderer, options, None);
        let Some(dragged) = self.drag.as_ref().map(DragSession::tag) else {
            return Ok(None);
        };
        let pending = candidate.and_then(|target| {
            Some(PendingDrop {
                dragged,
                target,
                from: self.tag_position(dragged)?,
                onto: self.tag_position(target)?,
            })
        });
        match pending {
            Some(pending) => {
                if let Some(session) = &mut self.drag {
                    session.set_phase(DragPhase::AwaitingDrop);
                }
                log::debug!("drop of {:?} onto {:?} pending", pending.from, pending.onto);
                Ok(Some(pending))
            }
            None => {
                self.return_dragged(renderer);
                self.pump(source, renderer, options)?;
                Ok(None)
            }
        }
    }

    /// Treats a cancelled gesture like a refused drop.
    pub(crate) fn cancel_drag<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
    ) -> Result<(), ListViewError> {
        if !self.is_dragging() {
            return Ok(());
        }
        log::debug!("drag cancelled");
        self.set_candidate(renderer, options, None);
        self.return_dragged(renderer);
        self.pump(source, renderer, options)
    }

    /// Resolves a drop. Returns `false` if no drop was pending.
    pub(crate) fn resolve_drop<S: SectionSource, R: RowRenderer<Handle = H>>(
        &mut self,
        source: &S,
        renderer: &mut R,
        options: &ListViewOptions,
        outcome: DropOutcome,
    ) -> Result<bool, ListViewError> {
        let Some(session) = self
            .drag
            .as_ref()
            .filter(|s| s.phase() == DragPhase::AwaitingDrop)
        else {
            log::warn!("drop outcome {outcome:?} without a pending drop");
            return Ok(false);
        };
        let tag = session.tag();
        log::debug!("drop of {tag:?} {outcome:?}");
        match outcome {
            DropOutcome::Failed => {
                self.return_dragged(renderer);
                self.pump(source, renderer, options)?;
            }
            DropOutcome::Succeeded => {
                let at = self.tag_position(tag);
                self.drag = None;
                self.lifecycle.destroy(renderer, tag);
                if let Some(at) = at {
                    self.remove(source, renderer, options, &[at])?;
                }
            }
        }
        Ok(true)
    }

    /// Animates the dragged view back to where the drag started. A return that
    /// settles at once leaves a reconcile pending for the caller to pump.
    fn return_dragged<R: RowRenderer<Handle = H>>(&mut self, renderer: &mut R) {
        let Some(session) = &mut self.drag else {
            return;
        };
        session.set_phase(DragPhase::Returning);
        let (tag, origin) = (session.tag(), session.origin());
        self.lifecycle.animate(renderer, tag, origin, 1.0);
        let still_moving = self
            .lifecycle
            .row(tag)
            .is_some_and(|view| view.flags.contains(ViewFlags::ANIMATING));
        if !still_moving {
            self.finish_return();
        }
    }

    fn finish_return(&mut self) {
        let Some(session) = self.drag.take() else {
            return;
        };
        self.lifecycle
            .set_flags(session.tag(), ViewFlags::DRAGGING, false);
        self.reconcile_pending = true;
        log::debug!("drag of {:?} ended", session.tag());
    }
}

/// The sequencer's view of an attached engine.
struct Stage<'a, H, S, R> {
    engine: &'a mut Engine<H>,
    source: &'a S,
    renderer: &'a mut R,
    options: &'a ListViewOptions,
}

impl<H, S, R> Stage<'_, H, S, R>
where
    S: SectionSource,
    R: RowRenderer<Handle = H>,
{
    /// Animates every live row that is not being dragged to the frame of the index
    /// `map` assigns it under `layout`.
    fn shift_rows(&mut self, layout: &SectionLayout, map: impl Fn(usize) -> Option<usize>) {
        let moves: Vec<(Tag, Rect, f64)> = self
            .engine
            .lifecycle
            .rows()
            .iter()
            .filter(|(_, _, view)| !view.flags.contains(ViewFlags::DRAGGING))
            .filter_map(|(tag, index, view)| {
                let frame = layout.frame_for_index(LinearIndex(map(index.0)?))?;
                Some((tag, frame, view.target_alpha()))
            })
            .collect();
        for (tag, frame, alpha) in moves {
            self.engine
                .lifecycle
                .animate(self.renderer, tag, frame, alpha);
        }
    }

    fn shift_headers(&mut self, layout: &SectionLayout) {
        let sections: SmallVec<[usize; 8]> =
            self.engine.lifecycle.headers().map(|(s, _)| s).collect();
        for section in sections {
            if section < layout.section_count() {
                self.engine.lifecycle.animate_header(
                    self.renderer,
                    section,
                    layout.frame_for_header(section),
                );
            }
        }
    }

    fn resize_content(&mut self, layout: &SectionLayout) {
        let height = layout.content_height(self.engine.viewport.size().height);
        self.engine.viewport.set_content_height(height);
    }

    /// Pre-creates the target window at source frames and animates everything to
    /// the target geometry.
    fn shift_transform(&mut self, counts: &[usize], to: LayoutMode) -> Result<(), ListViewError> {
        let from_layout = self.engine.layout_for(self.source, counts, self.engine.mode);
        let to_layout = self.engine.layout_for(self.source, counts, to);
        self.resize_content(&to_layout);
        self.engine.viewport.clamp_to_content();

        let margin = self.options.prefetch_margin.max(1) * to_layout.columns().count();
        let window = self
            .engine
            .window(&to_layout, self.options)
            .extended(margin, to_layout.total_count());

        self.shift_rows(&to_layout, Some);
        for index in window.indices() {
            if !self.engine.lifecycle.rows().contains_index(index) {
                let start = from_layout.frame_for_index(index);
                self.engine
                    .lifecycle
                    .materialize(self.renderer, &to_layout, index, start)?;
            }
        }

        self.shift_headers(&to_layout);
        if let (Some(first), Some(last)) = (window.first(), window.last()) {
            for section in to_layout.sections_spanning(first, last) {
                if self.engine.lifecycle.header(section).is_none() {
                    let start = from_layout.frame_for_header(section);
                    self.engine.lifecycle.materialize_header(
                        self.renderer,
                        &to_layout,
                        section,
                        Some(start),
                    )?;
                }
            }
        }
        log::debug!(
            "transform {:?} -> {to:?}, prefetched {:?}",
            self.engine.mode,
            window.range()
        );
        self.engine.mode = to;
        Ok(())
    }
}

impl<H, S, R> MutationHost for Stage<'_, H, S, R>
where
    S: SectionSource,
    R: RowRenderer<Handle = H>,
{
    fn is_settled(&self) -> bool {
        self.engine.lifecycle.is_settled()
    }

    fn shift(&mut self, mutation: &Mutation) -> Result<(), ListViewError> {
        match &mutation.kind {
            MutationKind::Insert { at, .. } => {
                let layout = self
                    .engine
                    .layout_for(self.source, &mutation.counts, self.engine.mode);
                self.shift_rows(&layout, |i| Some(index_after_insert(i, at)));
                self.shift_headers(&layout);
                self.resize_content(&layout);
            }
            MutationKind::Remove { at } => {
                for &index in at {
                    let tag = self.engine.lifecycle.rows().tag_for(index);
                    let session = self.engine.drag.as_ref();
                    let dragged = session.is_some_and(|s| s.tag() == tag);
                    let candidate = session.is_some_and(|s| s.candidate() == Some(tag));
                    if dragged || candidate {
                        self.engine.set_candidate(self.renderer, self.options, None);
                    }
                    if dragged {
                        log::debug!("dragged row {index:?} removed; drag ended");
                        self.engine.drag = None;
                    }
                    self.engine.lifecycle.destroy(self.renderer, tag);
                }
                let layout = self
                    .engine
                    .layout_for(self.source, &mutation.counts, self.engine.mode);
                self.shift_rows(&layout, |i| index_after_remove(i, at));
                self.shift_headers(&layout);
                self.resize_content(&layout);
            }
            MutationKind::Transform { to } => self.shift_transform(&mutation.counts, *to)?,
        }
        Ok(())
    }

    fn renumber(&mut self, mutation: &Mutation) -> Result<(), ListViewError> {
        let layout = self.engine.layout_for(self.source, &mutation.counts, self.engine.mode);
        let report = match &mutation.kind {
            MutationKind::Insert { at, placeholder } => {
                let report = self.engine.lifecycle.expand(self.renderer, &layout, at);
                self.engine.editing.expand(at);
                if *placeholder {
                    for &index in at {
                        self.engine.lifecycle.mark_placeholder(index);
                    }
                }
                report
            }
            MutationKind::Remove { at } => {
                let report = self.engine.lifecycle.compact(self.renderer, &layout, at);
                self.engine.editing.compact(at);
                report
            }
            MutationKind::Transform { .. } => return Ok(()),
        };
        if let Some(session) = &mut self.engine.drag {
            session.follow(&report);
        }
        log::trace!("renumbered {} live row(s)", report.len());
        Ok(())
    }

    fn reconcile(&mut self) -> Result<(), ListViewError> {
        self.engine
            .reconcile(self.source, self.renderer, self.options)
            .map(drop)
    }
}
