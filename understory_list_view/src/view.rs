// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host object wiring geometry, identity, lifecycle, sequencing, and gestures.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect};
use understory_section_layout::{
    LayoutMode, LinearIndex, ScrollAlign, SectionLayout, SectionRow, SectionSource,
    VisibleWindow,
};

use crate::drag::DragSession;
use crate::engine::{Engine, Routed, source_counts};
use crate::error::ListViewError;
use crate::handlers::{DropHandler, DropOutcome, DropReply, DropRequest, SelectionHandler};
use crate::identity::Tag;
use crate::options::ListViewOptions;
use crate::refresh::RefreshState;
use crate::renderer::RowRenderer;
use crate::sequencer::Phase;
use crate::types::LiveView;

/// A virtualized, sectioned list or grid over a [`SectionSource`].
///
/// A `ListView` starts detached: every operation is a no-op until
/// [`attach`](Self::attach) gives it a viewport. Once attached it keeps exactly the
/// rows of the current [`VisibleWindow`] alive through its [`RowRenderer`], plus any
/// row that is mid-animation or being dragged.
///
/// Structural changes go through [`insert_rows`](Self::insert_rows),
/// [`remove_rows`](Self::remove_rows), and [`set_layout_mode`](Self::set_layout_mode).
/// The host updates its source first, then reports the change. Changes are
/// serialized and animated; drive the animations with [`tick`](Self::tick).
///
/// A [`ListViewError`] is sticky: after one is returned, every operation returns it
/// again until [`reload_data`](Self::reload_data) succeeds.
pub struct ListView<S, R: RowRenderer> {
    source: S,
    renderer: R,
    options: ListViewOptions,
    drop_handler: Option<Box<dyn DropHandler<R::Handle>>>,
    selection: Option<Box<dyn SelectionHandler>>,
    engine: Option<Engine<R::Handle>>,
    fault: Option<ListViewError>,
}

impl<S, R> fmt::Debug for ListView<S, R>
where
    S: fmt::Debug,
    R: RowRenderer + fmt::Debug,
    R::Handle: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListView")
            .field("source", &self.source)
            .field("renderer", &self.renderer)
            .field("options", &self.options)
            .field("engine", &self.engine)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

impl<S: SectionSource, R: RowRenderer> ListView<S, R> {
    /// Creates a detached list view.
    pub fn new(source: S, renderer: R, options: ListViewOptions) -> Self {
        Self {
            source,
            renderer,
            options,
            drop_handler: None,
            selection: None,
            engine: None,
            fault: None,
        }
    }

    /// Installs the collaborator that decides drag-and-drop outcomes.
    ///
    /// Without one, every drop is refused.
    #[must_use]
    pub fn with_drop_handler(mut self, handler: impl DropHandler<R::Handle> + 'static) -> Self {
        self.drop_handler = Some(Box::new(handler));
        self
    }

    /// Installs the collaborator that receives taps and editing actions.
    #[must_use]
    pub fn with_selection_handler(mut self, handler: impl SelectionHandler + 'static) -> Self {
        self.selection = Some(Box::new(handler));
        self
    }

    /// The data source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the data source.
    ///
    /// Count changes must be reported through a mutation before the next operation.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Current configuration.
    pub fn options(&self) -> &ListViewOptions {
        &self.options
    }

    /// Returns `true` once attached to a viewport.
    pub fn is_attached(&self) -> bool {
        self.engine.is_some()
    }

    /// The sticky fault, if any.
    pub fn fault(&self) -> Option<&ListViewError> {
        self.fault.as_ref()
    }

    fn check_fault(&self) -> Result<(), ListViewError> {
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    fn record<T>(&mut self, result: Result<T, ListViewError>) -> Result<T, ListViewError> {
        if let Err(err) = &result {
            log::error!("list view faulted: {err}");
            self.fault = Some(err.clone());
        }
        result
    }

    /// Runs `op` on the attached engine, or does nothing while detached.
    fn with_engine<T: Default>(
        &mut self,
        op: impl FnOnce(
            &mut Engine<R::Handle>,
            &S,
            &mut R,
            &ListViewOptions,
        ) -> Result<T, ListViewError>,
    ) -> Result<T, ListViewError> {
        self.check_fault()?;
        let Some(engine) = self.engine.as_mut() else {
            return Ok(T::default());
        };
        let result = op(engine, &self.source, &mut self.renderer, &self.options);
        self.record(result)
    }

    fn route(&mut self, routed: Option<Routed>) {
        let (Some(routed), Some(handler)) = (routed, self.selection.as_mut()) else {
            return;
        };
        match routed {
            Routed::Tapped(at) => handler.cell_tapped(at),
            Routed::Toggled(at, selected) => handler.checkbox_toggled(at, selected),
            Routed::DrawerButton(at, button) => handler.drawer_button_pressed(at, button),
            Routed::Refresh => handler.refresh_requested(),
        }
    }

    // Lifecycle.

    /// Attaches to `viewport` (content coordinates: its top edge is the scroll
    /// offset) and materializes the visible rows. If already attached, this moves
    /// the viewport.
    pub fn attach(&mut self, viewport: Rect) -> Result<(), ListViewError> {
        if self.engine.is_some() {
            return self.set_viewport(viewport);
        }
        self.check_fault()?;
        let counts = source_counts(&self.source);
        log::debug!("attaching at {viewport:?} with counts {counts:?}");
        let engine = self
            .engine
            .insert(Engine::new(&self.options, viewport, counts));
        let result = engine
            .reconcile(&self.source, &mut self.renderer, &self.options)
            .map(drop);
        self.record(result)
    }

    /// Destroys every row and header view and returns to the detached state.
    pub fn detach(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            log::debug!("detaching");
            engine.teardown(&mut self.renderer);
        }
    }

    /// Destroys every view, drops pending mutations, re-reads the source, and
    /// reconciles. This also clears a sticky fault.
    pub fn reload_data(&mut self) -> Result<(), ListViewError> {
        self.fault = None;
        self.with_engine(|engine, source, renderer, options| {
            engine.reload(source, renderer, options)
        })
    }

    /// Advances animations, drag auto-scroll, and queued mutations to `now`.
    pub fn tick(&mut self, now: f64) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.tick(source, renderer, options, now)
        })
    }

    // Queries.

    /// The layout mode requested last.
    pub fn layout_mode(&self) -> LayoutMode {
        self.engine
            .as_ref()
            .map_or(self.options.layout_mode, |e| e.requested_mode)
    }

    /// Visible rectangle in content coordinates.
    pub fn viewport(&self) -> Option<Rect> {
        self.engine.as_ref().map(|e| e.viewport.rect())
    }

    /// Scrollable content height.
    pub fn content_height(&self) -> Option<f64> {
        self.engine.as_ref().map(|e| e.viewport.content_height())
    }

    /// Geometry of the settled state.
    pub fn layout(&self) -> Option<SectionLayout> {
        self.engine.as_ref().map(|e| e.layout(&self.source))
    }

    /// Indices that should currently be materialized.
    pub fn visible_window(&self) -> VisibleWindow {
        self.engine.as_ref().map_or(VisibleWindow::EMPTY, |e| {
            e.window(&e.layout(&self.source), &self.options)
        })
    }

    /// Live rows with their indices, in ascending tag order.
    pub fn rows(&self) -> impl Iterator<Item = (Tag, LinearIndex, &LiveView<R::Handle>)> {
        self.engine
            .iter()
            .flat_map(|e| e.lifecycle.rows().iter())
    }

    /// A live row.
    pub fn row(&self, tag: Tag) -> Option<&LiveView<R::Handle>> {
        self.engine.as_ref()?.lifecycle.row(tag)
    }

    /// Tag of the live row showing `index`, if any.
    pub fn tag_at(&self, index: LinearIndex) -> Option<Tag> {
        let rows = self.engine.as_ref()?.lifecycle.rows();
        rows.contains_index(index).then_some(rows.tag_for(index))
    }

    /// The header view of `section`, if materialized.
    pub fn header(&self, section: usize) -> Option<&LiveView<R::Handle>> {
        self.engine.as_ref()?.lifecycle.header(section)
    }

    /// Data position of the row a live tag displays.
    ///
    /// Returns `None` for a row that a pending mutation removes. An unknown tag is an
    /// identity fault.
    pub fn section_row_for(&self, tag: Tag) -> Option<SectionRow> {
        self.engine.as_ref()?.tag_position(tag)
    }

    /// Phase of the mutation in flight.
    pub fn phase(&self) -> Phase {
        self.engine
            .as_ref()
            .map_or(Phase::Idle, |e| e.sequencer.phase())
    }

    /// Mutations in flight or queued.
    pub fn pending_mutations(&self) -> usize {
        self.engine.as_ref().map_or(0, |e| e.sequencer.pending())
    }

    /// The active drag session.
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.engine.as_ref()?.drag.as_ref()
    }

    /// Pull-to-refresh state.
    pub fn refresh_state(&self) -> RefreshState {
        self.engine
            .as_ref()
            .map_or(RefreshState::Idle, |e| e.refresh)
    }

    /// Returns `true` while editing.
    pub fn is_editing(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|e| e.editing.is_editing())
    }

    /// Selected rows, in data coordinates.
    pub fn selected_rows(&self) -> Vec<SectionRow> {
        self.engine
            .as_ref()
            .map(Engine::selected_rows)
            .unwrap_or_default()
    }

    /// The row whose drawer is open.
    pub fn open_drawer_tag(&self) -> Option<Tag> {
        self.engine.as_ref()?.open_drawer_tag()
    }

    // Scrolling.

    /// Moves the viewport to a new size and offset.
    ///
    /// A width change re-tiles collection rows and snaps live views to their new
    /// frames without animation.
    pub fn set_viewport(&mut self, viewport: Rect) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.set_viewport(source, renderer, options, viewport)
        })
    }

    /// Scrolls to `offset`. Offsets above zero model a pull past the top.
    pub fn scroll_to(&mut self, offset: f64) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.scroll_to(source, renderer, options, offset)
        })
    }

    /// Scrolls by `delta`.
    pub fn scroll_by(&mut self, delta: f64) -> Result<(), ListViewError> {
        let offset = self.viewport().map_or(0.0, |v| v.y0) + delta;
        self.scroll_to(offset)
    }

    /// Scrolls so the row at `at` is visible according to `align`.
    ///
    /// Positions outside the data are ignored.
    pub fn scroll_to_row(
        &mut self,
        at: SectionRow,
        align: ScrollAlign,
    ) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            let layout = engine.layout(source);
            if layout.linear_index_for(at).is_none() {
                log::warn!("scroll to {at:?} ignored: no such row");
                return Ok(());
            }
            let offset = engine
                .viewport
                .offset_revealing(layout.frame_for(at), align);
            engine.scroll_to(source, renderer, options, offset)
        })
    }

    /// The user started dragging the viewport.
    pub fn scroll_began(&mut self) -> Result<(), ListViewError> {
        self.with_engine(|engine, _, renderer, _| {
            engine.scroll_began(renderer);
            Ok(())
        })
    }

    /// The user let go of the viewport. Without deceleration, off-screen views are
    /// cleaned up at once.
    pub fn scroll_ended(&mut self, decelerating: bool) -> Result<(), ListViewError> {
        let routed = self.with_engine(|engine, source, renderer, options| {
            engine.scroll_ended(source, renderer, options, decelerating)
        })?;
        self.route(routed);
        Ok(())
    }

    /// Deceleration after a fling stopped; cleans up off-screen views.
    pub fn deceleration_ended(&mut self) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.deceleration_ended(source, renderer, options)
        })
    }

    /// The host finished the refresh it was asked for.
    pub fn end_refresh(&mut self) -> Result<(), ListViewError> {
        self.with_engine(|engine, _, _, _| {
            engine.end_refresh();
            Ok(())
        })
    }

    // Mutations.

    /// Reports rows inserted at `rows`, applied in order; each position is read
    /// against the counts left by the ones before it.
    pub fn insert_rows(&mut self, rows: &[SectionRow]) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.insert(source, renderer, options, rows, false)
        })
    }

    /// Like [`insert_rows`](Self::insert_rows), but the new rows appear without a
    /// fade, for a placeholder the host already shows.
    pub fn insert_rows_placeholder(&mut self, rows: &[SectionRow]) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.insert(source, renderer, options, rows, true)
        })
    }

    /// Reports one row inserted right after the row `tag` displays.
    pub fn insert_after(&mut self, tag: Tag) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.insert_after(source, renderer, options, tag)
        })
    }

    /// Reports rows removed from `rows` (positions before the removal).
    pub fn remove_rows(&mut self, rows: &[SectionRow]) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.remove(source, renderer, options, rows)
        })
    }

    /// Switches to `mode` with an animated transform.
    ///
    /// While detached this sets the mode the list attaches in.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) -> Result<(), ListViewError> {
        if self.engine.is_none() {
            self.options.layout_mode = mode;
        }
        self.with_engine(|engine, source, renderer, options| {
            engine.transform(source, renderer, options, mode)
        })
    }

    // Drag and drop.

    /// A drag gesture started on `tag` with the pointer at `pointer` (viewport
    /// coordinates). Returns `false` if a drag is already active or `tag` is not live.
    pub fn drag_began(&mut self, tag: Tag, pointer: Point) -> Result<bool, ListViewError> {
        self.with_engine(|engine, _, renderer, _| {
            Ok(engine.begin_drag(renderer, tag, pointer))
        })
    }

    /// The drag pointer moved.
    pub fn drag_moved(&mut self, pointer: Point) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.move_drag(source, renderer, options, pointer)
        })
    }

    /// The drag pointer was released.
    pub fn drag_ended(&mut self) -> Result<(), ListViewError> {
        let pending = self.with_engine(|engine, source, renderer, options| {
            engine.release_drag(source, renderer, options)
        })?;
        let Some(pending) = pending else {
            return Ok(());
        };
        let reply = match (self.drop_handler.as_mut(), self.engine.as_ref()) {
            (Some(handler), Some(engine)) => {
                match (
                    engine.lifecycle.row(pending.dragged),
                    engine.lifecycle.row(pending.target),
                ) {
                    (Some(dragged), Some(target)) => handler.on_drop(DropRequest {
                        dragged: &dragged.handle,
                        target: &target.handle,
                        from: pending.from,
                        onto: pending.onto,
                    }),
                    _ => DropReply::Failed,
                }
            }
            _ => DropReply::Failed,
        };
        match reply {
            DropReply::Succeeded => self.complete_drop(DropOutcome::Succeeded).map(drop),
            DropReply::Failed => self.complete_drop(DropOutcome::Failed).map(drop),
            DropReply::Deferred => Ok(()),
        }
    }

    /// The drag gesture was cancelled; handled like a refused drop.
    pub fn drag_cancelled(&mut self) -> Result<(), ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.cancel_drag(source, renderer, options)
        })
    }

    /// Reports the outcome of a drop. Returns `false` if no drop was pending.
    ///
    /// On success the host must already have removed the dragged item from its data.
    pub fn complete_drop(&mut self, outcome: DropOutcome) -> Result<bool, ListViewError> {
        self.with_engine(|engine, source, renderer, options| {
            engine.resolve_drop(source, renderer, options, outcome)
        })
    }

    // Editing.

    /// Enters or leaves editing mode. Leaving clears the selection.
    pub fn set_editing(&mut self, editing: bool) -> Result<(), ListViewError> {
        self.with_engine(|engine, _, renderer, _| {
            engine.set_editing(renderer, editing);
            Ok(())
        })
    }

    /// A tap on a live row.
    pub fn tap(&mut self, tag: Tag) -> Result<(), ListViewError> {
        let routed = self.with_engine(|engine, _, renderer, _| {
            Ok(engine.tap(renderer, tag))
        })?;
        self.route(routed);
        Ok(())
    }

    /// Opens the drawer of a row, closing any other. Returns `false` if it cannot be
    /// opened (unknown row, drag in progress, or editing).
    pub fn open_drawer(&mut self, tag: Tag) -> Result<bool, ListViewError> {
        self.with_engine(|engine, _, renderer, _| {
            Ok(engine.open_drawer(renderer, tag))
        })
    }

    /// Closes the open drawer. Returns `false` if none was open.
    pub fn close_drawer(&mut self) -> Result<bool, ListViewError> {
        self.with_engine(|engine, _, renderer, _| {
            Ok(engine.close_drawer(renderer))
        })
    }

    /// Button `button` of the open drawer on `tag` was pressed; the drawer closes.
    pub fn drawer_button_pressed(&mut self, tag: Tag, button: usize) -> Result<(), ListViewError> {
        let routed = self.with_engine(|engine, _, renderer, _| {
            Ok(engine.drawer_button_pressed(renderer, tag, button))
        })?;
        self.route(routed);
        Ok(())
    }
}
