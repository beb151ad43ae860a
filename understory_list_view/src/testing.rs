// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording collaborators for unit tests.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;
use understory_section_layout::{
    CellMetrics, HeaderMetrics, LayoutMode, SectionRow, SectionSource, StaticSections,
};

use crate::handlers::{DropHandler, DropReply, DropRequest, SelectionHandler};
use crate::renderer::RowRenderer;

/// One renderer call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Make {
        id: usize,
        at: SectionRow,
        frame: Rect,
    },
    Update { id: usize, at: SectionRow },
    MakeHeader { id: usize, section: usize },
    Place { id: usize, frame: Rect, alpha: f64 },
    Drawer { id: usize, open: bool },
    Destroy { id: usize },
}

/// Renderer whose handles are sequential ids, recording every call.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub(crate) calls: Vec<Call>,
    pub(crate) refuse_rows: bool,
    next_id: usize,
    rows: BTreeMap<usize, SectionRow>,
    headers: BTreeSet<usize>,
}

impl RecordingRenderer {
    pub(crate) fn live_rows(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn live_headers(&self) -> usize {
        self.headers.len()
    }

    /// Position a live row handle is currently bound to.
    pub(crate) fn bound(&self, id: usize) -> Option<SectionRow> {
        self.rows.get(&id).copied()
    }

    pub(crate) fn updates(&self) -> Vec<(usize, SectionRow)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Update { id, at } => Some((*id, *at)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn made(&self) -> Vec<SectionRow> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Make { at, .. } => Some(*at),
                _ => None,
            })
            .collect()
    }

    fn mint(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

impl RowRenderer for RecordingRenderer {
    type Handle = usize;

    fn make_row(&mut self, at: SectionRow, frame: Rect) -> Option<usize> {
        if self.refuse_rows {
            return None;
        }
        let id = self.mint();
        self.rows.insert(id, at);
        self.calls.push(Call::Make { id, at, frame });
        Some(id)
    }

    fn update_row(&mut self, handle: &usize, at: SectionRow) {
        assert!(
            self.rows.contains_key(handle),
            "update of dead row {handle}"
        );
        self.rows.insert(*handle, at);
        self.calls.push(Call::Update { id: *handle, at });
    }

    fn make_header(&mut self, section: usize, _frame: Rect) -> Option<usize> {
        let id = self.mint();
        self.headers.insert(id);
        self.calls.push(Call::MakeHeader { id, section });
        Some(id)
    }

    fn place(&mut self, handle: &usize, frame: Rect, alpha: f64) {
        self.calls.push(Call::Place {
            id: *handle,
            frame,
            alpha,
        });
    }

    fn set_drawer_open(&mut self, handle: &usize, open: bool) {
        self.calls.push(Call::Drawer { id: *handle, open });
    }

    fn destroy(&mut self, handle: usize) {
        let was_live = self.rows.remove(&handle).is_some() || self.headers.remove(&handle);
        assert!(was_live, "handle {handle} destroyed twice");
        self.calls.push(Call::Destroy { id: handle });
    }
}

/// Section counts shared between a test and the list view that reads them.
#[derive(Clone, Debug)]
pub(crate) struct SharedSections(Rc<RefCell<StaticSections>>);

impl SharedSections {
    /// Table cells are 320x64 with 12 padding; collection cells 100x100 with 10;
    /// headers are 32 tall.
    pub(crate) fn new(counts: &[usize]) -> Self {
        Self(Rc::new(RefCell::new(StaticSections::new(
            counts.to_vec(),
            CellMetrics::new(320.0, 64.0, 12.0),
            CellMetrics::new(100.0, 100.0, 10.0),
            HeaderMetrics::new(0.0, 32.0),
        ))))
    }

    pub(crate) fn counts(&self) -> Vec<usize> {
        self.0.borrow().counts().to_vec()
    }

    pub(crate) fn grow(&self, section: usize, n: usize) {
        self.0.borrow_mut().grow(section, n);
    }

    pub(crate) fn shrink(&self, section: usize, n: usize) {
        self.0.borrow_mut().shrink(section, n);
    }
}

impl SectionSource for SharedSections {
    fn section_count(&self) -> usize {
        self.0.borrow().section_count()
    }

    fn item_count(&self, section: usize) -> usize {
        self.0.borrow().item_count(section)
    }

    fn cell_metrics(&self, mode: LayoutMode) -> CellMetrics {
        self.0.borrow().cell_metrics(mode)
    }

    fn header_metrics(&self, mode: LayoutMode) -> HeaderMetrics {
        self.0.borrow().header_metrics(mode)
    }
}

/// One routed selection event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Selection {
    Tapped(SectionRow),
    Toggled(SectionRow, bool),
    DrawerButton(SectionRow, usize),
    Refresh,
}

/// Selection handler appending to a shared log.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingSelection(pub(crate) Rc<RefCell<Vec<Selection>>>);

impl RecordingSelection {
    pub(crate) fn events(&self) -> Vec<Selection> {
        self.0.borrow().clone()
    }
}

impl SelectionHandler for RecordingSelection {
    fn cell_tapped(&mut self, at: SectionRow) {
        self.0.borrow_mut().push(Selection::Tapped(at));
    }

    fn checkbox_toggled(&mut self, at: SectionRow, selected: bool) {
        self.0.borrow_mut().push(Selection::Toggled(at, selected));
    }

    fn drawer_button_pressed(&mut self, at: SectionRow, button: usize) {
        self.0
            .borrow_mut()
            .push(Selection::DrawerButton(at, button));
    }

    fn refresh_requested(&mut self) {
        self.0.borrow_mut().push(Selection::Refresh);
    }
}

/// Drop handler answering with a fixed reply. On success it removes the dragged
/// row from `source` first, as a real host would.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedDrop {
    pub(crate) reply: DropReply,
    pub(crate) source: SharedSections,
    pub(crate) seen: Rc<RefCell<Vec<(usize, usize, SectionRow, SectionRow)>>>,
}

impl ScriptedDrop {
    pub(crate) fn new(reply: DropReply, source: &SharedSections) -> Self {
        Self {
            reply,
            source: source.clone(),
            seen: Rc::default(),
        }
    }
}

impl DropHandler<usize> for ScriptedDrop {
    fn on_drop(&mut self, request: DropRequest<'_, usize>) -> DropReply {
        let (from, onto) = (request.from, request.onto);
        self.seen
            .borrow_mut()
            .push((*request.dragged, *request.target, from, onto));
        if self.reply == DropReply::Succeeded {
            self.source.shrink(request.from.section, 1);
        }
        self.reply
    }
}
