// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity map between linear indices and live view tags.
//!
//! A [`Tag`] is the identity of one materialized view. At rest, a tag always equals
//! `base + linear_index` of the item its view displays. Mutations break that
//! relation for a moment and restore it by renumbering:
//!
//! - [`IdentityMap::renumber`] shifts every live tag at or after an index by a delta
//!   (inserts walk tags in descending order, deletes in ascending order, so a shifted
//!   tag never lands on a live one).
//! - [`IdentityMap::compact`] closes the gaps left by a batch of removals in a single
//!   ascending pass: each survivor moves down by the number of removed indices that
//!   preceded it.
//!
//! Looking up a tag that is not live is a programmer error. It panics in debug
//! builds and is logged and ignored in release builds.

use alloc::collections::BTreeMap;

use smallvec::SmallVec;
use understory_section_layout::{LinearIndex, SectionLayout, SectionRow};

/// Largest accepted tag base. Tags above it are left for the indices.
pub const MAX_TAG_BASE: u64 = u64::MAX >> 1;

/// Opaque identity of a live view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub(crate) u64);

impl Tag {
    /// Returns the raw tag value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// One tag moved by a renumbering pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Renumbered {
    /// Tag before the pass.
    pub from: Tag,
    /// Tag after the pass.
    pub to: Tag,
}

/// Tags moved by one renumbering pass, in the order they were processed.
pub type RenumberReport = SmallVec<[Renumbered; 8]>;

/// Map from live [`Tag`]s to per-view payloads, ordered by tag.
#[derive(Clone, Debug)]
pub struct IdentityMap<T> {
    base: u64,
    entries: BTreeMap<Tag, T>,
}

impl<T> IdentityMap<T> {
    /// Creates an empty map whose tags start at `base`, clamped to [`MAX_TAG_BASE`].
    #[must_use]
    pub fn new(base: u64) -> Self {
        Self {
            base: base.min(MAX_TAG_BASE),
            entries: BTreeMap::new(),
        }
    }

    /// The offset between linear indices and tags.
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// The tag a view displaying `index` carries at rest.
    #[must_use]
    pub const fn tag_for(&self, index: LinearIndex) -> Tag {
        Tag(self.base.saturating_add(index.0 as u64))
    }

    fn index_of(&self, tag: Tag) -> LinearIndex {
        debug_assert!(tag.0 >= self.base, "tag {tag:?} below base {}", self.base);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Tags are only ever minted from usize indices"
        )]
        let index = (tag.0 - self.base) as usize;
        LinearIndex(index)
    }

    /// The linear index of a live tag.
    ///
    /// Returns `None` (after flagging an identity fault) if `tag` is not live.
    #[must_use]
    pub fn linear_index_for(&self, tag: Tag) -> Option<LinearIndex> {
        if self.entries.contains_key(&tag) {
            Some(self.index_of(tag))
        } else {
            unknown_tag(tag);
            None
        }
    }

    /// The `(section, row)` of a live tag under `layout`.
    #[must_use]
    pub fn section_row_for(&self, tag: Tag, layout: &SectionLayout) -> Option<SectionRow> {
        self.linear_index_for(tag)
            .and_then(|index| layout.section_row_for(index))
    }

    /// Returns `true` if `tag` is live.
    #[must_use]
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Returns `true` if a view for `index` is live.
    #[must_use]
    pub fn contains_index(&self, index: LinearIndex) -> bool {
        self.entries.contains_key(&self.tag_for(index))
    }

    /// Payload of a live tag.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&T> {
        self.entries.get(&tag)
    }

    /// Mutable payload of a live tag.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut T> {
        self.entries.get_mut(&tag)
    }

    /// Registers a view for `index` and returns its tag.
    ///
    /// A view must not already be live for `index`.
    pub fn insert(&mut self, index: LinearIndex, value: T) -> Tag {
        let tag = self.tag_for(index);
        let previous = self.entries.insert(tag, value);
        debug_assert!(previous.is_none(), "tag {tag:?} was already live");
        tag
    }

    /// Unregisters a tag, returning its payload.
    pub fn remove(&mut self, tag: Tag) -> Option<T> {
        self.entries.remove(&tag)
    }

    /// Number of live tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tag is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live tags with their indices and payloads, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, LinearIndex, &T)> {
        self.entries
            .iter()
            .map(|(&tag, value)| (tag, self.index_of(tag), value))
    }

    /// Live tags with their indices and mutable payloads, in ascending order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Tag, LinearIndex, &mut T)> {
        let base = self.base;
        self.entries.iter_mut().map(move |(&tag, value)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Tags are only ever minted from usize indices"
            )]
            let index = (tag.0 - base) as usize;
            (tag, LinearIndex(index), value)
        })
    }

    /// Live tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> {
        self.entries.keys().copied()
    }

    /// Removes every entry, yielding the payloads.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + use<T> {
        core::mem::take(&mut self.entries).into_values()
    }

    /// Shifts every live tag whose index is `>= from` by `delta`.
    ///
    /// Positive deltas are processed in descending tag order and negative ones in
    /// ascending order. A negative delta requires the `|delta|` slots below `from` to
    /// be vacant already.
    pub fn renumber(&mut self, from: LinearIndex, delta: isize) -> RenumberReport {
        let mut report = RenumberReport::new();
        if delta == 0 {
            return report;
        }
        if delta < 0 && from.0 < delta.unsigned_abs() {
            unknown_shift(from, delta);
            return report;
        }
        let tail = self.entries.split_off(&self.tag_for(from));
        let shift = |tag: Tag| Tag(tag.0.wrapping_add_signed(delta as i64));
        if delta > 0 {
            for (tag, value) in tail.into_iter().rev() {
                let to = shift(tag);
                self.entries.insert(to, value);
                report.push(Renumbered { from: tag, to });
            }
        } else {
            for (tag, value) in tail {
                let to = shift(tag);
                let collided = self.entries.insert(to, value);
                debug_assert!(
                    collided.is_none(),
                    "renumbering {tag:?} by {delta} collided with a live tag"
                );
                report.push(Renumbered { from: tag, to });
            }
        }
        report
    }

    /// Opens slots for `inserted` (final indices, sorted ascending, no duplicates).
    ///
    /// Each live tag moves up by the number of slots opened at or below its new
    /// position. Tags are processed in descending order.
    pub fn expand(&mut self, inserted: &[LinearIndex]) -> RenumberReport {
        debug_assert!(
            inserted.windows(2).all(|w| w[0] < w[1]),
            "inserted indices must be sorted and unique"
        );
        if let [at] = inserted {
            return self.renumber(*at, 1);
        }
        let mut report = RenumberReport::new();
        if inserted.is_empty() {
            return report;
        }
        let entries = core::mem::take(&mut self.entries);
        for (tag, value) in entries.into_iter().rev() {
            let index = self.index_of(tag);
            let to = self.tag_for(LinearIndex(index_after_insert(index.0, inserted)));
            if to != tag {
                report.push(Renumbered { from: tag, to });
            }
            self.entries.insert(to, value);
        }
        report
    }

    /// Closes the gaps left by removing `removed` (sorted ascending, no duplicates).
    ///
    /// The views for `removed` must already be gone. Each surviving tag moves down by
    /// the number of removed indices below it, in a single ascending pass.
    pub fn compact(&mut self, removed: &[LinearIndex]) -> RenumberReport {
        debug_assert!(
            removed.windows(2).all(|w| w[0] < w[1]),
            "removed indices must be sorted and unique"
        );
        if let [at] = removed {
            debug_assert!(
                !self.contains_index(*at),
                "{at:?} is still live but was removed"
            );
            return self.renumber(LinearIndex(at.0 + 1), -1);
        }
        let mut report = RenumberReport::new();
        if removed.is_empty() {
            return report;
        }
        let entries = core::mem::take(&mut self.entries);
        for (tag, value) in entries {
            let index = self.index_of(tag);
            let Some(new_index) = index_after_remove(index.0, removed) else {
                stale_tag(tag);
                continue;
            };
            let to = self.tag_for(LinearIndex(new_index));
            if to != tag {
                report.push(Renumbered { from: tag, to });
            }
            self.entries.insert(to, value);
        }
        report
    }
}

/// New position of old index `index` after inserting at the final positions
/// `inserted` (sorted ascending, unique).
pub(crate) fn index_after_insert(index: usize, inserted: &[LinearIndex]) -> usize {
    // The j-th insertion lands before old index `inserted[j] - j`.
    let opened = inserted
        .iter()
        .enumerate()
        .take_while(|&(j, p)| p.0 - j <= index)
        .count();
    index + opened
}

/// New position of old index `index` after removing the old positions `removed`
/// (sorted ascending, unique), or `None` if `index` itself was removed.
pub(crate) fn index_after_remove(index: usize, removed: &[LinearIndex]) -> Option<usize> {
    let preceding = removed.partition_point(|r| r.0 < index);
    match removed.get(preceding) {
        Some(r) if r.0 == index => None,
        _ => Some(index - preceding),
    }
}

/// Maps `tag` through a renumbering report.
#[must_use]
pub fn follow(report: &[Renumbered], tag: Tag) -> Tag {
    report
        .iter()
        .find(|r| r.from == tag)
        .map_or(tag, |r| r.to)
}

fn unknown_tag(tag: Tag) {
    if cfg!(debug_assertions) {
        panic!("unknown tag {tag:?}: not present in the live view pool");
    }
    log::error!("unknown tag {tag:?}: not present in the live view pool");
}

fn stale_tag(tag: Tag) {
    if cfg!(debug_assertions) {
        panic!("{tag:?} is still live but its index was removed");
    }
    log::error!("{tag:?} is still live but its index was removed; dropped");
}

fn unknown_shift(from: LinearIndex, delta: isize) {
    if cfg!(debug_assertions) {
        panic!("renumbering from {from:?} by {delta} would underflow");
    }
    log::error!("renumbering from {from:?} by {delta} underflows; ignored");
}
