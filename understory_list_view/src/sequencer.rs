// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation sequencing: one structural change at a time, in three phases.
//!
//! Every structural change (insert, remove, mode transform) goes through the same
//! [`Phase`] machine:
//!
//! ```text
//! Idle ──enqueue──▶ Shifting ──settled──▶ Renumbering ──▶ Reconciling ──▶ Idle
//! ```
//!
//! - **Shifting** starts animations towards the post-mutation geometry. It lasts until
//!   the host reports that every motion has settled.
//! - **Renumbering** brings the identity map in line with the new linear indices and
//!   rebinds moved views.
//! - **Reconciling** runs an ordinary window reconciliation, skipped while more
//!   mutations are queued so each queued one starts from the still-shifted pool.
//!
//! Mutations requested while another is in flight are queued and run in order. Their
//! positions are already expressed against the counts that will hold once everything
//! ahead of them has run; [`Sequencer::project`] maps a position in the current
//! (possibly lagging) identity space to that final space.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_section_layout::{LayoutMode, LinearIndex};

use crate::error::ListViewError;
use crate::identity::{index_after_insert, index_after_remove};

/// Sorted, unique linear indices touched by one mutation.
pub type IndexBatch = SmallVec<[LinearIndex; 4]>;

/// The structural part of a [`Mutation`].
#[derive(Clone, Debug, PartialEq)]
pub enum MutationKind {
    /// Rows inserted at these final positions.
    Insert {
        /// Final positions, ascending.
        at: IndexBatch,
        /// Whether the new rows appear without a fade.
        placeholder: bool,
    },
    /// Rows removed from these old positions.
    Remove {
        /// Old positions, ascending.
        at: IndexBatch,
    },
    /// Switch to another layout mode.
    Transform {
        /// Mode to switch to.
        to: LayoutMode,
    },
}

/// One queued structural change.
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    /// What changes.
    pub kind: MutationKind,
    /// Per-section counts once this mutation has been applied.
    pub counts: Vec<usize>,
}

impl Mutation {
    /// Maps an index from before this mutation to after it.
    ///
    /// Returns `None` for a removed index.
    #[must_use]
    pub fn project(&self, index: LinearIndex) -> Option<LinearIndex> {
        match &self.kind {
            MutationKind::Insert { at, .. } => Some(LinearIndex(index_after_insert(index.0, at))),
            MutationKind::Remove { at } => index_after_remove(index.0, at).map(LinearIndex),
            MutationKind::Transform { .. } => Some(index),
        }
    }
}

/// Phase of the mutation in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Animating towards the post-mutation geometry.
    Shifting,
    /// Renumbering live tags.
    Renumbering,
    /// Reconciling the pool with the new window.
    Reconciling,
}

/// The side effects of each [`Phase`], supplied by the owner of the view pool.
pub trait MutationHost {
    /// Returns `true` once no view is animating.
    fn is_settled(&self) -> bool;
    /// Starts the animations of the Shifting phase.
    fn shift(&mut self, mutation: &Mutation) -> Result<(), ListViewError>;
    /// Renumbers and rebinds live views.
    fn renumber(&mut self, mutation: &Mutation) -> Result<(), ListViewError>;
    /// Reconciles the pool with the current window.
    fn reconcile(&mut self) -> Result<(), ListViewError>;
}

/// Serializes mutations through the [`Phase`] machine.
#[derive(Clone, Debug, Default)]
pub struct Sequencer {
    phase: Phase,
    active: Option<Mutation>,
    queue: VecDeque<Mutation>,
}

impl Sequencer {
    /// Creates an idle sequencer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The mutation in flight.
    #[must_use]
    pub fn active(&self) -> Option<&Mutation> {
        self.active.as_ref()
    }

    /// Returns `true` when nothing is in flight or queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle && self.queue.is_empty()
    }

    /// Mutations in flight or queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len() + usize::from(self.active.is_some())
    }

    /// Queues a mutation. Call [`advance`](Self::advance) to start it.
    pub fn enqueue(&mut self, mutation: Mutation) {
        log::debug!(
            "queued {:?} behind {} pending mutation(s)",
            mutation.kind,
            self.pending()
        );
        self.queue.push_back(mutation);
    }

    /// Maps a live index to the index it will have once every pending mutation has run.
    ///
    /// Returns `None` if a pending mutation removes it.
    #[must_use]
    pub fn project(&self, index: LinearIndex) -> Option<LinearIndex> {
        // Only a Shifting mutation has not renumbered yet; the other phases are
        // transient within `advance`.
        let active = self.active.iter().filter(|_| self.phase == Phase::Shifting);
        active
            .chain(&self.queue)
            .try_fold(index, |index, mutation| mutation.project(index))
    }

    /// Drops every pending mutation.
    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.active = None;
        self.queue.clear();
    }

    /// Runs phases until one has to wait for animations, or the queue is drained.
    pub fn advance(&mut self, host: &mut impl MutationHost) -> Result<(), ListViewError> {
        loop {
            match self.phase {
                Phase::Idle => {
                    let Some(mutation) = self.queue.pop_front() else {
                        return Ok(());
                    };
                    log::debug!("shifting for {:?}", mutation.kind);
                    host.shift(&mutation)?;
                    self.active = Some(mutation);
                    self.phase = Phase::Shifting;
                }
                Phase::Shifting => {
                    if !host.is_settled() {
                        return Ok(());
                    }
                    self.phase = Phase::Renumbering;
                }
                Phase::Renumbering => {
                    if let Some(mutation) = &self.active {
                        host.renumber(mutation)?;
                    }
                    self.phase = Phase::Reconciling;
                }
                Phase::Reconciling => {
                    if self.queue.is_empty() {
                        host.reconcile()?;
                    } else {
                        log::trace!("reconcile skipped; {} mutation(s) queued", self.queue.len());
                    }
                    if let Some(mutation) = self.active.take() {
                        log::debug!("finished {:?}", mutation.kind);
                    }
                    self.phase = Phase::Idle;
                }
            }
        }
    }
}
