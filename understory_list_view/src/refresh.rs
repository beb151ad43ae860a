// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pull-to-refresh state machine.
//!
//! The gesture is driven entirely by the scroll offset (negative while the content is
//! pulled past its top) and by whether the user is still tracking the scroll:
//!
//! - `Idle` to `Pulling`: the tracked offset goes negative.
//! - `Pulling` to `Armed`: the pull reaches the threshold; back below it disarms.
//! - `Armed` to `Refreshing`: the user lets go. This is the only transition that asks
//!   the host to refresh.
//! - `Pulling` to `Idle`: the user lets go early, or the offset returns to zero.
//! - `Refreshing` to `Idle`: the host reports that the refresh finished.

/// Where a pull-to-refresh gesture stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshState {
    /// No pull in progress.
    #[default]
    Idle,
    /// Pulled, but not far enough to trigger.
    Pulling,
    /// Pulled past the threshold; releasing triggers a refresh.
    Armed,
    /// Waiting for the host to finish refreshing.
    Refreshing,
}

impl RefreshState {
    /// Next state after the offset changed to `offset`.
    #[must_use]
    pub fn on_scroll(self, offset: f64, threshold: f64, tracking: bool) -> Self {
        let pull = -offset;
        match self {
            Self::Idle if tracking && pull > 0.0 => {
                Self::Pulling.on_scroll(offset, threshold, tracking)
            }
            Self::Pulling | Self::Armed if pull <= 0.0 => Self::Idle,
            Self::Pulling | Self::Armed if pull >= threshold => Self::Armed,
            Self::Pulling | Self::Armed => Self::Pulling,
            other => other,
        }
    }

    /// Next state after the user stopped tracking the scroll.
    #[must_use]
    pub fn on_release(self) -> Self {
        match self {
            Self::Armed => Self::Refreshing,
            Self::Pulling => Self::Idle,
            other => other,
        }
    }

    /// Next state after the host finished refreshing.
    #[must_use]
    pub fn on_finished(self) -> Self {
        match self {
            Self::Refreshing => Self::Idle,
            other => other,
        }
    }
}
