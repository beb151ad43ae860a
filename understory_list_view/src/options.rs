// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunables for [`ListView`](crate::ListView).

use understory_section_layout::LayoutMode;

use crate::identity::MAX_TAG_BASE;

/// Configuration for a [`ListView`](crate::ListView).
///
/// All durations are in the host's time unit (the one passed to
/// [`ListView::tick`](crate::ListView::tick)). A duration of `0.0` makes the
/// corresponding transition synchronous.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ListViewOptions {
    /// Mode the list starts in.
    pub layout_mode: LayoutMode,
    /// Lines kept alive above and below the viewport.
    pub prefetch_margin: usize,
    /// Duration of fades, shifts, drag returns, and mode transforms.
    pub row_animation_duration: f64,
    /// Tag assigned to linear index zero.
    pub tag_base: u64,
    /// Opacity of the current drop-target candidate.
    pub drag_dim_alpha: f64,
    /// Height of the auto-scroll strips at the top and bottom of the viewport.
    pub auto_scroll_strip: f64,
    /// Scroll distance per auto-scroll step at full strip overlap.
    pub auto_scroll_step: f64,
    /// Pull distance that arms pull-to-refresh; `None` disables it.
    pub refresh_threshold: Option<f64>,
}

impl Default for ListViewOptions {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Table,
            prefetch_margin: 1,
            row_animation_duration: 0.25,
            tag_base: 1,
            drag_dim_alpha: 0.5,
            auto_scroll_strip: 44.0,
            auto_scroll_step: 12.0,
            refresh_threshold: None,
        }
    }
}

impl ListViewOptions {
    /// Sets the initial layout mode.
    #[must_use]
    pub fn with_layout_mode(mut self, mode: LayoutMode) -> Self {
        self.layout_mode = mode;
        self
    }

    /// Sets the prefetch margin, in lines.
    #[must_use]
    pub fn with_prefetch_margin(mut self, lines: usize) -> Self {
        self.prefetch_margin = lines;
        self
    }

    /// Sets the animation duration. Negative values are treated as `0.0`.
    #[must_use]
    pub fn with_row_animation_duration(mut self, duration: f64) -> Self {
        self.row_animation_duration = duration.max(0.0);
        self
    }

    /// Sets the tag of linear index zero, clamped to [`MAX_TAG_BASE`].
    #[must_use]
    pub fn with_tag_base(mut self, base: u64) -> Self {
        self.tag_base = base.min(MAX_TAG_BASE);
        self
    }

    /// Sets the opacity of the drop-target candidate.
    #[must_use]
    pub fn with_drag_dim_alpha(mut self, alpha: f64) -> Self {
        self.drag_dim_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Sets the auto-scroll strip height and step.
    #[must_use]
    pub fn with_auto_scroll(mut self, strip: f64, step: f64) -> Self {
        self.auto_scroll_strip = strip.max(0.0);
        self.auto_scroll_step = step.max(0.0);
        self
    }

    /// Enables pull-to-refresh, armed once the content is pulled `threshold` past
    /// its top.
    #[must_use]
    pub fn with_refresh_threshold(mut self, threshold: f64) -> Self {
        self.refresh_threshold = Some(threshold.max(0.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use understory_section_layout::LayoutMode;

    use super::ListViewOptions;
    use crate::identity::MAX_TAG_BASE;

    #[test]
    fn builders_sanitize_inputs() {
        let options = ListViewOptions::default()
            .with_layout_mode(LayoutMode::Collection)
            .with_row_animation_duration(-1.0)
            .with_drag_dim_alpha(3.0)
            .with_refresh_threshold(60.0);
        assert_eq!(options.layout_mode, LayoutMode::Collection);
        assert_eq!(options.row_animation_duration, 0.0);
        assert_eq!(options.drag_dim_alpha, 1.0);
        assert_eq!(options.refresh_threshold, Some(60.0));
        assert_eq!(options.tag_base, 1);
        let options = ListViewOptions::default().with_tag_base(u64::MAX);
        assert_eq!(options.tag_base, MAX_TAG_BASE);
    }
}
