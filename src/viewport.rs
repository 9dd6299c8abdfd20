//! Zoom/pan viewport over the sample history.
//!
//! [`Viewport`] is the continuous transform a gesture layer drives: a zoom
//! factor, a pan offset in samples, and the vertical display ceiling. It
//! never mutates the history it windows; rendering code reads it through the
//! [`GraphSource`] trait, bound together with a history for one draw pass by
//! [`GraphData`].

use serde::Serialize;

use crate::history::{History, PowerSample};

/// Vertical ceiling a fresh viewport starts with, in watts.
pub const DEFAULT_MAX_Y: f64 = 2000.0;

/// Smallest allowed vertical ceiling.
const MIN_MAX_Y: f64 = 1.0;

/// Datasource contract a renderer draws from: a bounded number of
/// viewport-relative samples plus the current vertical scale ceiling.
pub trait GraphSource {
    /// Number of samples visible in the current window.
    fn sample_count(&self) -> usize;
    /// Visible sample `x`, block-averaged over `block_size` underlying
    /// seconds. `x` is viewport-relative, never an absolute buffer index.
    fn sample(&self, x: usize, block_size: usize) -> Option<PowerSample>;
    /// Vertical axis ceiling in watts.
    fn max_y(&self) -> f64;
}

/// Zoom/pan state over a [`History`].
///
/// `scale` is 1.0 when the whole buffer is visible; `offset` is how many
/// samples from the buffer start the window begins. Both are re-clamped on
/// every mutation so the window always lies fully over stored samples and
/// pins to the right edge while new data streams in.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Viewport {
    scale: f64,
    offset: f64,
    max_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            max_y: DEFAULT_MAX_Y,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current zoom factor, always >= 1.0.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Window start in samples from the buffer start, always >= 0.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Vertical axis ceiling in watts.
    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    fn visible_samples(&self, history: &History) -> f64 {
        history.count() as f64 / self.scale
    }

    fn right_padding(&self, history: &History) -> f64 {
        history.count() as f64 - self.visible_samples(history) - self.offset
    }

    /// Number of samples the current window shows, never more than the
    /// history holds.
    pub fn visible_count(&self, history: &History) -> usize {
        (self.visible_samples(history).round() as usize).min(history.count())
    }

    /// Set the zoom factor, clamped to `1.0..=count/2`. The ceiling keeps
    /// the window from collapsing to under two samples; the offset is
    /// shifted so the zoom stays centered on the viewport midpoint instead
    /// of the left edge.
    pub fn set_scale(&mut self, scale: f64, history: &History) {
        let old = self.scale;
        let ceiling = (history.count() / 2).max(1) as f64;
        self.scale = scale.clamp(1.0, ceiling);
        let recenter = (self.scale - old) * self.visible_samples(history) / 2.0;
        self.set_offset(self.offset + recenter, history);
    }

    /// Multiply the zoom factor, for pinch deltas.
    pub fn zoom_by(&mut self, factor: f64, history: &History) {
        self.set_scale(self.scale * factor, history);
    }

    /// Set the pan offset. Clamped so the window neither starts before the
    /// buffer nor runs past its end.
    pub fn set_offset(&mut self, offset: f64, history: &History) {
        self.offset = offset.max(0.0);
        let right_padding = self.right_padding(history);
        if right_padding < 0.0 {
            self.offset += right_padding;
        }
    }

    /// Shift the pan offset, for drag deltas.
    pub fn pan_by(&mut self, delta: f64, history: &History) {
        self.set_offset(self.offset + delta, history);
    }

    /// Set the vertical ceiling, floor-clamped so it stays positive.
    pub fn set_max_y(&mut self, max_y: f64) {
        self.max_y = max_y.max(MIN_MAX_Y);
    }

    /// Back to the full overview: whole buffer visible, no pan.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.offset = 0.0;
    }

    /// Re-clamp the offset against the current history, after the history
    /// itself changed (capacity shrink, purge).
    pub fn revalidate(&mut self, history: &History) {
        self.set_offset(self.offset, history);
    }

    /// Visible sample `x`, resolved through the current window.
    pub fn sample(
        &self,
        history: &History,
        x: usize,
        block_size: usize,
    ) -> Option<PowerSample> {
        history.get_sample_averaged(x + self.offset.round() as usize, block_size)
    }
}

/// A viewport bound to a history for the duration of one draw pass.
pub struct GraphData<'a> {
    pub viewport: &'a Viewport,
    pub history: &'a History,
}

impl GraphSource for GraphData<'_> {
    fn sample_count(&self) -> usize {
        self.viewport.visible_count(self.history)
    }

    fn sample(&self, x: usize, block_size: usize) -> Option<PowerSample> {
        self.viewport.sample(self.history, x, block_size)
    }

    fn max_y(&self) -> f64 {
        self.viewport.max_y()
    }
}
