//! Pan/zoom state and the screen↔model coordinate transform
//!
//! Pure calculation logic: no host dependencies, so it can be unit tested
//! directly.
//!
//! ```text
//! screen = model * scale + offset
//! model  = (screen - offset) / scale
//! ```

use serde::{Deserialize, Serialize};

/// Zoom limits and step size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change of one zoom button press or wheel notch
    pub zoom_step: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 2.0,
            zoom_step: 0.1,
        }
    }
}

impl ViewportConfig {
    /// Repair bounds that are swapped, non-positive or non-finite
    fn normalized(self) -> Self {
        let fallback = Self::default();
        let finite_pos = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        let a = finite_pos(self.min_scale, fallback.min_scale);
        let b = finite_pos(self.max_scale, fallback.max_scale);
        Self {
            min_scale: a.min(b),
            max_scale: a.max(b),
            zoom_step: if self.zoom_step.is_finite() {
                self.zoom_step.abs()
            } else {
                fallback.zoom_step
            },
        }
    }
}

/// View transform state
#[derive(Debug, Clone, Serialize)]
pub struct Viewport {
    /// Zoom level (1.0 = 100%)
    scale: f64,
    /// Pan offset in screen pixels
    offset_x: f64,
    offset_y: f64,
    #[serde(skip)]
    config: ViewportConfig,
    #[serde(skip)]
    panning: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub const DEFAULT_SCALE: f64 = 1.0;

    pub fn new(config: ViewportConfig) -> Self {
        let config = config.normalized();
        Self {
            scale: Self::DEFAULT_SCALE.clamp(config.min_scale, config.max_scale),
            offset_x: 0.0,
            offset_y: 0.0,
            config,
            panning: false,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Current zoom as a whole percentage
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Convert model coordinates to screen coordinates
    pub fn model_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.offset_x,
            y * self.scale + self.offset_y,
        )
    }

    /// Convert screen coordinates to model coordinates
    pub fn screen_to_model(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Add `delta` to the scale, clamped to the configured range
    pub fn zoom_by(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.scale = (self.scale + delta).clamp(self.config.min_scale, self.config.max_scale);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-self.config.zoom_step);
    }

    /// One wheel notch: scrolling down zooms out, scrolling up zooms in
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y > 0.0 {
            self.zoom_out();
        } else if delta_y < 0.0 {
            self.zoom_in();
        }
    }

    /// Reset view to default
    pub fn reset_view(&mut self) {
        self.scale = Self::DEFAULT_SCALE.clamp(self.config.min_scale, self.config.max_scale);
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    pub fn begin_pan(&mut self) {
        self.panning = true;
    }

    pub fn end_pan(&mut self) {
        self.panning = false;
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    /// Pan the view by delta pixels. Ignored unless a pan gesture is active.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        if !self.panning || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        self.offset_x += dx;
        self.offset_y += dy;
        true
    }

    /// Fit the given model-space bounds into a canvas of `width` × `height`
    pub fn fit_to_bounds(&mut self, bounds: &BoundingBox, width: f64, height: f64, padding: f64) {
        if bounds.is_empty() {
            return;
        }

        let available_width = (width - 2.0 * padding).max(1.0);
        let available_height = (height - 2.0 * padding).max(1.0);

        let scale_x = available_width / bounds.width();
        let scale_y = available_height / bounds.height();
        self.scale = scale_x
            .min(scale_y)
            .clamp(self.config.min_scale, self.config.max_scale);

        // Put the bounds' center at the canvas center
        self.offset_x = width / 2.0 - bounds.center_x() * self.scale;
        self.offset_y = height / 2.0 - bounds.center_y() * self.scale;
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Expand the bounding box to include a circle
    pub fn include_circle(&mut self, x: f64, y: f64, radius: f64) {
        self.min_x = self.min_x.min(x - radius);
        self.max_x = self.max_x.max(x + radius);
        self.min_y = self.min_y.min(y - radius);
        self.max_y = self.max_y.max(y + radius);
    }

    /// Width, at least 1.0 so it can be divided by
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(1.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(1.0)
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let vp = Viewport::default();
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.offset(), (0.0, 0.0));
        assert_eq!(vp.zoom_percent(), 100);
        assert!(!vp.is_panning());
    }

    #[test]
    fn model_to_screen_applies_scale_then_offset() {
        let mut vp = Viewport::default();
        vp.begin_pan();
        vp.pan_by(100.0, 50.0);
        vp.zoom_by(1.0);
        assert_eq!(vp.model_to_screen(10.0, 20.0), (120.0, 90.0));
        assert_eq!(vp.screen_to_model(120.0, 90.0), (10.0, 20.0));
    }

    #[test]
    fn roundtrip_holds_for_many_states() {
        let mut vp = Viewport::default();
        vp.begin_pan();
        let points = [(0.0, 0.0), (123.4, -56.7), (-1e4, 3e3), (0.001, 999.9)];
        for step in 0..20 {
            vp.zoom_by(if step % 3 == 0 { -0.37 } else { 0.23 });
            vp.pan_by(step as f64 * 7.3 - 40.0, 11.1 - step as f64);
            for &(x, y) in &points {
                let (sx, sy) = vp.model_to_screen(x, y);
                let (mx, my) = vp.screen_to_model(sx, sy);
                assert!((mx - x).abs() < 1e-9 * x.abs().max(1.0));
                assert!((my - y).abs() < 1e-9 * y.abs().max(1.0));
            }
        }
    }

    #[test]
    fn zoom_by_clamps_to_bounds() {
        let mut vp = Viewport::default();
        vp.zoom_by(-10.0);
        assert_eq!(vp.scale(), 0.5);
        vp.zoom_by(1000.0);
        assert_eq!(vp.scale(), 2.0);
        vp.zoom_by(f64::NAN);
        assert_eq!(vp.scale(), 2.0);
    }

    #[test]
    fn zoom_never_leaves_range() {
        let mut vp = Viewport::default();
        let deltas = [0.3, -0.9, 0.05, 2.5, -0.01, -7.0, 0.7, 0.0, 1e9, -1e9];
        for (i, d) in deltas.iter().cycle().take(200).enumerate() {
            vp.zoom_by(*d * (i % 5) as f64);
            assert!((0.5..=2.0).contains(&vp.scale()));
        }
    }

    #[test]
    fn wheel_steps_by_configured_amount() {
        let mut vp = Viewport::default();
        vp.wheel(120.0);
        assert!((vp.scale() - 0.9).abs() < 1e-12);
        vp.wheel(-120.0);
        vp.wheel(-120.0);
        assert!((vp.scale() - 1.1).abs() < 1e-12);
        vp.wheel(0.0);
        assert!((vp.scale() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn pan_only_while_gesture_active() {
        let mut vp = Viewport::default();
        assert!(!vp.pan_by(10.0, 10.0));
        assert_eq!(vp.offset(), (0.0, 0.0));

        vp.begin_pan();
        assert!(vp.pan_by(10.0, -5.0));
        vp.end_pan();
        assert!(!vp.pan_by(10.0, 10.0));
        assert_eq!(vp.offset(), (10.0, -5.0));
    }

    #[test]
    fn reset_view_restores_defaults() {
        let mut vp = Viewport::default();
        vp.begin_pan();
        vp.pan_by(100.0, 50.0);
        vp.zoom_in();
        vp.reset_view();
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.offset(), (0.0, 0.0));
    }

    #[test]
    fn swapped_config_is_normalized() {
        let vp = Viewport::new(ViewportConfig {
            min_scale: 3.0,
            max_scale: 1.5,
            zoom_step: -0.2,
        });
        assert_eq!(vp.config().min_scale, 1.5);
        assert_eq!(vp.config().max_scale, 3.0);
        assert_eq!(vp.config().zoom_step, 0.2);
        assert_eq!(vp.scale(), 1.5);
    }

    #[test]
    fn fit_to_bounds_centers_graph() {
        let mut vp = Viewport::default();
        let bounds = BoundingBox {
            min_x: 0.0,
            max_x: 400.0,
            min_y: 0.0,
            max_y: 300.0,
        };
        vp.fit_to_bounds(&bounds, 800.0, 600.0, 0.0);

        // 800/400 = 2, 600/300 = 2
        assert_eq!(vp.scale(), 2.0);
        let (cx, cy) = vp.model_to_screen(bounds.center_x(), bounds.center_y());
        assert_eq!((cx, cy), (400.0, 300.0));
    }

    #[test]
    fn fit_to_bounds_clamps_scale() {
        let mut vp = Viewport::default();
        let bounds = BoundingBox {
            min_x: -5000.0,
            max_x: 5000.0,
            min_y: -10.0,
            max_y: 10.0,
        };
        vp.fit_to_bounds(&bounds, 800.0, 600.0, 20.0);
        assert_eq!(vp.scale(), 0.5);
    }

    #[test]
    fn fit_to_empty_bounds_does_nothing() {
        let mut vp = Viewport::default();
        vp.zoom_in();
        vp.fit_to_bounds(&BoundingBox::empty(), 800.0, 600.0, 0.0);
        assert!((vp.scale() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn bounding_box_dimensions() {
        let mut bb = BoundingBox::empty();
        assert!(bb.is_empty());
        bb.include_circle(0.0, 0.0, 10.0);
        bb.include_circle(100.0, 40.0, 10.0);
        assert_eq!(bb.width(), 120.0);
        assert_eq!(bb.height(), 60.0);
        assert_eq!(bb.center_x(), 50.0);
        assert_eq!(bb.center_y(), 20.0);
    }
}
