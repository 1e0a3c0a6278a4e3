//! Zoom factor between document space and screen space

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_SCALE: f64 = 2.0;

/// Current zoom, always clamped to `[MIN_SCALE, MAX_SCALE]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    value: f64,
}

impl Scale {
    pub fn new(value: f64) -> Self {
        Self { value: Self::bounded(value) }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set(&mut self, value: f64) {
        self.value = Self::bounded(value);
    }

    pub fn zoom_in(&mut self) {
        self.set(self.value + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set(self.value - ZOOM_STEP);
    }

    /// Multiplicative zoom, e.g. from a scroll wheel delta
    pub fn smooth_zoom(&mut self, delta: f64) {
        self.set(self.value * (1.0 + delta));
    }

    fn bounded(value: f64) -> f64 {
        if value.is_nan() {
            return DEFAULT_SCALE;
        }
        value.clamp(MIN_SCALE, MAX_SCALE)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self { value: DEFAULT_SCALE }
    }
}
