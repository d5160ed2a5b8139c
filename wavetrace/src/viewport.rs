// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::document::Time;

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 10.0;

/// Pixel dimensions of the drawing surface. The sidebar on the left holds signal
/// labels; waveforms are drawn in the remaining width.
#[derive(Debug, Clone, Copy)]
pub struct CanvasDims {
    pub width: f64,
    pub height: f64,
    pub sidebar_width: f64,
}

impl CanvasDims {
    pub fn new(width: f64, height: f64, sidebar_width: f64) -> Self {
        CanvasDims {
            width,
            height,
            sidebar_width,
        }
    }

    /// Width available for waveform tracks.
    pub fn drawable_width(&self) -> f64 {
        self.width - self.sidebar_width
    }
}

/// View state owned by the rendering layer: zoom, scroll offset and the hovered
/// time. Mutated only by user gestures, never by the parser or the data model.
#[derive(Debug, Clone)]
pub struct Viewport {
    zoom: f64,
    offset_x: f64,
    offset_y: f64,
    hovered_time: Option<f64>,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            hovered_time: None,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Sets the zoom level, clamped to `[ZOOM_MIN, ZOOM_MAX]` on every mutation.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn zoom_in(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    pub fn zoom_out(&mut self, factor: f64) {
        self.set_zoom(self.zoom / factor);
    }

    pub fn offset_x(&self) -> f64 {
        self.offset_x
    }

    /// Vertical scroll in pixels; rows scrolled past the top are skipped for drawing
    /// but still consume layout height.
    pub fn offset_y(&self) -> f64 {
        self.offset_y
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y = (self.offset_y + dy).max(0.0);
    }

    pub fn hovered_time(&self) -> Option<f64> {
        self.hovered_time
    }

    pub fn set_hovered_time(&mut self, time: Option<f64>) {
        self.hovered_time = time;
    }

    /// Derives the affine time-to-pixel transform for the current zoom and scroll.
    /// Returns `None` for degenerate inputs (no time span, no drawable width) in
    /// which case drawing is a no-op.
    pub fn transform(&self, dims: &CanvasDims, max_time: Time) -> Option<TimeTransform> {
        let span = max_time as f64;
        let drawable = dims.drawable_width();
        if span <= 0.0 || drawable <= 0.0 {
            return None;
        }
        let x_scale = drawable * self.zoom / span;
        let visible_start = self.offset_x / x_scale;
        Some(TimeTransform {
            x_scale,
            visible_start,
            sidebar: dims.sidebar_width,
            span,
            zoom: self.zoom,
        })
    }
}

/// The affine mapping between simulation time and horizontal pixel position,
/// derived per frame from the viewport and canvas geometry.
#[derive(Debug, Clone, Copy)]
pub struct TimeTransform {
    x_scale: f64,
    visible_start: f64,
    sidebar: f64,
    span: f64,
    zoom: f64,
}

impl TimeTransform {
    pub fn time_to_x(&self, time: f64) -> f64 {
        (time - self.visible_start) * self.x_scale + self.sidebar
    }

    pub fn x_to_time(&self, x: f64) -> f64 {
        (x - self.sidebar) / self.x_scale + self.visible_start
    }

    /// The currently visible time window `[start, start + span/zoom]`.
    pub fn visible_window(&self) -> (f64, f64) {
        (self.visible_start, self.visible_start + self.span / self.zoom)
    }

    pub fn x_scale(&self) -> f64 {
        self.x_scale
    }
}
