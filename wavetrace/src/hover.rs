// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::layout::SignalLayout;
use crate::render::Renderer;
use crate::viewport::{CanvasDims, Viewport};
use crate::WaveformDocument;

/// Result of a successful hover query: the track under the pointer, its held value
/// and the simulation time at the pointer's x position.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub track_name: String,
    pub value: String,
    pub time: f64,
}

impl Renderer {
    /// Maps a pixel position back to simulation time and the track under it, and
    /// resolves the track's effective value at that time: the value holds from a
    /// change until just before the next one. Pixels over the sidebar, past the
    /// last row or without a drawable transform yield `None`.
    pub fn resolve_hover(
        &self,
        doc: &WaveformDocument,
        layout: &SignalLayout,
        viewport: &Viewport,
        dims: &CanvasDims,
        x: f64,
        y: f64,
    ) -> Option<HoverInfo> {
        let transform = viewport.transform(dims, doc.max_time())?;
        if x < dims.sidebar_width || x > dims.width {
            return None;
        }
        let time = transform.x_to_time(x);
        if time < 0.0 {
            return None;
        }

        let track_y = y - self.ruler_height + viewport.offset_y();
        let row_idx = layout.track_index_at(track_y, self.row_height)?;
        let row = &layout.rows()[row_idx];
        let signal = layout.resolve(doc, row);
        let (_, value) = signal.value_before_next_change(time as u64);
        Some(HoverInfo {
            track_name: row.label.clone(),
            value: value.clone(),
            time,
        })
    }
}
