// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod document;
mod expand;
mod hover;
mod layout;
mod render;
mod timescale;
pub mod vcd;
mod viewport;

/// Cargo.toml version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, thiserror::Error)]
pub enum WavetraceError {
    #[error("failed to load {0}:\n{1}")]
    FailedToLoad(String, String),
    #[error("io error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WavetraceError>;

pub use document::{value_has_undefined, Signal, Time, WaveEntry, WaveformDocument};
pub use expand::{base_name, expand_bus, expand_buses, parse_bit_index, parse_bit_range, BitRange};
pub use hover::HoverInfo;
pub use layout::{SignalGroup, SignalLayout, TrackRow, TrackSource};
pub use render::{
    tick_step, CanvasSurface, Color, DrawCommand, DrawList, LineStyle, Renderer, TextAlign, Theme,
};
pub use timescale::{parse_timescale, TimescaleUnit};
pub use vcd::{parse, read_from_file, ChunkedParse, ParseStep, ProgressCount};
pub use viewport::{CanvasDims, TimeTransform, Viewport, ZOOM_MAX, ZOOM_MIN};
