// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::document::{value_has_undefined, Signal, WaveformDocument};
use crate::hover::HoverInfo;
use crate::layout::SignalLayout;
use crate::viewport::{CanvasDims, TimeTransform, Viewport};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum TextAlign {
    Left,
    Center,
}

/// Drawing surface supplied by the host UI shell. The renderer only needs a handful
/// of primitives; anything that can rasterize these can display a diagram.
pub trait CanvasSurface {
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color);
    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color, style: LineStyle);
    fn stroke_polygon(&mut self, points: &[(f64, f64)], color: Color);
    fn draw_text(&mut self, text: &str, x: f64, y: f64, color: Color, align: TextAlign);

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        self.stroke_line(x, y, x + w, y, color, LineStyle::Solid);
        self.stroke_line(x + w, y, x + w, y + h, color, LineStyle::Solid);
        self.stroke_line(x + w, y + h, x, y + h, color, LineStyle::Solid);
        self.stroke_line(x, y + h, x, y, color, LineStyle::Solid);
    }
}

/// A recorded draw primitive, for headless rendering and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Color,
    },
    Line {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Color,
        style: LineStyle,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        color: Color,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        color: Color,
        align: TextAlign,
    },
}

/// [`CanvasSurface`] implementation that records commands instead of rasterizing.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl CanvasSurface for DrawList {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        self.commands.push(DrawCommand::FillRect { x, y, w, h, color });
    }

    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color, style: LineStyle) {
        self.commands.push(DrawCommand::Line {
            x0,
            y0,
            x1,
            y1,
            color,
            style,
        });
    }

    fn stroke_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, color: Color, align: TextAlign) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            color,
            align,
        });
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub text: Color,
    pub wave: Color,
    pub error: Color,
    pub cursor: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::rgb(0x1e, 0x1e, 0x1e),
            grid: Color::rgb(0x3a, 0x3a, 0x3a),
            text: Color::rgb(0xd0, 0xd0, 0xd0),
            wave: Color::rgb(0x4c, 0xaf, 0x50),
            error: Color::rgb(0xe5, 0x39, 0x35),
            cursor: Color::rgb(0xff, 0xc1, 0x07),
        }
    }
}

/// Chooses the largest power of ten that yields roughly five labeled ticks across
/// the visible window.
pub fn tick_step(span: f64) -> f64 {
    debug_assert!(span > 0.0);
    10.0_f64.powf((span / 5.0).log10().floor())
}

/// Draws the time ruler, the waveform tracks, the cursor and the hover tooltip.
/// Missing preconditions (empty document, degenerate canvas) make `render` a no-op.
pub struct Renderer {
    pub theme: Theme,
    pub row_height: f64,
    pub ruler_height: f64,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer {
            theme: Theme::default(),
            row_height: 30.0,
            ruler_height: 20.0,
        }
    }
}

/// Vertical row margin between a track's high and low levels and its slot edges.
const LEVEL_MARGIN: f64 = 4.0;
/// Horizontal extent of a bus hexagon's sloped edges.
const HEX_SLOPE: f64 = 4.0;
/// Minimum cell width before value text is dropped.
const MIN_TEXT_WIDTH: f64 = 14.0;

impl Renderer {
    pub fn render(
        &self,
        canvas: &mut impl CanvasSurface,
        doc: &WaveformDocument,
        layout: &SignalLayout,
        viewport: &Viewport,
        dims: &CanvasDims,
        hover: Option<&HoverInfo>,
    ) {
        if doc.is_empty() {
            return;
        }
        let Some(transform) = viewport.transform(dims, doc.max_time()) else {
            return;
        };

        canvas.clear(self.theme.background);
        self.draw_ruler(canvas, &transform, dims);
        self.draw_tracks(canvas, doc, layout, viewport, &transform, dims);
        self.draw_cursor(canvas, viewport, &transform, dims, hover);
    }

    fn draw_ruler(&self, canvas: &mut impl CanvasSurface, transform: &TimeTransform, dims: &CanvasDims) {
        let (start, end) = transform.visible_window();
        let span = end - start;
        if span <= 0.0 {
            return;
        }
        let step = tick_step(span);
        let mut tick = (start / step).ceil() * step;
        while tick <= end {
            let x = transform.time_to_x(tick);
            if x >= dims.sidebar_width && x <= dims.width {
                canvas.stroke_line(x, 0.0, x, dims.height, self.theme.grid, LineStyle::Solid);
                canvas.draw_text(
                    &format!("{}", tick),
                    x,
                    self.ruler_height / 2.0,
                    self.theme.text,
                    TextAlign::Center,
                );
            }
            tick += step;
        }
    }

    fn draw_tracks(
        &self,
        canvas: &mut impl CanvasSurface,
        doc: &WaveformDocument,
        layout: &SignalLayout,
        viewport: &Viewport,
        transform: &TimeTransform,
        dims: &CanvasDims,
    ) {
        for (row_idx, row) in layout.rows().iter().enumerate() {
            let y_top = self.ruler_height + row_idx as f64 * self.row_height - viewport.offset_y();
            // off-screen rows still consume layout height, they are just not drawn
            if y_top + self.row_height <= self.ruler_height || y_top >= dims.height {
                continue;
            }
            canvas.draw_text(
                &row.label,
                4.0,
                y_top + self.row_height / 2.0,
                self.theme.text,
                TextAlign::Left,
            );
            let signal = layout.resolve(doc, row);
            self.draw_wave(canvas, signal, y_top, transform, dims);
        }
    }

    fn draw_wave(
        &self,
        canvas: &mut impl CanvasSurface,
        signal: &Signal,
        y_top: f64,
        transform: &TimeTransform,
        dims: &CanvasDims,
    ) {
        let (win_start, win_end) = transform.visible_window();
        let wave = signal.wave();
        let mut prev_value: Option<&str> = None;
        for (ii, (time, value)) in wave.iter().enumerate() {
            let seg_start = *time as f64;
            let seg_end = wave
                .get(ii + 1)
                .map(|(t, _)| *t as f64)
                .unwrap_or(win_end)
                .min(win_end);
            // a change exactly on the window end still gets its riser drawn, so
            // only segments strictly past the edge are dropped
            if seg_end <= win_start || seg_start > win_end {
                prev_value = Some(value);
                continue;
            }
            let x0 = transform.time_to_x(seg_start.max(win_start)).max(dims.sidebar_width);
            let x1 = transform.time_to_x(seg_end).min(dims.width);
            if x1 >= x0 {
                self.draw_value_cell(
                    canvas,
                    x0,
                    x1,
                    y_top,
                    value,
                    prev_value,
                    signal.width(),
                    seg_start >= win_start,
                );
            }
            prev_value = Some(value);
        }
    }

    /// The one parameterized value-cell primitive: binary level segments, multi-bit
    /// hexagons and the undefined-state box all come out of here.
    #[allow(clippy::too_many_arguments)]
    fn draw_value_cell(
        &self,
        canvas: &mut impl CanvasSurface,
        x0: f64,
        x1: f64,
        y_top: f64,
        value: &str,
        prev_value: Option<&str>,
        width_bits: u32,
        at_change_edge: bool,
    ) {
        let y_high = y_top + LEVEL_MARGIN;
        let y_low = y_top + self.row_height - LEVEL_MARGIN;
        let y_mid = (y_high + y_low) / 2.0;

        if value_has_undefined(value) {
            if x1 <= x0 {
                return;
            }
            // undefined states override the normal rendering for the whole segment
            let offending = value.chars().find(|c| matches!(c, 'x' | 'z')).unwrap();
            canvas.stroke_rect(x0, y_high, x1 - x0, y_low - y_high, self.theme.error);
            if x1 - x0 >= MIN_TEXT_WIDTH {
                canvas.draw_text(
                    &offending.to_string(),
                    (x0 + x1) / 2.0,
                    y_mid,
                    self.theme.error,
                    TextAlign::Center,
                );
            }
            return;
        }

        if width_bits == 1 {
            let level = if value == "1" { y_high } else { y_low };
            if x1 > x0 {
                canvas.stroke_line(x0, level, x1, level, self.theme.wave, LineStyle::Solid);
            }
            if at_change_edge {
                if let Some(prev) = prev_value.filter(|p| !value_has_undefined(p)) {
                    let prev_level = if prev == "1" { y_high } else { y_low };
                    if prev_level != level {
                        canvas.stroke_line(
                            x0,
                            prev_level,
                            x0,
                            level,
                            self.theme.wave,
                            LineStyle::Solid,
                        );
                    }
                }
            }
            return;
        }

        if x1 <= x0 {
            return;
        }
        let slope = HEX_SLOPE.min((x1 - x0) / 2.0);
        let points = [
            (x0, y_mid),
            (x0 + slope, y_high),
            (x1 - slope, y_high),
            (x1, y_mid),
            (x1 - slope, y_low),
            (x0 + slope, y_low),
        ];
        canvas.stroke_polygon(&points, self.theme.wave);
        if x1 - x0 >= MIN_TEXT_WIDTH {
            canvas.draw_text(value, (x0 + x1) / 2.0, y_mid, self.theme.text, TextAlign::Center);
        }
    }

    fn draw_cursor(
        &self,
        canvas: &mut impl CanvasSurface,
        viewport: &Viewport,
        transform: &TimeTransform,
        dims: &CanvasDims,
        hover: Option<&HoverInfo>,
    ) {
        let Some(hovered_time) = viewport.hovered_time() else {
            return;
        };
        let x = transform.time_to_x(hovered_time);
        if x < dims.sidebar_width || x > dims.width {
            return;
        }
        canvas.stroke_line(x, 0.0, x, dims.height, self.theme.cursor, LineStyle::Dashed);
        if let Some(info) = hover {
            canvas.draw_text(
                &format!("{} = {} @ {}", info.track_name, info.value, info.time),
                x + 6.0,
                self.ruler_height + 4.0,
                self.theme.text,
                TextAlign::Left,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_step_selection() {
        assert_eq!(tick_step(100.0), 10.0);
        assert_eq!(tick_step(50.0), 10.0);
        assert_eq!(tick_step(49.0), 1.0);
        assert_eq!(tick_step(5.0), 1.0);
        assert_eq!(tick_step(5000.0), 1000.0);
        assert_eq!(tick_step(0.5), 0.1);
    }

    #[test]
    fn test_stroke_rect_default_impl() {
        let mut list = DrawList::new();
        list.stroke_rect(1.0, 2.0, 10.0, 5.0, Color::rgb(1, 2, 3));
        assert_eq!(list.commands().len(), 4);
        assert!(list
            .commands()
            .iter()
            .all(|c| matches!(c, DrawCommand::Line { .. })));
    }
}
