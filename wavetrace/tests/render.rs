// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use wavetrace::*;

const DIAGRAM_VCD: &str = "$timescale 1 ns $end\n\
    $scope module top $end\n\
    $var wire 1 ! clk $end\n\
    $var wire 4 \" data[3:0] $end\n\
    $var wire 1 # err $end\n\
    $upscope $end\n\
    #0\n0!\nb0101 \"\n0#\n\
    #50\n1!\nb1100 \"\nx#\n\
    #100\n0!\n";

fn render_to_list(
    viewport: &Viewport,
    hover: Option<&HoverInfo>,
) -> (Vec<DrawCommand>, WaveformDocument, SignalLayout) {
    let doc = parse(DIAGRAM_VCD);
    let layout = SignalLayout::new(&doc);
    let renderer = Renderer::default();
    let dims = CanvasDims::new(1100.0, 400.0, 100.0);
    let mut list = DrawList::new();
    renderer.render(&mut list, &doc, &layout, viewport, &dims, hover);
    (list.into_commands(), doc, layout)
}

#[test]
fn test_render_produces_ruler_and_tracks() {
    let (commands, _, layout) = render_to_list(&Viewport::default(), None);
    assert!(!commands.is_empty());
    assert!(matches!(commands[0], DrawCommand::Clear(_)));

    // time span 100 -> tick step 10 -> grid lines labeled 10, 20, ... 100
    let labels: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(labels.contains(&"10"));
    assert!(labels.contains(&"100"));

    // every visible row gets its label in the sidebar
    for row in layout.rows() {
        assert!(labels.contains(&row.label.as_str()), "{}", row.label);
    }
}

#[test]
fn test_binary_track_renders_levels_and_risers() {
    let (commands, _, _) = render_to_list(&Viewport::default(), None);
    let lines: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Line {
                x0,
                y0,
                x1,
                y1,
                style: LineStyle::Solid,
                color: _,
            } => Some((*x0, *y0, *x1, *y1)),
            _ => None,
        })
        .collect();
    // clk rises at time 50 -> a vertical riser at x = 100 + 50 * 10 = 600
    assert!(
        lines
            .iter()
            .any(|(x0, y0, x1, y1)| x0 == x1 && *x0 == 600.0 && y0 != y1),
        "expected a riser at x=600"
    );
    // and horizontal segments on both sides of it
    assert!(lines
        .iter()
        .any(|(x0, y0, x1, y1)| y0 == y1 && *x0 == 100.0 && *x1 == 600.0));
}

#[test]
fn test_multi_bit_track_renders_hexagons() {
    let (commands, _, _) = render_to_list(&Viewport::default(), None);
    let hexagons: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Polygon { points, .. } => Some(points),
            _ => None,
        })
        .collect();
    assert_eq!(hexagons.len(), 2, "two defined bus segments");
    assert!(hexagons.iter().all(|p| p.len() == 6));

    let texts: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(texts.contains(&"0101"));
    assert!(texts.contains(&"1100"));
}

#[test]
fn test_undefined_segment_renders_error_box() {
    let (commands, _, _) = render_to_list(&Viewport::default(), None);
    let error = Theme::default().error;
    // the err signal goes x at time 50; its segment becomes an outlined box
    let error_lines = commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Line { color, .. } if *color == error))
        .count();
    assert!(error_lines >= 4, "outlined box is four error-colored lines");
    assert!(commands.iter().any(
        |c| matches!(c, DrawCommand::Text { text, color, .. } if text == "x" && *color == error)
    ));
}

#[test]
fn test_cursor_and_tooltip() {
    let mut viewport = Viewport::default();
    viewport.set_hovered_time(Some(30.0));
    let hover = HoverInfo {
        track_name: "clk".to_string(),
        value: "0".to_string(),
        time: 30.0,
    };
    let (commands, _, _) = render_to_list(&viewport, Some(&hover));
    let cursor = Theme::default().cursor;
    assert!(commands.iter().any(|c| matches!(
        c,
        DrawCommand::Line { x0, style: LineStyle::Dashed, color, .. }
            if *color == cursor && (*x0 - 400.0).abs() < 1e-9
    )));
    assert!(commands
        .iter()
        .any(|c| matches!(c, DrawCommand::Text { text, .. } if text.contains("clk = 0"))));
}

#[test]
fn test_render_is_noop_without_data() {
    let doc = parse("");
    let layout = SignalLayout::new(&doc);
    let mut list = DrawList::new();
    let dims = CanvasDims::new(1100.0, 400.0, 100.0);
    Renderer::default().render(
        &mut list,
        &doc,
        &layout,
        &Viewport::default(),
        &dims,
        None,
    );
    assert!(list.commands().is_empty());

    // degenerate canvas: sidebar swallows the whole width
    let doc = parse(DIAGRAM_VCD);
    let layout = SignalLayout::new(&doc);
    let mut list = DrawList::new();
    let dims = CanvasDims::new(80.0, 400.0, 100.0);
    Renderer::default().render(
        &mut list,
        &doc,
        &layout,
        &Viewport::default(),
        &dims,
        None,
    );
    assert!(list.commands().is_empty());
}

#[test]
fn test_rows_scrolled_off_screen_are_skipped() {
    let doc = parse(DIAGRAM_VCD);
    let layout = SignalLayout::new(&doc);
    let renderer = Renderer::default();
    // a canvas so short that only the first row fits under the ruler
    let dims = CanvasDims::new(1100.0, 45.0, 100.0);
    let mut list = DrawList::new();
    renderer.render(&mut list, &doc, &layout, &Viewport::default(), &dims, None);
    let labels: Vec<&String> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text),
            _ => None,
        })
        .filter(|t| layout.rows().iter().any(|r| &r.label == t.as_str()))
        .collect();
    assert_eq!(labels.len(), 1, "only the first track label is drawn");
    assert_eq!(labels[0], "clk");

    // scrolling down brings later rows in and pushes the first one out
    let mut viewport = Viewport::default();
    viewport.scroll_by(0.0, 30.0);
    let mut list = DrawList::new();
    renderer.render(&mut list, &doc, &layout, &viewport, &dims, None);
    let texts: Vec<&String> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert!(!texts.iter().any(|t| t.as_str() == "clk"));
    assert!(texts.iter().any(|t| t.as_str() == "data[3:0]"));
}

#[test]
fn test_change_on_window_edge_keeps_its_riser() {
    // clk falls back to 0 exactly at max_time, i.e. on the right window edge
    let (commands, _, _) = render_to_list(&Viewport::default(), None);
    let wave = Theme::default().wave;
    assert!(
        commands.iter().any(|c| matches!(
            c,
            DrawCommand::Line { x0, x1, y0, y1, color, style: LineStyle::Solid }
                if *color == wave && x0 == x1 && (*x0 - 1100.0).abs() < 1e-9 && y0 != y1
        )),
        "expected a riser on the right window edge"
    );
}

#[test]
fn test_zoomed_window_clips_segments() {
    let mut viewport = Viewport::default();
    viewport.set_zoom(2.0);
    viewport.scroll_by(1200.0, 0.0); // 20 px per tick -> window starts at tick 60
    let (commands, _, _) = render_to_list(&viewport, None);
    // only the post-50 bus value is visible
    let texts: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(texts.contains(&"1100"));
    assert!(!texts.contains(&"0101"));
}
