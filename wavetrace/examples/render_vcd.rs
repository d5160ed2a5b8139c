// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::Ordering;
use wavetrace::*;

#[derive(Parser, Debug)]
#[command(name = "render_vcd")]
#[command(version)]
#[command(about = "Parses a VCD file and renders it into a draw command list.", long_about = None)]
struct Args {
    #[arg(value_name = "VCDFILE", index = 1)]
    filename: String,
    /// canvas width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f64,
    /// canvas height in pixels
    #[arg(long, default_value_t = 720.0)]
    height: f64,
    /// expand every bus into per-bit tracks before layout
    #[arg(long)]
    expand: bool,
}

fn parse_with_progress(text: &str) -> WaveformDocument {
    let progress: ProgressCount = Default::default();
    let bar = ProgressBar::new(text.lines().count() as u64);
    bar.set_style(
        ProgressStyle::with_template("{wide_bar} {pos}/{len} lines ({eta})")
            .expect("valid template"),
    );
    let mut cont = ChunkedParse::new(text).with_progress(progress.clone());
    loop {
        match cont.step() {
            ParseStep::Pending(next) => {
                bar.set_position(progress.load(Ordering::SeqCst));
                cont = next;
            }
            ParseStep::Complete(doc) => {
                bar.finish();
                return doc;
            }
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.filename).expect("failed to read input file");
    let start = std::time::Instant::now();
    let mut doc = parse_with_progress(&text);
    let load_duration = start.elapsed();
    println!(
        "Loaded {}: {} signals, max time {}, timescale exponent {} in {:?}",
        args.filename,
        doc.signals().len(),
        doc.max_time(),
        doc.timescale_exponent(),
        load_duration
    );
    if doc.is_empty() {
        println!("No waveform data to render.");
        return;
    }
    if args.expand {
        doc = expand_buses(doc);
    }

    for signal in doc.signals() {
        let last = signal.wave().last().expect("waves are never empty");
        println!(
            "  {:40} {} changes, final value {}",
            signal.full_name(),
            signal.wave().len(),
            last.1
        );
    }

    let layout = SignalLayout::new(&doc);
    let viewport = Viewport::default();
    let dims = CanvasDims::new(args.width, args.height, 150.0);
    let mut list = DrawList::new();
    Renderer::default().render(&mut list, &doc, &layout, &viewport, &dims, None);
    println!(
        "Rendered {} tracks into {} draw commands.",
        layout.rows().len(),
        list.commands().len()
    );
}
