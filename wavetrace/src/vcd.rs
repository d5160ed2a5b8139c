// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::document::{Signal, Time, WaveEntry, WaveformDocument};
use crate::timescale::parse_timescale;
use log::{debug, trace};
use rustc_hash::FxHashMap;

/// Used to communicate progress (in lines consumed) to a UI thread.
pub type ProgressCount = std::sync::Arc<std::sync::atomic::AtomicU64>;

/// Number of lines processed per call to [`ChunkedParse::step`]. Large VCD files are
/// consumed in bounded chunks so that the caller can yield back to its scheduler
/// between chunks instead of blocking for the whole file.
pub const LINES_PER_CHUNK: usize = 10_000;

/// Parses the full text of a VCD file into a [`WaveformDocument`] by driving the
/// chunked continuation to completion.
///
/// The parser is deliberately permissive: unrecognized lines, malformed timescale
/// tokens and value changes for unknown ids are skipped, never raised. The only
/// observable definitional failure is an empty document.
pub fn parse(text: &str) -> WaveformDocument {
    let mut cont = ChunkedParse::new(text);
    loop {
        match cont.step() {
            ParseStep::Pending(next) => cont = next,
            ParseStep::Complete(doc) => return doc,
        }
    }
}

/// Reads a VCD file from disk and parses it.
pub fn read_from_file<P: AsRef<std::path::Path>>(filename: P) -> crate::Result<WaveformDocument> {
    let input_file = std::fs::File::open(filename.as_ref()).map_err(|e| {
        crate::WavetraceError::FailedToLoad(filename.as_ref().display().to_string(), e.to_string())
    })?;
    let mmap = unsafe { memmap2::Mmap::map(&input_file)? };
    let text = String::from_utf8_lossy(&mmap[..]);
    Ok(parse(&text))
}

/// Result of one parse step: either the continuation for the next chunk or the
/// finished document.
pub enum ParseStep<'a> {
    Pending(ChunkedParse<'a>),
    Complete(WaveformDocument),
}

/// An in-flight parse. All transient state lives in this value, so concurrent parses
/// never share anything. Cancellation is simply dropping the continuation.
pub struct ChunkedParse<'a> {
    lines: std::str::Lines<'a>,
    state: ParserState,
    chunk_size: usize,
    progress: Option<ProgressCount>,
}

impl<'a> ChunkedParse<'a> {
    pub fn new(text: &'a str) -> Self {
        ChunkedParse {
            lines: text.lines(),
            state: ParserState::default(),
            chunk_size: LINES_PER_CHUNK,
            progress: None,
        }
    }

    /// Overrides the chunk size. Chunking never changes the parse result; this only
    /// controls how much work a single `step` performs.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        assert!(chunk_size > 0);
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCount) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Processes up to one chunk of lines and yields either the continuation or the
    /// finished document.
    pub fn step(mut self) -> ParseStep<'a> {
        let mut processed = 0usize;
        while processed < self.chunk_size {
            match self.lines.next() {
                Some(line) => {
                    self.state.handle_line(line);
                    processed += 1;
                }
                None => {
                    self.report_progress(processed);
                    return ParseStep::Complete(self.state.finish());
                }
            }
        }
        self.report_progress(processed);
        ParseStep::Pending(self)
    }

    fn report_progress(&self, processed: usize) {
        if let Some(p) = self.progress.as_ref() {
            p.fetch_add(processed as u64, std::sync::atomic::Ordering::SeqCst);
        }
    }
}

/// Transient parser state, constructed per parse and threaded through the chunks.
#[derive(Default)]
struct ParserState {
    current_time: Time,
    max_time: Time,
    timescale_exponent: i32,
    scope_stack: Vec<String>,
    id_to_signal: FxHashMap<String, usize>,
    signals: Vec<Signal>,
}

impl ParserState {
    fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match line.as_bytes()[0] {
            b'$' => self.handle_command(line),
            b'#' => self.handle_time(line),
            b'b' | b'B' => self.handle_vector_change(line),
            _ => self.handle_scalar_change(line),
        }
    }

    fn handle_command(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens[0] {
            "$timescale" => {
                let token = join_until_end(&tokens[1..], " ");
                self.timescale_exponent = parse_timescale(&token);
                debug!("timescale: 10^{} s", self.timescale_exponent);
            }
            "$scope" => {
                if let Some(name) = tokens.get(2) {
                    self.scope_stack.push(name.to_string());
                }
            }
            "$upscope" => {
                // popping an empty stack is a no-op, not an error
                self.scope_stack.pop();
            }
            "$var" => self.handle_var(&tokens),
            // $enddefinitions, $dumpvars, $comment, vendor extensions ... are all inert
            other => trace!("ignoring command: {other}"),
        }
    }

    fn handle_var(&mut self, tokens: &[&str]) {
        if tokens.len() < 5 {
            trace!("ignoring malformed $var: {tokens:?}");
            return;
        }
        let width = match tokens[2].parse::<u32>() {
            Ok(w) if w >= 1 => w,
            _ => {
                trace!("ignoring $var with bad width: {tokens:?}");
                return;
            }
        };
        let id = tokens[3].to_string();
        // the name and an optional `[msb:lsb]` range may arrive as separate tokens;
        // concatenating them restores the `base[hi:lo]` form the bus expander expects
        let name = join_until_end(&tokens[4..], "");
        if name.is_empty() {
            trace!("ignoring $var without a name: {tokens:?}");
            return;
        }
        if self.id_to_signal.contains_key(&id) {
            trace!("duplicate id `{id}`, keeping the first declaration");
            return;
        }
        let signal = Signal::new(
            id.clone(),
            name,
            width,
            Vec::new(),
            self.scope_stack.clone(),
        );
        self.id_to_signal.insert(id, self.signals.len());
        self.signals.push(signal);
    }

    fn handle_time(&mut self, line: &str) {
        match line[1..].parse::<Time>() {
            Ok(time) => {
                self.current_time = time;
                self.max_time = self.max_time.max(time);
            }
            Err(_) => trace!("ignoring malformed timestamp: {line}"),
        }
    }

    /// `b<bitstring> <id>`, whitespace separated.
    fn handle_vector_change(&mut self, line: &str) {
        let mut tokens = line.split_whitespace();
        let (value_token, id) = match (tokens.next(), tokens.next()) {
            (Some(v), Some(id)) => (v, id),
            _ => {
                trace!("ignoring malformed vector change: {line}");
                return;
            }
        };
        let value = value_token[1..].to_ascii_lowercase();
        if value.is_empty() || !value.chars().all(is_wave_char) {
            trace!("ignoring vector change with bad value: {line}");
            return;
        }
        let Some(&signal_idx) = self.id_to_signal.get(id) else {
            trace!("value change for unknown id `{id}`");
            return;
        };
        let width = self.signals[signal_idx].width() as usize;
        let value = pad_to_width(value, width);
        append_change(
            self.signals[signal_idx].wave_mut(),
            self.current_time,
            value,
        );
    }

    /// `<bit><id>` with no separating whitespace.
    fn handle_scalar_change(&mut self, line: &str) {
        if line.len() < 2 || line.contains(char::is_whitespace) {
            trace!("ignoring line: {line}");
            return;
        }
        let bit = line.chars().next().unwrap().to_ascii_lowercase();
        if !is_wave_char(bit) {
            trace!("ignoring line: {line}");
            return;
        }
        let id = &line[1..];
        let Some(&signal_idx) = self.id_to_signal.get(id) else {
            trace!("value change for unknown id `{id}`");
            return;
        };
        append_change(
            self.signals[signal_idx].wave_mut(),
            self.current_time,
            bit.to_string(),
        );
    }

    fn finish(mut self) -> WaveformDocument {
        for signal in self.signals.iter_mut() {
            let width = signal.width() as usize;
            let wave = signal.wave_mut();
            // guard against out-of-order emission; the stable sort keeps emission
            // order for equal times so the dedup below keeps the last one
            wave.sort_by_key(|(t, _)| *t);
            collapse_duplicate_times(wave);
            // every signal has a defined value at time zero
            if wave.first().map(|(t, _)| *t > 0).unwrap_or(true) {
                wave.insert(0, (0, "0".repeat(width)));
            }
        }
        debug!(
            "parsed {} signals, max time {}",
            self.signals.len(),
            self.max_time
        );
        WaveformDocument::new(self.signals, self.timescale_exponent, self.max_time)
    }
}

fn is_wave_char(c: char) -> bool {
    matches!(c, '0' | '1' | 'x' | 'z')
}

/// Joins tokens with `sep`, stopping at a `$end` terminator if present.
fn join_until_end(tokens: &[&str], sep: &str) -> String {
    let end = tokens
        .iter()
        .position(|t| *t == "$end")
        .unwrap_or(tokens.len());
    tokens[..end].join(sep)
}

/// Left-pads with `'0'` to the declared width; a value that is too long keeps only
/// its lowest `width` bits.
fn pad_to_width(value: String, width: usize) -> String {
    use std::cmp::Ordering;
    match value.len().cmp(&width) {
        Ordering::Equal => value,
        Ordering::Less => {
            let mut padded = "0".repeat(width - value.len());
            padded.push_str(&value);
            padded
        }
        Ordering::Greater => value.chars().skip(value.len() - width).collect(),
    }
}

/// Appends a change, replacing the previous entry if the time did not advance.
fn append_change(wave: &mut Vec<WaveEntry>, time: Time, value: String) {
    match wave.last_mut() {
        Some(last) if last.0 == time => last.1 = value,
        _ => wave.push((time, value)),
    }
}

/// Keeps the last entry for every distinct time. Expects a sorted wave.
fn collapse_duplicate_times(wave: &mut Vec<WaveEntry>) {
    let mut deduped: Vec<WaveEntry> = Vec::with_capacity(wave.len());
    for entry in wave.drain(..) {
        match deduped.last_mut() {
            Some(last) if last.0 == entry.0 => *last = entry,
            _ => deduped.push(entry),
        }
    }
    *wave = deduped;
}
