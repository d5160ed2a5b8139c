// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use std::fmt::{Debug, Formatter};

pub type Time = u64;

/// A single trace entry: the signal takes `value` at `time` and holds it until the
/// next entry.
pub type WaveEntry = (Time, String);

/// One declared VCD variable together with all of its recorded value changes.
///
/// Values are strings of exactly `width` characters over `{0,1,x,z}`. The wave is
/// sorted ascending by time, contains at most one entry per time and always starts
/// at time zero (the parser inserts an all-zero default if the file does not).
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    id: String,
    name: String,
    width: u32,
    wave: Vec<WaveEntry>,
    hierarchy: Vec<String>,
}

impl Debug for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signal({}, {} bits, {} changes)",
            self.full_name(),
            self.width,
            self.wave.len()
        )
    }
}

impl Signal {
    pub fn new(
        id: String,
        name: String,
        width: u32,
        wave: Vec<WaveEntry>,
        hierarchy: Vec<String>,
    ) -> Self {
        debug_assert!(width >= 1);
        Signal {
            id,
            name,
            width,
            wave,
            hierarchy,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn wave(&self) -> &[WaveEntry] {
        &self.wave
    }

    /// Scope names from the root module down to the immediate parent.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn full_name(&self) -> String {
        if self.hierarchy.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.hierarchy.join("."), self.name)
        }
    }

    pub fn is_multi_bit(&self) -> bool {
        self.width > 1
    }

    /// The effective value at `time`: the value of the last change at or before `time`.
    /// Well defined for any query since the wave always has an entry at time zero.
    pub fn value_at(&self, time: Time) -> &str {
        debug_assert!(!self.wave.is_empty(), "wave must never be empty");
        let idx = self.wave.partition_point(|(t, _)| *t <= time);
        let idx = idx.saturating_sub(1);
        &self.wave[idx].1
    }

    /// The value held over the interval that contains `time`, resolved the way the
    /// hover tooltip needs it: the entry just before the first change with a time
    /// strictly greater than `time`, or the last entry if no such change exists.
    pub fn value_before_next_change(&self, time: Time) -> &WaveEntry {
        debug_assert!(!self.wave.is_empty(), "wave must never be empty");
        let next = self.wave.partition_point(|(t, _)| *t <= time);
        if next < self.wave.len() {
            &self.wave[next.saturating_sub(1)]
        } else {
            self.wave.last().unwrap()
        }
    }

    pub(crate) fn wave_mut(&mut self) -> &mut Vec<WaveEntry> {
        &mut self.wave
    }
}

/// Returns `true` if the value string contains an undefined (`x`) or floating (`z`) bit.
pub fn value_has_undefined(value: &str) -> bool {
    value.chars().any(|c| matches!(c, 'x' | 'z'))
}

/// The parsed result of one VCD file. Immutable once built; re-parsing produces a
/// fresh document.
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct WaveformDocument {
    signals: Vec<Signal>,
    timescale_exponent: i32,
    max_time: Time,
}

impl Debug for WaveformDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WaveformDocument({} signals, max time {}, 10^{} s per tick)",
            self.signals.len(),
            self.max_time,
            self.timescale_exponent
        )
    }
}

impl WaveformDocument {
    pub fn new(signals: Vec<Signal>, timescale_exponent: i32, max_time: Time) -> Self {
        WaveformDocument {
            signals,
            timescale_exponent,
            max_time,
        }
    }

    /// All signals in declaration order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Looks a signal up by display name. On duplicate names, the first declaration wins.
    pub fn get_signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn timescale_exponent(&self) -> i32 {
        self.timescale_exponent
    }

    /// Seconds represented by one integer time tick.
    pub fn timescale_magnitude(&self) -> f64 {
        10.0_f64.powi(self.timescale_exponent)
    }

    pub fn max_time(&self) -> Time {
        self.max_time
    }

    /// Number of displayed cycles: `ceil(max_time / 10^-exponent)`.
    pub fn max_cycles(&self) -> u64 {
        let divisor = 10.0_f64.powi(-self.timescale_exponent);
        (self.max_time as f64 / divisor).ceil() as u64
    }

    /// A document with no signals or no time range is a legitimate outcome of parsing
    /// a trivial file; callers surface it as a "no data" state.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() || self.max_time == 0
    }
}
