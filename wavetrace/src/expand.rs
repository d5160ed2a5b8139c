// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::document::{Signal, WaveformDocument};

/// An explicit `[hi:lo]` bit range carried in a signal name.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BitRange {
    pub hi: u32,
    pub lo: u32,
}

impl BitRange {
    pub fn length(&self) -> u32 {
        self.hi - self.lo + 1
    }
}

/// Extracts a trailing `[hi:lo]` range from a signal name, e.g. `SW[1:0]` ->
/// (`SW`, 1..0). Spaces before the bracket are tolerated since some dumpers emit the
/// range as a separate token. A single `[i]` suffix or a descending range is not an
/// expandable range and yields `None`.
pub fn parse_bit_range(name: &str) -> Option<(&str, BitRange)> {
    let rest = name.strip_suffix(']')?;
    let bracket = rest.rfind('[')?;
    let (base, inside) = (rest[..bracket].trim_end(), &rest[bracket + 1..]);
    let (hi, lo) = inside.split_once(':')?;
    let hi = hi.trim().parse::<u32>().ok()?;
    let lo = lo.trim().parse::<u32>().ok()?;
    if base.is_empty() || hi < lo {
        return None;
    }
    Some((base, BitRange { hi, lo }))
}

/// Extracts a single trailing `[i]` bit index, e.g. `SW[1]` -> (`SW`, 1).
pub fn parse_bit_index(name: &str) -> Option<(&str, u32)> {
    let rest = name.strip_suffix(']')?;
    let bracket = rest.rfind('[')?;
    let (base, inside) = (rest[..bracket].trim_end(), &rest[bracket + 1..]);
    let idx = inside.trim().parse::<u32>().ok()?;
    if base.is_empty() {
        return None;
    }
    Some((base, idx))
}

/// The grouping key for the signal layout: the name before any `[...]` suffix.
pub fn base_name(name: &str) -> &str {
    match name.strip_suffix(']').and_then(|rest| rest.rfind('[')) {
        Some(bracket) => name[..bracket].trim_end(),
        None => name,
    }
}

/// Splits a multi-bit signal carrying an explicit bit range into per-bit signals
/// named `base[i]`, highest index first. Character 0 of the value string (leftmost)
/// is the highest bit index. Timestamps are preserved, nothing is resampled.
/// Returns `None` for signals that are not expandable.
pub fn expand_bus(signal: &Signal) -> Option<Vec<Signal>> {
    if !signal.is_multi_bit() {
        return None;
    }
    let (base, range) = parse_bit_range(signal.name())?;
    let mut bits = Vec::with_capacity(range.length() as usize);
    for ii in (range.lo..=range.hi).rev() {
        let char_idx = (range.hi - ii) as usize;
        let wave = signal
            .wave()
            .iter()
            .map(|(time, value)| {
                // a value shorter than the range reads as the parser's default
                let bit = value.chars().nth(char_idx).unwrap_or('0');
                (*time, bit.to_string())
            })
            .collect();
        bits.push(Signal::new(
            format!("{}[{ii}]", signal.id()),
            format!("{base}[{ii}]"),
            1,
            wave,
            signal.hierarchy().to_vec(),
        ));
    }
    Some(bits)
}

/// Post-processing pass over a parsed document: every expandable bus is followed by
/// its synthetic per-bit signals. The parent signal is retained, both forms stay
/// addressable.
pub fn expand_buses(doc: WaveformDocument) -> WaveformDocument {
    let timescale_exponent = doc.timescale_exponent();
    let max_time = doc.max_time();
    let mut signals = Vec::with_capacity(doc.signals().len());
    for signal in doc.signals() {
        let expansion = expand_bus(signal);
        signals.push(signal.clone());
        if let Some(bits) = expansion {
            signals.extend(bits);
        }
    }
    WaveformDocument::new(signals, timescale_exponent, max_time)
}
