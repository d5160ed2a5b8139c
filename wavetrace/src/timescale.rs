// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

/// Timescale unit as declared in a VCD `$timescale` command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum TimescaleUnit {
    FemtoSeconds,
    PicoSeconds,
    NanoSeconds,
    MicroSeconds,
    MilliSeconds,
    Seconds,
    Unknown,
}

impl TimescaleUnit {
    pub fn to_exponent(&self) -> i32 {
        match &self {
            TimescaleUnit::FemtoSeconds => -15,
            TimescaleUnit::PicoSeconds => -12,
            TimescaleUnit::NanoSeconds => -9,
            TimescaleUnit::MicroSeconds => -6,
            TimescaleUnit::MilliSeconds => -3,
            TimescaleUnit::Seconds => 0,
            // an unrecognized unit contributes nothing instead of aborting the parse
            TimescaleUnit::Unknown => 0,
        }
    }

    pub fn from_str(name: &str) -> Self {
        match name {
            "fs" => TimescaleUnit::FemtoSeconds,
            "ps" => TimescaleUnit::PicoSeconds,
            "ns" => TimescaleUnit::NanoSeconds,
            "us" => TimescaleUnit::MicroSeconds,
            "ms" => TimescaleUnit::MilliSeconds,
            "s" => TimescaleUnit::Seconds,
            _ => TimescaleUnit::Unknown,
        }
    }
}

/// The base-10 exponent contributed by the magnitude of a timescale token.
/// Only 1, 10 and 100 are legal per the VCD standard; anything else contributes zero.
fn magnitude_exponent(factor: u64) -> i32 {
    match factor {
        1 => 0,
        10 => 1,
        100 => 2,
        _ => 0,
    }
}

/// Converts a timescale token like `10 ns` or `100ps` into a base-10 exponent,
/// e.g. `10 ns` -> -8. Malformed tokens resolve to `0` (one second) so that a bad
/// `$timescale` never takes down the whole parse.
pub fn parse_timescale(token: &str) -> i32 {
    let token = token.trim();
    let digits_end = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(ii, _)| ii)
        .unwrap_or(token.len());
    let (digits, rest) = token.split_at(digits_end);
    let unit = rest.trim_start();
    if digits.is_empty()
        || unit.is_empty()
        || !unit.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return 0;
    }
    let factor = match digits.parse::<u64>() {
        Ok(value) => value,
        Err(_) => return 0,
    };
    magnitude_exponent(factor) + TimescaleUnit::from_str(unit).to_exponent()
}
