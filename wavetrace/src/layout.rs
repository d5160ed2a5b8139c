// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::document::{Signal, Time, WaveformDocument};
use crate::expand::{base_name, parse_bit_index};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Where a track's wave data comes from: a signal in the document or a composite
/// synthesized from a group's per-bit members.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TrackSource {
    Document(usize),
    Composite(usize),
}

/// One vertical slot in the diagram. Row `i` occupies pixels
/// `[i * row_height, (i+1) * row_height)` in track space.
#[derive(Debug, Clone)]
pub struct TrackRow {
    pub label: String,
    pub source: TrackSource,
}

/// A named cluster of signals sharing a base name (e.g. `SW[1:0]`, `SW[1]`, `SW[0]`).
/// Toggles between a collapsed single-row rendering and an expanded per-bit one.
#[derive(Debug, Clone)]
pub struct SignalGroup {
    name: String,
    collapsed: TrackRow,
    members: Vec<TrackRow>,
    expanded: bool,
}

impl SignalGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// A group with fewer than two member rows has nothing to expand into.
    pub fn is_expandable(&self) -> bool {
        self.members.len() > 1
    }
}

/// Derived vertical arrangement of the document's signals. Rebuilt whenever a group
/// is expanded or collapsed; never persisted.
pub struct SignalLayout {
    groups: Vec<SignalGroup>,
    rows: Vec<TrackRow>,
    composites: Vec<Signal>,
}

impl SignalLayout {
    pub fn new(doc: &WaveformDocument) -> Self {
        let (groups, composites) = build_groups(doc);
        let mut layout = SignalLayout {
            groups,
            rows: Vec::new(),
            composites,
        };
        layout.rebuild_rows();
        layout
    }

    pub fn groups(&self) -> &[SignalGroup] {
        &self.groups
    }

    /// All currently visible rows, top to bottom.
    pub fn rows(&self) -> &[TrackRow] {
        &self.rows
    }

    pub fn set_expanded(&mut self, group_name: &str, expanded: bool) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.name == group_name) {
            if group.is_expandable() {
                group.expanded = expanded;
            }
        }
        self.rebuild_rows();
    }

    pub fn toggle(&mut self, group_name: &str) {
        let expanded = self
            .groups
            .iter()
            .find(|g| g.name == group_name)
            .map(|g| !g.expanded)
            .unwrap_or(false);
        self.set_expanded(group_name, expanded);
    }

    /// Maps a vertical pixel position (in track space, i.e. already adjusted for the
    /// ruler and vertical scroll) to a row index. Out of range yields `None`.
    pub fn track_index_at(&self, y: f64, row_height: f64) -> Option<usize> {
        if y < 0.0 || row_height <= 0.0 {
            return None;
        }
        let idx = (y / row_height) as usize;
        (idx < self.rows.len()).then_some(idx)
    }

    /// Resolves a row to the signal that should be drawn for it.
    pub fn resolve<'a>(&'a self, doc: &'a WaveformDocument, row: &TrackRow) -> &'a Signal {
        match row.source {
            TrackSource::Document(idx) => &doc.signals()[idx],
            TrackSource::Composite(idx) => &self.composites[idx],
        }
    }

    fn rebuild_rows(&mut self) {
        self.rows.clear();
        for group in self.groups.iter() {
            if group.expanded {
                self.rows.extend(group.members.iter().cloned());
            } else {
                self.rows.push(group.collapsed.clone());
            }
        }
    }
}

/// Signals only ever share a group when they carry a `[...]` suffix on the same base
/// name in the same scope. A suffix-less signal is keyed by its own index so that an
/// identically named scalar in another scope (a `clk` in every module) stays a
/// separate track instead of being concatenated into a bogus composite.
#[derive(Clone, Hash, Eq, PartialEq)]
struct GroupKey {
    scope: Vec<String>,
    base: String,
    solo: Option<usize>,
}

fn build_groups(doc: &WaveformDocument) -> (Vec<SignalGroup>, Vec<Signal>) {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut by_key: FxHashMap<GroupKey, GroupBuilder> = FxHashMap::default();

    for (idx, signal) in doc.signals().iter().enumerate() {
        let base = base_name(signal.name()).to_string();
        let key = GroupKey {
            scope: signal.hierarchy().to_vec(),
            solo: (signal.name() == base).then_some(idx),
            base,
        };
        let builder = by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            GroupBuilder::default()
        });
        if signal.is_multi_bit() && signal.name() != key.base {
            // `base[hi:lo]` style bus declaration becomes the group parent
            if builder.parent.is_none() {
                builder.parent = Some(idx);
            }
        } else {
            builder.members.push(idx);
        }
    }

    let mut groups = Vec::with_capacity(order.len());
    let mut composites = Vec::new();
    for key in order {
        let builder = by_key.remove(&key).unwrap();
        let base = key.base;
        let members: Vec<TrackRow> = builder
            .members
            .iter()
            .map(|idx| TrackRow {
                label: doc.signals()[*idx].name().to_string(),
                source: TrackSource::Document(*idx),
            })
            .collect();

        let collapsed = if let Some(parent) = builder.parent {
            TrackRow {
                label: doc.signals()[parent].name().to_string(),
                source: TrackSource::Document(parent),
            }
        } else if members.len() > 1 {
            // per-bit signals without a declared bus parent collapse into a
            // synthesized composite signal
            let composite = build_composite(doc, &base, &builder.members);
            composites.push(composite);
            TrackRow {
                label: base.clone(),
                source: TrackSource::Composite(composites.len() - 1),
            }
        } else {
            members[0].clone()
        };

        groups.push(SignalGroup {
            name: base,
            collapsed,
            members,
            expanded: false,
        });
    }
    (groups, composites)
}

#[derive(Default)]
struct GroupBuilder {
    parent: Option<usize>,
    members: Vec<usize>,
}

/// Assembles a multi-bit wave by concatenating per-bit values at the union of all
/// sampled times, highest bit index first. Members without an index suffix keep
/// their declaration order after the indexed ones.
fn build_composite(doc: &WaveformDocument, base: &str, member_indices: &[usize]) -> Signal {
    let mut ordered: Vec<usize> = member_indices.to_vec();
    ordered.sort_by_key(|idx| {
        let signal = &doc.signals()[*idx];
        match parse_bit_index(signal.name()) {
            Some((_, bit)) => (0u8, std::cmp::Reverse(bit)),
            None => (1u8, std::cmp::Reverse(0)),
        }
    });

    let times: BTreeSet<Time> = ordered
        .iter()
        .flat_map(|idx| doc.signals()[*idx].wave().iter().map(|(t, _)| *t))
        .collect();

    let width: u32 = ordered.iter().map(|idx| doc.signals()[*idx].width()).sum();
    let wave = times
        .into_iter()
        .map(|time| {
            let value: String = ordered
                .iter()
                .map(|idx| doc.signals()[*idx].value_at(time))
                .collect();
            (time, value)
        })
        .collect();

    let hierarchy = member_indices
        .first()
        .map(|idx| doc.signals()[*idx].hierarchy().to_vec())
        .unwrap_or_default();
    Signal::new(base.to_string(), base.to_string(), width, wave, hierarchy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand_buses;
    use crate::vcd::parse;

    const GROUPED_VCD: &str = "$scope module top $end\n\
        $var wire 1 ! clk $end\n\
        $var wire 1 a SW[1] $end\n\
        $var wire 1 b SW[0] $end\n\
        $upscope $end\n\
        #0\n0!\n1a\n0b\n#5\n1!\n0a\n1b\n";

    #[test]
    fn test_groups_by_base_name() {
        let doc = parse(GROUPED_VCD);
        let layout = SignalLayout::new(&doc);
        let names: Vec<_> = layout.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, ["clk", "SW"]);
        assert!(!layout.groups()[0].is_expandable());
        assert!(layout.groups()[1].is_expandable());
    }

    #[test]
    fn test_collapsed_composite_row() {
        let doc = parse(GROUPED_VCD);
        let layout = SignalLayout::new(&doc);
        assert_eq!(layout.rows().len(), 2);
        let sw_row = &layout.rows()[1];
        assert_eq!(sw_row.label, "SW");
        let composite = layout.resolve(&doc, sw_row);
        assert_eq!(composite.width(), 2);
        // SW[1] concatenated before SW[0]
        assert_eq!(
            composite.wave(),
            [(0, "10".to_string()), (5, "01".to_string())]
        );
    }

    #[test]
    fn test_expand_and_collapse() {
        let doc = parse(GROUPED_VCD);
        let mut layout = SignalLayout::new(&doc);
        layout.set_expanded("SW", true);
        let labels: Vec<_> = layout.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["clk", "SW[1]", "SW[0]"]);
        layout.toggle("SW");
        let labels: Vec<_> = layout.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["clk", "SW"]);
        // expanding a non-expandable group is a no-op
        layout.set_expanded("clk", true);
        assert_eq!(layout.rows().len(), 2);
    }

    #[test]
    fn test_bus_parent_renders_when_collapsed() {
        let doc = parse("$var wire 2 ! SW[1:0] $end\n$var wire 1 \" clk $end\n#0\nb10 !\n0\"\n#5\n1\"\n");
        let doc = expand_buses(doc);
        let layout = SignalLayout::new(&doc);
        let labels: Vec<_> = layout.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["SW[1:0]", "clk"]);

        let mut layout = layout;
        layout.set_expanded("SW", true);
        let labels: Vec<_> = layout.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["SW[1]", "SW[0]", "clk"]);
    }

    #[test]
    fn test_same_name_in_different_scopes_stays_separate() {
        let doc = parse(
            "$scope module a $end\n$var wire 1 ! clk $end\n$upscope $end\n\
             $scope module b $end\n$var wire 1 \" clk $end\n$upscope $end\n\
             #0\n0!\n1\"\n#5\n1!\n1\"\n",
        );
        let layout = SignalLayout::new(&doc);
        assert_eq!(layout.rows().len(), 2);
        for row in layout.rows() {
            assert_eq!(row.label, "clk");
        }
        let first = layout.resolve(&doc, &layout.rows()[0]);
        assert_eq!(first.width(), 1);
        assert_eq!(first.full_name(), "a.clk");
        let second = layout.resolve(&doc, &layout.rows()[1]);
        assert_eq!(second.full_name(), "b.clk");
        assert_eq!(second.value_at(0), "1");
    }

    #[test]
    fn test_bit_members_group_per_scope() {
        // the same per-bit family in two scopes yields two composites, not one
        let doc = parse(
            "$scope module a $end\n$var wire 1 ! SW[0] $end\n$var wire 1 \" SW[1] $end\n$upscope $end\n\
             $scope module b $end\n$var wire 1 # SW[0] $end\n$var wire 1 $ SW[1] $end\n$upscope $end\n\
             #0\n1!\n0\"\n0#\n1$\n#5\n",
        );
        let layout = SignalLayout::new(&doc);
        let labels: Vec<_> = layout.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["SW", "SW"]);
        let first = layout.resolve(&doc, &layout.rows()[0]);
        assert_eq!(first.width(), 2);
        assert_eq!(first.wave()[0], (0, "01".to_string()));
        let second = layout.resolve(&doc, &layout.rows()[1]);
        assert_eq!(second.wave()[0], (0, "10".to_string()));
    }

    #[test]
    fn test_track_index_at() {
        let doc = parse(GROUPED_VCD);
        let layout = SignalLayout::new(&doc);
        assert_eq!(layout.track_index_at(0.0, 30.0), Some(0));
        assert_eq!(layout.track_index_at(29.9, 30.0), Some(0));
        assert_eq!(layout.track_index_at(30.0, 30.0), Some(1));
        assert_eq!(layout.track_index_at(60.0, 30.0), None);
        assert_eq!(layout.track_index_at(-5.0, 30.0), None);
    }
}
