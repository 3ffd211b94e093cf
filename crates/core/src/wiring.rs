//! Visual wiring graph of one Block: wire segments and junctions.
//!
//! Segments are undirected edges whose ends are terminals or junctions. A
//! junction is created on a host segment and can anchor any number of further
//! segments. Each connected component that touches a terminal is one logical
//! net; exactly one of its segments carries that net's id.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::model::{JunctionId, NetId, RawId, SegmentId, Terminal};

/// One end of a wire segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Terminal(Terminal),
    Junction(JunctionId),
}

impl Endpoint {
    pub fn terminal(self) -> Option<Terminal> {
        match self {
            Endpoint::Terminal(t) => Some(t),
            Endpoint::Junction(_) => None,
        }
    }

    pub fn junction(self) -> Option<JunctionId> {
        match self {
            Endpoint::Junction(j) => Some(j),
            Endpoint::Terminal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: SegmentId,
    pub start: Endpoint,
    pub end: Endpoint,
    /// Set on the single segment that carries its component's net.
    pub net: Option<NetId>,
}

impl Segment {
    pub fn ends(&self) -> [Endpoint; 2] {
        [self.start, self.end]
    }

    pub fn touches(&self, endpoint: Endpoint) -> bool {
        self.start == endpoint || self.end == endpoint
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub id: JunctionId,
    /// Segment the junction sits on.
    pub host: Option<SegmentId>,
}

/// A connected set of segments and junctions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    pub segments: Vec<SegmentId>,
    pub junctions: Vec<JunctionId>,
}

impl Component {
    pub fn contains_segment(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WireGraph {
    segments: IndexMap<SegmentId, Segment>,
    junctions: IndexMap<JunctionId, Junction>,
    next_segment: u32,
    next_junction: u32,
}

impl WireGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.junctions.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn junctions(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junctions.get(&id)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    pub(crate) fn add_segment(&mut self, start: Endpoint, end: Endpoint, net: Option<NetId>) -> SegmentId {
        let id = SegmentId::from_raw(self.next_segment);
        self.next_segment += 1;
        self.segments.insert(id, Segment { id, start, end, net });
        id
    }

    pub(crate) fn add_junction(&mut self, host: Option<SegmentId>) -> JunctionId {
        let id = JunctionId::from_raw(self.next_junction);
        self.next_junction += 1;
        self.junctions.insert(id, Junction { id, host });
        id
    }

    /// Rebuild a graph from saved parts, keeping their ids.
    ///
    /// `next_segment`/`next_junction` are floors for the id counters so ids
    /// freed before saving are not handed out again.
    pub(crate) fn from_parts(
        segments: Vec<Segment>,
        junctions: Vec<Junction>,
        next_segment: u32,
        next_junction: u32,
    ) -> Result<WireGraph, String> {
        let mut graph = WireGraph::new();
        for junction in junctions {
            if graph.junctions.contains_key(&junction.id) {
                return Err(format!("junction {} is defined twice", junction.id));
            }
            graph.next_junction = graph.next_junction.max(junction.id.as_raw() + 1);
            graph.junctions.insert(junction.id, junction);
        }
        for segment in segments {
            if graph.segments.contains_key(&segment.id) {
                return Err(format!("wire {} is defined twice", segment.id));
            }
            let dangling = segment.ends().into_iter().filter_map(Endpoint::junction).find(|j| !graph.junctions.contains_key(j));
            if let Some(j) = dangling {
                return Err(format!("wire {} ends at unknown junction {j}", segment.id));
            }
            graph.next_segment = graph.next_segment.max(segment.id.as_raw() + 1);
            graph.segments.insert(segment.id, segment);
        }
        for junction in graph.junctions.values() {
            if let Some(h) = junction.host.filter(|h| !graph.segments.contains_key(h)) {
                return Err(format!("junction {} sits on unknown wire {h}", junction.id));
            }
        }
        graph.next_segment = graph.next_segment.max(next_segment);
        graph.next_junction = graph.next_junction.max(next_junction);
        Ok(graph)
    }

    /// Id counters, saved alongside the parts.
    pub fn next_ids(&self) -> (u32, u32) {
        (self.next_segment, self.next_junction)
    }

    pub(crate) fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        self.segments.shift_remove(&id)
    }

    pub(crate) fn remove_junction(&mut self, id: JunctionId) -> Option<Junction> {
        self.junctions.shift_remove(&id)
    }

    pub(crate) fn set_label(&mut self, id: SegmentId, net: Option<NetId>) {
        if let Some(segment) = self.segments.get_mut(&id) {
            segment.net = net;
        }
    }

    /// Rewrite every terminal and label through the given maps.
    pub(crate) fn remap(
        &self,
        terminals: &HashMap<Terminal, Terminal>,
        nets: &HashMap<NetId, NetId>,
    ) -> WireGraph {
        let map_end = |end: Endpoint| match end {
            Endpoint::Terminal(t) => Endpoint::Terminal(terminals.get(&t).copied().unwrap_or(t)),
            other => other,
        };
        let mut copy = self.clone();
        for segment in copy.segments.values_mut() {
            segment.start = map_end(segment.start);
            segment.end = map_end(segment.end);
            segment.net = segment.net.and_then(|n| nets.get(&n).copied());
        }
        copy
    }

    /// The segment ending at `terminal`, if any. A terminal anchors at most one.
    pub fn segment_at(&self, terminal: Terminal) -> Option<SegmentId> {
        let end = Endpoint::Terminal(terminal);
        self.segments.values().find(|s| s.touches(end)).map(|s| s.id)
    }

    /// Segments with an end on `junction` (its branches, host excluded unless it
    /// also ends there).
    pub fn branches(&self, junction: JunctionId) -> Vec<SegmentId> {
        let end = Endpoint::Junction(junction);
        self.segments.values().filter(|s| s.touches(end)).map(|s| s.id).collect()
    }

    pub fn hosted_on(&self, segment: SegmentId) -> Vec<JunctionId> {
        self.junctions.values().filter(|j| j.host == Some(segment)).map(|j| j.id).collect()
    }

    /// Breadth-first walk over the segment/junction graph from a segment.
    pub fn component(&self, seed: SegmentId) -> Component {
        self.walk(Some(seed), None)
    }

    pub fn component_of_junction(&self, seed: JunctionId) -> Component {
        self.walk(None, Some(seed))
    }

    fn walk(&self, seed_segment: Option<SegmentId>, seed_junction: Option<JunctionId>) -> Component {
        let mut seen_segments = HashSet::new();
        let mut seen_junctions = HashSet::new();
        let mut component = Component::default();
        let mut segment_queue: VecDeque<SegmentId> = seed_segment.into_iter().collect();
        let mut junction_queue: VecDeque<JunctionId> = seed_junction.into_iter().collect();

        while !segment_queue.is_empty() || !junction_queue.is_empty() {
            while let Some(sid) = segment_queue.pop_front() {
                let Some(segment) = self.segments.get(&sid) else { continue };
                if !seen_segments.insert(sid) {
                    continue;
                }
                component.segments.push(sid);
                junction_queue.extend(segment.ends().into_iter().filter_map(Endpoint::junction));
                junction_queue.extend(self.hosted_on(sid));
            }
            while let Some(jid) = junction_queue.pop_front() {
                let Some(junction) = self.junctions.get(&jid) else { continue };
                if !seen_junctions.insert(jid) {
                    continue;
                }
                component.junctions.push(jid);
                segment_queue.extend(self.branches(jid));
                segment_queue.extend(junction.host);
            }
        }
        component
    }

    /// Every connected component, in segment order, followed by bare junctions.
    pub fn components(&self) -> Vec<Component> {
        let mut covered_segments = HashSet::new();
        let mut covered_junctions = HashSet::new();
        let mut out = Vec::new();
        for sid in self.segments.keys() {
            if covered_segments.contains(sid) {
                continue;
            }
            let component = self.component(*sid);
            covered_segments.extend(component.segments.iter().copied());
            covered_junctions.extend(component.junctions.iter().copied());
            out.push(component);
        }
        for jid in self.junctions.keys() {
            if !covered_junctions.contains(jid) {
                let component = self.component_of_junction(*jid);
                covered_junctions.extend(component.junctions.iter().copied());
                out.push(component);
            }
        }
        out
    }

    /// Terminals reached by a component, in first-seen order.
    pub fn terminals(&self, component: &Component) -> Vec<Terminal> {
        let mut out = Vec::new();
        for sid in &component.segments {
            if let Some(segment) = self.segments.get(sid) {
                for t in segment.ends().into_iter().filter_map(Endpoint::terminal) {
                    if !out.contains(&t) {
                        out.push(t);
                    }
                }
            }
        }
        out
    }

    /// The labelled segment of a component and its net.
    pub fn label(&self, component: &Component) -> Option<(SegmentId, NetId)> {
        component
            .segments
            .iter()
            .filter_map(|sid| self.segments.get(sid))
            .find_map(|s| s.net.map(|n| (s.id, n)))
    }

    pub(crate) fn remove_component(&mut self, component: &Component) {
        for sid in &component.segments {
            self.segments.shift_remove(sid);
        }
        for jid in &component.junctions {
            self.junctions.shift_remove(jid);
        }
    }

    /// Remove every segment that ends at one of `terminals`.
    pub(crate) fn detach(&mut self, terminals: &[Terminal]) -> Vec<Segment> {
        let ends: HashSet<Endpoint> = terminals.iter().map(|t| Endpoint::Terminal(*t)).collect();
        let doomed: Vec<SegmentId> = self
            .segments
            .values()
            .filter(|s| s.ends().iter().any(|e| ends.contains(e)))
            .map(|s| s.id)
            .collect();
        doomed.into_iter().filter_map(|sid| self.segments.shift_remove(&sid)).collect()
    }

    /// Re-host junctions whose host segment is gone onto one of their branches,
    /// then prune junctions with nothing left to sit on. Returns the pruned ids.
    pub(crate) fn prune_orphans(&mut self) -> Vec<JunctionId> {
        let homeless: Vec<JunctionId> = self
            .junctions
            .values()
            .filter(|j| !j.host.is_some_and(|h| self.segments.contains_key(&h)))
            .map(|j| j.id)
            .collect();

        let mut pruned = Vec::new();
        for jid in homeless {
            let new_host = self.branches(jid).first().copied();
            match new_host {
                Some(host) => {
                    if let Some(j) = self.junctions.get_mut(&jid) {
                        j.host = Some(host);
                    }
                }
                None => {
                    self.junctions.shift_remove(&jid);
                    pruned.push(jid);
                }
            }
        }
        pruned
    }
}
