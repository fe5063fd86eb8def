//! # Records & Adjacency Index
//!
//! Node and edge records, and the attach/detach primitives that keep the
//! per-node adjacency maps in sync with the edge table.
//!
//! Each node carries three ordered maps (`inbound`, `outbound`,
//! `undirected`) from neighbour handle to edge handle. In multi graphs the
//! stored edge is the head of a doubly-linked chain of parallel edges
//! sharing the same slot; the most recently attached edge is the head.

use crate::arena::{Arena, EdgeIndex, NodeIndex};
use crate::types::Attributes;
use indexmap::IndexMap;

/// Neighbour -> edge (or chain head) map.
pub(crate) type Adjacency = IndexMap<NodeIndex, EdgeIndex>;

pub(crate) type NodeArena = Arena<NodeIndex, NodeRecord>;
pub(crate) type EdgeArena = Arena<EdgeIndex, EdgeRecord>;

// =============================================================================
// NODE RECORD
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct NodeRecord {
    pub key: String,
    pub attributes: Attributes,
    pub in_degree: usize,
    pub out_degree: usize,
    pub undirected_degree: usize,
    pub directed_loops: usize,
    pub undirected_loops: usize,
    pub inbound: Adjacency,
    pub outbound: Adjacency,
    pub undirected: Adjacency,
}

impl NodeRecord {
    pub(crate) fn new(key: String, attributes: Attributes) -> Self {
        Self {
            key,
            attributes,
            in_degree: 0,
            out_degree: 0,
            undirected_degree: 0,
            directed_loops: 0,
            undirected_loops: 0,
            inbound: Adjacency::new(),
            outbound: Adjacency::new(),
            undirected: Adjacency::new(),
        }
    }

    /// Drop every adjacency entry and zero the degree counters.
    pub(crate) fn clear_edges(&mut self) {
        self.in_degree = 0;
        self.out_degree = 0;
        self.undirected_degree = 0;
        self.directed_loops = 0;
        self.undirected_loops = 0;
        self.inbound.clear();
        self.outbound.clear();
        self.undirected.clear();
    }

    pub(crate) fn has_edges(&self) -> bool {
        !(self.inbound.is_empty() && self.outbound.is_empty() && self.undirected.is_empty())
    }

    fn slot(&self, slot: Slot) -> &Adjacency {
        match slot {
            Slot::In => &self.inbound,
            Slot::Out => &self.outbound,
            Slot::Undirected => &self.undirected,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Adjacency {
        match slot {
            Slot::In => &mut self.inbound,
            Slot::Out => &mut self.outbound,
            Slot::Undirected => &mut self.undirected,
        }
    }
}

// =============================================================================
// EDGE RECORD
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct EdgeRecord {
    pub key: String,
    pub attributes: Attributes,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub undirected: bool,
    pub next: Option<EdgeIndex>,
    pub previous: Option<EdgeIndex>,
}

impl EdgeRecord {
    pub(crate) fn new(
        key: String,
        attributes: Attributes,
        source: NodeIndex,
        target: NodeIndex,
        undirected: bool,
    ) -> Self {
        Self {
            key,
            attributes,
            source,
            target,
            undirected,
            next: None,
            previous: None,
        }
    }

    pub(crate) fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The endpoint that is not `node`, or `None` if `node` is not attached.
    pub(crate) fn opposite(&self, node: NodeIndex) -> Option<NodeIndex> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    /// Adjacency slots written for this edge: one on the source side keyed
    /// by the target, one on the target side keyed by the source.
    fn slots(&self) -> (Slot, Slot) {
        if self.undirected {
            (Slot::Undirected, Slot::Undirected)
        } else {
            (Slot::Out, Slot::In)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    In,
    Out,
    Undirected,
}

// =============================================================================
// ATTACH / DETACH
// =============================================================================

/// Register a simple-graph edge in both endpoints' adjacency maps.
pub(crate) fn attach(nodes: &mut NodeArena, edges: &EdgeArena, edge: EdgeIndex) {
    let record = &edges[edge];
    let (source, target) = (record.source, record.target);
    let (out_slot, in_slot) = record.slots();

    nodes[source].slot_mut(out_slot).insert(target, edge);

    // An undirected self-loop only occupies a single slot.
    if record.undirected && source == target {
        return;
    }

    nodes[target].slot_mut(in_slot).insert(source, edge);
}

/// Register a multi-graph edge, prepending it to the chain of parallel
/// edges when the slot is already taken.
pub(crate) fn attach_multi(nodes: &mut NodeArena, edges: &mut EdgeArena, edge: EdgeIndex) {
    let record = &edges[edge];
    let (source, target) = (record.source, record.target);
    let (out_slot, in_slot) = record.slots();
    let undirected = record.undirected;

    let Some(head) = nodes[source].slot(out_slot).get(&target).copied() else {
        attach(nodes, edges, edge);
        return;
    };

    edges[head].previous = Some(edge);
    edges[edge].next = Some(head);

    // IndexMap::insert on an existing key keeps the entry's position.
    nodes[source].slot_mut(out_slot).insert(target, edge);
    if !(undirected && source == target) {
        nodes[target].slot_mut(in_slot).insert(source, edge);
    }
}

/// Remove a simple-graph edge from both endpoints' adjacency maps.
pub(crate) fn detach(nodes: &mut NodeArena, edges: &EdgeArena, edge: EdgeIndex) {
    let record = &edges[edge];
    let (source, target) = (record.source, record.target);
    let (out_slot, in_slot) = record.slots();

    nodes[source].slot_mut(out_slot).shift_remove(&target);
    nodes[target].slot_mut(in_slot).shift_remove(&source);
}

/// Remove a multi-graph edge, unlinking it from its chain.
pub(crate) fn detach_multi(nodes: &mut NodeArena, edges: &mut EdgeArena, edge: EdgeIndex) {
    let record = &edges[edge];
    let (source, target) = (record.source, record.target);
    let (out_slot, in_slot) = record.slots();
    let undirected = record.undirected;
    let (previous, next) = (record.previous, record.next);

    match (previous, next) {
        // Lone edge in its slot.
        (None, None) => detach(nodes, edges, edge),
        // Head with a successor: promote the successor.
        (None, Some(next)) => {
            edges[next].previous = None;
            nodes[source].slot_mut(out_slot).insert(target, next);
            if !(undirected && source == target) {
                nodes[target].slot_mut(in_slot).insert(source, next);
            }
        }
        // Inside the chain: splice out, slots untouched.
        (Some(previous), next) => {
            edges[previous].next = next;
            if let Some(next) = next {
                edges[next].previous = Some(previous);
            }
        }
    }

    let record = &mut edges[edge];
    record.next = None;
    record.previous = None;
}

/// Walk a chain of parallel edges starting at `head`.
pub(crate) fn chain(edges: &EdgeArena, head: EdgeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
    std::iter::successors(Some(head), move |&current| edges[current].next)
}

// =============================================================================
// TESTS
// =============================================================================
