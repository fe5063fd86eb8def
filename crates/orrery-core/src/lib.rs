//! # orrery-core
//!
//! An in-memory attributed graph store: directed, undirected or mixed,
//! simple or multi, with optional self-loops.
//!
//! Nodes and edges are addressed by string keys and carry JSON attribute
//! maps. The store keeps per-node adjacency indexes so neighbourhood and
//! degree queries never scan the whole graph, fires synchronous events on
//! every mutation, and serializes to a JSON document or a compact binary
//! format.
//!
//! ## Architectural Constraints
//!
//! - Single-threaded and synchronous: no async, no network, no file I/O
//! - Every mutation validates first; a failing call leaves the graph untouched
//! - Iteration order is insertion order, for nodes, edges and neighbours

// =============================================================================
// MODULES
// =============================================================================

mod arena;
pub mod attributes;
pub mod events;
pub mod export;
pub mod formats;
pub mod graph;
pub mod iteration;
mod keygen;
pub mod primitives;
mod record;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Attributes, Direction, EdgeMerge, EdgeRef, GraphError, GraphOptions, GraphType, NodeRef,
    Relation, UpdateHints, Value,
};

// =============================================================================
// RE-EXPORTS: Graph Store
// =============================================================================

pub use attributes::EdgeContext;
pub use events::{AttributeUpdate, EventKind, GraphEvent, ListenerId};
pub use export::{SerializedEdge, SerializedGraph, SerializedNode};
pub use graph::Graph;
pub use iteration::{
    AdjacencyEntries, AdjacencyEntry, AdjacencyMode, EdgeEntries, EdgeEntry, NeighborEntries,
    NodeEntry, Scope,
};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, graph_from_bytes, graph_to_bytes};
