//! # Iteration
//!
//! Lazy iterators over edges, neighbours, nodes and adjacency entries.
//!
//! Each family has exactly one iterator type ([`EdgeEntries`],
//! [`NeighborEntries`], [`AdjacencyEntries`]); the vector, `for_each_*`,
//! `find_*`, `some_*` and `every_*` forms generated below only consume it.
//!
//! A [`Relation`] selects which adjacency maps are walked. A relation whose
//! type the graph cannot hold yields nothing, before the node is even looked
//! up.

use crate::arena::{EdgeIndex, NodeIndex};
use crate::graph::Graph;
use crate::record::{Adjacency, NodeRecord};
use crate::types::{Attributes, GraphError, Relation};
use std::fmt;

// =============================================================================
// ENTRIES
// =============================================================================

/// A node seen during iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEntry<'g> {
    pub key: &'g str,
    pub attributes: &'g Attributes,
}

/// An edge seen during iteration, with both endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEntry<'g> {
    pub key: &'g str,
    pub attributes: &'g Attributes,
    pub source: NodeEntry<'g>,
    pub target: NodeEntry<'g>,
    pub undirected: bool,
}

/// One step of an adjacency traversal.
///
/// `neighbor` and `edge` are `None` only for orphan entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyEntry<'g> {
    pub node: NodeEntry<'g>,
    pub neighbor: Option<NodeEntry<'g>>,
    pub edge: Option<EdgeEntry<'g>>,
}

/// Where an edge iteration looks: the whole graph, one node's incident
/// edges, or the edges linking two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Graph,
    Node(String),
    Path { source: String, target: String },
}

impl Scope {
    pub fn node(node: impl fmt::Display) -> Self {
        Self::Node(node.to_string())
    }

    pub fn path(source: impl fmt::Display, target: impl fmt::Display) -> Self {
        Self::Path {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Adjacency traversal options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacencyMode {
    /// Report each undirected edge once, from the endpoint whose key sorts
    /// first.
    pub asymmetric: bool,
    /// Also report nodes that produced no entry, with no neighbour.
    pub orphans: bool,
}

impl Graph {
    fn node_entry(&self, node: NodeIndex) -> NodeEntry<'_> {
        let record = &self.nodes[node];
        NodeEntry {
            key: &record.key,
            attributes: &record.attributes,
        }
    }

    fn edge_entry(&self, edge: EdgeIndex) -> EdgeEntry<'_> {
        let record = &self.edges[edge];
        EdgeEntry {
            key: &record.key,
            attributes: &record.attributes,
            source: self.node_entry(record.source),
            target: self.node_entry(record.target),
            undirected: record.undirected,
        }
    }
}

// =============================================================================
// EDGES
// =============================================================================

type Heads<'g> = Box<dyn Iterator<Item = EdgeIndex> + 'g>;

/// Lazy edge iterator. Chain heads come from the key table or from
/// adjacency maps; in the latter case every chain is walked to its end.
pub struct EdgeEntries<'g> {
    graph: &'g Graph,
    heads: Heads<'g>,
    chains: bool,
    pending: Option<EdgeIndex>,
}

impl<'g> EdgeEntries<'g> {
    fn new(graph: &'g Graph, heads: Heads<'g>, chains: bool) -> Self {
        Self {
            graph,
            heads,
            chains,
            pending: None,
        }
    }

    fn empty(graph: &'g Graph) -> Self {
        Self::new(graph, Box::new(std::iter::empty()), false)
    }

    /// Collect the keys of the remaining edges.
    pub fn keys(self) -> Vec<String> {
        self.map(|entry| entry.key.to_string()).collect()
    }
}

impl<'g> Iterator for EdgeEntries<'g> {
    type Item = EdgeEntry<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let edge = match self.pending.take() {
            Some(edge) => edge,
            None => self.heads.next()?,
        };
        if self.chains {
            self.pending = self.graph.edges[edge].next;
        }
        Some(self.graph.edge_entry(edge))
    }
}

impl fmt::Debug for EdgeEntries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeEntries")
            .field("chains", &self.chains)
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// Edges matching `relation` within `scope`.
    pub fn edge_entries_in(
        &self,
        relation: Relation,
        scope: &Scope,
    ) -> Result<EdgeEntries<'_>, GraphError> {
        const METHOD: &str = "edge_entries";
        if !self.options.graph_type.admits(relation.graph_type) {
            return Ok(EdgeEntries::empty(self));
        }

        match scope {
            Scope::Graph => {
                let filter = relation.graph_type;
                let heads = self
                    .edge_keys
                    .values()
                    .copied()
                    .filter(move |&edge| filter.matches_edge(self.edges[edge].undirected));
                Ok(EdgeEntries::new(self, Box::new(heads), false))
            }
            Scope::Node(key) => {
                let node = self.require_node(METHOD, key)?;
                Ok(EdgeEntries::new(
                    self,
                    node_heads(&self.nodes[node], node, relation),
                    true,
                ))
            }
            Scope::Path { source, target } => {
                let s = self.require_node(METHOD, source)?;
                let t = self.require_node(METHOD, target)?;
                Ok(EdgeEntries::new(
                    self,
                    path_heads(&self.nodes[s], s, t, relation),
                    true,
                ))
            }
        }
    }
}

/// Chain heads incident to `node`. With no direction, the outbound entry
/// keyed by the node itself is skipped: that self-loop was already met in
/// the inbound map.
fn node_heads(record: &NodeRecord, node: NodeIndex, relation: Relation) -> Heads<'_> {
    let skip = relation.direction.is_none().then_some(node);
    let inbound = walked(relation.walks_in(), &record.inbound).flat_map(Adjacency::values);
    let outbound = walked(relation.walks_out(), &record.outbound)
        .flat_map(Adjacency::iter)
        .filter(move |&(&neighbor, _)| skip != Some(neighbor))
        .map(|(_, head)| head);
    let undirected =
        walked(relation.walks_undirected(), &record.undirected).flat_map(Adjacency::values);
    Box::new(inbound.chain(outbound).chain(undirected).copied())
}

/// Chain heads linking `source` to `target`, read from the source's maps.
fn path_heads(
    record: &NodeRecord,
    source: NodeIndex,
    target: NodeIndex,
    relation: Relation,
) -> Heads<'_> {
    let skip_out = relation.direction.is_none() && source == target;
    let inbound = walked(relation.walks_in(), &record.inbound).filter_map(move |m| m.get(&target));
    let outbound = walked(relation.walks_out() && !skip_out, &record.outbound)
        .filter_map(move |m| m.get(&target));
    let undirected = walked(relation.walks_undirected(), &record.undirected)
        .filter_map(move |m| m.get(&target));
    Box::new(inbound.chain(outbound).chain(undirected).copied())
}

fn walked(walks: bool, map: &Adjacency) -> std::option::IntoIter<&Adjacency> {
    walks.then_some(map).into_iter()
}

macro_rules! edge_iteration_methods {
    ($(
        $relation:ident =>
        $all:ident, $of_node:ident, $between:ident, $entries:ident,
        $for_each:ident, $find:ident, $some:ident, $every:ident;
    )*) => {
        impl Graph {
            $(
                #[doc = concat!("Keys of every edge matched by `Relation::", stringify!($relation), "`.")]
                pub fn $all(&self) -> Vec<String> {
                    self.$entries(&Scope::Graph).map(EdgeEntries::keys).unwrap_or_default()
                }

                pub fn $of_node(&self, node: impl fmt::Display) -> Result<Vec<String>, GraphError> {
                    Ok(self.$entries(&Scope::node(node))?.keys())
                }

                pub fn $between(
                    &self,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                ) -> Result<Vec<String>, GraphError> {
                    Ok(self.$entries(&Scope::path(source, target))?.keys())
                }

                pub fn $entries(&self, scope: &Scope) -> Result<EdgeEntries<'_>, GraphError> {
                    self.edge_entries_in(Relation::$relation, scope)
                }

                pub fn $for_each(
                    &self,
                    scope: &Scope,
                    callback: impl FnMut(EdgeEntry<'_>),
                ) -> Result<(), GraphError> {
                    self.$entries(scope)?.for_each(callback);
                    Ok(())
                }

                /// Key of the first edge accepted by `predicate`.
                pub fn $find(
                    &self,
                    scope: &Scope,
                    mut predicate: impl FnMut(&EdgeEntry<'_>) -> bool,
                ) -> Result<Option<String>, GraphError> {
                    Ok(self
                        .$entries(scope)?
                        .find(|entry| predicate(entry))
                        .map(|entry| entry.key.to_string()))
                }

                pub fn $some(
                    &self,
                    scope: &Scope,
                    mut predicate: impl FnMut(&EdgeEntry<'_>) -> bool,
                ) -> Result<bool, GraphError> {
                    Ok(self.$entries(scope)?.any(|entry| predicate(&entry)))
                }

                /// Vacuously true on an empty iteration.
                pub fn $every(
                    &self,
                    scope: &Scope,
                    mut predicate: impl FnMut(&EdgeEntry<'_>) -> bool,
                ) -> Result<bool, GraphError> {
                    Ok(self.$entries(scope)?.all(|entry| predicate(&entry)))
                }
            )*
        }
    };
}

edge_iteration_methods! {
    ALL => edges, node_edges, edges_between, edge_entries,
        for_each_edge, find_edge, some_edge, every_edge;
    IN => in_edges, node_in_edges, in_edges_between, in_edge_entries,
        for_each_in_edge, find_in_edge, some_in_edge, every_in_edge;
    OUT => out_edges, node_out_edges, out_edges_between, out_edge_entries,
        for_each_out_edge, find_out_edge, some_out_edge, every_out_edge;
    INBOUND => inbound_edges, node_inbound_edges, inbound_edges_between, inbound_edge_entries,
        for_each_inbound_edge, find_inbound_edge, some_inbound_edge, every_inbound_edge;
    OUTBOUND => outbound_edges, node_outbound_edges, outbound_edges_between, outbound_edge_entries,
        for_each_outbound_edge, find_outbound_edge, some_outbound_edge, every_outbound_edge;
    DIRECTED => directed_edges, node_directed_edges, directed_edges_between, directed_edge_entries,
        for_each_directed_edge, find_directed_edge, some_directed_edge, every_directed_edge;
    UNDIRECTED => undirected_edges, node_undirected_edges, undirected_edges_between,
        undirected_edge_entries, for_each_undirected_edge, find_undirected_edge,
        some_undirected_edge, every_undirected_edge;
}

// =============================================================================
// NEIGHBOURS
// =============================================================================

/// Lazy neighbour iterator.
///
/// For relations spanning several maps, a neighbour is skipped when it is a
/// key of a map already walked, so each neighbour appears once without
/// building a key set.
pub struct NeighborEntries<'g> {
    graph: &'g Graph,
    neighbors: Box<dyn Iterator<Item = NodeIndex> + 'g>,
}

impl<'g> NeighborEntries<'g> {
    fn new(graph: &'g Graph, record: &'g NodeRecord, relation: Relation) -> Self {
        let inbound = relation.walks_in().then_some(&record.inbound);
        let outbound = relation.walks_out().then_some(&record.outbound);
        let first = inbound.into_iter().flat_map(Adjacency::keys);
        let second = outbound
            .into_iter()
            .flat_map(Adjacency::keys)
            .filter(move |neighbor| !seen(&[inbound], neighbor));
        let third = walked(relation.walks_undirected(), &record.undirected)
            .flat_map(Adjacency::keys)
            .filter(move |neighbor| !seen(&[inbound, outbound], neighbor));

        Self {
            graph,
            neighbors: Box::new(first.chain(second).chain(third).copied()),
        }
    }

    fn empty(graph: &'g Graph) -> Self {
        Self {
            graph,
            neighbors: Box::new(std::iter::empty()),
        }
    }

    pub fn keys(self) -> Vec<String> {
        self.map(|entry| entry.key.to_string()).collect()
    }
}

fn seen(maps: &[Option<&Adjacency>], neighbor: &NodeIndex) -> bool {
    maps.iter().flatten().any(|map| map.contains_key(neighbor))
}

impl<'g> Iterator for NeighborEntries<'g> {
    type Item = NodeEntry<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let neighbor = self.neighbors.next()?;
        Some(self.graph.node_entry(neighbor))
    }
}

impl fmt::Debug for NeighborEntries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeighborEntries").finish_non_exhaustive()
    }
}

impl Graph {
    /// Neighbours of `node` under `relation`, each reported once.
    pub fn neighbor_entries_in(
        &self,
        relation: Relation,
        node: impl fmt::Display,
    ) -> Result<NeighborEntries<'_>, GraphError> {
        if !self.options.graph_type.admits(relation.graph_type) {
            return Ok(NeighborEntries::empty(self));
        }
        let node = self.require_node("neighbor_entries", &node.to_string())?;
        Ok(NeighborEntries::new(self, &self.nodes[node], relation))
    }
}

macro_rules! neighbor_iteration_methods {
    ($(
        $relation:ident =>
        $keys:ident, $entries:ident, $for_each:ident, $find:ident, $some:ident, $every:ident;
    )*) => {
        impl Graph {
            $(
                #[doc = concat!("Keys of the neighbours matched by `Relation::", stringify!($relation), "`.")]
                pub fn $keys(&self, node: impl fmt::Display) -> Result<Vec<String>, GraphError> {
                    Ok(self.$entries(node)?.keys())
                }

                pub fn $entries(
                    &self,
                    node: impl fmt::Display,
                ) -> Result<NeighborEntries<'_>, GraphError> {
                    self.neighbor_entries_in(Relation::$relation, node)
                }

                pub fn $for_each(
                    &self,
                    node: impl fmt::Display,
                    callback: impl FnMut(NodeEntry<'_>),
                ) -> Result<(), GraphError> {
                    self.$entries(node)?.for_each(callback);
                    Ok(())
                }

                pub fn $find(
                    &self,
                    node: impl fmt::Display,
                    mut predicate: impl FnMut(&NodeEntry<'_>) -> bool,
                ) -> Result<Option<String>, GraphError> {
                    Ok(self
                        .$entries(node)?
                        .find(|entry| predicate(entry))
                        .map(|entry| entry.key.to_string()))
                }

                pub fn $some(
                    &self,
                    node: impl fmt::Display,
                    mut predicate: impl FnMut(&NodeEntry<'_>) -> bool,
                ) -> Result<bool, GraphError> {
                    Ok(self.$entries(node)?.any(|entry| predicate(&entry)))
                }

                pub fn $every(
                    &self,
                    node: impl fmt::Display,
                    mut predicate: impl FnMut(&NodeEntry<'_>) -> bool,
                ) -> Result<bool, GraphError> {
                    Ok(self.$entries(node)?.all(|entry| predicate(&entry)))
                }
            )*
        }
    };
}

neighbor_iteration_methods! {
    ALL => neighbors, neighbor_entries,
        for_each_neighbor, find_neighbor, some_neighbor, every_neighbor;
    IN => in_neighbors, in_neighbor_entries,
        for_each_in_neighbor, find_in_neighbor, some_in_neighbor, every_in_neighbor;
    OUT => out_neighbors, out_neighbor_entries,
        for_each_out_neighbor, find_out_neighbor, some_out_neighbor, every_out_neighbor;
    INBOUND => inbound_neighbors, inbound_neighbor_entries,
        for_each_inbound_neighbor, find_inbound_neighbor, some_inbound_neighbor,
        every_inbound_neighbor;
    OUTBOUND => outbound_neighbors, outbound_neighbor_entries,
        for_each_outbound_neighbor, find_outbound_neighbor, some_outbound_neighbor,
        every_outbound_neighbor;
    DIRECTED => directed_neighbors, directed_neighbor_entries,
        for_each_directed_neighbor, find_directed_neighbor, some_directed_neighbor,
        every_directed_neighbor;
    UNDIRECTED => undirected_neighbors, undirected_neighbor_entries,
        for_each_undirected_neighbor, find_undirected_neighbor, some_undirected_neighbor,
        every_undirected_neighbor;
}

// =============================================================================
// NODES
// =============================================================================

impl Graph {
    /// Node keys in insertion order.
    pub fn nodes(&self) -> Vec<String> {
        self.node_keys.keys().cloned().collect()
    }

    pub fn node_entries(&self) -> impl Iterator<Item = NodeEntry<'_>> + '_ {
        self.node_keys.values().map(|&node| self.node_entry(node))
    }

    pub fn for_each_node(&self, callback: impl FnMut(NodeEntry<'_>)) {
        self.node_entries().for_each(callback);
    }

    pub fn find_node(&self, mut predicate: impl FnMut(&NodeEntry<'_>) -> bool) -> Option<String> {
        self.node_entries()
            .find(|entry| predicate(entry))
            .map(|entry| entry.key.to_string())
    }

    pub fn some_node(&self, mut predicate: impl FnMut(&NodeEntry<'_>) -> bool) -> bool {
        self.node_entries().any(|entry| predicate(&entry))
    }

    pub fn every_node(&self, mut predicate: impl FnMut(&NodeEntry<'_>) -> bool) -> bool {
        self.node_entries().all(|entry| predicate(&entry))
    }
}

// =============================================================================
// ADJACENCY
// =============================================================================

/// Per-node cursor: remaining `(neighbour, chain head)` pairs and whether
/// anything was reported for the node yet.
struct Cursor<'g> {
    node: NodeIndex,
    heads: Box<dyn Iterator<Item = (NodeIndex, EdgeIndex)> + 'g>,
    reported: bool,
}

/// Lazy adjacency traversal: for every node, its outbound entries then its
/// undirected entries, chains walked fully.
pub struct AdjacencyEntries<'g> {
    graph: &'g Graph,
    nodes: indexmap::map::Values<'g, String, NodeIndex>,
    mode: AdjacencyMode,
    cursor: Option<Cursor<'g>>,
    pending: Option<(NodeIndex, EdgeIndex)>,
}

impl<'g> AdjacencyEntries<'g> {
    fn open(&self, node: NodeIndex) -> Cursor<'g> {
        let graph = self.graph;
        let record = &graph.nodes[node];
        let asymmetric = self.mode.asymmetric;

        let outbound = record
            .outbound
            .iter()
            .map(|(&neighbor, &head)| (neighbor, head));
        let undirected = record
            .undirected
            .iter()
            .filter(move |&(&neighbor, _)| {
                !(asymmetric && record.key > graph.nodes[neighbor].key)
            })
            .map(|(&neighbor, &head)| (neighbor, head));

        Cursor {
            node,
            heads: Box::new(outbound.chain(undirected)),
            reported: false,
        }
    }

    fn entry(&self, node: NodeIndex, neighbor: NodeIndex, edge: EdgeIndex) -> AdjacencyEntry<'g> {
        AdjacencyEntry {
            node: self.graph.node_entry(node),
            neighbor: Some(self.graph.node_entry(neighbor)),
            edge: Some(self.graph.edge_entry(edge)),
        }
    }
}

impl<'g> Iterator for AdjacencyEntries<'g> {
    type Item = AdjacencyEntry<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = &mut self.cursor {
                if let Some((neighbor, edge)) = self.pending.take() {
                    cursor.reported = true;
                    let node = cursor.node;
                    if let Some(next) = self.graph.edges[edge].next {
                        self.pending = Some((neighbor, next));
                    }
                    return Some(self.entry(node, neighbor, edge));
                }
                if let Some(head) = cursor.heads.next() {
                    self.pending = Some(head);
                    continue;
                }
                let finished = self.cursor.take();
                if let Some(cursor) = finished {
                    if self.mode.orphans && !cursor.reported {
                        return Some(AdjacencyEntry {
                            node: self.graph.node_entry(cursor.node),
                            neighbor: None,
                            edge: None,
                        });
                    }
                }
            }

            let &node = self.nodes.next()?;
            self.cursor = Some(self.open(node));
        }
    }
}

impl fmt::Debug for AdjacencyEntries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdjacencyEntries")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Graph {
    pub fn adjacency_entries(&self, mode: AdjacencyMode) -> AdjacencyEntries<'_> {
        AdjacencyEntries {
            graph: self,
            nodes: self.node_keys.values(),
            mode,
            cursor: None,
            pending: None,
        }
    }

    pub fn for_each_adjacency_entry(
        &self,
        mode: AdjacencyMode,
        callback: impl FnMut(AdjacencyEntry<'_>),
    ) {
        self.adjacency_entries(mode).for_each(callback);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn mixed() -> Graph {
        let mut graph = Graph::default();
        for key in ["a", "b", "c", "d"] {
            graph.add_node(key, Value::Null).expect("node");
        }
        graph.add_edge_with_key("ab", "a", "b", Value::Null).expect("ab");
        graph.add_edge_with_key("ca", "c", "a", Value::Null).expect("ca");
        graph
            .add_undirected_edge_with_key("ad", "a", "d", Value::Null)
            .expect("ad");
        graph.add_edge_with_key("aa", "a", "a", Value::Null).expect("aa");
        graph
    }

    #[test]
    fn whole_graph_edges_follow_insertion_order() {
        let graph = mixed();
        assert_eq!(graph.edges(), vec!["ab", "ca", "ad", "aa"]);
        assert_eq!(graph.directed_edges(), vec!["ab", "ca", "aa"]);
        assert_eq!(graph.undirected_edges(), vec!["ad"]);
        // Direction does not narrow a whole-graph walk.
        assert_eq!(graph.in_edges(), graph.directed_edges());
    }

    #[test]
    fn node_edges_report_self_loops_once() {
        let graph = mixed();
        assert_eq!(
            graph.node_edges("a").expect("a"),
            vec!["ca", "aa", "ab", "ad"]
        );
        assert_eq!(graph.node_in_edges("a").expect("a"), vec!["ca", "aa"]);
        assert_eq!(graph.node_out_edges("a").expect("a"), vec!["ab", "aa"]);
        assert_eq!(
            graph.node_outbound_edges("a").expect("a"),
            vec!["ab", "aa", "ad"]
        );
        assert!(matches!(
            graph.node_edges("zz"),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn edges_between_walks_both_directions() {
        let mut graph = Graph::multi();
        graph.merge_edge("a", "b", Value::Null).expect("ab1");
        graph.merge_edge("a", "b", Value::Null).expect("ab2");
        graph.merge_edge("b", "a", Value::Null).expect("ba");
        graph.merge_edge("a", "a", Value::Null).expect("aa");

        assert_eq!(graph.edges_between("a", "b").expect("ab").len(), 3);
        assert_eq!(graph.out_edges_between("a", "b").expect("ab").len(), 2);
        assert_eq!(graph.in_edges_between("a", "b").expect("ab").len(), 1);
        assert_eq!(graph.edges_between("a", "a").expect("aa").len(), 1);
        assert!(graph.edges_between("a", "zz").is_err());
    }

    #[test]
    fn incompatible_relation_is_empty_even_for_missing_nodes() {
        let graph = Graph::directed();
        assert!(graph.undirected_edges().is_empty());
        assert_eq!(
            graph.node_undirected_edges("missing").expect("empty"),
            Vec::<String>::new()
        );
        assert_eq!(
            graph.undirected_neighbors("missing").expect("empty"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn neighbors_are_deduplicated() {
        let mut graph = Graph::default();
        graph.merge_edge("a", "b", Value::Null).expect("ab");
        graph.merge_edge("b", "a", Value::Null).expect("ba");
        graph.merge_undirected_edge("a", "b", Value::Null).expect("a-b");
        graph.merge_undirected_edge("a", "c", Value::Null).expect("a-c");
        graph.merge_edge("a", "a", Value::Null).expect("aa");

        assert_eq!(graph.neighbors("a").expect("a"), vec!["b", "a", "c"]);
        assert_eq!(graph.out_neighbors("a").expect("a"), vec!["b", "a"]);
        assert_eq!(graph.undirected_neighbors("a").expect("a"), vec!["b", "c"]);
        assert_eq!(graph.inbound_neighbors("c").expect("c"), vec!["a"]);
    }

    #[test]
    fn callback_forms_consume_the_same_iterator() {
        let graph = mixed();
        let scope = Scope::node("a");

        let mut seen = Vec::new();
        graph
            .for_each_edge(&scope, |entry| seen.push(entry.key.to_string()))
            .expect("for_each");
        assert_eq!(seen, graph.node_edges("a").expect("a"));

        assert_eq!(
            graph
                .find_edge(&scope, |entry| entry.undirected)
                .expect("find"),
            Some("ad".to_string())
        );
        assert!(graph.some_edge(&scope, |entry| entry.source.key == "c").expect("some"));
        assert!(!graph.every_edge(&scope, |entry| entry.undirected).expect("every"));
        assert!(graph.every_edge(&Scope::node("d"), |entry| entry.undirected).expect("every"));
        assert!(graph.every_undirected_edge(&Scope::node("b"), |_| false).expect("vacuous"));

        assert_eq!(
            graph
                .find_neighbor("a", |entry| entry.key > "b")
                .expect("find"),
            Some("c".to_string())
        );
    }

    #[test]
    fn node_iteration() {
        let graph = mixed();
        assert_eq!(graph.nodes(), vec!["a", "b", "c", "d"]);
        assert_eq!(graph.find_node(|entry| entry.key > "b"), Some("c".into()));
        assert!(graph.some_node(|entry| entry.key == "d"));
        assert!(graph.every_node(|entry| entry.attributes.is_empty()));
        let mut count = 0;
        graph.for_each_node(|_| count += 1);
        assert_eq!(count, 4);
    }

    #[test]
    fn adjacency_traversal() {
        let mut graph = Graph::default();
        for key in ["a", "b", "c", "lonely"] {
            graph.add_node(key, Value::Null).expect("node");
        }
        graph.add_edge_with_key("ab", "a", "b", Value::Null).expect("ab");
        graph
            .add_undirected_edge_with_key("bc", "b", "c", Value::Null)
            .expect("bc");
        graph
            .add_undirected_edge_with_key("cc", "c", "c", Value::Null)
            .expect("cc");

        let pairs = |mode| {
            graph
                .adjacency_entries(mode)
                .map(|entry| {
                    format!(
                        "{}>{}",
                        entry.node.key,
                        entry.neighbor.map_or("-", |n| n.key)
                    )
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(
            pairs(AdjacencyMode::default()),
            vec!["a>b", "b>c", "c>b", "c>c"]
        );
        assert_eq!(
            pairs(AdjacencyMode {
                asymmetric: true,
                orphans: false,
            }),
            vec!["a>b", "b>c", "c>c"]
        );
        assert_eq!(
            pairs(AdjacencyMode {
                asymmetric: true,
                orphans: true,
            }),
            vec!["a>b", "b>c", "c>c", "lonely>-"]
        );
    }

    #[test]
    fn adjacency_walks_multi_chains() {
        let mut graph = Graph::multi_directed();
        graph.merge_edge("a", "b", Value::Null).expect("1");
        graph.merge_edge("a", "b", Value::Null).expect("2");
        let edges: Vec<_> = graph
            .adjacency_entries(AdjacencyMode::default())
            .filter_map(|entry| entry.edge.map(|edge| edge.key.to_string()))
            .collect();
        assert_eq!(edges.len(), 2);
    }
}
