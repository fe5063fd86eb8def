//! # Graph Store
//!
//! The `Graph` owns a node arena and an edge arena, two insertion-ordered
//! key tables pointing into them, incrementally maintained counters and the
//! event channel.
//!
//! Every mutation validates its arguments first, then updates the tables
//! and adjacency maps, then emits. A failing call leaves the graph
//! untouched.
//!
//! Removing keys uses `shift_remove` on the ordered tables, so iteration
//! keeps insertion order after drops at the cost of a linear shift.

use crate::arena::{EdgeIndex, NodeIndex};
use crate::events::{AttributeUpdate, EventChannel, EventKind, GraphEvent, ListenerId};
use crate::keygen::EdgeKeyGenerator;
use crate::record::{
    EdgeArena, EdgeRecord, NodeArena, NodeRecord, attach, attach_multi, detach, detach_multi,
};
use crate::types::{
    Attributes, EdgeMerge, EdgeRef, GraphError, GraphOptions, GraphType, Relation, Value,
    attributes_from,
};
use indexmap::IndexMap;
use std::fmt;

// =============================================================================
// GRAPH
// =============================================================================

/// An attributed graph: directed, undirected or mixed, simple or multi.
pub struct Graph {
    pub(crate) options: GraphOptions,
    pub(crate) attributes: Attributes,
    pub(crate) nodes: NodeArena,
    pub(crate) edges: EdgeArena,
    pub(crate) node_keys: IndexMap<String, NodeIndex>,
    pub(crate) edge_keys: IndexMap<String, EdgeIndex>,
    directed_size: usize,
    undirected_size: usize,
    directed_self_loops: usize,
    undirected_self_loops: usize,
    key_generator: EdgeKeyGenerator,
    pub(crate) events: EventChannel,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

/// Renders `<Kind> { order, size } {attributes} {nodes} {edges}` as debug
/// maps. Every edge is listed under its own key as `[key]: (source)->(target)`,
/// or `--` when undirected, with endpoints in stored order.
impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match (self.options.multi, self.options.graph_type) {
            (false, GraphType::Mixed) => "Graph",
            (false, GraphType::Directed) => "DirectedGraph",
            (false, GraphType::Undirected) => "UndirectedGraph",
            (true, GraphType::Mixed) => "MultiGraph",
            (true, GraphType::Directed) => "MultiDirectedGraph",
            (true, GraphType::Undirected) => "MultiUndirectedGraph",
        };
        write!(
            f,
            "{label} {{ order: {}, size: {} }} ",
            self.order(),
            self.size()
        )?;
        f.debug_map().entries(self.attributes.iter()).finish()?;
        f.write_str(" ")?;

        let mut nodes = f.debug_map();
        for (key, &node) in &self.node_keys {
            nodes.entry(key, &self.nodes[node].attributes);
        }
        nodes.finish()?;
        f.write_str(" ")?;

        let mut edges = f.debug_map();
        for &edge in self.edge_keys.values() {
            let record = &self.edges[edge];
            let arrow = if record.undirected { "--" } else { "->" };
            let entry = format!(
                "[{}]: ({}){}({})",
                record.key,
                self.nodes[record.source].key,
                arrow,
                self.nodes[record.target].key
            );
            edges.entry(&entry, &record.attributes);
        }
        edges.finish()
    }
}

/// Which directedness an insertion method produces.
#[derive(Debug, Clone, Copy)]
enum EdgeKind {
    /// Follows the graph type: undirected only for undirected graphs.
    Default,
    Directed,
    Undirected,
}

/// What to do with an edge that already exists in merge/update mode.
enum Upsert<F> {
    /// Shallow-merge these attributes (`None`: leave the edge as is).
    Merge(Option<Attributes>),
    /// Thread the attributes through an updater.
    Update(F),
}

type NoUpdater = fn(Attributes) -> Attributes;

impl Graph {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Create an empty graph with the given options.
    #[must_use]
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            attributes: Attributes::new(),
            nodes: NodeArena::new(),
            edges: EdgeArena::new(),
            node_keys: IndexMap::new(),
            edge_keys: IndexMap::new(),
            directed_size: 0,
            undirected_size: 0,
            directed_self_loops: 0,
            undirected_self_loops: 0,
            key_generator: EdgeKeyGenerator::new(),
            events: EventChannel::default(),
        }
    }

    /// Simple directed graph.
    #[must_use]
    pub fn directed() -> Self {
        Self::new(GraphOptions::of_type(GraphType::Directed))
    }

    /// Simple undirected graph.
    #[must_use]
    pub fn undirected() -> Self {
        Self::new(GraphOptions::of_type(GraphType::Undirected))
    }

    /// Mixed graph allowing parallel edges.
    #[must_use]
    pub fn multi() -> Self {
        Self::new(GraphOptions::default().multi(true))
    }

    /// Directed graph allowing parallel edges.
    #[must_use]
    pub fn multi_directed() -> Self {
        Self::new(GraphOptions::of_type(GraphType::Directed).multi(true))
    }

    /// Undirected graph allowing parallel edges.
    #[must_use]
    pub fn multi_undirected() -> Self {
        Self::new(GraphOptions::of_type(GraphType::Undirected).multi(true))
    }

    // =========================================================================
    // CONFIGURATION & COUNTERS
    // =========================================================================

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn graph_type(&self) -> GraphType {
        self.options.graph_type
    }

    pub fn is_multi(&self) -> bool {
        self.options.multi
    }

    pub fn allows_self_loops(&self) -> bool {
        self.options.allow_self_loops
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn size(&self) -> usize {
        self.edges.len()
    }

    pub fn directed_size(&self) -> usize {
        self.directed_size
    }

    pub fn undirected_size(&self) -> usize {
        self.undirected_size
    }

    pub fn self_loop_count(&self) -> usize {
        self.directed_self_loops + self.undirected_self_loops
    }

    pub fn directed_self_loop_count(&self) -> usize {
        self.directed_self_loops
    }

    pub fn undirected_self_loop_count(&self) -> usize {
        self.undirected_self_loops
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Subscribe to one kind of event. Listeners run synchronously, in
    /// registration order, after the mutation has been applied.
    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&GraphEvent<'_>) + 'static,
    ) -> ListenerId {
        self.events.subscribe(kind, Box::new(listener))
    }

    /// Unsubscribe a listener. Returns `false` if it was already gone.
    pub fn off(&mut self, listener: ListenerId) -> bool {
        self.events.unsubscribe(listener)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.events.count(kind)
    }

    /// Remove every listener of `kind`, or every listener at all.
    pub fn remove_all_listeners(&mut self, kind: Option<EventKind>) {
        self.events.clear(kind);
    }

    // =========================================================================
    // INTERNAL LOOKUPS
    // =========================================================================

    pub(crate) fn node_index(&self, key: &str) -> Option<NodeIndex> {
        self.node_keys.get(key).copied()
    }

    pub(crate) fn require_node(&self, method: &str, key: &str) -> Result<NodeIndex, GraphError> {
        self.node_index(key).ok_or_else(|| {
            GraphError::not_found(method, format!("could not find the \"{key}\" node in the graph"))
        })
    }

    pub(crate) fn require_edge(&self, method: &str, key: &str) -> Result<EdgeIndex, GraphError> {
        self.edge_keys.get(key).copied().ok_or_else(|| {
            GraphError::not_found(method, format!("could not find the \"{key}\" edge in the graph"))
        })
    }

    /// First edge from `source` to `target` matching the type filter.
    pub(crate) fn matching_edge(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        filter: GraphType,
    ) -> Option<EdgeIndex> {
        let record = &self.nodes[source];
        match filter {
            GraphType::Directed => record.outbound.get(&target).copied(),
            GraphType::Undirected => record.undirected.get(&target).copied(),
            GraphType::Mixed => record
                .outbound
                .get(&target)
                .or_else(|| record.undirected.get(&target))
                .copied(),
        }
    }

    /// Resolve an edge reference under a type filter.
    ///
    /// Key form is only meaningful for the mixed filter; path form needs a
    /// simple graph.
    pub(crate) fn resolve_edge(
        &self,
        method: &str,
        filter: GraphType,
        edge: &EdgeRef,
    ) -> Result<EdgeIndex, GraphError> {
        if !self.options.graph_type.admits(filter) {
            return Err(GraphError::usage(
                method,
                format!(
                    "cannot find this type of edges in your {} graph",
                    self.options.graph_type
                ),
            ));
        }

        match edge {
            EdgeRef::Key(key) => {
                if filter != GraphType::Mixed {
                    return Err(GraphError::usage(
                        method,
                        "addressing a typed edge by key is ambiguous, use a (source, target) path",
                    ));
                }
                self.require_edge(method, key)
            }
            EdgeRef::Path { source, target } => {
                if self.options.multi {
                    return Err(GraphError::usage(
                        method,
                        "cannot use a (source, target) path on a multi graph since several edges may link them",
                    ));
                }
                let not_found = || {
                    GraphError::not_found(
                        method,
                        format!("could not find an edge for the given path (\"{source}\", \"{target}\")"),
                    )
                };
                let s = self.node_index(source).ok_or_else(not_found)?;
                let t = self.node_index(target).ok_or_else(not_found)?;
                self.matching_edge(s, t, filter).ok_or_else(not_found)
            }
        }
    }

    // =========================================================================
    // READ API
    // =========================================================================

    pub fn has_node(&self, node: impl fmt::Display) -> bool {
        self.node_keys.contains_key(&node.to_string())
    }

    pub fn has_edge(&self, edge: impl fmt::Display) -> bool {
        self.edge_keys.contains_key(&edge.to_string())
    }

    /// Whether any edge leaves `source` towards `target` (directed out-edge or
    /// undirected edge).
    pub fn has_edge_between(&self, source: impl fmt::Display, target: impl fmt::Display) -> bool {
        self.has_path(GraphType::Mixed, &source.to_string(), &target.to_string())
    }

    pub fn has_directed_edge(&self, edge: impl fmt::Display) -> bool {
        self.edge_keys
            .get(&edge.to_string())
            .is_some_and(|&e| !self.edges[e].undirected)
    }

    pub fn has_directed_edge_between(
        &self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> bool {
        self.has_path(GraphType::Directed, &source.to_string(), &target.to_string())
    }

    pub fn has_undirected_edge(&self, edge: impl fmt::Display) -> bool {
        self.edge_keys
            .get(&edge.to_string())
            .is_some_and(|&e| self.edges[e].undirected)
    }

    pub fn has_undirected_edge_between(
        &self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> bool {
        self.has_path(GraphType::Undirected, &source.to_string(), &target.to_string())
    }

    fn has_path(&self, filter: GraphType, source: &str, target: &str) -> bool {
        let (Some(s), Some(t)) = (self.node_index(source), self.node_index(target)) else {
            return false;
        };
        self.matching_edge(s, t, filter).is_some()
    }

    /// Key of the edge from `source` to `target`, if any.
    pub fn edge(
        &self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> Result<Option<String>, GraphError> {
        self.find_edge_key("edge", GraphType::Mixed, source.to_string(), target.to_string())
    }

    pub fn directed_edge(
        &self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> Result<Option<String>, GraphError> {
        self.find_edge_key(
            "directed_edge",
            GraphType::Directed,
            source.to_string(),
            target.to_string(),
        )
    }

    pub fn undirected_edge(
        &self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> Result<Option<String>, GraphError> {
        self.find_edge_key(
            "undirected_edge",
            GraphType::Undirected,
            source.to_string(),
            target.to_string(),
        )
    }

    fn find_edge_key(
        &self,
        method: &str,
        filter: GraphType,
        source: String,
        target: String,
    ) -> Result<Option<String>, GraphError> {
        if !self.options.graph_type.admits(filter) {
            return Ok(None);
        }
        if self.options.multi {
            return Err(GraphError::usage(
                method,
                "this method is irrelevant with multi graphs since there might be multiple edges between source & target",
            ));
        }
        let s = self.require_node(method, &source)?;
        let t = self.require_node(method, &target)?;
        Ok(self
            .matching_edge(s, t, filter)
            .map(|e| self.edges[e].key.clone()))
    }

    pub fn are_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_neighbors", Relation::ALL, node, neighbor)
    }

    pub fn are_in_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_in_neighbors", Relation::IN, node, neighbor)
    }

    pub fn are_out_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_out_neighbors", Relation::OUT, node, neighbor)
    }

    pub fn are_inbound_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_inbound_neighbors", Relation::INBOUND, node, neighbor)
    }

    pub fn are_outbound_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_outbound_neighbors", Relation::OUTBOUND, node, neighbor)
    }

    pub fn are_directed_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_directed_neighbors", Relation::DIRECTED, node, neighbor)
    }

    pub fn are_undirected_neighbors(
        &self,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        self.related("are_undirected_neighbors", Relation::UNDIRECTED, node, neighbor)
    }

    fn related(
        &self,
        method: &str,
        relation: Relation,
        node: impl fmt::Display,
        neighbor: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        let record = &self.nodes[self.require_node(method, &node.to_string())?];
        let Some(other) = self.node_index(&neighbor.to_string()) else {
            return Ok(false);
        };
        Ok((relation.walks_in() && record.inbound.contains_key(&other))
            || (relation.walks_out() && record.outbound.contains_key(&other))
            || (relation.walks_undirected() && record.undirected.contains_key(&other)))
    }

    // =========================================================================
    // DEGREES
    // =========================================================================

    fn degree_for(
        &self,
        method: &str,
        node: impl fmt::Display,
        relation: Relation,
        self_loops: bool,
    ) -> Result<usize, GraphError> {
        let record = &self.nodes[self.require_node(method, &node.to_string())?];
        let directed_loops = if self_loops { 0 } else { record.directed_loops };
        let undirected_loops = if self_loops {
            0
        } else {
            2 * record.undirected_loops
        };

        let mut degree = 0;
        if relation.walks_in() {
            degree += record.in_degree - directed_loops;
        }
        if relation.walks_out() {
            degree += record.out_degree - directed_loops;
        }
        if relation.walks_undirected() {
            degree += record.undirected_degree - undirected_loops;
        }
        Ok(degree)
    }

    pub fn in_degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("in_degree", node, Relation::IN, true)
    }

    pub fn out_degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("out_degree", node, Relation::OUT, true)
    }

    pub fn directed_degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("directed_degree", node, Relation::DIRECTED, true)
    }

    pub fn undirected_degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("undirected_degree", node, Relation::UNDIRECTED, true)
    }

    pub fn inbound_degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("inbound_degree", node, Relation::INBOUND, true)
    }

    pub fn outbound_degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("outbound_degree", node, Relation::OUTBOUND, true)
    }

    /// Total degree: in + out + undirected, self-loops counted twice.
    pub fn degree(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("degree", node, Relation::ALL, true)
    }

    pub fn in_degree_without_self_loops(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("in_degree_without_self_loops", node, Relation::IN, false)
    }

    pub fn out_degree_without_self_loops(
        &self,
        node: impl fmt::Display,
    ) -> Result<usize, GraphError> {
        self.degree_for("out_degree_without_self_loops", node, Relation::OUT, false)
    }

    pub fn directed_degree_without_self_loops(
        &self,
        node: impl fmt::Display,
    ) -> Result<usize, GraphError> {
        self.degree_for(
            "directed_degree_without_self_loops",
            node,
            Relation::DIRECTED,
            false,
        )
    }

    pub fn undirected_degree_without_self_loops(
        &self,
        node: impl fmt::Display,
    ) -> Result<usize, GraphError> {
        self.degree_for(
            "undirected_degree_without_self_loops",
            node,
            Relation::UNDIRECTED,
            false,
        )
    }

    pub fn inbound_degree_without_self_loops(
        &self,
        node: impl fmt::Display,
    ) -> Result<usize, GraphError> {
        self.degree_for(
            "inbound_degree_without_self_loops",
            node,
            Relation::INBOUND,
            false,
        )
    }

    pub fn outbound_degree_without_self_loops(
        &self,
        node: impl fmt::Display,
    ) -> Result<usize, GraphError> {
        self.degree_for(
            "outbound_degree_without_self_loops",
            node,
            Relation::OUTBOUND,
            false,
        )
    }

    pub fn degree_without_self_loops(&self, node: impl fmt::Display) -> Result<usize, GraphError> {
        self.degree_for("degree_without_self_loops", node, Relation::ALL, false)
    }

    // =========================================================================
    // EDGE ENDPOINTS
    // =========================================================================

    pub fn source(&self, edge: impl fmt::Display) -> Result<&str, GraphError> {
        let record = &self.edges[self.require_edge("source", &edge.to_string())?];
        Ok(&self.nodes[record.source].key)
    }

    pub fn target(&self, edge: impl fmt::Display) -> Result<&str, GraphError> {
        let record = &self.edges[self.require_edge("target", &edge.to_string())?];
        Ok(&self.nodes[record.target].key)
    }

    /// Both endpoints of an edge, source first.
    pub fn extremities(&self, edge: impl fmt::Display) -> Result<(&str, &str), GraphError> {
        let record = &self.edges[self.require_edge("extremities", &edge.to_string())?];
        Ok((
            &self.nodes[record.source].key,
            &self.nodes[record.target].key,
        ))
    }

    /// The endpoint of `edge` that is not `node`.
    pub fn opposite(
        &self,
        node: impl fmt::Display,
        edge: impl fmt::Display,
    ) -> Result<&str, GraphError> {
        let node = node.to_string();
        let index = self.require_node("opposite", &node)?;
        let edge = edge.to_string();
        let record = &self.edges[self.require_edge("opposite", &edge)?];
        let other = record.opposite(index).ok_or_else(|| {
            GraphError::not_found(
                "opposite",
                format!("the \"{node}\" node is not attached to the \"{edge}\" edge"),
            )
        })?;
        Ok(&self.nodes[other].key)
    }

    /// Whether `node` is one of the endpoints of `edge`.
    pub fn has_extremity(
        &self,
        edge: impl fmt::Display,
        node: impl fmt::Display,
    ) -> Result<bool, GraphError> {
        let record = &self.edges[self.require_edge("has_extremity", &edge.to_string())?];
        let node = node.to_string();
        Ok(self.nodes[record.source].key == node || self.nodes[record.target].key == node)
    }

    pub fn is_undirected(&self, edge: impl fmt::Display) -> Result<bool, GraphError> {
        Ok(self.edges[self.require_edge("is_undirected", &edge.to_string())?].undirected)
    }

    pub fn is_directed(&self, edge: impl fmt::Display) -> Result<bool, GraphError> {
        Ok(!self.edges[self.require_edge("is_directed", &edge.to_string())?].undirected)
    }

    pub fn is_self_loop(&self, edge: impl fmt::Display) -> Result<bool, GraphError> {
        Ok(self.edges[self.require_edge("is_self_loop", &edge.to_string())?].is_self_loop())
    }

    // =========================================================================
    // NODE MUTATIONS
    // =========================================================================

    /// Add a node. `attributes` must be an object or `null`.
    pub fn add_node(
        &mut self,
        node: impl fmt::Display,
        attributes: impl Into<Value>,
    ) -> Result<String, GraphError> {
        const METHOD: &str = "add_node";
        let attributes = attributes_from(METHOD, attributes.into())?;
        let key = node.to_string();
        if self.node_keys.contains_key(&key) {
            return Err(GraphError::usage(
                METHOD,
                format!("the \"{key}\" node already exists in the graph"),
            ));
        }
        self.insert_node_record(key.clone(), attributes);
        Ok(key)
    }

    /// Add a node, or merge `attributes` into the existing one.
    ///
    /// Returns the key and whether the node was created.
    pub fn merge_node(
        &mut self,
        node: impl fmt::Display,
        attributes: impl Into<Value>,
    ) -> Result<(String, bool), GraphError> {
        const METHOD: &str = "merge_node";
        let attributes = attributes.into();
        let given = !attributes.is_null();
        let attributes = attributes_from(METHOD, attributes)?;
        let key = node.to_string();

        if let Some(index) = self.node_index(&key) {
            if given {
                let record = &mut self.nodes[index];
                record.attributes.extend(attributes.clone());
                self.events.emit(&GraphEvent::NodeAttributesUpdated {
                    key: &record.key,
                    kind: AttributeUpdate::Merge,
                    attributes: &record.attributes,
                    name: None,
                    data: Some(&attributes),
                });
            }
            return Ok((key, false));
        }

        self.insert_node_record(key.clone(), attributes);
        Ok((key, true))
    }

    /// Add a node built from `updater(empty)`, or replace the existing
    /// node's attributes with `updater(current)`.
    ///
    /// Returns the key and whether the node was created.
    pub fn update_node(
        &mut self,
        node: impl fmt::Display,
        updater: impl FnOnce(Attributes) -> Attributes,
    ) -> (String, bool) {
        let key = node.to_string();

        if let Some(index) = self.node_index(&key) {
            let record = &mut self.nodes[index];
            record.attributes = updater(std::mem::take(&mut record.attributes));
            self.events.emit(&GraphEvent::NodeAttributesUpdated {
                key: &record.key,
                kind: AttributeUpdate::Replace,
                attributes: &record.attributes,
                name: None,
                data: None,
            });
            return (key, false);
        }

        self.insert_node_record(key.clone(), updater(Attributes::new()));
        (key, true)
    }

    pub(crate) fn insert_node_record(&mut self, key: String, attributes: Attributes) -> NodeIndex {
        let node = self.nodes.insert(NodeRecord::new(key.clone(), attributes));
        self.node_keys.insert(key, node);
        let record = &self.nodes[node];
        self.events.emit(&GraphEvent::NodeAdded {
            key: &record.key,
            attributes: &record.attributes,
        });
        node
    }

    /// Drop a node and every edge attached to it.
    pub fn drop_node(&mut self, node: impl fmt::Display) -> Result<(), GraphError> {
        let key = node.to_string();
        let index = self.require_node("drop_node", &key)?;

        let incident = self.incident_edges(index);
        tracing::trace!(node = %key, edges = incident.len(), "dropping node");
        for edge in incident {
            self.remove_edge_record(edge);
        }

        self.node_keys.shift_remove(&key);
        if let Some(record) = self.nodes.remove(index) {
            self.events.emit(&GraphEvent::NodeDropped {
                key: &record.key,
                attributes: &record.attributes,
            });
        }
        Ok(())
    }

    /// Every edge attached to `node`, each once, chains walked fully.
    fn incident_edges(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let record = &self.nodes[node];
        if !record.has_edges() {
            return Vec::new();
        }
        let mut incident = Vec::with_capacity(
            record.in_degree + record.out_degree + record.undirected_degree,
        );

        let out = record.outbound.values();
        // Directed self-loops sit in both `outbound` and `inbound`.
        let inbound = record
            .inbound
            .iter()
            .filter(|&(&neighbor, _)| neighbor != node)
            .map(|(_, head)| head);
        let undirected = record.undirected.values();

        for &head in out.chain(inbound).chain(undirected) {
            incident.extend(crate::record::chain(&self.edges, head));
        }
        incident
    }

    // =========================================================================
    // EDGE MUTATIONS
    // =========================================================================

    fn undirected_for(&self, kind: EdgeKind) -> bool {
        match kind {
            EdgeKind::Default => self.options.graph_type == GraphType::Undirected,
            EdgeKind::Directed => false,
            EdgeKind::Undirected => true,
        }
    }

    fn check_directedness(&self, method: &str, undirected: bool) -> Result<(), GraphError> {
        match (self.options.graph_type, undirected) {
            (GraphType::Directed, true) => Err(GraphError::usage(
                method,
                "you cannot add an undirected edge to a directed graph",
            )),
            (GraphType::Undirected, false) => Err(GraphError::usage(
                method,
                "you cannot add a directed edge to an undirected graph",
            )),
            _ => Ok(()),
        }
    }

    fn check_self_loop(&self, method: &str, source: &str, target: &str) -> Result<(), GraphError> {
        if !self.options.allow_self_loops && source == target {
            return Err(GraphError::usage(
                method,
                format!(
                    "source & target are the same (\"{source}\"), thus creating a loop explicitly forbidden by this graph 'allow_self_loops' option set to false"
                ),
            ));
        }
        Ok(())
    }

    fn add_edge_with(
        &mut self,
        method: &str,
        kind: EdgeKind,
        key: Option<String>,
        source: String,
        target: String,
        attributes: Value,
    ) -> Result<String, GraphError> {
        let undirected = self.undirected_for(kind);
        self.check_directedness(method, undirected)?;
        let attributes = attributes_from(method, attributes)?;
        self.check_self_loop(method, &source, &target)?;

        let s = self.node_index(&source).ok_or_else(|| {
            GraphError::not_found(method, format!("source node \"{source}\" not found"))
        })?;
        let t = self.node_index(&target).ok_or_else(|| {
            GraphError::not_found(method, format!("target node \"{target}\" not found"))
        })?;

        if let Some(key) = &key {
            if self.edge_keys.contains_key(key) {
                return Err(GraphError::usage(
                    method,
                    format!("the \"{key}\" edge already exists in the graph"),
                ));
            }
        }

        let filter = if undirected {
            GraphType::Undirected
        } else {
            GraphType::Directed
        };
        if !self.options.multi && self.matching_edge(s, t, filter).is_some() {
            return Err(GraphError::usage(
                method,
                format!(
                    "an edge linking \"{source}\" to \"{target}\" already exists; use a multi graph to allow parallel edges"
                ),
            ));
        }

        let edge = self.insert_edge_record(key, s, t, undirected, attributes);
        Ok(self.edges[edge].key.clone())
    }

    fn upsert_edge_with<F>(
        &mut self,
        method: &str,
        kind: EdgeKind,
        key: Option<String>,
        source: String,
        target: String,
        upsert: Upsert<F>,
    ) -> Result<EdgeMerge, GraphError>
    where
        F: FnOnce(Attributes) -> Attributes,
    {
        let undirected = self.undirected_for(kind);
        self.check_directedness(method, undirected)?;
        self.check_self_loop(method, &source, &target)?;

        let s = self.node_index(&source);
        let t = self.node_index(&target);

        let mut existing = None;
        if let Some(key) = &key {
            if let Some(&edge) = self.edge_keys.get(key) {
                let record = &self.edges[edge];
                let (es, et) = (&self.nodes[record.source].key, &self.nodes[record.target].key);
                let same = *es == source && *et == target;
                let flipped = undirected && *es == target && *et == source;
                if !same && !flipped {
                    return Err(GraphError::usage(
                        method,
                        format!(
                            "inconsistency detected when attempting to merge the \"{key}\" edge with \"{source}\" source & \"{target}\" target vs. (\"{es}\", \"{et}\")"
                        ),
                    ));
                }
                existing = Some(edge);
            }
        }

        if existing.is_none() && !self.options.multi {
            if let (Some(s), Some(t)) = (s, t) {
                let filter = if undirected {
                    GraphType::Undirected
                } else {
                    GraphType::Directed
                };
                existing = self.matching_edge(s, t, filter);
            }
        }

        if let Some(edge) = existing {
            let record = &mut self.edges[edge];
            match upsert {
                Upsert::Merge(None) => {}
                Upsert::Merge(Some(data)) => {
                    record.attributes.extend(data.clone());
                    self.events.emit(&GraphEvent::EdgeAttributesUpdated {
                        key: &record.key,
                        kind: AttributeUpdate::Merge,
                        attributes: &record.attributes,
                        name: None,
                        data: Some(&data),
                    });
                }
                Upsert::Update(updater) => {
                    record.attributes = updater(std::mem::take(&mut record.attributes));
                    self.events.emit(&GraphEvent::EdgeAttributesUpdated {
                        key: &record.key,
                        kind: AttributeUpdate::Replace,
                        attributes: &record.attributes,
                        name: None,
                        data: None,
                    });
                }
            }
            return Ok(EdgeMerge::existing(record.key.clone()));
        }

        let attributes = match upsert {
            Upsert::Merge(data) => data.unwrap_or_default(),
            Upsert::Update(updater) => updater(Attributes::new()),
        };

        let source_created = s.is_none();
        let s = match s {
            Some(s) => s,
            None => self.insert_node_record(source.clone(), Attributes::new()),
        };
        let (t, target_created) = match t {
            Some(t) => (t, false),
            None if source == target => (s, false),
            None => (self.insert_node_record(target, Attributes::new()), true),
        };

        let edge = self.insert_edge_record(key, s, t, undirected, attributes);
        Ok(EdgeMerge {
            key: self.edges[edge].key.clone(),
            created: true,
            source_created,
            target_created,
        })
    }

    pub(crate) fn insert_edge_record(
        &mut self,
        key: Option<String>,
        source: NodeIndex,
        target: NodeIndex,
        undirected: bool,
        attributes: Attributes,
    ) -> EdgeIndex {
        let key = match key {
            Some(key) => key,
            None => self
                .key_generator
                .generate(|candidate| self.edge_keys.contains_key(candidate)),
        };

        let edge = self.edges.insert(EdgeRecord::new(
            key.clone(),
            attributes,
            source,
            target,
            undirected,
        ));
        self.edge_keys.insert(key, edge);

        let self_loop = source == target;
        if undirected {
            self.nodes[source].undirected_degree += 1;
            self.nodes[target].undirected_degree += 1;
            if self_loop {
                self.nodes[source].undirected_loops += 1;
                self.undirected_self_loops += 1;
            }
            self.undirected_size += 1;
        } else {
            self.nodes[source].out_degree += 1;
            self.nodes[target].in_degree += 1;
            if self_loop {
                self.nodes[source].directed_loops += 1;
                self.directed_self_loops += 1;
            }
            self.directed_size += 1;
        }

        if self.options.multi {
            attach_multi(&mut self.nodes, &mut self.edges, edge);
        } else {
            attach(&mut self.nodes, &self.edges, edge);
        }

        let record = &self.edges[edge];
        self.events.emit(&GraphEvent::EdgeAdded {
            key: &record.key,
            source: &self.nodes[record.source].key,
            target: &self.nodes[record.target].key,
            attributes: &record.attributes,
            undirected: record.undirected,
        });
        edge
    }

    fn remove_edge_record(&mut self, edge: EdgeIndex) {
        let record = &self.edges[edge];
        let (source, target, undirected) = (record.source, record.target, record.undirected);
        let self_loop = source == target;

        if undirected {
            self.nodes[source].undirected_degree -= 1;
            self.nodes[target].undirected_degree -= 1;
            if self_loop {
                self.nodes[source].undirected_loops -= 1;
                self.undirected_self_loops -= 1;
            }
            self.undirected_size -= 1;
        } else {
            self.nodes[source].out_degree -= 1;
            self.nodes[target].in_degree -= 1;
            if self_loop {
                self.nodes[source].directed_loops -= 1;
                self.directed_self_loops -= 1;
            }
            self.directed_size -= 1;
        }

        if self.options.multi {
            detach_multi(&mut self.nodes, &mut self.edges, edge);
        } else {
            detach(&mut self.nodes, &self.edges, edge);
        }

        let Some(record) = self.edges.remove(edge) else {
            return;
        };
        self.edge_keys.shift_remove(&record.key);
        self.events.emit(&GraphEvent::EdgeDropped {
            key: &record.key,
            source: &self.nodes[source].key,
            target: &self.nodes[target].key,
            attributes: &record.attributes,
            undirected,
        });
    }

    /// Drop an edge by key, or by `(source, target)` path on simple graphs.
    pub fn drop_edge(&mut self, edge: impl Into<EdgeRef>) -> Result<(), GraphError> {
        let edge = self.resolve_edge("drop_edge", GraphType::Mixed, &edge.into())?;
        self.remove_edge_record(edge);
        Ok(())
    }

    /// Drop the directed edge from `source` to `target` (simple graphs only).
    pub fn drop_directed_edge(
        &mut self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> Result<(), GraphError> {
        let path = EdgeRef::path(source, target);
        let edge = self.resolve_edge("drop_directed_edge", GraphType::Directed, &path)?;
        self.remove_edge_record(edge);
        Ok(())
    }

    /// Drop the undirected edge between `source` and `target` (simple graphs
    /// only).
    pub fn drop_undirected_edge(
        &mut self,
        source: impl fmt::Display,
        target: impl fmt::Display,
    ) -> Result<(), GraphError> {
        let path = EdgeRef::path(source, target);
        let edge = self.resolve_edge("drop_undirected_edge", GraphType::Undirected, &path)?;
        self.remove_edge_record(edge);
        Ok(())
    }

    /// Remove every node and edge. Graph attributes and listeners stay.
    pub fn clear(&mut self) {
        tracing::debug!(order = self.order(), size = self.size(), "clearing graph");
        self.nodes.clear();
        self.edges.clear();
        self.node_keys.clear();
        self.edge_keys.clear();
        self.reset_counters();
        self.events.emit(&GraphEvent::Cleared);
    }

    /// Remove every edge, keeping the nodes.
    pub fn clear_edges(&mut self) {
        tracing::debug!(size = self.size(), "clearing edges");
        for record in self.nodes.iter_mut() {
            record.clear_edges();
        }
        self.edges.clear();
        self.edge_keys.clear();
        self.reset_counters();
        self.events.emit(&GraphEvent::EdgesCleared);
    }

    fn reset_counters(&mut self) {
        self.directed_size = 0;
        self.undirected_size = 0;
        self.directed_self_loops = 0;
        self.undirected_self_loops = 0;
    }
}

// =============================================================================
// EDGE INSERTION FAMILY
// =============================================================================

macro_rules! edge_insertion_methods {
    ($(
        $kind:ident, $label:literal =>
        $add:ident, $add_with_key:ident,
        $merge:ident, $merge_with_key:ident,
        $update:ident, $update_with_key:ident;
    )*) => {
        impl Graph {
            $(
                #[doc = concat!("Add ", $label, " edge with a generated key. Both endpoints must exist.")]
                pub fn $add(
                    &mut self,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                    attributes: impl Into<Value>,
                ) -> Result<String, GraphError> {
                    self.add_edge_with(
                        stringify!($add),
                        EdgeKind::$kind,
                        None,
                        source.to_string(),
                        target.to_string(),
                        attributes.into(),
                    )
                }

                #[doc = concat!("Add ", $label, " edge under an explicit key. Both endpoints must exist.")]
                pub fn $add_with_key(
                    &mut self,
                    edge: impl fmt::Display,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                    attributes: impl Into<Value>,
                ) -> Result<String, GraphError> {
                    self.add_edge_with(
                        stringify!($add_with_key),
                        EdgeKind::$kind,
                        Some(edge.to_string()),
                        source.to_string(),
                        target.to_string(),
                        attributes.into(),
                    )
                }

                #[doc = concat!("Add ", $label, " edge, or merge `attributes` into the matching one. Missing endpoints are created.")]
                pub fn $merge(
                    &mut self,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                    attributes: impl Into<Value>,
                ) -> Result<EdgeMerge, GraphError> {
                    let upsert = merge_payload(stringify!($merge), attributes.into())?;
                    self.upsert_edge_with(
                        stringify!($merge),
                        EdgeKind::$kind,
                        None,
                        source.to_string(),
                        target.to_string(),
                        upsert,
                    )
                }

                #[doc = concat!("Keyed variant of [`Graph::", stringify!($merge), "`].")]
                pub fn $merge_with_key(
                    &mut self,
                    edge: impl fmt::Display,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                    attributes: impl Into<Value>,
                ) -> Result<EdgeMerge, GraphError> {
                    let upsert = merge_payload(stringify!($merge_with_key), attributes.into())?;
                    self.upsert_edge_with(
                        stringify!($merge_with_key),
                        EdgeKind::$kind,
                        Some(edge.to_string()),
                        source.to_string(),
                        target.to_string(),
                        upsert,
                    )
                }

                #[doc = concat!("Add ", $label, " edge built from `updater(empty)`, or pass the matching edge's attributes through `updater`. Missing endpoints are created.")]
                pub fn $update(
                    &mut self,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                    updater: impl FnOnce(Attributes) -> Attributes,
                ) -> Result<EdgeMerge, GraphError> {
                    self.upsert_edge_with(
                        stringify!($update),
                        EdgeKind::$kind,
                        None,
                        source.to_string(),
                        target.to_string(),
                        Upsert::Update(updater),
                    )
                }

                #[doc = concat!("Keyed variant of [`Graph::", stringify!($update), "`].")]
                pub fn $update_with_key(
                    &mut self,
                    edge: impl fmt::Display,
                    source: impl fmt::Display,
                    target: impl fmt::Display,
                    updater: impl FnOnce(Attributes) -> Attributes,
                ) -> Result<EdgeMerge, GraphError> {
                    self.upsert_edge_with(
                        stringify!($update_with_key),
                        EdgeKind::$kind,
                        Some(edge.to_string()),
                        source.to_string(),
                        target.to_string(),
                        Upsert::Update(updater),
                    )
                }
            )*
        }
    };
}

fn merge_payload(method: &str, attributes: Value) -> Result<Upsert<NoUpdater>, GraphError> {
    if attributes.is_null() {
        return Ok(Upsert::Merge(None));
    }
    Ok(Upsert::Merge(Some(attributes_from(method, attributes)?)))
}

edge_insertion_methods! {
    Default, "an" =>
        add_edge, add_edge_with_key,
        merge_edge, merge_edge_with_key,
        update_edge, update_edge_with_key;
    Directed, "a directed" =>
        add_directed_edge, add_directed_edge_with_key,
        merge_directed_edge, merge_directed_edge_with_key,
        update_directed_edge, update_directed_edge_with_key;
    Undirected, "an undirected" =>
        add_undirected_edge, add_undirected_edge_with_key,
        merge_undirected_edge, merge_undirected_edge_with_key,
        update_undirected_edge, update_undirected_edge_with_key;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn path(graph: &mut Graph, keys: &[&str]) {
        for key in keys {
            graph.merge_node(key, Value::Null).expect("merge node");
        }
        for pair in keys.windows(2) {
            graph.add_edge(pair[0], pair[1], Value::Null).expect("add edge");
        }
    }

    #[test]
    fn add_node_and_duplicates() {
        let mut graph = Graph::default();
        assert_eq!(graph.add_node("a", json!({"x": 1})).expect("add"), "a");
        assert!(graph.has_node("a"));
        assert_eq!(graph.order(), 1);

        assert!(matches!(
            graph.add_node("a", Value::Null),
            Err(GraphError::Usage(_))
        ));
        assert!(matches!(
            graph.add_node("b", json!("nope")),
            Err(GraphError::InvalidArguments(_))
        ));
        assert_eq!(graph.order(), 1);
    }

    #[test]
    fn keys_are_coerced_to_strings() {
        let mut graph = Graph::default();
        graph.add_node(1, Value::Null).expect("add");
        assert!(graph.has_node("1"));
        assert!(matches!(
            graph.add_node("1", Value::Null),
            Err(GraphError::Usage(_))
        ));
    }

    #[test]
    fn directed_edge_updates_degrees() {
        let mut graph = Graph::directed();
        path(&mut graph, &["a", "b"]);

        assert_eq!(graph.size(), 1);
        assert_eq!(graph.directed_size(), 1);
        assert_eq!(graph.out_degree("a").expect("a"), 1);
        assert_eq!(graph.in_degree("b").expect("b"), 1);
        assert_eq!(graph.in_degree("a").expect("a"), 0);
        assert_eq!(graph.undirected_degree("a").expect("a"), 0);
        assert_eq!(graph.degree("b").expect("b"), 1);
    }

    #[test]
    fn wrong_directedness_is_usage() {
        let mut graph = Graph::directed();
        path(&mut graph, &["a", "b"]);
        assert!(matches!(
            graph.add_undirected_edge("a", "b", Value::Null),
            Err(GraphError::Usage(_))
        ));

        let mut graph = Graph::undirected();
        graph.add_node("a", Value::Null).expect("add");
        graph.add_node("b", Value::Null).expect("add");
        assert!(matches!(
            graph.add_directed_edge("a", "b", Value::Null),
            Err(GraphError::Usage(_))
        ));
        let key = graph.add_edge("a", "b", Value::Null).expect("default edge");
        assert!(graph.is_undirected(&key).expect("edge"));
    }

    #[test]
    fn missing_endpoints_are_not_found() {
        let mut graph = Graph::default();
        graph.add_node("a", Value::Null).expect("add");
        assert!(matches!(
            graph.add_edge("a", "zz", Value::Null),
            Err(GraphError::NotFound(_))
        ));
        assert!(matches!(
            graph.add_edge("zz", "a", Value::Null),
            Err(GraphError::NotFound(_))
        ));
        assert_eq!(graph.size(), 0);
    }

    #[test]
    fn explicit_key_collision_is_usage() {
        let mut graph = Graph::multi();
        path(&mut graph, &["a", "b"]);
        graph
            .add_edge_with_key("e", "a", "b", Value::Null)
            .expect("keyed");
        assert!(matches!(
            graph.add_edge_with_key("e", "b", "a", Value::Null),
            Err(GraphError::Usage(_))
        ));
    }

    #[test]
    fn simple_graph_rejects_parallel_edges() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b"]);
        assert!(matches!(
            graph.add_edge("a", "b", Value::Null),
            Err(GraphError::Usage(_))
        ));
        // Opposite direction is a different directed pair.
        graph.add_edge("b", "a", Value::Null).expect("reverse");
        // An undirected edge lives in its own slot in mixed graphs.
        graph
            .add_undirected_edge("a", "b", Value::Null)
            .expect("undirected");
        assert!(matches!(
            graph.add_undirected_edge("b", "a", Value::Null),
            Err(GraphError::Usage(_))
        ));
    }

    #[test]
    fn self_loop_policy() {
        let mut graph = Graph::new(GraphOptions::default().allow_self_loops(false));
        graph.add_node("a", Value::Null).expect("add");
        assert!(matches!(
            graph.add_edge("a", "a", Value::Null),
            Err(GraphError::Usage(_))
        ));

        let mut graph = Graph::default();
        graph.add_node("a", Value::Null).expect("add");
        let directed = graph.add_edge("a", "a", Value::Null).expect("loop");
        assert_eq!(graph.directed_self_loop_count(), 1);
        assert!(graph.is_self_loop(&directed).expect("edge"));
        graph
            .add_undirected_edge("a", "a", Value::Null)
            .expect("undirected loop");
        assert_eq!(graph.undirected_self_loop_count(), 1);
        assert_eq!(graph.self_loop_count(), 2);

        assert_eq!(graph.degree("a").expect("a"), 4);
        assert_eq!(graph.undirected_degree("a").expect("a"), 2);
        assert_eq!(graph.degree_without_self_loops("a").expect("a"), 0);
        assert_eq!(graph.in_degree_without_self_loops("a").expect("a"), 0);
    }

    #[test]
    fn merge_edge_on_duplicate_returns_existing() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b"]);
        let existing = graph.edge("a", "b").expect("edge").expect("present");

        let merged = graph
            .merge_edge("a", "b", json!({"weight": 2}))
            .expect("merge");
        assert_eq!(merged, EdgeMerge::existing(existing.clone()));
        assert_eq!(graph.out_degree("a").expect("a"), 1);
        assert_eq!(
            graph.get_edge_attribute(existing.as_str(), "weight").expect("attr"),
            Some(&json!(2))
        );
    }

    #[test]
    fn merge_edge_creates_missing_endpoints() {
        let mut graph = Graph::default();
        let merged = graph.merge_edge("a", "b", Value::Null).expect("merge");
        assert!(merged.created && merged.source_created && merged.target_created);
        assert_eq!(graph.order(), 2);

        let looped = graph.merge_edge("c", "c", Value::Null).expect("loop");
        assert!(looped.source_created);
        assert!(!looped.target_created);
        assert_eq!(graph.order(), 3);
    }

    #[test]
    fn merge_with_key_checks_consistency() {
        let mut graph = Graph::default();
        graph
            .merge_undirected_edge_with_key("e", "a", "b", Value::Null)
            .expect("create");
        // Flipped endpoints are accepted for undirected edges.
        let merged = graph
            .merge_undirected_edge_with_key("e", "b", "a", json!({"w": 1}))
            .expect("flipped");
        assert!(!merged.created);

        assert!(matches!(
            graph.merge_undirected_edge_with_key("e", "a", "c", Value::Null),
            Err(GraphError::Usage(_))
        ));
        assert!(!graph.has_node("c"));
    }

    #[test]
    fn update_edge_threads_attributes() {
        let mut graph = Graph::default();
        let created = graph
            .update_edge("a", "b", |mut attributes| {
                attributes.insert("count".into(), json!(1));
                attributes
            })
            .expect("create");
        assert!(created.created);

        graph
            .update_edge("a", "b", |mut attributes| {
                let count = attributes.get("count").and_then(Value::as_i64).unwrap_or(0);
                attributes.insert("count".into(), json!(count + 1));
                attributes
            })
            .expect("update");
        assert_eq!(
            graph
                .get_edge_attribute(created.key.as_str(), "count")
                .expect("attr"),
            Some(&json!(2))
        );
    }

    #[test]
    fn merge_and_update_node() {
        let mut graph = Graph::default();
        assert_eq!(
            graph.merge_node("a", json!({"x": 1})).expect("merge"),
            ("a".to_string(), true)
        );
        assert_eq!(
            graph.merge_node("a", json!({"y": 2})).expect("merge"),
            ("a".to_string(), false)
        );
        assert_eq!(graph.get_node_attributes("a").expect("attrs").len(), 2);

        let (_, created) = graph.update_node("a", |_| Attributes::new());
        assert!(!created);
        assert!(graph.get_node_attributes("a").expect("attrs").is_empty());

        let (_, created) = graph.update_node("b", |mut attributes| {
            attributes.insert("fresh".into(), json!(true));
            attributes
        });
        assert!(created);
        assert_eq!(
            graph.get_node_attribute("b", "fresh").expect("attr"),
            Some(&json!(true))
        );
    }

    #[test]
    fn drop_node_cascades() {
        let mut graph = Graph::multi();
        path(&mut graph, &["a", "b", "c"]);
        graph.add_edge("b", "b", Value::Null).expect("loop");
        graph.merge_undirected_edge("b", "d", Value::Null).expect("d");
        graph.add_edge("a", "b", Value::Null).expect("parallel");

        let before = graph.size();
        let incident = graph.node_edges("b").expect("edges");
        graph.drop_node("b").expect("drop");

        assert!(!graph.has_node("b"));
        assert_eq!(graph.size(), before - incident.len());
        for edge in &incident {
            assert!(!graph.has_edge(edge));
        }
        assert_eq!(graph.out_degree("a").expect("a"), 0);
        assert_eq!(graph.self_loop_count(), 0);
    }

    #[test]
    fn drop_edge_by_key_and_path() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b", "c"]);
        let ab = graph.edge("a", "b").expect("edge").expect("present");
        graph.drop_edge(&ab).expect("by key");
        assert!(!graph.has_edge(&ab));
        assert_eq!(graph.out_degree("a").expect("a"), 0);

        graph.drop_edge(("b", "c")).expect("by path");
        assert_eq!(graph.size(), 0);

        assert!(matches!(
            graph.drop_edge("nope"),
            Err(GraphError::NotFound(_))
        ));
        assert!(matches!(
            graph.drop_directed_edge("a", "b"),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn drop_by_path_on_multi_graph_is_usage() {
        let mut graph = Graph::multi_directed();
        path(&mut graph, &["a", "b"]);
        assert!(matches!(
            graph.drop_edge(("a", "b")),
            Err(GraphError::Usage(_))
        ));
        assert!(matches!(
            graph.drop_directed_edge("a", "b"),
            Err(GraphError::Usage(_))
        ));
        assert_eq!(graph.size(), 1);
    }

    #[test]
    fn edge_lookup_rules() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b"]);
        assert!(graph.edge("a", "b").expect("edge").is_some());
        assert!(graph.edge("b", "a").expect("edge").is_none());
        assert!(graph.undirected_edge("a", "b").expect("edge").is_none());
        assert!(matches!(graph.edge("a", "zz"), Err(GraphError::NotFound(_))));

        let multi = Graph::multi();
        assert!(matches!(multi.edge("a", "b"), Err(GraphError::Usage(_))));

        let directed = Graph::directed();
        assert_eq!(directed.undirected_edge("a", "b").expect("early"), None);
    }

    #[test]
    fn endpoints_and_opposite() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b"]);
        graph.add_node("c", Value::Null).expect("add");
        let e = graph.edge("a", "b").expect("edge").expect("present");

        assert_eq!(graph.source(&e).expect("source"), "a");
        assert_eq!(graph.target(&e).expect("target"), "b");
        assert_eq!(graph.extremities(&e).expect("ends"), ("a", "b"));
        assert_eq!(graph.opposite("a", &e).expect("opposite"), "b");
        assert!(graph.has_extremity(&e, "b").expect("edge"));
        assert!(!graph.has_extremity(&e, "c").expect("edge"));
        assert!(matches!(
            graph.opposite("c", &e),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn neighbor_predicates() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b"]);
        graph.add_node("c", Value::Null).expect("add");
        graph.add_undirected_edge("a", "c", Value::Null).expect("und");

        assert!(graph.are_neighbors("a", "b").expect("a"));
        assert!(graph.are_out_neighbors("a", "b").expect("a"));
        assert!(!graph.are_in_neighbors("a", "b").expect("a"));
        assert!(graph.are_in_neighbors("b", "a").expect("b"));
        assert!(graph.are_undirected_neighbors("c", "a").expect("c"));
        assert!(graph.are_inbound_neighbors("a", "c").expect("a"));
        assert!(!graph.are_directed_neighbors("a", "c").expect("a"));
        assert!(!graph.are_neighbors("a", "missing").expect("a"));
        assert!(matches!(
            graph.are_neighbors("missing", "a"),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn has_edge_variants() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b"]);
        graph.add_node("c", Value::Null).expect("add");
        let und = graph
            .add_undirected_edge("b", "c", Value::Null)
            .expect("und");

        assert!(graph.has_edge_between("a", "b"));
        assert!(!graph.has_edge_between("b", "a"));
        assert!(graph.has_directed_edge_between("a", "b"));
        assert!(graph.has_undirected_edge_between("c", "b"));
        assert!(graph.has_undirected_edge(&und));
        assert!(!graph.has_directed_edge(&und));
        assert!(!graph.has_edge_between("zz", "a"));
    }

    #[test]
    fn clear_and_clear_edges() {
        let mut graph = Graph::default();
        path(&mut graph, &["a", "b", "c"]);
        graph.set_attribute("name", "g");

        graph.clear_edges();
        assert_eq!(graph.order(), 3);
        assert_eq!(graph.size(), 0);
        assert_eq!(graph.degree("b").expect("b"), 0);
        assert!(graph.neighbors("b").expect("b").is_empty());

        graph.add_edge("a", "c", Value::Null).expect("re-add");
        graph.clear();
        assert_eq!(graph.order(), 0);
        assert_eq!(graph.size(), 0);
        assert_eq!(graph.directed_size(), 0);
        assert_eq!(graph.get_attribute("name"), Some(&json!("g")));
    }

    #[test]
    fn recreated_node_starts_fresh() {
        let mut graph = Graph::default();
        graph.add_node("a", json!({"old": true})).expect("add");
        graph.drop_node("a").expect("drop");
        graph.add_node("a", Value::Null).expect("re-add");
        assert!(graph.get_node_attributes("a").expect("attrs").is_empty());
    }

    #[test]
    fn mutations_emit_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut graph = Graph::default();
        for kind in [
            EventKind::NodeAdded,
            EventKind::EdgeAdded,
            EventKind::EdgeDropped,
            EventKind::NodeDropped,
        ] {
            let log = Rc::clone(&log);
            graph.on(kind, move |event| {
                log.borrow_mut()
                    .push(format!("{:?}:{}", event.kind(), event.key().unwrap_or("")));
            });
        }

        graph.add_edge_with_key("e", "a", "b", Value::Null).ok();
        graph.add_node("a", Value::Null).expect("a");
        graph.add_node("b", Value::Null).expect("b");
        graph
            .add_edge_with_key("e", "a", "b", Value::Null)
            .expect("edge");
        graph.drop_node("a").expect("drop");

        assert_eq!(
            *log.borrow(),
            vec![
                "NodeAdded:a",
                "NodeAdded:b",
                "EdgeAdded:e",
                "EdgeDropped:e",
                "NodeDropped:a"
            ]
        );
    }

    #[test]
    fn debug_output_labels_edges() {
        let mut graph = Graph::default();
        graph.set_attribute("name", "pair");
        path(&mut graph, &["a", "b"]);
        graph
            .add_undirected_edge_with_key("u", "a", "b", Value::Null)
            .expect("und");
        let rendered = format!("{graph:?}");
        assert!(rendered.contains(r#"{"name": String("pair")}"#));
        assert!(rendered.contains("(a)->(b)"));
        assert!(rendered.contains("[u]: (a)--(b)"));
        assert!(rendered.contains("Graph { order: 2, size: 2 }"));
    }
}
