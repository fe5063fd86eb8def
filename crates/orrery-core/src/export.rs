//! # Serialization, Import & Copies
//!
//! The serialized document is a plain JSON-compatible structure:
//!
//! ```text
//! { options: { type, multi, allowSelfLoops },
//!   attributes: {...},
//!   nodes: [ { key, attributes? } ],
//!   edges: [ { key?, source, target, attributes?, undirected? } ] }
//! ```
//!
//! Empty attribute maps are omitted on export, and `undirected: true` is
//! only written for undirected edges of mixed graphs. Untyped documents
//! (`import_value`, `from_value`) are validated as a whole before any entry
//! is applied.

use crate::graph::Graph;
use crate::iteration::Scope;
use crate::primitives::MAX_IMPORT_ENTRIES;
use crate::types::{Attributes, GraphError, GraphOptions, GraphType, Value};
use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENT
// =============================================================================

/// A node in a serialized graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

/// An edge in a serialized graph. A missing key asks the importer to
/// generate one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undirected: Option<bool>,
}

/// A whole serialized graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    #[serde(default)]
    pub options: GraphOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default)]
    pub nodes: Vec<SerializedNode>,
    #[serde(default)]
    pub edges: Vec<SerializedEdge>,
}

impl SerializedGraph {
    /// Validate and convert an untyped document.
    ///
    /// Node keys and edge endpoints may be any scalar; they are coerced to
    /// strings. Nothing is returned unless the whole document is well formed.
    /// Entry lists longer than [`MAX_IMPORT_ENTRIES`] are rejected before any
    /// entry is converted.
    pub fn from_value(value: &Value) -> Result<Self, GraphError> {
        Self::from_value_within(value, MAX_IMPORT_ENTRIES)
    }

    fn from_value_within(value: &Value, limit: usize) -> Result<Self, GraphError> {
        const METHOD: &str = "import";
        let Value::Object(document) = value else {
            return Err(GraphError::invalid(
                METHOD,
                "invalid argument. Expecting a serialized graph",
            ));
        };

        let options = match document.get("options") {
            None | Some(Value::Null) => GraphOptions::default(),
            Some(options) => GraphOptions::from_value(options)?,
        };

        let attributes = match document.get("attributes") {
            None | Some(Value::Null) => None,
            Some(Value::Object(attributes)) => Some(attributes.clone()),
            Some(_) => {
                return Err(GraphError::invalid(
                    METHOD,
                    "invalid attributes. Expecting a plain object",
                ));
            }
        };

        let nodes = entries(document, "nodes", limit)?
            .iter()
            .map(node_from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = entries(document, "edges", limit)?
            .iter()
            .map(edge_from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            options,
            attributes,
            nodes,
            edges,
        })
    }

    fn check_limits(&self, limit: usize) -> Result<(), GraphError> {
        check_entry_count("nodes", self.nodes.len(), limit)?;
        check_entry_count("edges", self.edges.len(), limit)
    }
}

/// Reject an entry list longer than `limit`.
pub(crate) fn check_entry_count(field: &str, len: usize, limit: usize) -> Result<(), GraphError> {
    if len > limit {
        return Err(GraphError::invalid(
            "import",
            format!("document has {len} {field}, more than the {limit} allowed"),
        ));
    }
    Ok(())
}

fn entries<'v>(
    document: &'v serde_json::Map<String, Value>,
    field: &str,
    limit: usize,
) -> Result<&'v [Value], GraphError> {
    match document.get(field) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(list)) => {
            check_entry_count(field, list.len(), limit)?;
            Ok(list)
        }
        Some(_) => Err(GraphError::invalid(
            "import",
            format!("invalid {field}. Expecting an array"),
        )),
    }
}

/// String form of a scalar key.
fn scalar_key(value: &Value, what: &str) -> Result<String, GraphError> {
    match value {
        Value::String(key) => Ok(key.clone()),
        Value::Array(_) | Value::Object(_) => Err(GraphError::invalid(
            "import",
            format!("invalid {what}. Expecting a string or a number"),
        )),
        scalar => Ok(scalar.to_string()),
    }
}

fn optional_attributes(
    entry: &serde_json::Map<String, Value>,
) -> Result<Option<Attributes>, GraphError> {
    match entry.get("attributes") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(attributes)) => Ok(Some(attributes.clone())),
        Some(_) => Err(GraphError::invalid(
            "import",
            "invalid attributes. Attributes should be a plain object, null or omitted",
        )),
    }
}

fn node_from_value(value: &Value) -> Result<SerializedNode, GraphError> {
    let Value::Object(entry) = value else {
        return Err(GraphError::invalid(
            "import",
            "invalid serialized node. A serialized node should be a plain object with at least a \"key\" property",
        ));
    };
    let key = entry
        .get("key")
        .ok_or_else(|| GraphError::invalid("import", "serialized node is missing its key"))?;
    Ok(SerializedNode {
        key: scalar_key(key, "node key")?,
        attributes: optional_attributes(entry)?,
    })
}

fn edge_from_value(value: &Value) -> Result<SerializedEdge, GraphError> {
    let Value::Object(entry) = value else {
        return Err(GraphError::invalid(
            "import",
            "invalid serialized edge. A serialized edge should be a plain object with at least a \"source\" & \"target\" property",
        ));
    };
    let endpoint = |field: &str| {
        entry
            .get(field)
            .ok_or_else(|| {
                GraphError::invalid("import", format!("serialized edge is missing its {field}"))
            })
            .and_then(|value| scalar_key(value, field))
    };
    let undirected = match entry.get("undirected") {
        None => None,
        Some(Value::Bool(undirected)) => Some(*undirected),
        Some(_) => {
            return Err(GraphError::invalid(
                "import",
                "invalid undirectedness information. Undirected should be boolean or omitted",
            ));
        }
    };

    Ok(SerializedEdge {
        key: entry
            .get("key")
            .map(|key| scalar_key(key, "edge key"))
            .transpose()?,
        source: endpoint("source")?,
        target: endpoint("target")?,
        attributes: optional_attributes(entry)?,
        undirected,
    })
}

fn attributes_value(attributes: Option<&Attributes>) -> Value {
    attributes.map_or(Value::Null, |attributes| Value::Object(attributes.clone()))
}

fn non_empty(attributes: &Attributes) -> Option<Attributes> {
    (!attributes.is_empty()).then(|| attributes.clone())
}

// =============================================================================
// EXPORT & IMPORT
// =============================================================================

impl Graph {
    /// Snapshot of the whole graph, in insertion order.
    pub fn export(&self) -> SerializedGraph {
        let mixed = self.graph_type() == GraphType::Mixed;
        let nodes = self
            .node_entries()
            .map(|node| SerializedNode {
                key: node.key.to_string(),
                attributes: non_empty(node.attributes),
            })
            .collect();
        let edges = self
            .edge_entries(&Scope::Graph)
            .map(|edges| {
                edges
                    .map(|edge| SerializedEdge {
                        key: Some(edge.key.to_string()),
                        source: edge.source.key.to_string(),
                        target: edge.target.key.to_string(),
                        attributes: non_empty(edge.attributes),
                        undirected: (mixed && edge.undirected).then_some(true),
                    })
                    .collect()
            })
            .unwrap_or_default();

        SerializedGraph {
            options: self.options(),
            attributes: Some(self.get_attributes().clone()),
            nodes,
            edges,
        }
    }

    /// The exported document as JSON.
    pub fn to_json(&self) -> Result<Value, GraphError> {
        serde_json::to_value(self.export())
            .map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Apply a serialized document. Options in the document are ignored.
    ///
    /// With `merge`, nodes and edges go through the `merge_*` family and the
    /// graph attributes are merged; otherwise the `add_*` family is used and
    /// the graph attributes are replaced. Application stops at the first
    /// failing entry.
    pub fn import(&mut self, document: &SerializedGraph, merge: bool) -> Result<(), GraphError> {
        document.check_limits(MAX_IMPORT_ENTRIES)?;
        tracing::debug!(
            nodes = document.nodes.len(),
            edges = document.edges.len(),
            merge,
            "importing document"
        );

        if let Some(attributes) = &document.attributes {
            let attributes = Value::Object(attributes.clone());
            if merge {
                self.merge_attributes(attributes)?;
            } else {
                self.replace_attributes(attributes)?;
            }
        }

        for node in &document.nodes {
            let attributes = attributes_value(node.attributes.as_ref());
            if merge {
                self.merge_node(&node.key, attributes)?;
            } else {
                self.add_node(&node.key, attributes)?;
            }
        }

        let undirected_by_default = self.graph_type() == GraphType::Undirected;
        for edge in &document.edges {
            let undirected = edge.undirected.unwrap_or(undirected_by_default);
            let attributes = attributes_value(edge.attributes.as_ref());
            self.import_edge(
                merge,
                undirected,
                edge.key.as_deref(),
                &edge.source,
                &edge.target,
                attributes,
            )?;
        }
        Ok(())
    }

    /// Validate an untyped document, then apply it.
    pub fn import_value(&mut self, document: &Value, merge: bool) -> Result<(), GraphError> {
        self.import_value_within(document, merge, MAX_IMPORT_ENTRIES)
    }

    fn import_value_within(
        &mut self,
        document: &Value,
        merge: bool,
        limit: usize,
    ) -> Result<(), GraphError> {
        let document = SerializedGraph::from_value_within(document, limit)?;
        self.import(&document, merge)
    }

    /// Copy every node and edge of `other`, keys included.
    pub fn import_graph(&mut self, other: &Graph, merge: bool) -> Result<(), GraphError> {
        tracing::debug!(
            order = other.order(),
            size = other.size(),
            merge,
            "importing graph"
        );
        for node in other.node_entries() {
            let attributes = Value::Object(node.attributes.clone());
            if merge {
                self.merge_node(node.key, attributes)?;
            } else {
                self.add_node(node.key, attributes)?;
            }
        }
        for edge in other.edge_entries(&Scope::Graph)? {
            self.import_edge(
                merge,
                edge.undirected,
                Some(edge.key),
                edge.source.key,
                edge.target.key,
                Value::Object(edge.attributes.clone()),
            )?;
        }
        Ok(())
    }

    fn import_edge(
        &mut self,
        merge: bool,
        undirected: bool,
        key: Option<&str>,
        source: &str,
        target: &str,
        attributes: Value,
    ) -> Result<(), GraphError> {
        match (merge, undirected, key) {
            (true, true, Some(key)) => {
                self.merge_undirected_edge_with_key(key, source, target, attributes)?;
            }
            (true, false, Some(key)) => {
                self.merge_directed_edge_with_key(key, source, target, attributes)?;
            }
            (true, true, None) => {
                self.merge_undirected_edge(source, target, attributes)?;
            }
            (true, false, None) => {
                self.merge_directed_edge(source, target, attributes)?;
            }
            (false, true, Some(key)) => {
                self.add_undirected_edge_with_key(key, source, target, attributes)?;
            }
            (false, false, Some(key)) => {
                self.add_directed_edge_with_key(key, source, target, attributes)?;
            }
            (false, true, None) => {
                self.add_undirected_edge(source, target, attributes)?;
            }
            (false, false, None) => {
                self.add_directed_edge(source, target, attributes)?;
            }
        }
        Ok(())
    }

    /// Build a graph from a document, under the document's options unless
    /// `options` overrides them.
    pub fn from_serialized(
        document: &SerializedGraph,
        options: Option<GraphOptions>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(options.unwrap_or(document.options));
        graph.import(document, false)?;
        Ok(graph)
    }

    /// Build a graph from an untyped document, options included.
    pub fn from_value(document: &Value) -> Result<Self, GraphError> {
        Self::from_serialized(&SerializedGraph::from_value(document)?, None)
    }

    // =========================================================================
    // COPIES
    // =========================================================================

    /// Same options (unless overridden) and graph attributes; no nodes, no
    /// edges, no listeners.
    pub fn null_copy(&self, options: Option<GraphOptions>) -> Self {
        let mut graph = Self::new(options.unwrap_or(self.options()));
        graph.attributes = self.attributes.clone();
        graph
    }

    /// Null copy plus every node with its attributes.
    pub fn empty_copy(&self, options: Option<GraphOptions>) -> Self {
        let mut graph = self.null_copy(options);
        for node in self.node_entries() {
            graph.insert_node_record(node.key.to_string(), node.attributes.clone());
        }
        graph
    }

    /// Full copy with the same edge keys.
    ///
    /// `options` may only widen the graph: a narrower type, a multi graph
    /// made simple, or self-loops newly forbidden are `Usage` errors.
    pub fn copy(&self, options: Option<GraphOptions>) -> Result<Self, GraphError> {
        const METHOD: &str = "copy";
        if let Some(options) = options {
            let current = self.options();
            if options.graph_type != current.graph_type && options.graph_type != GraphType::Mixed {
                return Err(GraphError::usage(
                    METHOD,
                    format!(
                        "cannot create an incompatible copy from \"{}\" type to \"{}\" because this would mean losing information about the current graph",
                        current.graph_type, options.graph_type
                    ),
                ));
            }
            if current.multi && !options.multi {
                return Err(GraphError::usage(
                    METHOD,
                    "cannot create an incompatible copy by downgrading a multi graph to a simple one because this would mean losing information about the current graph",
                ));
            }
            if current.allow_self_loops && !options.allow_self_loops {
                return Err(GraphError::usage(
                    METHOD,
                    "cannot create an incompatible copy from a graph allowing self loops to one that does not because this would mean losing information about the current graph",
                ));
            }
        }

        let mut graph = self.empty_copy(options);
        for edge in self.edge_keys.values() {
            let record = &self.edges[*edge];
            let (Some(source), Some(target)) = (
                graph.node_index(&self.nodes[record.source].key),
                graph.node_index(&self.nodes[record.target].key),
            ) else {
                continue;
            };
            graph.insert_edge_record(
                Some(record.key.clone()),
                source,
                target,
                record.undirected,
                record.attributes.clone(),
            );
        }
        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Graph {
        let mut graph = Graph::default();
        graph.set_attribute("name", "sample");
        graph.add_node("a", json!({"x": 1})).expect("a");
        graph.add_node("b", Value::Null).expect("b");
        graph.add_edge_with_key("ab", "a", "b", json!({"w": 2})).expect("ab");
        graph
            .add_undirected_edge_with_key("ba", "b", "a", Value::Null)
            .expect("ba");
        graph
    }

    #[test]
    fn export_shape() {
        let json = sample().to_json().expect("json");
        assert_eq!(
            json,
            json!({
                "options": {"type": "mixed", "multi": false, "allowSelfLoops": true},
                "attributes": {"name": "sample"},
                "nodes": [{"key": "a", "attributes": {"x": 1}}, {"key": "b"}],
                "edges": [
                    {"key": "ab", "source": "a", "target": "b", "attributes": {"w": 2}},
                    {"key": "ba", "source": "b", "target": "a", "undirected": true}
                ]
            })
        );
    }

    #[test]
    fn undirected_flag_only_on_mixed_graphs() {
        let mut graph = Graph::undirected();
        graph.merge_edge("a", "b", Value::Null).expect("edge");
        let document = graph.export();
        assert_eq!(document.edges[0].undirected, None);

        let key = document.edges[0].key.clone().expect("exported key");
        let restored = Graph::from_serialized(&document, None).expect("restore");
        assert!(restored.is_undirected(&key).expect("edge"));
        assert_eq!(restored.undirected_size(), 1);
    }

    #[test]
    fn round_trip_through_json() {
        let graph = sample();
        let restored = Graph::from_value(&graph.to_json().expect("json")).expect("restore");
        assert_eq!(restored.export(), graph.export());
    }

    #[test]
    fn import_value_validates_before_applying() {
        let mut graph = Graph::default();
        let bad = json!({
            "nodes": [{"key": "a"}, {"attributes": {}}],
        });
        assert!(matches!(
            graph.import_value(&bad, false),
            Err(GraphError::InvalidArguments(_))
        ));
        assert_eq!(graph.order(), 0);

        for bad in [
            json!([]),
            json!({"nodes": {}}),
            json!({"edges": [{"source": "a"}]}),
            json!({"edges": [{"source": "a", "target": "b", "undirected": "yes"}]}),
            json!({"nodes": [{"key": "a", "attributes": 3}]}),
            json!({"attributes": "nope"}),
            json!({"nodes": [{"key": {"nested": true}}]}),
        ] {
            assert!(graph.import_value(&bad, false).is_err(), "{bad}");
        }
    }

    #[test]
    fn oversized_documents_are_rejected_untouched() {
        let mut graph = Graph::default();
        let document = json!({
            "nodes": [{"key": "a"}, {"key": "b"}, {"key": "c"}],
            "edges": [{"source": "a", "target": "b"}],
        });

        assert!(matches!(
            graph.import_value_within(&document, false, 2),
            Err(GraphError::InvalidArguments(_))
        ));
        assert_eq!(graph.order(), 0);
        assert_eq!(graph.size(), 0);

        let edges_over = json!({"edges": [
            {"source": "a", "target": "b"},
            {"source": "b", "target": "c"},
        ]});
        assert!(matches!(
            SerializedGraph::from_value_within(&edges_over, 1),
            Err(GraphError::InvalidArguments(_))
        ));

        graph.import_value_within(&document, false, 3).expect("at the limit");
        assert_eq!(graph.order(), 3);

        let typed = graph.export();
        assert!(typed.check_limits(3).is_ok());
        assert!(matches!(typed.check_limits(2), Err(GraphError::InvalidArguments(_))));
    }

    #[test]
    fn scalar_keys_are_coerced() {
        let mut graph = Graph::default();
        graph
            .import_value(
                &json!({
                    "nodes": [{"key": 1}, {"key": true}],
                    "edges": [{"source": 1, "target": true}]
                }),
                false,
            )
            .expect("import");
        assert!(graph.has_node("1"));
        assert!(graph.has_node("true"));
        assert!(graph.has_directed_edge_between(1, true));
    }

    #[test]
    fn merge_import_combines() {
        let mut graph = sample();
        let mut other = Graph::default();
        other.add_node("a", json!({"y": 2})).expect("a");
        other.add_node("c", Value::Null).expect("c");
        other.add_edge_with_key("ac", "a", "c", Value::Null).expect("ac");

        graph.import_graph(&other, true).expect("merge");
        assert_eq!(graph.order(), 3);
        assert_eq!(graph.get_node_attributes("a").expect("a").len(), 2);
        assert!(graph.has_edge("ac"));

        assert!(matches!(
            graph.import_graph(&other, false),
            Err(GraphError::Usage(_))
        ));
    }

    #[test]
    fn copies() {
        let graph = sample();

        let null = graph.null_copy(None);
        assert_eq!(null.order(), 0);
        assert_eq!(null.get_attribute("name"), Some(&json!("sample")));

        let empty = graph.empty_copy(None);
        assert_eq!(empty.order(), 2);
        assert_eq!(empty.size(), 0);

        let full = graph.copy(None).expect("copy");
        assert_eq!(full.export(), graph.export());

        let widened = graph
            .copy(Some(GraphOptions::default().multi(true)))
            .expect("multi copy");
        assert!(widened.is_multi());
        assert_eq!(widened.size(), 2);
    }

    #[test]
    fn copy_refuses_downgrades() {
        let graph = Graph::multi_directed();
        for options in [
            GraphOptions::of_type(GraphType::Undirected).multi(true),
            GraphOptions::of_type(GraphType::Directed),
            GraphOptions::of_type(GraphType::Directed)
                .multi(true)
                .allow_self_loops(false),
        ] {
            assert!(matches!(
                graph.copy(Some(options)),
                Err(GraphError::Usage(_))
            ));
        }
        assert!(
            graph
                .copy(Some(GraphOptions::default().multi(true)))
                .is_ok()
        );
    }
}
