//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the store:
//! - Graph configuration (`GraphType`, `GraphOptions`)
//! - Relation descriptors used by iteration (`Direction`, `Relation`)
//! - Element addressing (`EdgeRef`, `NodeRef`)
//! - Results of merge/update operations (`EdgeMerge`)
//! - Error types (`GraphError`)
//!
//! Attribute bags are plain `serde_json` objects with insertion order
//! preserved (`Attributes`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use serde_json::Value;

/// Open key-value map attached to nodes, edges and the graph itself.
pub type Attributes = serde_json::Map<String, Value>;

// =============================================================================
// GRAPH CONFIGURATION
// =============================================================================

/// Kind of edges a graph may hold. Also used as a type filter when
/// addressing edges or walking relations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    Directed,
    Undirected,
    #[default]
    Mixed,
}

impl GraphType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directed => "directed",
            Self::Undirected => "undirected",
            Self::Mixed => "mixed",
        }
    }

    /// Whether a graph of this type can hold edges matching `filter`.
    ///
    /// A mixed filter is compatible with every graph; a typed filter only
    /// with the same type or with mixed graphs.
    #[must_use]
    pub const fn admits(self, filter: GraphType) -> bool {
        matches!(
            (self, filter),
            (_, Self::Mixed)
                | (Self::Mixed, _)
                | (Self::Directed, Self::Directed)
                | (Self::Undirected, Self::Undirected)
        )
    }

    /// Whether an edge of the given directedness matches this filter.
    #[must_use]
    pub const fn matches_edge(self, undirected: bool) -> bool {
        match self {
            Self::Mixed => true,
            Self::Directed => !undirected,
            Self::Undirected => undirected,
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directed" => Ok(Self::Directed),
            "undirected" => Ok(Self::Undirected),
            "mixed" => Ok(Self::Mixed),
            other => Err(GraphError::InvalidArguments(format!(
                "options: \"type\" must be one of \"directed\", \"undirected\" or \"mixed\", got \"{other}\""
            ))),
        }
    }
}

/// Immutable configuration of a graph, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphOptions {
    #[serde(rename = "type")]
    pub graph_type: GraphType,
    pub multi: bool,
    pub allow_self_loops: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            graph_type: GraphType::Mixed,
            multi: false,
            allow_self_loops: true,
        }
    }
}

impl GraphOptions {
    /// Default options with the given graph type.
    #[must_use]
    pub fn of_type(graph_type: GraphType) -> Self {
        Self {
            graph_type,
            ..Self::default()
        }
    }

    /// Same options, allowing parallel edges or not.
    #[must_use]
    pub const fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    /// Same options, allowing self-loops or not.
    #[must_use]
    pub const fn allow_self_loops(mut self, allow: bool) -> Self {
        self.allow_self_loops = allow;
        self
    }

    /// Parse options out of a loose JSON object.
    ///
    /// Missing fields take their defaults; `null` is the default options.
    /// Anything else than an object, a bad `type` string or non-boolean
    /// flags are rejected with `InvalidArguments`.
    pub fn from_value(value: &Value) -> Result<Self, GraphError> {
        let mut options = Self::default();
        let object = match value {
            Value::Null => return Ok(options),
            Value::Object(object) => object,
            _ => {
                return Err(GraphError::InvalidArguments(
                    "options: expecting an object".to_string(),
                ));
            }
        };

        match object.get("type") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => options.graph_type = s.parse()?,
            Some(other) => {
                return Err(GraphError::InvalidArguments(format!(
                    "options: \"type\" must be a string, got {other}"
                )));
            }
        }

        for (field, slot) in [
            ("multi", &mut options.multi),
            ("allowSelfLoops", &mut options.allow_self_loops),
        ] {
            match object.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::Bool(flag)) => *slot = *flag,
                Some(other) => {
                    return Err(GraphError::InvalidArguments(format!(
                        "options: \"{field}\" must be a boolean, got {other}"
                    )));
                }
            }
        }

        Ok(options)
    }
}

// =============================================================================
// RELATIONS
// =============================================================================

/// Direction of a directed relation, seen from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// Which relations an iteration walks: an edge type filter and an optional
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub graph_type: GraphType,
    pub direction: Option<Direction>,
}

impl Relation {
    /// Every relation: in, out and undirected.
    pub const ALL: Self = Self::new(GraphType::Mixed, None);
    /// Incoming directed relations.
    pub const IN: Self = Self::new(GraphType::Directed, Some(Direction::In));
    /// Outgoing directed relations.
    pub const OUT: Self = Self::new(GraphType::Directed, Some(Direction::Out));
    /// Incoming directed relations plus undirected ones.
    pub const INBOUND: Self = Self::new(GraphType::Mixed, Some(Direction::In));
    /// Outgoing directed relations plus undirected ones.
    pub const OUTBOUND: Self = Self::new(GraphType::Mixed, Some(Direction::Out));
    /// Directed relations in both directions.
    pub const DIRECTED: Self = Self::new(GraphType::Directed, None);
    /// Undirected relations.
    pub const UNDIRECTED: Self = Self::new(GraphType::Undirected, None);

    #[must_use]
    pub const fn new(graph_type: GraphType, direction: Option<Direction>) -> Self {
        Self {
            graph_type,
            direction,
        }
    }

    pub(crate) const fn walks_in(self) -> bool {
        !matches!(self.graph_type, GraphType::Undirected)
            && !matches!(self.direction, Some(Direction::Out))
    }

    pub(crate) const fn walks_out(self) -> bool {
        !matches!(self.graph_type, GraphType::Undirected)
            && !matches!(self.direction, Some(Direction::In))
    }

    pub(crate) const fn walks_undirected(self) -> bool {
        !matches!(self.graph_type, GraphType::Directed)
    }
}

impl FromStr for Relation {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::ALL),
            "in" => Ok(Self::IN),
            "out" => Ok(Self::OUT),
            "inbound" => Ok(Self::INBOUND),
            "outbound" => Ok(Self::OUTBOUND),
            "directed" => Ok(Self::DIRECTED),
            "undirected" => Ok(Self::UNDIRECTED),
            other => Err(GraphError::InvalidArguments(format!(
                "unknown relation \"{other}\""
            ))),
        }
    }
}

// =============================================================================
// ADDRESSING
// =============================================================================

/// Addresses an edge either by key or by its `(source, target)` path.
///
/// Keys and endpoints are coerced to strings, so `EdgeRef::key(3)` and
/// `EdgeRef::from("3")` designate the same edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeRef {
    Key(String),
    Path { source: String, target: String },
}

impl EdgeRef {
    #[must_use]
    pub fn key(key: impl fmt::Display) -> Self {
        Self::Key(key.to_string())
    }

    #[must_use]
    pub fn path(source: impl fmt::Display, target: impl fmt::Display) -> Self {
        Self::Path {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

impl From<&str> for EdgeRef {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for EdgeRef {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&String> for EdgeRef {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl<S: fmt::Display, T: fmt::Display> From<(S, T)> for EdgeRef {
    fn from((source, target): (S, T)) -> Self {
        Self::path(source, target)
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "\"{key}\""),
            Self::Path { source, target } => write!(f, "\"{source}\" -> \"{target}\""),
        }
    }
}

/// Addresses a node directly or through one of an edge's endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// The node with this key.
    Node(String),
    /// Source of the edge with this key.
    Source(String),
    /// Target of the edge with this key.
    Target(String),
    /// Endpoint of `edge` that is not `node`.
    Opposite { node: String, edge: String },
}

impl NodeRef {
    #[must_use]
    pub fn node(key: impl fmt::Display) -> Self {
        Self::Node(key.to_string())
    }

    #[must_use]
    pub fn source(edge: impl fmt::Display) -> Self {
        Self::Source(edge.to_string())
    }

    #[must_use]
    pub fn target(edge: impl fmt::Display) -> Self {
        Self::Target(edge.to_string())
    }

    #[must_use]
    pub fn opposite(node: impl fmt::Display, edge: impl fmt::Display) -> Self {
        Self::Opposite {
            node: node.to_string(),
            edge: edge.to_string(),
        }
    }
}

// =============================================================================
// OPERATION RESULTS
// =============================================================================

/// Outcome of a merge/update edge operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMerge {
    /// Key of the created or pre-existing edge.
    pub key: String,
    /// Whether a new edge was created.
    pub created: bool,
    /// Whether the source node had to be created.
    pub source_created: bool,
    /// Whether the target node had to be created.
    pub target_created: bool,
}

impl EdgeMerge {
    pub(crate) fn existing(key: String) -> Self {
        Self {
            key,
            created: false,
            source_created: false,
            target_created: false,
        }
    }
}

/// Optional hints passed along bulk attribute updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHints {
    /// Names of the attributes the updater touched, if known.
    pub attributes: Option<Vec<String>>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while operating on a graph.
///
/// - No silent failures
/// - Use `Result<T, GraphError>` for fallible operations
/// - Operations validate before mutating: an error leaves the graph untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Malformed arguments: non-object attributes, bad options, bad documents.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The addressed node or edge does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not allowed for this graph's configuration or state.
    #[error("Usage error: {0}")]
    Usage(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    pub(crate) fn invalid(method: &str, message: impl fmt::Display) -> Self {
        Self::InvalidArguments(format!("{method}: {message}"))
    }

    pub(crate) fn not_found(method: &str, message: impl fmt::Display) -> Self {
        Self::NotFound(format!("{method}: {message}"))
    }

    pub(crate) fn usage(method: &str, message: impl fmt::Display) -> Self {
        Self::Usage(format!("{method}: {message}"))
    }
}

/// Turn a loosely typed attribute argument into an attribute map.
///
/// `null` stands for "no attributes"; any other non-object is rejected.
pub(crate) fn attributes_from(method: &str, value: Value) -> Result<Attributes, GraphError> {
    match value {
        Value::Null => Ok(Attributes::new()),
        Value::Object(map) => Ok(map),
        other => Err(GraphError::invalid(
            method,
            format!("attributes must be a plain object, got {other}"),
        )),
    }
}

/// Like [`attributes_from`], but `null` is rejected too.
pub(crate) fn object_from(method: &str, value: Value) -> Result<Attributes, GraphError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GraphError::invalid(
            method,
            format!("provided attributes are not a plain object, got {other}"),
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================
