//! # Persistence Format
//!
//! Binary serialization for Orrery graphs.
//!
//! Format: Header (5 bytes) + postcard-serialized export document.
//! - 4 bytes: Magic ("ORRY")
//! - 1 byte: Version
//!
//! postcard is not self-describing, so attribute maps travel as JSON text
//! inside the payload. Sizes and the header are validated before the
//! payload is decoded.

use crate::export::{SerializedEdge, SerializedGraph, SerializedNode, check_entry_count};
use crate::graph::Graph;
use crate::primitives::{self, HEADER_LEN};
use crate::types::{Attributes, GraphError, GraphOptions};
use serde::{Deserialize, Serialize};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum allowed size of an encoded graph.
///
/// Checked before deserialization so a corrupted length prefix cannot drive
/// a huge allocation.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all graph data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(GraphError::Serialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(GraphError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(GraphError::Serialization(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }

    /// Whether `bytes` start with the Orrery magic.
    #[must_use]
    pub fn is_present(bytes: &[u8]) -> bool {
        bytes.starts_with(primitives::MAGIC_BYTES)
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    options: GraphOptions,
    attributes: Option<String>,
    nodes: Vec<PayloadNode>,
    edges: Vec<PayloadEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PayloadNode {
    key: String,
    attributes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PayloadEdge {
    key: Option<String>,
    source: String,
    target: String,
    attributes: Option<String>,
    undirected: Option<bool>,
}

fn encode_attributes(attributes: Option<&Attributes>) -> Result<Option<String>, GraphError> {
    attributes
        .map(|attributes| {
            serde_json::to_string(attributes)
                .map_err(|e| GraphError::Serialization(e.to_string()))
        })
        .transpose()
}

fn decode_attributes(text: Option<String>) -> Result<Option<Attributes>, GraphError> {
    text.map(|text| {
        serde_json::from_str(&text).map_err(|e| {
            GraphError::Serialization(format!("Failed to decode attributes: {e}"))
        })
    })
    .transpose()
}

impl Payload {
    fn encode(document: SerializedGraph) -> Result<Self, GraphError> {
        let nodes = document
            .nodes
            .into_iter()
            .map(|node| {
                Ok(PayloadNode {
                    attributes: encode_attributes(node.attributes.as_ref())?,
                    key: node.key,
                })
            })
            .collect::<Result<_, GraphError>>()?;
        let edges = document
            .edges
            .into_iter()
            .map(|edge| {
                Ok(PayloadEdge {
                    attributes: encode_attributes(edge.attributes.as_ref())?,
                    key: edge.key,
                    source: edge.source,
                    target: edge.target,
                    undirected: edge.undirected,
                })
            })
            .collect::<Result<_, GraphError>>()?;

        Ok(Self {
            options: document.options,
            attributes: encode_attributes(document.attributes.as_ref())?,
            nodes,
            edges,
        })
    }

    fn decode(self) -> Result<SerializedGraph, GraphError> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| {
                Ok(SerializedNode {
                    key: node.key,
                    attributes: decode_attributes(node.attributes)?,
                })
            })
            .collect::<Result<_, GraphError>>()?;
        let edges = self
            .edges
            .into_iter()
            .map(|edge| {
                Ok(SerializedEdge {
                    key: edge.key,
                    source: edge.source,
                    target: edge.target,
                    attributes: decode_attributes(edge.attributes)?,
                    undirected: edge.undirected,
                })
            })
            .collect::<Result<_, GraphError>>()?;

        Ok(SerializedGraph {
            options: self.options,
            attributes: decode_attributes(self.attributes)?,
            nodes,
            edges,
        })
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a graph to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn graph_to_bytes(graph: &Graph) -> Result<Vec<u8>, GraphError> {
    let header = PersistenceHeader::new();
    let payload = postcard::to_stdvec(&Payload::encode(graph.export())?)
        .map_err(|e| GraphError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a graph from bytes.
///
/// This is a pure transformation - no file I/O.
///
/// Validated before the payload is touched:
/// 1. Minimum data size (header must be present)
/// 2. Maximum payload size
/// 3. Header magic bytes and version
///
/// Entry counts are checked against [`primitives::MAX_IMPORT_ENTRIES`]
/// before any attribute text is parsed.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<Graph, GraphError> {
    graph_from_bytes_within(bytes, primitives::MAX_IMPORT_ENTRIES)
}

fn graph_from_bytes_within(bytes: &[u8], limit: usize) -> Result<Graph, GraphError> {
    if bytes.len() < HEADER_LEN {
        return Err(GraphError::Serialization(format!(
            "Data too short: minimum {HEADER_LEN} bytes required"
        )));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(GraphError::Serialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload: Payload = postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        GraphError::Serialization(format!("Failed to deserialize graph data: {e}"))
    })?;
    tracing::debug!(
        nodes = payload.nodes.len(),
        edges = payload.edges.len(),
        "decoded binary graph"
    );
    check_entry_count("nodes", payload.nodes.len(), limit)?;
    check_entry_count("edges", payload.edges.len(), limit)?;

    Graph::from_serialized(&payload.decode()?, None)
}

// =============================================================================
// TESTS
// =============================================================================
