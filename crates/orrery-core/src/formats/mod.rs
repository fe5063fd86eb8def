//! # Formats
//!
//! Byte-level codecs for graphs. File I/O lives in the app layer.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, graph_from_bytes, graph_to_bytes,
};
