//! # Primitives
//!
//! Constants shared by the store and its codecs.

/// Prefix of generated edge keys.
///
/// - Generated key = prefix + instance id + `_` + per-graph counter.
pub const EDGE_KEY_PREFIX: &str = "geid_";

/// Magic bytes for the Orrery binary format header.
///
/// - File Header = Magic Bytes ("ORRY") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"ORRY";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the binary header (magic + version).
pub const HEADER_LEN: usize = 5;

/// Maximum number of entries accepted by a single import document.
///
/// Documents with more nodes or edges than this are rejected before any
/// entry is applied.
pub const MAX_IMPORT_ENTRIES: usize = 10_000_000;
