//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands, plus
//! the file helpers they share. Inputs are read as binary when they start
//! with the Orrery magic, as exported JSON documents otherwise.

use super::config::{OrreryConfig, OutputFormat};
use crate::error::CliError;
use orrery_core::{
    AdjacencyMode, Graph, GraphError, GraphOptions, PersistenceHeader, Relation, Scope, Value,
    graph_from_bytes, graph_to_bytes,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a graph file, JSON or binary (500 MB).
const MAX_GRAPH_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CliError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CliError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path: symlinks and ".." are resolved, and the target
/// must be an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CliError> {
    let canonical = path.canonicalize().map_err(|e| {
        CliError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CliError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, CliError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CliError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CliError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CliError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// GRAPH FILES
// =============================================================================

/// Read a graph file, binary or JSON.
pub fn load_graph(path: &Path) -> Result<Graph, CliError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_GRAPH_FILE_SIZE)?;

    let data = std::fs::read(&validated)
        .map_err(|e| CliError::Io(format!("Read '{}': {}", path.display(), e)))?;

    let graph = if PersistenceHeader::is_present(&data) {
        graph_from_bytes(&data)?
    } else {
        let document: Value = serde_json::from_slice(&data)?;
        Graph::from_value(&document)?
    };

    tracing::debug!(
        path = %validated.display(),
        order = graph.order(),
        size = graph.size(),
        "loaded graph"
    );
    Ok(graph)
}

/// Encode a graph in the requested format.
pub fn encode_graph(graph: &Graph, format: OutputFormat, pretty: bool) -> Result<Vec<u8>, CliError> {
    match format {
        OutputFormat::Binary => Ok(graph_to_bytes(graph)?),
        OutputFormat::Json => {
            let document = graph.to_json()?;
            let data = if pretty {
                serde_json::to_vec_pretty(&document)?
            } else {
                serde_json::to_vec(&document)?
            };
            Ok(data)
        }
    }
}

/// Write a graph file. Returns the number of bytes written.
pub fn save_graph(
    graph: &Graph,
    path: &Path,
    format: OutputFormat,
    pretty: bool,
) -> Result<usize, CliError> {
    let validated = validate_output_path(path)?;
    let data = encode_graph(graph, format, pretty)?;
    std::fs::write(&validated, &data)
        .map_err(|e| CliError::Io(format!("Write '{}': {}", path.display(), e)))?;
    Ok(data.len())
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Summary counters of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub options: GraphOptions,
    pub order: usize,
    pub size: usize,
    pub directed_size: usize,
    pub undirected_size: usize,
    pub self_loops: usize,
    pub directed_self_loops: usize,
    pub undirected_self_loops: usize,
}

impl GraphStats {
    #[must_use]
    pub fn collect(graph: &Graph) -> Self {
        Self {
            options: graph.options(),
            order: graph.order(),
            size: graph.size(),
            directed_size: graph.directed_size(),
            undirected_size: graph.undirected_size(),
            self_loops: graph.self_loop_count(),
            directed_self_loops: graph.directed_self_loop_count(),
            undirected_self_loops: graph.undirected_self_loop_count(),
        }
    }
}

/// Show graph counters and options.
pub fn cmd_stats(path: &Path, json_mode: bool) -> Result<(), CliError> {
    let graph = load_graph(path)?;
    let stats = GraphStats::collect(&graph);

    if json_mode {
        return print_json(&stats);
    }

    println!("Orrery Graph Stats");
    println!("==================");
    println!("File:       {}", path.display());
    println!(
        "Options:    type={} multi={} allowSelfLoops={}",
        stats.options.graph_type, stats.options.multi, stats.options.allow_self_loops
    );
    println!();
    println!("Nodes:      {}", stats.order);
    println!(
        "Edges:      {} ({} directed, {} undirected)",
        stats.size, stats.directed_size, stats.undirected_size
    );
    println!(
        "Self-loops: {} ({} directed, {} undirected)",
        stats.self_loops, stats.directed_self_loops, stats.undirected_self_loops
    );

    Ok(())
}

// =============================================================================
// NEIGHBORS COMMAND
// =============================================================================

/// Neighbour keys of `node` along `relation`.
pub fn neighbor_keys(graph: &Graph, node: &str, relation: Relation) -> Result<Vec<String>, CliError> {
    Ok(graph
        .neighbor_entries_in(relation, node)?
        .map(|entry| entry.key.to_string())
        .collect())
}

/// List the neighbours of a node.
pub fn cmd_neighbors(
    path: &Path,
    node: &str,
    relation: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let graph = load_graph(path)?;
    let neighbors = neighbor_keys(&graph, node, relation.parse()?)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "node": node,
            "relation": relation,
            "neighbors": neighbors,
        }));
    }

    println!("{} neighbor(s) of \"{}\" ({}):", neighbors.len(), node, relation);
    for neighbor in &neighbors {
        println!("  {}", neighbor);
    }

    Ok(())
}

// =============================================================================
// EDGES COMMAND
// =============================================================================

/// One listed edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeLine {
    pub key: String,
    pub source: String,
    pub target: String,
    pub undirected: bool,
}

/// Edges along `relation`: of the whole graph, of `node`, or between `node`
/// and `target`.
pub fn edge_lines(
    graph: &Graph,
    node: Option<&str>,
    target: Option<&str>,
    relation: Relation,
) -> Result<Vec<EdgeLine>, CliError> {
    let scope = match (node, target) {
        (Some(source), Some(target)) => Scope::path(source, target),
        (Some(node), None) => Scope::node(node),
        (None, None) => Scope::Graph,
        (None, Some(_)) => {
            return Err(GraphError::InvalidArguments(
                "edges: a target needs a source node".to_string(),
            )
            .into());
        }
    };

    Ok(graph
        .edge_entries_in(relation, &scope)?
        .map(|entry| EdgeLine {
            key: entry.key.to_string(),
            source: entry.source.key.to_string(),
            target: entry.target.key.to_string(),
            undirected: entry.undirected,
        })
        .collect())
}

/// List edges.
pub fn cmd_edges(
    path: &Path,
    node: Option<&str>,
    target: Option<&str>,
    relation: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let graph = load_graph(path)?;
    let lines = edge_lines(&graph, node, target, relation.parse()?)?;

    if json_mode {
        return print_json(&lines);
    }

    println!("{} edge(s):", lines.len());
    for line in &lines {
        let arrow = if line.undirected { "--" } else { "->" };
        println!("  {}: {} {} {}", line.key, line.source, arrow, line.target);
    }

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// A node whose stored degree disagrees with its adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeMismatch {
    pub node: String,
    pub relation: &'static str,
    pub stored: usize,
    pub counted: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counted {
    incoming: usize,
    outgoing: usize,
    undirected: usize,
}

/// Recount every node's degrees from a full adjacency traversal and compare
/// them with the stored counters.
pub fn check_degrees(graph: &Graph) -> Result<Vec<DegreeMismatch>, CliError> {
    let mut counted: HashMap<&str, Counted> = HashMap::new();

    for entry in graph.adjacency_entries(AdjacencyMode::default()) {
        let (Some(neighbor), Some(edge)) = (entry.neighbor, entry.edge) else {
            continue;
        };
        let self_loop = entry.node.key == neighbor.key;
        if edge.undirected {
            // Undirected self-loops count twice but are reported once.
            let slot = counted.entry(entry.node.key).or_default();
            slot.undirected += if self_loop { 2 } else { 1 };
        } else {
            counted.entry(entry.node.key).or_default().outgoing += 1;
            counted.entry(neighbor.key).or_default().incoming += 1;
        }
    }

    let mut mismatches = Vec::new();
    for node in graph.nodes() {
        let actual = counted.get(node.as_str()).copied().unwrap_or_default();
        let checks = [
            ("in", graph.in_degree(&node)?, actual.incoming),
            ("out", graph.out_degree(&node)?, actual.outgoing),
            ("undirected", graph.undirected_degree(&node)?, actual.undirected),
        ];
        for (relation, stored, recounted) in checks {
            if stored != recounted {
                mismatches.push(DegreeMismatch {
                    node: node.clone(),
                    relation,
                    stored,
                    counted: recounted,
                });
            }
        }
    }
    Ok(mismatches)
}

/// Verify the degree counters of every node.
pub fn cmd_check(path: &Path, json_mode: bool) -> Result<(), CliError> {
    let graph = load_graph(path)?;
    let mismatches = check_degrees(&graph)?;

    if json_mode {
        print_json(&serde_json::json!({
            "nodes": graph.order(),
            "ok": mismatches.is_empty(),
            "mismatches": mismatches,
        }))?;
    } else if mismatches.is_empty() {
        println!("OK: {} node(s), {} edge(s) consistent", graph.order(), graph.size());
    } else {
        for mismatch in &mismatches {
            println!(
                "MISMATCH {} {}: stored {} counted {}",
                mismatch.node, mismatch.relation, mismatch.stored, mismatch.counted
            );
        }
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(CliError::Integrity(mismatches.len()))
    }
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Re-encode a graph file.
pub fn cmd_convert(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let graph = load_graph(input)?;
    let written = save_graph(&graph, output, format, pretty)?;
    tracing::info!(?format, bytes = written, "converted graph");
    println!("Wrote {} bytes to {}", written, output.display());
    Ok(())
}

// =============================================================================
// MERGE COMMAND
// =============================================================================

/// Import every input, in order, into one graph built with `options`.
pub fn merge_files(inputs: &[PathBuf], options: GraphOptions) -> Result<Graph, CliError> {
    let mut graph = Graph::new(options);
    for input in inputs {
        let other = load_graph(input)?;
        graph.import_graph(&other, true)?;
        tracing::info!(
            input = %input.display(),
            order = graph.order(),
            size = graph.size(),
            "merged input"
        );
    }
    Ok(graph)
}

/// Merge several graph files into one.
pub fn cmd_merge(
    inputs: &[PathBuf],
    output: &Path,
    config: &OrreryConfig,
    format: OutputFormat,
    json_mode: bool,
) -> Result<(), CliError> {
    let graph = merge_files(inputs, config.graph)?;
    let written = save_graph(&graph, output, format, config.output.pretty)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "inputs": inputs.len(),
            "output": output.to_string_lossy(),
            "bytes": written,
            "stats": GraphStats::collect(&graph),
        }));
    }

    println!(
        "Merged {} file(s): {} nodes, {} edges -> {} ({} bytes)",
        inputs.len(),
        graph.order(),
        graph.size(),
        output.display(),
        written
    );
    Ok(())
}
