//! Integration tests for the CLI command layer, driven through real files.

use orrery::CliError;
use orrery::cli::{
    self, Cli, Commands, OrreryConfig, OutputFormat, check_degrees, edge_lines, encode_graph,
    load_graph, merge_files, neighbor_keys, save_graph,
};
use orrery_core::{Graph, GraphError, GraphOptions, GraphType, PersistenceHeader, Relation, Value};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// HELPERS
// =============================================================================

fn sample() -> Graph {
    let mut graph = Graph::default();
    graph.set_attribute("name", "sample");
    graph.add_node("a", json!({"label": "A"})).expect("a");
    graph.add_node("b", Value::Null).expect("b");
    graph.add_node("c", Value::Null).expect("c");
    graph.add_edge_with_key("ab", "a", "b", json!({"w": 2})).expect("ab");
    graph.add_undirected_edge_with_key("bc", "b", "c", Value::Null).expect("bc");
    graph.add_undirected_edge_with_key("cc", "c", "c", Value::Null).expect("cc");
    graph
}

fn write_json(dir: &TempDir, name: &str, document: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec(document).expect("encode")).expect("write");
    path
}

fn write_graph(dir: &TempDir, name: &str, graph: &Graph, format: OutputFormat) -> PathBuf {
    let path = dir.path().join(name);
    save_graph(graph, &path, format, false).expect("save");
    path
}

fn run(args: &[&str]) -> Result<(), CliError> {
    use clap::Parser;
    let cli = Cli::try_parse_from(std::iter::once("orrery").chain(args.iter().copied()))
        .expect("arguments");
    cli::execute(cli)
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

// =============================================================================
// LOADING & SAVING
// =============================================================================

#[test]
fn json_and_binary_files_load_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let graph = sample();

    let json_path = write_graph(&dir, "g.json", &graph, OutputFormat::Json);
    let binary_path = write_graph(&dir, "g.orry", &graph, OutputFormat::Binary);

    let raw = std::fs::read(&binary_path).expect("read");
    assert!(PersistenceHeader::is_present(&raw));

    let from_json = load_graph(&json_path).expect("json");
    let from_binary = load_graph(&binary_path).expect("binary");
    assert_eq!(from_json.export(), graph.export());
    assert_eq!(from_binary.export(), graph.export());
}

#[test]
fn pretty_output_is_still_the_same_document() {
    let graph = sample();
    let pretty = encode_graph(&graph, OutputFormat::Json, true).expect("pretty");
    let compact = encode_graph(&graph, OutputFormat::Json, false).expect("compact");
    assert!(pretty.len() > compact.len());

    let a: Value = serde_json::from_slice(&pretty).expect("parse pretty");
    let b: Value = serde_json::from_slice(&compact).expect("parse compact");
    assert_eq!(a, b);
}

#[test]
fn bad_inputs_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");

    assert!(matches!(
        load_graph(&dir.path().join("missing.json")),
        Err(CliError::Io(_))
    ));
    assert!(matches!(load_graph(dir.path()), Err(CliError::Io(_))));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, b"{not json").expect("write");
    assert!(matches!(load_graph(&garbage), Err(CliError::Json(_))));

    let invalid = write_json(&dir, "invalid.json", &json!({"nodes": [{"attributes": {}}]}));
    assert!(matches!(
        load_graph(&invalid),
        Err(CliError::Graph(GraphError::InvalidArguments(_)))
    ));

    let truncated = dir.path().join("truncated.orry");
    std::fs::write(&truncated, b"ORRY\x01\xff").expect("write");
    assert!(matches!(
        load_graph(&truncated),
        Err(CliError::Graph(GraphError::Serialization(_)))
    ));
}

#[test]
fn output_directory_must_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("nowhere").join("g.json");
    assert!(matches!(
        save_graph(&sample(), &target, OutputFormat::Json, false),
        Err(CliError::Io(_))
    ));
}

// =============================================================================
// QUERIES
// =============================================================================

#[test]
fn neighbor_queries_follow_relations() {
    let graph = sample();
    assert_eq!(neighbor_keys(&graph, "b", Relation::ALL).expect("all"), vec!["a", "c"]);
    assert_eq!(neighbor_keys(&graph, "b", Relation::IN).expect("in"), vec!["a"]);
    assert!(neighbor_keys(&graph, "b", Relation::OUT).expect("out").is_empty());
    assert!(matches!(
        neighbor_keys(&graph, "zz", Relation::ALL),
        Err(CliError::Graph(GraphError::NotFound(_)))
    ));
}

#[test]
fn edge_listing_scopes() {
    let graph = sample();

    let all = edge_lines(&graph, None, None, Relation::ALL).expect("all");
    assert_eq!(
        all.iter().map(|line| line.key.as_str()).collect::<Vec<_>>(),
        vec!["ab", "bc", "cc"]
    );

    let of_c = edge_lines(&graph, Some("c"), None, Relation::UNDIRECTED).expect("c");
    assert_eq!(of_c.len(), 2);
    assert!(of_c.iter().all(|line| line.undirected));

    let between = edge_lines(&graph, Some("b"), Some("a"), Relation::ALL).expect("between");
    assert_eq!(between.len(), 1);
    assert_eq!((between[0].source.as_str(), between[0].target.as_str()), ("a", "b"));

    assert!(edge_lines(&graph, None, Some("a"), Relation::ALL).is_err());
}

#[test]
fn degree_check_passes_on_consistent_graphs() {
    let mut graph = Graph::multi();
    graph.merge_edge("a", "b", Value::Null).expect("ab");
    graph.merge_edge("a", "b", Value::Null).expect("ab again");
    graph.merge_edge("b", "b", Value::Null).expect("directed loop");
    graph.merge_undirected_edge("b", "c", Value::Null).expect("bc");
    graph.merge_undirected_edge("c", "c", Value::Null).expect("undirected loop");
    graph.add_node("lonely", Value::Null).expect("lonely");

    assert!(check_degrees(&graph).expect("check").is_empty());
}

// =============================================================================
// MERGE & CONFIG
// =============================================================================

#[test]
fn merge_combines_inputs_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = write_json(
        &dir,
        "first.json",
        &json!({
            "nodes": [{"key": "a", "attributes": {"x": 1}}, {"key": "b"}],
            "edges": [{"key": "ab", "source": "a", "target": "b"}]
        }),
    );
    let mut second = Graph::directed();
    second.merge_node("a", json!({"y": 2})).expect("a");
    second.merge_edge_with_key("ac", "a", "c", Value::Null).expect("ac");
    let second = write_graph(&dir, "second.orry", &second, OutputFormat::Binary);

    let merged = merge_files(&[first, second], GraphOptions::of_type(GraphType::Directed))
        .expect("merge");
    assert_eq!(merged.nodes(), vec!["a", "b", "c"]);
    assert_eq!(merged.edges(), vec!["ab", "ac"]);
    assert_eq!(
        merged.get_node_attributes("a").expect("a"),
        json!({"x": 1, "y": 2}).as_object().expect("object")
    );
}

#[test]
fn merge_respects_configured_options() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_json(
        &dir,
        "directed.json",
        &json!({
            "nodes": [{"key": "a"}, {"key": "b"}],
            "edges": [{"source": "a", "target": "b", "undirected": false}]
        }),
    );

    assert!(matches!(
        merge_files(&[input], GraphOptions::of_type(GraphType::Undirected)),
        Err(CliError::Graph(GraphError::Usage(_)))
    ));
}

#[test]
fn convert_and_merge_through_the_command_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_graph(&dir, "g.json", &sample(), OutputFormat::Json);
    let binary = dir.path().join("g.orry");
    let merged = dir.path().join("merged.json");

    let config = dir.path().join("orrery.toml");
    std::fs::write(&config, "[graph]\ntype = \"mixed\"\n\n[output]\npretty = false\n")
        .expect("config");

    run(&[
        "--quiet",
        "convert",
        path_arg(&source),
        path_arg(&binary),
        "--format",
        "binary",
    ])
    .expect("convert");
    assert!(PersistenceHeader::is_present(&std::fs::read(&binary).expect("read")));

    run(&[
        "--config",
        path_arg(&config),
        "merge",
        path_arg(&source),
        path_arg(&binary),
        "--output",
        path_arg(&merged),
    ])
    .expect("merge");

    // Graph-level attributes are not carried by a merge.
    let merged_graph = load_graph(&merged).expect("load merged");
    let (merged_doc, sample_doc) = (merged_graph.export(), sample().export());
    assert_eq!(merged_doc.nodes, sample_doc.nodes);
    assert_eq!(merged_doc.edges, sample_doc.edges);
    assert!(merged_graph.get_attributes().is_empty());
    run(&["check", path_arg(&merged)]).expect("check");
}

#[test]
fn commands_parse_as_documented() {
    use clap::Parser;

    let cli = Cli::try_parse_from([
        "orrery", "edges", "g.json", "--node", "a", "--target", "b", "-r", "out",
    ])
    .expect("edges");
    assert!(matches!(
        cli.command,
        Commands::Edges { ref node, ref target, ref relation, .. }
            if node.as_deref() == Some("a") && target.as_deref() == Some("b") && relation == "out"
    ));

    assert!(Cli::try_parse_from(["orrery", "edges", "g.json", "--target", "b"]).is_err());
    assert!(Cli::try_parse_from(["orrery", "merge", "--output", "m.json"]).is_err());

    let config = OrreryConfig::default();
    assert_eq!(config.output.format, OutputFormat::Json);
}
