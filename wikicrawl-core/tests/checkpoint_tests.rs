// Tests for file-backed checkpoints

mod common;

use common::ScriptedFetcher;
use std::sync::Arc;
use tempfile::TempDir;
use wikicrawl_core::checkpoint::{CheckpointError, CheckpointStore, load_json, save_json};
use wikicrawl_core::{
    CrawlTree, DumpOptions, FileStore, GraphDumper, LinkGraph, MemoryReporter, PathFinder,
    PathOptions, SearchOutcome,
};

#[test]
fn test_file_store_creates_directories() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    store.save("Data/nested/blob.json", b"{}").unwrap();

    assert!(dir.path().join("Data/nested/blob.json").is_file());
    assert!(store.exists("Data/nested/blob.json"));
    assert_eq!(store.load("Data/nested/blob.json").unwrap(), b"{}");
}

#[test]
fn test_file_store_replaces_whole_blob() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    store.save("blob.json", b"a much longer first version").unwrap();
    store.save("blob.json", b"short").unwrap();

    assert_eq!(store.load("blob.json").unwrap(), b"short");
    // No temp files left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_file_store_missing_key() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    assert!(!store.exists("nothing.json"));
    assert!(matches!(
        store.load("nothing.json"),
        Err(CheckpointError::NotFound(_))
    ));
}

#[test]
fn test_corrupt_checkpoint_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    store.save("tree.json", b"not json").unwrap();

    let result: Result<CrawlTree, CheckpointError> = load_json(&store, "tree.json");
    assert!(matches!(result, Err(CheckpointError::Serialization(_))));
}

#[test]
fn test_graph_blob_keeps_node_order() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    let mut graph = LinkGraph::with_seed("Z");
    graph.add_edge("Z", "M");
    graph.add_edge("Z", "A");
    graph.add_edge("M", "A");
    save_json(&store, "graph.json", &graph).unwrap();

    let loaded: LinkGraph = load_json(&store, "graph.json").unwrap();
    assert_eq!(loaded.nodes().collect::<Vec<_>>(), vec!["Z", "M", "A"]);
    assert_eq!(loaded.edge_count(), 3);
    assert!(loaded.has_edge("M", "A"));
    assert!(loaded.contains("A"));
}

#[tokio::test]
async fn test_path_search_resumes_from_disk() {
    let dir = TempDir::new().unwrap();
    let site = || {
        ScriptedFetcher::new()
            .page("A", &["B", "C"])
            .page("B", &["D"])
    };

    let options = |max_iter| PathOptions {
        start: Some("A".to_string()),
        end: Some("D".to_string()),
        max_iter,
        save_prefix: "Data/".to_string(),
        resume: true,
        ..PathOptions::default()
    };

    let mut first = PathFinder::new(
        options(2),
        site(),
        Arc::new(FileStore::new(dir.path())),
        Arc::new(MemoryReporter::new()),
    )
    .await
    .unwrap();
    first.find_path().await.unwrap();
    assert!(dir.path().join(first.checkpoint_key()).is_file());
    assert!(dir.path().join(first.key_map_key()).is_file());

    let fetcher = Arc::new(site());
    let mut second = PathFinder::new(
        options(3),
        fetcher.clone(),
        Arc::new(FileStore::new(dir.path())),
        Arc::new(MemoryReporter::new()),
    )
    .await
    .unwrap();
    let outcome = second.find_path().await.unwrap();

    assert!(matches!(outcome, SearchOutcome::Found { clicks: 2, .. }));
    assert_eq!(fetcher.call_count("A"), 0);
}

#[tokio::test]
async fn test_graph_dump_writes_both_files() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let options = DumpOptions {
        stop_count: 3,
        seed: "A".to_string(),
        save_path: "Data/fullnet1.json".to_string(),
        ..DumpOptions::default()
    };

    let mut dumper = GraphDumper::new(
        options,
        ScriptedFetcher::new().page("A", &["B", "C"]),
        store,
        Arc::new(MemoryReporter::new()),
    )
    .await
    .unwrap();
    dumper.start_dump().await.unwrap();

    assert!(dir.path().join("Data/fullnet1.json").is_file());
    assert!(dir.path().join("Data/fullnet1dict.json").is_file());
}
