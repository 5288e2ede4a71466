//! End-to-end checks of build, search, filter and visual mapping.

use confgraph_core::{BuildError, ConfigSourceFile, EnvironmentSpec, FileType};
use confgraph_graph::{
    apply, build, to_visual, ConfigGraph, EdgeKind, FilterState, GraphBuilder, NodeVariant,
    SearchIndex,
};
use std::collections::HashSet;

fn scenario_sources() -> Vec<ConfigSourceFile> {
    vec![
        ConfigSourceFile::new("/app/config.json", FileType::Json).with_keys(["db.host", "db.port"]),
        ConfigSourceFile::new("/app/env.ts", FileType::Ts).with_keys(["API_URL"]),
    ]
}

fn scenario_environments() -> Vec<EnvironmentSpec> {
    vec![EnvironmentSpec::new("prod", ["/app/config.json"])]
}

fn project_sources() -> Vec<ConfigSourceFile> {
    vec![
        ConfigSourceFile::new("/repo/package.json", FileType::Json).with_keys(["name", "scripts"]),
        ConfigSourceFile::new("/repo/tsconfig.json", FileType::Json)
            .with_keys(["compilerOptions", "compilerOptions.strict"]),
        ConfigSourceFile::new("/repo/vite.config.ts", FileType::Ts)
            .with_keys(["export default", "server", "server.port"]),
        ConfigSourceFile::new("/repo/src-tauri/Cargo.toml", FileType::Toml)
            .with_keys(["package", "package.name"]),
        ConfigSourceFile::new("/repo/src-tauri/tauri.conf.json", FileType::Json)
            .with_keys(["build", "build.devPath"]),
        ConfigSourceFile::new("/repo/.github/workflows/ci.yml", FileType::Yml)
            .with_keys(["jobs", "jobs.build"]),
        ConfigSourceFile::new("/repo/.prettierrc", FileType::Other),
    ]
}

fn project_environments() -> Vec<EnvironmentSpec> {
    vec![
        EnvironmentSpec::new(
            "development",
            ["/repo/vite.config.ts", "/repo/tsconfig.json"],
        )
        .with_label("Development"),
        EnvironmentSpec::new(
            "production",
            ["/repo/package.json", "/repo/src-tauri/Cargo.toml"],
        )
        .with_label("Production"),
        EnvironmentSpec::new("ci", ["/repo/.github/workflows/ci.yml", "/repo/package.json"]),
    ]
}

fn filter_grid() -> Vec<FilterState> {
    let type_sets: Vec<Vec<FileType>> = vec![
        FileType::ALL.to_vec(),
        vec![FileType::Json],
        vec![FileType::Ts, FileType::Toml],
        vec![],
    ];

    let mut filters = Vec::new();
    for types in &type_sets {
        for mask in 0..8u8 {
            filters.push(
                FilterState::all()
                    .with_files(mask & 1 != 0)
                    .with_environments(mask & 2 != 0)
                    .with_modules(mask & 4 != 0)
                    .with_file_types(types.iter().copied()),
            );
        }
    }
    filters
}

fn node_ids(graph: &ConfigGraph) -> HashSet<String> {
    graph.nodes().map(|n| n.id.clone()).collect()
}

#[test]
fn scenario_build_search_filter() {
    let graph = build(&scenario_sources(), &scenario_environments()).unwrap();

    assert_eq!(graph.node_count(), 3);
    let files = graph
        .nodes()
        .filter(|n| n.variant() == NodeVariant::File)
        .count();
    assert_eq!(files, 2);
    assert_eq!(graph.edge_count(), 1);

    let edge = graph.edges().next().unwrap();
    assert_eq!(edge.kind, EdgeKind::BelongsTo);
    assert_eq!(edge.source, "file:/app/config.json");
    assert_eq!(edge.target, "env:prod");

    let index = SearchIndex::build(&graph);
    let hits = index.search_by_text("db.");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "file:/app/config.json");

    let filter = FilterState::all()
        .with_file_types([FileType::Json])
        .with_environments(false);
    let projected = apply(&graph, &filter);
    assert_eq!(projected.node_count(), 1);
    assert_eq!(projected.edge_count(), 0);
    assert!(projected.contains("file:/app/config.json"));
}

#[test]
fn scenario_dangling_member() {
    let envs = vec![EnvironmentSpec::new("prod", ["/missing.json"])];
    let err = build(&scenario_sources(), &envs).unwrap_err();

    assert!(matches!(
        &err,
        BuildError::DanglingMember { path, .. } if path == "/missing.json"
    ));
    assert!(err.to_string().contains("/missing.json"));
}

#[test]
fn build_is_order_independent() {
    let sources = project_sources();
    let envs = project_environments();
    let baseline = build(&sources, &envs).unwrap();

    for rotation in 0..sources.len() {
        let mut s = sources.clone();
        s.rotate_left(rotation);
        let mut e = envs.clone();
        e.rotate_left(rotation % envs.len());
        e.reverse();

        let rebuilt = build(&s, &e).unwrap();
        assert_eq!(rebuilt, baseline, "rotation {}", rotation);
        assert_eq!(rebuilt.snapshot(), baseline.snapshot());
    }
}

#[test]
fn node_ids_are_stable_across_rescans() {
    let first = build(&project_sources(), &project_environments()).unwrap();

    // A re-scan that changes keys and metadata but not paths.
    let rescanned: Vec<ConfigSourceFile> = project_sources()
        .into_iter()
        .map(|s| {
            let mut keys = s.keys.clone();
            keys.push("added".into());
            s.with_keys(keys).with_metadata(99, 123)
        })
        .collect();
    let second = build(&rescanned, &project_environments()).unwrap();

    assert_eq!(node_ids(&first), node_ids(&second));
    assert_ne!(first, second);
}

#[test]
fn default_rules_link_project_files() {
    let graph = build(&project_sources(), &project_environments()).unwrap();

    let references: Vec<(String, String)> = graph
        .edges()
        .filter(|e| e.kind == EdgeKind::References)
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();

    assert!(references.contains(&(
        "file:/repo/package.json".into(),
        "file:/repo/tsconfig.json".into()
    )));
    assert!(references.contains(&(
        "file:/repo/vite.config.ts".into(),
        "file:/repo/package.json".into()
    )));
    assert!(references.contains(&(
        "file:/repo/src-tauri/Cargo.toml".into(),
        "file:/repo/src-tauri/tauri.conf.json".into()
    )));
    // vite.config.ts and tauri.conf.json live in different directories.
    assert_eq!(references.len(), 3);

    let without = GraphBuilder::without_relations()
        .build(&project_sources(), &project_environments())
        .unwrap();
    assert_eq!(without.edge_count(), graph.edge_count() - 3);
}

#[test]
fn filter_never_leaves_dangling_edges() {
    let graph = build(&project_sources(), &project_environments()).unwrap();

    for filter in filter_grid() {
        let projected = apply(&graph, &filter);
        let ids = node_ids(&projected);
        for edge in projected.edges() {
            assert!(ids.contains(&edge.source), "{:?}", filter);
            assert!(ids.contains(&edge.target), "{:?}", filter);
        }
        assert!(projected.is_consistent());
        for node in projected.nodes() {
            assert!(filter.admits(node));
        }
    }
}

#[test]
fn filter_keeps_every_edge_between_visible_nodes() {
    let graph = build(&project_sources(), &project_environments()).unwrap();

    for filter in filter_grid() {
        let projected = apply(&graph, &filter);
        let ids = node_ids(&projected);
        let expected = graph
            .edges()
            .filter(|e| ids.contains(&e.source) && ids.contains(&e.target))
            .count();
        assert_eq!(projected.edge_count(), expected, "{:?}", filter);
    }
}

#[test]
fn filter_everything_enabled_is_identity() {
    let graph = build(&project_sources(), &project_environments()).unwrap();
    assert_eq!(apply(&graph, &FilterState::all()), graph);
}

#[test]
fn empty_query_is_empty_for_any_index() {
    let graphs = vec![
        ConfigGraph::new(),
        build(&scenario_sources(), &scenario_environments()).unwrap(),
        build(&project_sources(), &project_environments()).unwrap(),
    ];
    for graph in graphs {
        assert!(SearchIndex::build(&graph).search_by_text("").is_empty());
    }
}

#[test]
fn search_is_reproducible() {
    let graph = build(&project_sources(), &project_environments()).unwrap();
    let index = SearchIndex::build(&graph);

    for query in ["build", "json", "server", "o", "PACKAGE"] {
        let first: Vec<String> = index.search_by_text(query).iter().map(|n| n.id.clone()).collect();
        let rebuilt = SearchIndex::build(&build(&project_sources(), &project_environments()).unwrap());
        let second: Vec<String> = rebuilt.search_by_text(query).iter().map(|n| n.id.clone()).collect();
        assert_eq!(first, second, "query {}", query);
    }
}

#[test]
fn visual_never_invents_or_drops_ids() {
    let graph = build(&project_sources(), &project_environments()).unwrap();

    for filter in filter_grid() {
        let projected = apply(&graph, &filter);
        let ids = node_ids(&projected);
        let visual = to_visual(&projected);

        let visual_ids: HashSet<String> = visual.nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(visual_ids, ids);
        for edge in &visual.edges {
            assert!(ids.contains(&edge.source));
            assert!(ids.contains(&edge.target));
        }
        assert_eq!(visual.edges.len(), projected.edge_count());
    }
}
