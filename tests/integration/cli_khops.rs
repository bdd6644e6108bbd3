#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const SOCIAL_EDGES: &str = "\
src,dst,type
1,2,KNOWS
2,3,KNOWS
2,1,FRIENDS
4,3,FRIENDS
4,5,FRIENDS
6,5,FRIENDS
6,8,FRIENDS
6,7,FRIENDS
";

fn setup(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.csv"));
    fs::write(&path, contents).expect("write csv");
    (dir, path)
}

fn no_config(dir: &Path) -> PathBuf {
    dir.join("absent.toml")
}

fn stdout_of(args: &[&str], dir: &Path) -> String {
    let output = cargo_bin_cmd!("sombra-khops")
        .env_remove("SOMBRA_KHOPS_CONFIG")
        .arg("--config")
        .arg(no_config(dir))
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn count_prints_the_neighborhood_size() {
    let (dir, edges) = setup("social", SOCIAL_EDGES);
    let edges = edges.to_str().unwrap();
    let out = stdout_of(&["count", edges, "--start", "1", "--distance", "4"], dir.path());
    assert_eq!(out.trim(), "4");

    let out = stdout_of(
        &["count", edges, "--start", "1", "--distance", "4", "--type", "KNOWS"],
        dir.path(),
    );
    assert_eq!(out.trim(), "2");
}

#[test]
fn parallel_engine_agrees() {
    let (dir, edges) = setup("social", SOCIAL_EDGES);
    let edges = edges.to_str().unwrap();
    for threads in ["1", "3", "0"] {
        let out = stdout_of(
            &[
                "count", edges, "--start", "1", "--distance", "4", "--parallel", "--threads",
                threads,
            ],
            dir.path(),
        );
        assert_eq!(out.trim(), "4", "threads={threads}");
    }
}

#[test]
fn json_report_has_null_for_absent_results() {
    let (dir, edges) = setup("social", SOCIAL_EDGES);
    let edges = edges.to_str().unwrap();

    let out = stdout_of(
        &["--format", "json", "count", edges, "--start", "99", "--distance", "2"],
        dir.path(),
    );
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert!(json["value"].is_null());
    assert_eq!(json["start"], 99);

    let out = stdout_of(
        &["--format", "json", "count", edges, "--start", "1", "--distance", "-1"],
        dir.path(),
    );
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert!(json["value"].is_null());

    let out = stdout_of(
        &[
            "--format", "json", "count", edges, "--start", "1", "--distance", "4", "--parallel",
        ],
        dir.path(),
    );
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json["value"], 4);
    assert_eq!(json["engine"], "parallel");
}

#[test]
fn text_output_is_empty_for_absent_results() {
    let (dir, edges) = setup("social", SOCIAL_EDGES);
    let out = stdout_of(
        &["count", edges.to_str().unwrap(), "--start", "1", "--distance", "0"],
        dir.path(),
    );
    assert!(out.trim().is_empty(), "unexpected output: {out}");
}

#[test]
fn nodes_file_adds_isolated_start() {
    let (dir, edges) = setup("social", SOCIAL_EDGES);
    let nodes = dir.path().join("nodes.csv");
    fs::write(&nodes, "id\n1\n50\n").unwrap();
    let out = stdout_of(
        &[
            "count",
            edges.to_str().unwrap(),
            "--nodes",
            nodes.to_str().unwrap(),
            "--start",
            "50",
            "--distance",
            "3",
        ],
        dir.path(),
    );
    assert_eq!(out.trim(), "0");
}

#[test]
fn config_file_supplies_columns_and_engine() {
    let (dir, edges) = setup("custom", "from|to|label\n1|2|R\n2|3|R\n3|4|S\n");
    let config = dir.path().join("khops.toml");
    fs::write(
        &config,
        "[engine]\nkind = \"parallel\"\nparallelism = 2\n\n[import]\nsrc_column = \"from\"\ndst_column = \"to\"\ntype_column = \"label\"\ndelimiter = \"|\"\n",
    )
    .unwrap();
    let output = cargo_bin_cmd!("sombra-khops")
        .env_remove("SOMBRA_KHOPS_CONFIG")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "count"])
        .arg(&edges)
        .args(["--start", "1", "--distance", "5", "--type", "R"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["value"], 2);
    assert_eq!(json["engine"], "parallel");
}

#[test]
fn static_edge_type_overrides_column() {
    let (dir, edges) = setup("untyped", "src,dst\n1,2\n2,3\n");
    let out = stdout_of(
        &[
            "count",
            edges.to_str().unwrap(),
            "--edge-type",
            "LINK",
            "--start",
            "1",
            "--distance",
            "2",
            "--type",
            "LINK",
        ],
        dir.path(),
    );
    assert_eq!(out.trim(), "2");
}

#[test]
fn stats_reports_the_import() {
    let (dir, edges) = setup("social", SOCIAL_EDGES);
    let out = stdout_of(
        &["--format", "json", "stats", edges.to_str().unwrap()],
        dir.path(),
    );
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json["edges_imported"], 8);
    assert_eq!(json["node_count"], 8);
    assert_eq!(json["relationship_types"], 2);
}

#[test]
fn malformed_input_exits_with_error() {
    let (dir, edges) = setup("broken", "a,b\n1,2\n");
    let assert = cargo_bin_cmd!("sombra-khops")
        .env_remove("SOMBRA_KHOPS_CONFIG")
        .arg("--config")
        .arg(no_config(dir.path()))
        .arg("count")
        .arg(&edges)
        .args(["--start", "1"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("error: column 'src' not found"), "{stderr}");
}
