//! End-to-end runs: CSV features in, predictions file out.

mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use fast_tree::data::{read_features, CsvOptions};
use fast_tree::driver::{load_model_file, run, write_predictions_file};
use fast_tree::{EvaluatorKind, Parallelism};

use common::*;

/// Writes the canonical model and eight rows, one per leaf, using -999 for
/// the features no split reads.
fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let tree = canonical_depth_three();
    let mut csv = String::new();
    for leaf in 0..8usize {
        let row = row_for_path(&tree, &[leaf & 4 == 0, leaf & 2 == 0, leaf & 1 == 0], CANONICAL_NUM_FEATURES);
        let fields: Vec<String> = row
            .iter()
            .map(|v| if *v == 0.0 { "-999".to_string() } else { v.to_string() })
            .collect();
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }

    let data = dir.join("test.csv");
    let model = dir.join("model.txt");
    fs::write(&data, csv).unwrap();
    fs::write(&model, CANONICAL_DUMP).unwrap();
    (data, model)
}

#[test]
fn library_pipeline_matches_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let (data, model_path) = write_inputs(dir.path());
    let options = CsvOptions {
        num_cols: CANONICAL_NUM_FEATURES,
        num_rows: Some(8),
        ..Default::default()
    };
    let features = read_features(&data, &options).unwrap();
    assert!(features[[0, 1]].is_nan());

    for kind in EvaluatorKind::ALL {
        let model = load_model_file(kind, &model_path).unwrap();
        let report = run(&model, features.view(), Parallelism::Sequential);
        assert_eq!(report.predictions, CANONICAL_LEAVES.to_vec(), "{kind}");

        let out = dir.path().join(format!("{kind}.csv"));
        write_predictions_file(&out, &report.predictions).unwrap();
        let written: Vec<f32> = fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| l.parse().unwrap())
            .collect();
        assert_eq!(written, report.predictions);
    }
}

fn fast_tree() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fast-tree"))
}

#[test]
fn binary_runs_cover_benchmark() {
    let dir = tempfile::tempdir().unwrap();
    let (data, model) = write_inputs(dir.path());
    let out = dir.path().join("predictions.csv");

    let output = fast_tree()
        .arg("preorder-cover")
        .arg("--data")
        .arg(&data)
        .arg("--model")
        .arg(&model)
        .args(["--rows", "8"])
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Benchmark: preorder-cover\n"));
    assert!(stdout.contains("Total prediction time: "));
    assert!(stdout.contains("Node 0 has true cover 8\n"));
    assert!(stdout.contains("Node 14 has true cover 1\n"));
    assert_eq!(fs::read_to_string(&out).unwrap().lines().count(), 8);
}

#[test]
fn binary_emits_rust_source() {
    let dir = tempfile::tempdir().unwrap();
    let (data, model) = write_inputs(dir.path());
    let emitted = dir.path().join("tree.rs");

    let status = fast_tree()
        .arg("treelite")
        .arg("--data")
        .arg(&data)
        .arg("--model")
        .arg(&model)
        .args(["--rows", "0", "--threads", "2"])
        .arg("--out")
        .arg(dir.path().join("p.csv"))
        .arg("--emit-rust")
        .arg(&emitted)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(fs::read_to_string(&emitted).unwrap().contains("pub fn predict(features: &[f32]) -> f32"));
}

#[test]
fn binary_rejects_unknown_benchmark() {
    let output = fast_tree().arg("depth-first").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("depth-first"));
}

#[test]
fn binary_reports_bad_model() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = write_inputs(dir.path());
    let model = dir.path().join("bad.txt");
    fs::write(&model, "0:[f0<1] yes=1,no=2\n1:leaf=1\n").unwrap();

    let output = fast_tree()
        .arg("breadth-first")
        .arg("--data")
        .arg(&data)
        .arg("--model")
        .arg(&model)
        .args(["--rows", "8"])
        .arg("--out")
        .arg(dir.path().join("p.csv"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed model"));
}
