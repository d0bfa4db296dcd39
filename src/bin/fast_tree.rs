//! Benchmark runner.
//!
//! Usage:
//!   cargo run --release -- <benchmark> \[options\]
//!
//! Benchmarks:
//!   breadth-first      heap-indexed array walk
//!   preorder           preorder array walk with right-subtree offsets
//!   preorder-cover     preorder walk that also reports per-node visit counts
//!   treelite           closure-compiled baseline (alias: compiled)
//!   simd               SIMD compare plus lookup table, depth-3 only (alias: bitmask)
//!
//! Examples:
//!   # Reference run over the Higgs test set
//!   cargo run --release -- simd
//!
//!   # Another data file, all cores
//!   cargo run --release -- preorder --data test.csv --rows 1000 --threads 0
//!
//!   # Emit the model as Rust source for an out-of-tree baseline
//!   cargo run --release -- treelite --emit-rust model_tree.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fast_tree::data::read_features;
use fast_tree::driver::{load_model_file, run, write_predictions_file};
use fast_tree::{emit_rust, run_with_threads, BenchConfig, BreadthFirstTree, EvaluatorKind};

#[derive(Parser, Debug)]
#[command(name = "fast-tree", version, about = "Compare decision-tree evaluators on one batch of rows")]
struct Options {
    /// Evaluator to benchmark.
    benchmark: EvaluatorKind,
    /// JSON run configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-delimited feature file.
    #[arg(long)]
    data: Option<PathBuf>,
    /// XGBoost text dump holding a single tree.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Rows to read (0 reads the whole file).
    #[arg(long)]
    rows: Option<usize>,
    /// Values per row.
    #[arg(long)]
    cols: Option<usize>,
    /// Sentinel that marks a missing value in the data file.
    #[arg(long, allow_hyphen_values = true)]
    missing: Option<f32>,
    /// The data file starts with a header line.
    #[arg(long)]
    header: bool,
    /// Where to write predictions.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Worker threads: 0 = all cores, 1 = sequential.
    #[arg(long)]
    threads: Option<usize>,
    /// Also write the model as a Rust function to this path.
    #[arg(long)]
    emit_rust: Option<PathBuf>,
}

impl Options {
    fn into_config(self) -> Result<(EvaluatorKind, BenchConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => BenchConfig::default(),
        };
        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(rows) = self.rows {
            config.num_rows = (rows > 0).then_some(rows);
        }
        if let Some(cols) = self.cols {
            config.num_cols = cols;
        }
        if let Some(missing) = self.missing {
            config.missing_value = missing;
        }
        if self.header {
            config.has_header = true;
        }
        if let Some(out) = self.out {
            config.output_path = out;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        config.validate()?;
        Ok((self.benchmark, config, self.emit_rust))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (kind, config, emit_path) = Options::parse().into_config()?;
    println!("Benchmark: {kind}");

    if let Some(path) = emit_path {
        let tree = BreadthFirstTree::from_file(&config.model_path)
            .with_context(|| format!("failed to load model {}", config.model_path.display()))?;
        std::fs::write(&path, emit_rust(&tree, "predict"))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote Rust source to {}", path.display());
    }

    let features = read_features(&config.data_path, &config.csv_options())
        .with_context(|| format!("failed to read features {}", config.data_path.display()))?;
    let model = load_model_file(kind, &config.model_path)
        .with_context(|| format!("failed to load model {}", config.model_path.display()))?;

    let report = run_with_threads(config.threads, |parallelism| {
        run(&model, features.view(), parallelism)
    })
    .context("failed to start thread pool")?;

    write_predictions_file(&config.output_path, &report.predictions)
        .with_context(|| format!("failed to write {}", config.output_path.display()))?;

    println!("Total prediction time: {}s", report.elapsed.as_secs_f64());
    if let Some(cover) = &report.cover {
        for (node, count) in cover {
            println!("Node {node} has true cover {count}");
        }
    }
    Ok(())
}
