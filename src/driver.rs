//! Benchmark driver: load a model for one evaluator, time it over a batch.
//!
//! Model construction and feature loading happen before the clock starts; the
//! timed region covers evaluation of every row and nothing else.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};
use ndarray::{ArrayView2, Axis};

use crate::compile::CompiledTree;
use crate::error::ModelError;
use crate::inference::{
    evaluate_preorder_cover, BitmaskEvaluator, CoverCounts, Evaluator, EvaluatorKind,
};
use crate::repr::{load_breadth_first, load_preorder, BreadthFirstTree, NodeId, PreorderModel, PreorderTree};
use crate::utils::Parallelism;

/// Rows per work unit when running in parallel.
const PARALLEL_CHUNK_ROWS: usize = 4096;

/// A model laid out for one evaluator.
#[derive(Debug)]
pub enum LoadedModel {
    BreadthFirst(BreadthFirstTree),
    Preorder(PreorderTree),
    PreorderCover(PreorderModel),
    Compiled(CompiledTree),
    Bitmask(BitmaskEvaluator),
}

impl LoadedModel {
    pub fn kind(&self) -> EvaluatorKind {
        match self {
            LoadedModel::BreadthFirst(_) => EvaluatorKind::BreadthFirst,
            LoadedModel::Preorder(_) => EvaluatorKind::Preorder,
            LoadedModel::PreorderCover(_) => EvaluatorKind::PreorderCover,
            LoadedModel::Compiled(_) => EvaluatorKind::Compiled,
            LoadedModel::Bitmask(_) => EvaluatorKind::Bitmask,
        }
    }
}

/// Build the model `kind` needs from dump text.
pub fn load_model(kind: EvaluatorKind, source: &str) -> Result<LoadedModel, ModelError> {
    let model = match kind {
        EvaluatorKind::BreadthFirst => LoadedModel::BreadthFirst(load_breadth_first(source)?),
        EvaluatorKind::Preorder => LoadedModel::Preorder(load_preorder(source, false)?.tree),
        EvaluatorKind::PreorderCover => LoadedModel::PreorderCover(load_preorder(source, true)?),
        EvaluatorKind::Compiled => {
            LoadedModel::Compiled(CompiledTree::compile(&load_breadth_first(source)?))
        }
        EvaluatorKind::Bitmask => {
            LoadedModel::Bitmask(BitmaskEvaluator::new(&load_breadth_first(source)?)?)
        }
    };
    debug!("built {kind} model");
    Ok(model)
}

/// Read a dump file and build the model `kind` needs.
pub fn load_model_file(kind: EvaluatorKind, path: impl AsRef<Path>) -> Result<LoadedModel, ModelError> {
    let path = path.as_ref();
    info!("loading model {} for {kind}", path.display());
    let source = std::fs::read_to_string(path)?;
    load_model(kind, &source)
}

/// Outcome of one timed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub kind: EvaluatorKind,
    /// One prediction per input row, in row order.
    pub predictions: Vec<f32>,
    pub elapsed: Duration,
    /// `(node_id, visits)` ordered by node id, for the cover evaluator only.
    pub cover: Option<Vec<(NodeId, u64)>>,
}

/// Evaluate every row of `features` and time it.
///
/// In parallel mode rows are split into chunks, each evaluated on a rayon
/// worker; the cover evaluator counts into one [`CoverCounts`] per chunk and
/// merges them after the clock stops.
pub fn run(model: &LoadedModel, features: ArrayView2<f32>, parallelism: Parallelism) -> RunReport {
    let num_rows = features.nrows();
    let chunk_rows = if parallelism.is_parallel() {
        PARALLEL_CHUNK_ROWS
    } else {
        num_rows.max(1)
    };
    let chunks: Vec<ArrayView2<f32>> = features.axis_chunks_iter(Axis(0), chunk_rows).collect();
    debug!("{num_rows} rows in {} chunks ({parallelism:?})", chunks.len());

    let kind = model.kind();
    let (predictions, elapsed, cover) = match model {
        LoadedModel::BreadthFirst(tree) => timed(tree, chunks, parallelism),
        LoadedModel::Preorder(tree) => timed(tree, chunks, parallelism),
        LoadedModel::Compiled(tree) => timed(tree, chunks, parallelism),
        LoadedModel::Bitmask(evaluator) => timed(evaluator, chunks, parallelism),
        LoadedModel::PreorderCover(model) => {
            let tree = &model.tree;
            let start = Instant::now();
            let parts = parallelism.maybe_par_map(chunks, |chunk| {
                let mut cover = CoverCounts::for_tree(tree);
                let predictions =
                    predict_rows(chunk, |row| evaluate_preorder_cover(tree, row, &mut cover));
                (predictions, cover)
            });
            let elapsed = start.elapsed();

            let mut total = model.cover.clone().unwrap_or_else(|| CoverCounts::for_tree(tree));
            let mut predictions = Vec::with_capacity(num_rows);
            for (part, cover) in parts {
                predictions.extend(part);
                total.merge(&cover);
            }
            (predictions, elapsed, Some(total.report(tree)))
        }
    };

    info!(
        "{kind}: {} rows in {:.6}s",
        predictions.len(),
        elapsed.as_secs_f64()
    );
    RunReport {
        kind,
        predictions,
        elapsed,
        cover,
    }
}

type Timed = (Vec<f32>, Duration, Option<Vec<(NodeId, u64)>>);

fn timed<E: Evaluator>(evaluator: &E, chunks: Vec<ArrayView2<f32>>, parallelism: Parallelism) -> Timed {
    let start = Instant::now();
    let parts = parallelism.maybe_par_map(chunks, |chunk| {
        predict_rows(chunk, |row| evaluator.evaluate(row))
    });
    let predictions: Vec<f32> = parts.into_iter().flatten().collect();
    (predictions, start.elapsed(), None)
}

fn predict_rows(chunk: ArrayView2<f32>, mut predict: impl FnMut(&[f32]) -> f32) -> Vec<f32> {
    let mut scratch = Vec::new();
    chunk
        .rows()
        .into_iter()
        .map(|row| match row.as_slice() {
            Some(row) => predict(row),
            None => {
                scratch.clear();
                scratch.extend(row.iter().copied());
                predict(&scratch)
            }
        })
        .collect()
}

/// Write one prediction per line with 17 fixed decimals.
pub fn write_predictions(mut writer: impl Write, predictions: &[f32]) -> io::Result<()> {
    for p in predictions {
        writeln!(writer, "{p:.17}")?;
    }
    writer.flush()
}

pub fn write_predictions_file(path: impl AsRef<Path>, predictions: &[f32]) -> io::Result<()> {
    let path = path.as_ref();
    debug!("writing {} predictions to {}", predictions.len(), path.display());
    write_predictions(BufWriter::new(File::create(path)?), predictions)
}
