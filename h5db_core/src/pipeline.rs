//! End-to-end build: index → shape plan → labels → windows → folds → writer.

use ndarray::{Array2, Array3, ArrayViewD, Axis, IxDyn};
use tracing::{debug, info, warn};

use h5db_tools::read_matrix;

use crate::{
    BuildConfig, BuildError,
    assemble::{WindowOutcome, fill_sample},
    folds::{FoldIndex, FoldOffsets, reorder_rows},
    labels::extract_labels,
    metadata::MetadataIndex,
    plan::ShapePlan,
    report::{BuildReport, SkippedSample},
    writer::write_dataset,
};

/// In-memory result of a build, ready for the writer.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `(n_samples, max_steps, context_length * feature_dim)`; see
    /// [`ShapePlan`] for how the layouts map onto it.
    pub features: Array3<f64>,
    pub labels: Array2<f64>,
    pub plan: ShapePlan,
    /// Present once rows are fold-ordered.
    pub folds: Option<FoldOffsets>,
}

impl Dataset {
    /// Features in the layout's shape, without copying.
    pub fn feature_view(&self) -> Result<ArrayViewD<'_, f64>, BuildError> {
        let shape = self.plan.feature_shape();
        Ok(self.features.view().into_shape_with_order(IxDyn(&shape))?)
    }
}

#[derive(Debug, Clone)]
pub struct Assembled {
    pub dataset: Dataset,
    pub skipped: Vec<SkippedSample>,
}

/// Assemble the dataset described by `config` without writing anything.
pub fn assemble(config: &BuildConfig) -> Result<Assembled, BuildError> {
    config.validate()?;
    let mut index = MetadataIndex::load(config)?;

    let plan = ShapePlan::new(
        index.samples.len(),
        config.max_time_steps,
        config.context_length,
        index.feature_dim,
        config.label_columns.len(),
        config.layout,
    )?;

    info!("input dim: {}", plan.feature_dim);
    info!("number of samples: {}", plan.n_samples);
    info!("number of labels: {}", plan.n_labels);
    info!("max steps: {}", plan.max_steps);
    info!("context windows: {}", plan.context_length);
    info!("layout: {} shape {:?}", plan.layout, plan.feature_shape());

    let mut labels = extract_labels(&index.samples, &config.label_columns, &config.input)?;
    let mut features = Array3::zeros(plan.storage_shape());
    let mut fold_index = FoldIndex::new();
    let mut skipped = Vec::new();
    let format = config.feature_format();
    let mut first_frames = index.take_first_frames();

    for (idx, sample) in index.samples.iter().enumerate() {
        let frames = match first_frames.take_if(|(line, _)| *line == sample.line) {
            Some((_, frames)) => frames,
            None => read_matrix(&sample.feature_path, format)?,
        };
        let row = features.index_axis_mut(Axis(0), idx);
        match fill_sample(row, frames.view(), &plan) {
            WindowOutcome::Filled { steps } => {
                debug!(
                    "processing: {} : {} ({} frames, {} steps)",
                    idx + 1,
                    sample.feature_path.display(),
                    frames.nrows(),
                    steps
                );
            }
            WindowOutcome::DimensionMismatch { expected, found } => {
                warn!(
                    "inconsistent dim: {} has {} columns, expected {}; row left empty",
                    sample.feature_path.display(),
                    found,
                    expected
                );
                skipped.push(SkippedSample {
                    sample_index: idx,
                    line: sample.line,
                    feature_path: sample.feature_path.clone(),
                    expected_dim: expected,
                    found_dim: found,
                });
            }
        }
        if let Some(id) = sample.fold_id {
            fold_index.push(id, idx);
        }
    }

    info!("successfully wrote samples: {}", index.samples.len());

    let folds = if config.fold_mode() {
        if fold_index.len() != config.n_folds {
            warn!(
                "{} folds requested but the index holds {} distinct fold ids",
                config.n_folds,
                fold_index.len()
            );
        }
        let permutation = fold_index.permutation();
        reorder_rows(&mut features, &permutation, config.fold_storage);
        reorder_rows(&mut labels, &permutation, config.fold_storage);
        let offsets = fold_index.offsets();
        for i in 0..offsets.len() {
            info!(
                "corpus: {} (fold {}) starting from: {} ends: {}",
                i, offsets.ids[i], offsets.start[i], offsets.end[i]
            );
        }
        info!("total cv: {}", offsets.len());
        Some(offsets)
    } else {
        None
    };

    Ok(Assembled {
        dataset: Dataset {
            features,
            labels,
            plan,
            folds,
        },
        skipped,
    })
}

/// Assemble and persist the dataset, returning the build report.
pub fn build(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    let Assembled { dataset, skipped } = assemble(config)?;

    let output = config.output_path();
    write_dataset(&dataset, &output, config.format)?;
    info!("shape of feat: {:?}", dataset.plan.feature_shape());
    info!("shape of label: {:?}", dataset.labels.shape());
    info!("wrote {}", output.display());

    let plan = dataset.plan;
    let (label_rows, label_cols) = plan.label_shape();
    let report = BuildReport {
        input: config.input.clone(),
        output,
        format: config.format,
        layout: plan.layout,
        n_samples: plan.n_samples,
        n_labels: plan.n_labels,
        feature_dim: plan.feature_dim,
        context_length: plan.context_length,
        max_steps: plan.max_steps,
        feature_shape: plan.feature_shape(),
        label_shape: [label_rows, label_cols],
        folds: dataset.folds,
        skipped,
    };

    if config.write_report {
        let path = config.report_path();
        report.write(&path)?;
        debug!("build report at {}", path.display());
    }

    Ok(report)
}
