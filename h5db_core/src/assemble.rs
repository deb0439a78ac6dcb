//! Window assembly: copies one variable-length feature matrix into its
//! fixed-size row of the feature tensor.
//!
//! Time step `t` holds the context window of frames
//! `[t * context_length, (t + 1) * context_length)`, laid out frame after
//! frame. A step is filled only while the window ends strictly before the
//! last frame (`t * context_length < n_frames - context_length`); with a
//! context of one frame the condition is just `t < n_frames`. Steps that do
//! not qualify stay zero and frames beyond the last step are dropped.

use ndarray::{ArrayView2, ArrayViewMut2, s};

use crate::plan::ShapePlan;

/// What happened to one sample's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// `steps` leading time steps were written; the rest stay zero.
    Filled { steps: usize },
    /// The matrix width disagrees with the run's feature dimensionality and
    /// nothing was written.
    DimensionMismatch { expected: usize, found: usize },
}

/// Number of leading time steps a sequence of `n_frames` frames fills.
pub fn populated_steps(n_frames: usize, max_steps: usize, context_length: usize) -> usize {
    if context_length == 1 {
        return n_frames.min(max_steps);
    }
    (0..max_steps)
        .take_while(|t| t * context_length + context_length < n_frames)
        .count()
}

/// Copy `frames` into `row`, a `(max_steps, context_length * feature_dim)`
/// view of one sample in the feature tensor.
pub fn fill_sample(
    mut row: ArrayViewMut2<'_, f64>,
    frames: ArrayView2<'_, f64>,
    plan: &ShapePlan,
) -> WindowOutcome {
    let ctx = plan.context_length;
    let dim = plan.feature_dim;
    let steps = populated_steps(frames.nrows(), plan.max_steps, ctx);
    if steps == 0 {
        return WindowOutcome::Filled { steps: 0 };
    }
    if frames.ncols() != dim {
        return WindowOutcome::DimensionMismatch {
            expected: dim,
            found: frames.ncols(),
        };
    }

    for t in 0..steps {
        let window = frames.slice(s![t * ctx..(t + 1) * ctx, ..]);
        let mut slot = row.row_mut(t);
        for (c, frame) in window.outer_iter().enumerate() {
            slot.slice_mut(s![c * dim..(c + 1) * dim]).assign(&frame);
        }
    }

    WindowOutcome::Filled { steps }
}
