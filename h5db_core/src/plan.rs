use serde::Serialize;

use crate::{BuildError, LayoutMode};

/// Output shapes of a build, fixed before the first sample is copied.
///
/// The feature tensor is always stored as `(n_samples, max_steps,
/// context_length * feature_dim)`. The two-d and three-d layouts only insert
/// unit axes into that shape, so every layout shares the same row-major
/// element order and [`ShapePlan::feature_shape`] is a pure reshape of the
/// storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapePlan {
    pub n_samples: usize,
    pub max_steps: usize,
    pub context_length: usize,
    pub feature_dim: usize,
    pub n_labels: usize,
    pub layout: LayoutMode,
}

impl ShapePlan {
    pub fn new(
        n_samples: usize,
        max_time_steps: usize,
        context_length: usize,
        feature_dim: usize,
        n_labels: usize,
        layout: LayoutMode,
    ) -> Result<Self, BuildError> {
        if context_length == 0 {
            return Err(BuildError::InvalidConfig(
                "context length must be at least 1".to_string(),
            ));
        }
        let max_steps = max_time_steps / context_length;
        if max_steps == 0 {
            return Err(BuildError::ContextTooLong {
                context_length,
                max_time_steps,
            });
        }
        Ok(Self {
            n_samples,
            max_steps,
            context_length,
            feature_dim,
            n_labels,
            layout,
        })
    }

    /// Elements per time step: one context window of frames.
    pub fn window_width(&self) -> usize {
        self.context_length * self.feature_dim
    }

    pub fn storage_shape(&self) -> (usize, usize, usize) {
        (self.n_samples, self.max_steps, self.window_width())
    }

    /// Shape of `feat` as written for the active layout.
    pub fn feature_shape(&self) -> Vec<usize> {
        let (n, steps, ctx, dim) = (
            self.n_samples,
            self.max_steps,
            self.context_length,
            self.feature_dim,
        );
        match self.layout {
            LayoutMode::Flat => vec![n, steps, ctx * dim],
            LayoutMode::TwoD => vec![n, steps, 1, ctx, dim],
            LayoutMode::ThreeD => vec![n, 1, steps, ctx, dim],
        }
    }

    pub fn label_shape(&self) -> (usize, usize) {
        (self.n_samples, self.n_labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flat_shape_stacks_context_into_last_axis() {
        let plan = ShapePlan::new(10, 50, 3, 40, 5, LayoutMode::Flat).unwrap();
        assert_eq!(plan.max_steps, 16);
        assert_eq!(plan.feature_shape(), vec![10, 16, 120]);
        assert_eq!(plan.label_shape(), (10, 5));
    }

    #[test]
    fn grid_layouts_insert_unit_axes() {
        let two_d = ShapePlan::new(4, 8, 2, 3, 1, LayoutMode::TwoD).unwrap();
        assert_eq!(two_d.feature_shape(), vec![4, 4, 1, 2, 3]);
        let three_d = ShapePlan::new(4, 8, 2, 3, 1, LayoutMode::ThreeD).unwrap();
        assert_eq!(three_d.feature_shape(), vec![4, 1, 4, 2, 3]);
    }

    #[test]
    fn context_longer_than_steps_is_rejected() {
        let err = ShapePlan::new(1, 3, 4, 2, 1, LayoutMode::Flat).unwrap_err();
        assert!(matches!(err, BuildError::ContextTooLong { .. }));
        assert!(ShapePlan::new(1, 3, 0, 2, 1, LayoutMode::Flat).is_err());
    }

    proptest! {
        #[test]
        fn shapes_follow_the_layout_formula(
            n in 0usize..64,
            max_t in 1usize..200,
            ctx in 1usize..10,
            dim in 1usize..32,
            labels in 1usize..8,
        ) {
            prop_assume!(ctx <= max_t);
            for layout in [LayoutMode::Flat, LayoutMode::TwoD, LayoutMode::ThreeD] {
                let plan = ShapePlan::new(n, max_t, ctx, dim, labels, layout).unwrap();
                let steps = max_t / ctx;
                let expected = match layout {
                    LayoutMode::Flat => vec![n, steps, dim * ctx],
                    LayoutMode::TwoD => vec![n, steps, 1, ctx, dim],
                    LayoutMode::ThreeD => vec![n, 1, steps, ctx, dim],
                };
                prop_assert_eq!(plan.feature_shape(), expected);
                let storage = plan.storage_shape();
                prop_assert_eq!(
                    storage.0 * storage.1 * storage.2,
                    plan.feature_shape().iter().product::<usize>()
                );
            }
        }
    }
}
