//! Cross-validation fold grouping and the row reordering that makes each
//! fold a contiguous block of the output tensors.

use ndarray::{Array, Axis, RemoveAxis};
use serde::Serialize;

use crate::FoldStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub id: i64,
    /// Sample indices in processing order.
    pub samples: Vec<usize>,
}

/// Fold id to sample indices, kept in the order fold ids were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldIndex {
    folds: Vec<Fold>,
}

impl FoldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut index = Self::new();
        for (sample, id) in ids.into_iter().enumerate() {
            index.push(id, sample);
        }
        index
    }

    pub fn push(&mut self, id: i64, sample: usize) {
        match self.folds.iter_mut().find(|fold| fold.id == id) {
            Some(fold) => fold.samples.push(sample),
            None => self.folds.push(Fold {
                id,
                samples: vec![sample],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fold> {
        self.folds.iter()
    }

    pub fn total_samples(&self) -> usize {
        self.folds.iter().map(|fold| fold.samples.len()).sum()
    }

    /// `permutation[new_row] = old_row`: folds back to back, each keeping its
    /// internal order.
    pub fn permutation(&self) -> Vec<usize> {
        self.folds
            .iter()
            .flat_map(|fold| fold.samples.iter().copied())
            .collect()
    }

    pub fn offsets(&self) -> FoldOffsets {
        let mut offsets = FoldOffsets::default();
        let mut start = 0;
        for fold in &self.folds {
            let end = start + fold.samples.len();
            offsets.ids.push(fold.id);
            offsets.start.push(start);
            offsets.end.push(end);
            start = end;
        }
        offsets
    }
}

/// Half-open row range `[start[i], end[i])` of fold `ids[i]` in the
/// reordered tensors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoldOffsets {
    pub ids: Vec<i64>,
    pub start: Vec<usize>,
    pub end: Vec<usize>,
}

impl FoldOffsets {
    pub fn len(&self) -> usize {
        self.start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
    }
}

/// Reorder the rows (axis 0) of `array` so that new row `i` is old row
/// `permutation[i]`.
pub fn reorder_rows<D: RemoveAxis>(
    array: &mut Array<f64, D>,
    permutation: &[usize],
    storage: FoldStorage,
) {
    debug_assert_eq!(array.len_of(Axis(0)), permutation.len());
    match storage {
        FoldStorage::Copy => {
            let mut ordered = Array::zeros(array.raw_dim());
            for (mut dest, &src) in ordered.axis_iter_mut(Axis(0)).zip(permutation) {
                dest.assign(&array.index_axis(Axis(0), src));
            }
            *array = ordered;
        }
        FoldStorage::InPlace => permute_rows_in_place(array, permutation),
    }
}

// Walks each permutation cycle once, carrying rows through two scratch
// buffers the size of a single row.
fn permute_rows_in_place<D: RemoveAxis>(array: &mut Array<f64, D>, permutation: &[usize]) {
    if permutation.is_empty() {
        return;
    }
    let mut first = array.index_axis(Axis(0), 0).to_owned();
    let mut carry = first.clone();
    let mut placed = vec![false; permutation.len()];

    for start in 0..permutation.len() {
        if placed[start] {
            continue;
        }
        if permutation[start] == start {
            placed[start] = true;
            continue;
        }
        first.assign(&array.index_axis(Axis(0), start));
        let mut dest = start;
        loop {
            placed[dest] = true;
            let src = permutation[dest];
            if src == start {
                array.index_axis_mut(Axis(0), dest).assign(&first);
                break;
            }
            carry.assign(&array.index_axis(Axis(0), src));
            array.index_axis_mut(Axis(0), dest).assign(&carry);
            dest = src;
        }
    }
}
