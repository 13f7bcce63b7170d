//! Population-count discretization.
//!
//! A raw label is a 2-row matrix (row 0 = region indices, row 1 = population
//! counts). Classification appends a third row holding the class bin id.

use ndarray::{s, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

/// Supported class-bin layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassScheme {
    /// Decade edges: 1, 10, 100, 1000, 10000
    Six,
    /// Power-of-two edges: 2^0 .. 2^14
    Sixteen,
}

const SIX_EDGES: [f64; 5] = [1.0, 10.0, 100.0, 1000.0, 10000.0];

impl ClassScheme {
    /// Resolve a class count (6 or 16) into a scheme
    pub fn from_classes(classes: u32) -> DatasetResult<Self> {
        match classes {
            6 => Ok(ClassScheme::Six),
            16 => Ok(ClassScheme::Sixteen),
            other => Err(DatasetError::InvalidConfig(format!(
                "classes must be 6 or 16, got {}",
                other
            ))),
        }
    }

    /// Total number of classes, overflow bin included
    pub fn num_classes(&self) -> usize {
        self.edges().len() + 1
    }

    /// Ascending bin edges
    pub fn edges(&self) -> Vec<f64> {
        match self {
            ClassScheme::Six => SIX_EDGES.to_vec(),
            ClassScheme::Sixteen => (0..15).map(|p| (1u32 << p) as f64).collect(),
        }
    }

    /// Bin id of a single count: index of the first edge strictly greater than
    /// `count`, or the overflow bin when no edge is.
    pub fn bin_for_count(&self, count: f64) -> u8 {
        let edges = self.edges();
        edges
            .iter()
            .position(|&edge| count < edge)
            .unwrap_or(edges.len()) as u8
    }
}

/// 2-row label as read from a label file: indices over population counts
#[derive(Debug, Clone, PartialEq)]
pub struct RawLabel {
    rows: Array2<f64>,
}

impl RawLabel {
    /// # Returns
    /// * `Err(DatasetError::LabelShape)` if the two rows differ in length
    pub fn new(indices: &[f64], populations: &[f64]) -> DatasetResult<Self> {
        let shape_err = || DatasetError::LabelShape {
            indices: indices.len(),
            populations: populations.len(),
        };
        if indices.len() != populations.len() {
            return Err(shape_err());
        }
        let n = indices.len();
        let mut flat = Vec::with_capacity(2 * n);
        flat.extend_from_slice(indices);
        flat.extend_from_slice(populations);
        let rows = Array2::from_shape_vec((2, n), flat).map_err(|_| shape_err())?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &Array2<f64> {
        &self.rows
    }

    pub fn populations(&self) -> ArrayView1<'_, f64> {
        self.rows.row(1)
    }
}

/// Raw label with an appended class-id row
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLabel {
    rows: Array2<f64>,
    class_id: u8,
}

impl ClassifiedLabel {
    pub fn rows(&self) -> &Array2<f64> {
        &self.rows
    }

    pub fn indices(&self) -> ArrayView1<'_, f64> {
        self.rows.row(0)
    }

    pub fn populations(&self) -> ArrayView1<'_, f64> {
        self.rows.row(1)
    }

    /// Class shared by every region of the sample
    pub fn class_id(&self) -> u8 {
        self.class_id
    }
}

/// The count a sample is classified by.
///
/// Only the first region's count is consulted, so multi-region samples share
/// one class.
pub fn leading_count(raw: &RawLabel) -> Option<f64> {
    raw.populations().get(0).copied()
}

/// Append the class-id row to a raw label.
///
/// The id derived from [`leading_count`] is broadcast across every column,
/// so the result always has exactly one more row than `raw`.
pub fn classify(raw: &RawLabel, scheme: ClassScheme) -> ClassifiedLabel {
    let class_id = leading_count(raw)
        .map(|count| scheme.bin_for_count(count))
        .unwrap_or(0);
    let (height, width) = raw.rows.dim();
    let mut rows = Array2::zeros((height + 1, width));
    rows.slice_mut(s![..height, ..]).assign(&raw.rows);
    rows.row_mut(height).fill(class_id as f64);
    ClassifiedLabel { rows, class_id }
}
