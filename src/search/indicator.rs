//! Leaf Indicator: one slot per (shape, size, rotation) hypothesis.

use crate::util::{LeafMatchError, LeafMatchResult};

/// Flat indicator vector.
///
/// Slot `shape * sizes * rotations + size * rotations + rotation` is 1 when
/// that hypothesis matched and 0 otherwise. The length is fixed at
/// construction.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafIndicator {
    num_shapes: usize,
    num_sizes: usize,
    num_rotations: usize,
    values: Vec<f32>,
}

/// One cell of the scatterplot layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScatterPoint {
    pub column: usize,
    pub row: usize,
    pub name: String,
    pub set: bool,
}

impl LeafIndicator {
    pub fn new(num_shapes: usize, num_sizes: usize, num_rotations: usize) -> Self {
        let len = num_shapes * num_sizes * num_rotations;
        Self {
            num_shapes,
            num_sizes,
            num_rotations,
            values: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.num_shapes, self.num_sizes, self.num_rotations)
    }

    /// Flat index of a hypothesis.
    pub fn index(&self, shape: usize, size: usize, rotation: usize) -> LeafMatchResult<usize> {
        check(shape, self.num_shapes, "shape id")?;
        check(size, self.num_sizes, "size id")?;
        check(rotation, self.num_rotations, "rotation id")?;
        Ok(shape * self.num_sizes * self.num_rotations + size * self.num_rotations + rotation)
    }

    /// Marks a hypothesis as matched.
    pub fn set(&mut self, shape: usize, size: usize, rotation: usize) -> LeafMatchResult<()> {
        let idx = self.index(shape, size, rotation)?;
        self.values[idx] = 1.0;
        Ok(())
    }

    pub fn is_set(&self, shape: usize, size: usize, rotation: usize) -> LeafMatchResult<bool> {
        Ok(self.values[self.index(shape, size, rotation)?] != 0.0)
    }

    /// Flat values for a plotting collaborator.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn count_set(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }

    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    /// Lays the slots out row-major on a `columns x rows` grid.
    ///
    /// Slots beyond the grid capacity are dropped.
    pub fn scatter_points(&self, columns: usize, rows: usize) -> Vec<ScatterPoint> {
        if columns == 0 {
            return Vec::new();
        }
        let count = self.values.len().min(columns * rows);
        self.values[..count]
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let (column, row) = (i % columns, i / columns);
                ScatterPoint {
                    column,
                    row,
                    name: format!("point_x{column:02}y{row:02}"),
                    set: v != 0.0,
                }
            })
            .collect()
    }
}

fn check(index: usize, len: usize, context: &'static str) -> LeafMatchResult<()> {
    if index >= len {
        return Err(LeafMatchError::IndexOutOfBounds {
            index,
            len,
            context,
        });
    }
    Ok(())
}
