// The 8x8 note grid. Rows are pitches (row 0 on top), columns are time steps.
// Every operation is synchronous and touches nothing but the cells; change
// notifications are the caller's job.

use crate::error::SequencerError;
use crate::shared::{NUM_COLS, NUM_ROWS};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    cells: [[bool; NUM_COLS]; NUM_ROWS],
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// Flip one cell and return its new state. Out-of-range cells stay inactive.
    pub fn toggle(&mut self, row: usize, col: usize) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = !*cell;
                *cell
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.cells = [[false; NUM_COLS]; NUM_ROWS];
    }

    /// Overwrite the whole grid. The matrix must be exactly NUM_ROWS x NUM_COLS,
    /// otherwise nothing is written.
    pub fn set_from_matrix<R: AsRef<[bool]>>(&mut self, matrix: &[R]) -> Result<(), SequencerError> {
        let ragged = matrix.iter().find(|row| row.as_ref().len() != NUM_COLS);
        if matrix.len() != NUM_ROWS || ragged.is_some() {
            let cols = ragged
                .or(matrix.first())
                .map(|row| row.as_ref().len())
                .unwrap_or(0);
            return Err(SequencerError::ShapeMismatch { rows: matrix.len(), cols });
        }

        for (dst, src) in self.cells.iter_mut().zip(matrix) {
            dst.copy_from_slice(src.as_ref());
        }
        Ok(())
    }

    /// Rows that are active in `col`, top to bottom. The iterator borrows the
    /// grid and can be cloned to walk the column again.
    pub fn active_in_column(&self, col: usize) -> impl Iterator<Item = usize> + Clone + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, row)| row.get(col).copied().unwrap_or(false))
            .map(|(row, _)| row)
    }

    pub fn count_active(&self) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell).count()
    }

    pub fn to_matrix(&self) -> [[bool; NUM_COLS]; NUM_ROWS] {
        self.cells
    }
}
