//! Longest-common-subsequence alignment of two token sequences.
//!
//! [`align`] turns a previous and a current sequence into an [`EditScript`]:
//! an ordered list of [`EditStep`]s that consume both sequences from left to
//! right. Every step carries the index pair it consumes.
//!
//! # Algorithm
//!
//! 1. Trim the shared prefix and the shared suffix. They become `Skip` steps
//!    directly and never enter the matrix.
//! 2. Fill an edit-cost matrix over the remaining span, from the bottom-right
//!    corner back to the origin. Equal tokens take the diagonal (`Skip`);
//!    otherwise the cheaper of "consume previous" (`Remove`) and "consume
//!    current" (`Add`) is recorded. Equal costs choose `Add`.
//! 3. Walk the recorded directions from the origin to emit the span's steps.
//!
//! # Complexity
//!
//! - Time: O(n * m) over the trimmed span only
//! - Space: O(n * m) for the direction matrix

use std::fmt;

/// One step of an edit script.
///
/// `previous` and `current` are the positions in the previous and current
/// sequences at the moment the step is taken. `Skip` consumes one element of
/// each; `Remove` consumes `previous[previous]`; `Add` consumes
/// `current[current]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditStep {
    /// Both elements are equal.
    Skip { previous: usize, current: usize },
    /// `current[current]` is inserted before `previous[previous]`.
    Add { previous: usize, current: usize },
    /// `previous[previous]` is deleted.
    Remove { previous: usize, current: usize },
}

impl EditStep {
    /// Check if this is a Skip step
    pub fn is_skip(&self) -> bool {
        matches!(self, EditStep::Skip { .. })
    }
}

/// The result of aligning two sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditScript {
    steps: Vec<EditStep>,
    prefix: usize,
    suffix: usize,
}

impl EditScript {
    /// The steps, in order.
    pub fn steps(&self) -> &[EditStep] {
        &self.steps
    }

    /// Length of the shared prefix.
    pub fn prefix(&self) -> usize {
        self.prefix
    }

    /// Length of the shared suffix.
    pub fn suffix(&self) -> usize {
        self.suffix
    }

    /// Number of `Add` steps.
    pub fn additions(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, EditStep::Add { .. }))
            .count()
    }

    /// Number of `Remove` steps.
    pub fn removals(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, EditStep::Remove { .. }))
            .count()
    }

    /// Returns `true` if the script only skips.
    pub fn is_identity(&self) -> bool {
        self.steps.iter().all(EditStep::is_skip)
    }

    /// Iterate over the steps.
    pub fn iter(&self) -> std::slice::Iter<'_, EditStep> {
        self.steps.iter()
    }
}

impl IntoIterator for EditScript {
    type Item = EditStep;
    type IntoIter = std::vec::IntoIter<EditStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditStep;
    type IntoIter = std::slice::Iter<'a, EditStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    /// Diagonal: tokens are equal.
    Skip,
    /// Consume one previous element.
    Right,
    /// Consume one current element.
    Down,
}

#[derive(Clone, Copy)]
struct Cell {
    cost: u32,
    direction: Direction,
}

/// Cost/direction matrix over the trimmed span.
///
/// Rows index the current span, columns the previous span; both include one
/// extra terminal row/column.
struct Matrix {
    cols: usize,
    cells: Vec<Cell>,
}

impl Matrix {
    fn new(cols: usize, rows: usize) -> Self {
        let width = cols + 1;
        let mut cells = vec![
            Cell {
                cost: 0,
                direction: Direction::Skip,
            };
            width * (rows + 1)
        ];

        // last row: only previous elements remain
        for j in 0..cols {
            cells[rows * width + j] = Cell {
                cost: (cols - j) as u32,
                direction: Direction::Right,
            };
        }
        // last column: only current elements remain
        for i in 0..rows {
            cells[i * width + cols] = Cell {
                cost: (rows - i) as u32,
                direction: Direction::Down,
            };
        }

        Self { cols, cells }
    }

    fn at(&self, i: usize, j: usize) -> Cell {
        self.cells[i * (self.cols + 1) + j]
    }

    fn set(&mut self, i: usize, j: usize, cell: Cell) {
        let width = self.cols + 1;
        self.cells[i * width + j] = cell;
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("cols", &self.cols)
            .field("cells", &self.cells.len())
            .finish()
    }
}

/// Align `previous` against `current`.
pub fn align<T: Eq>(previous: &[T], current: &[T]) -> EditScript {
    let prefix = common_prefix(previous, current);
    let suffix = common_suffix(&previous[prefix..], &current[prefix..]);

    let span_prev = &previous[prefix..previous.len() - suffix];
    let span_cur = &current[prefix..current.len() - suffix];

    let mut steps = Vec::with_capacity(previous.len().max(current.len()));
    steps.extend((0..prefix).map(|k| EditStep::Skip {
        previous: k,
        current: k,
    }));

    if !span_prev.is_empty() || !span_cur.is_empty() {
        let matrix = fill(span_prev, span_cur);
        walk(&matrix, span_prev.len(), span_cur.len(), prefix, &mut steps);
    }

    let prev_tail = previous.len() - suffix;
    let cur_tail = current.len() - suffix;
    steps.extend((0..suffix).map(|k| EditStep::Skip {
        previous: prev_tail + k,
        current: cur_tail + k,
    }));

    EditScript {
        steps,
        prefix,
        suffix,
    }
}

fn common_prefix<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn fill<T: Eq>(previous: &[T], current: &[T]) -> Matrix {
    let cols = previous.len();
    let rows = current.len();
    let mut matrix = Matrix::new(cols, rows);

    for j in (0..cols).rev() {
        for i in (0..rows).rev() {
            let cell = if previous[j] == current[i] {
                Cell {
                    cost: matrix.at(i + 1, j + 1).cost,
                    direction: Direction::Skip,
                }
            } else {
                let right = matrix.at(i, j + 1).cost;
                let down = matrix.at(i + 1, j).cost;
                // ties go Down (Add before Remove)
                if right < down {
                    Cell {
                        cost: right + 1,
                        direction: Direction::Right,
                    }
                } else {
                    Cell {
                        cost: down + 1,
                        direction: Direction::Down,
                    }
                }
            };
            matrix.set(i, j, cell);
        }
    }

    matrix
}

fn walk(matrix: &Matrix, cols: usize, rows: usize, offset: usize, steps: &mut Vec<EditStep>) {
    let (mut i, mut j) = (0, 0);
    while i < rows || j < cols {
        let previous = offset + j;
        let current = offset + i;
        match matrix.at(i, j).direction {
            Direction::Skip => {
                steps.push(EditStep::Skip { previous, current });
                i += 1;
                j += 1;
            }
            Direction::Right => {
                steps.push(EditStep::Remove { previous, current });
                j += 1;
            }
            Direction::Down => {
                steps.push(EditStep::Add { previous, current });
                i += 1;
            }
        }
    }
}
