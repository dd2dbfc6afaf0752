//! Grid storage and the neighbour shift/unshift index scheme.
//!
//! Every layer is a row-major `Grid`. Neighbour lookups go through a padded
//! copy of the grid (one zero cell on every edge) and a set of precomputed
//! flat indices into that padded buffer, one map per compass direction.
//! Cells whose neighbour falls outside the domain read the zero border, so
//! nothing wraps around and nothing enters from outside.

use serde::{Deserialize, Serialize};

/// A 2-D `f32` field over the simulation domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr", into = "GridRepr")]
pub struct Grid {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

/// Serialized form; checked against its dimensions on load.
#[derive(Serialize, Deserialize)]
struct GridRepr {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        Grid::from_vec(repr.height, repr.width, repr.data)
    }
}

impl From<Grid> for GridRepr {
    fn from(grid: Grid) -> Self {
        GridRepr {
            height: grid.height,
            width: grid.width,
            data: grid.data,
        }
    }
}

impl Grid {
    /// Create a grid filled with zeros.
    pub fn zeros(height: usize, width: usize) -> Result<Self, GridError> {
        Self::filled(height, width, 0.0)
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(height: usize, width: usize, value: f32) -> Result<Self, GridError> {
        if height == 0 || width == 0 {
            return Err(GridError::InvalidDimensions { height, width });
        }
        Ok(Self {
            height,
            width,
            data: vec![value; height * width],
        })
    }

    /// Wrap a row-major buffer.
    pub fn from_vec(height: usize, width: usize, data: Vec<f32>) -> Result<Self, GridError> {
        if height == 0 || width == 0 {
            return Err(GridError::InvalidDimensions { height, width });
        }
        if data.len() != height * width {
            return Err(GridError::BufferLength {
                expected: height * width,
                found: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Build a grid from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(GridError::InvalidDimensions { height, width });
        }

        let mut data = Vec::with_capacity(height * width);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != width {
                return Err(GridError::RowLength {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            data.extend(values);
        }

        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// A zero grid with the same shape as `self`.
    pub fn zeros_like(&self) -> Self {
        Self {
            height: self.height,
            width: self.width,
            data: vec![0.0; self.data.len()],
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// (height, width)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert (row, col) to a flat index.
    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Value at (row, col), or `None` outside the grid.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.data[self.idx(row, col)])
        } else {
            None
        }
    }

    /// Set the value at (row, col). Out-of-range writes are rejected.
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<(), GridError> {
        if row >= self.height || col >= self.width {
            return Err(GridError::OutOfBounds {
                row,
                col,
                height: self.height,
                width: self.width,
            });
        }
        let idx = self.idx(row, col);
        self.data[idx] = value;
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.data.chunks(self.width).map(<[f32]>::to_vec).collect()
    }

    /// Total quantity, accumulated in f64 to keep drift checks meaningful.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| f64::from(v)).sum()
    }

    pub fn min(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Add `value` to every cell.
    pub fn add_scalar(&mut self, value: f32) {
        for v in &mut self.data {
            *v += value;
        }
    }
}

/// The four direct neighbours of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Row - 1.
    Up,
    /// Row + 1.
    Down,
    /// Column - 1.
    Left,
    /// Column + 1.
    Right,
}

impl Direction {
    /// All directions, in the order used for every per-direction array.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Position of this direction in per-direction arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// (row offset, column offset)
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Extend a grid by one zero-valued cell on every edge.
///
/// Zero fill is the only boundary policy: a neighbour outside the domain
/// holds nothing and receives nothing.
pub fn pad(grid: &Grid) -> Grid {
    let padded_width = grid.width + 2;
    let mut data = vec![0.0f32; (grid.height + 2) * padded_width];

    for (row, values) in grid.data.chunks(grid.width).enumerate() {
        let start = (row + 1) * padded_width + 1;
        data[start..start + grid.width].copy_from_slice(values);
    }

    Grid {
        height: grid.height + 2,
        width: padded_width,
        data,
    }
}

/// Remove the one-cell border added by [`pad`].
pub fn center_cut(padded: &Grid) -> Result<Grid, GridError> {
    if padded.height < 3 || padded.width < 3 {
        return Err(GridError::TooSmallToCut {
            height: padded.height,
            width: padded.width,
        });
    }

    let height = padded.height - 2;
    let width = padded.width - 2;
    let mut data = Vec::with_capacity(height * width);
    for row in 1..=height {
        let start = row * padded.width + 1;
        data.extend_from_slice(&padded.data[start..start + width]);
    }

    Ok(Grid {
        height,
        width,
        data,
    })
}

/// Precomputed neighbour indices into the padded buffer.
///
/// Built once from the unpadded shape. `index(dir)[i]` is the flat padded
/// index of cell `i`'s neighbour in direction `dir`; `in_domain(dir)[i]`
/// tells whether that neighbour is a real cell or part of the border.
#[derive(Debug, Clone)]
pub struct ShiftMaps {
    height: usize,
    width: usize,
    indices: [Vec<usize>; 4],
    in_domain: [Vec<bool>; 4],
}

impl ShiftMaps {
    pub fn new(height: usize, width: usize) -> Result<Self, GridError> {
        if height == 0 || width == 0 {
            return Err(GridError::InvalidDimensions { height, width });
        }

        let padded_width = width + 2;
        let indices = Direction::ALL.map(|dir| {
            let (dr, dc) = dir.offset();
            let mut map = Vec::with_capacity(height * width);
            for row in 0..height {
                for col in 0..width {
                    // Interior cell (row, col) sits at (row + 1, col + 1) in the padded frame.
                    let pr = (row as isize + 1 + dr) as usize;
                    let pc = (col as isize + 1 + dc) as usize;
                    map.push(pr * padded_width + pc);
                }
            }
            map
        });

        let in_domain = Direction::ALL.map(|dir| {
            let (dr, dc) = dir.offset();
            let mut mask = Vec::with_capacity(height * width);
            for row in 0..height as isize {
                for col in 0..width as isize {
                    let (nr, nc) = (row + dr, col + dc);
                    mask.push(nr >= 0 && nc >= 0 && nr < height as isize && nc < width as isize);
                }
            }
            mask
        });

        Ok(Self {
            height,
            width,
            indices,
            in_domain,
        })
    }

    /// Unpadded (height, width) these maps were built for.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Padded (height, width) the indices point into.
    #[inline]
    pub fn padded_shape(&self) -> (usize, usize) {
        (self.height + 2, self.width + 2)
    }

    #[inline]
    pub fn index(&self, dir: Direction) -> &[usize] {
        &self.indices[dir.index()]
    }

    /// Inverse map for scattering amounts sent in `dir` back to the receiver.
    #[inline]
    pub fn unshift_index(&self, dir: Direction) -> &[usize] {
        self.index(dir.opposite())
    }

    #[inline]
    pub fn in_domain(&self, dir: Direction) -> &[bool] {
        &self.in_domain[dir.index()]
    }

    fn check_unpadded(&self, grid: &Grid) -> Result<(), GridError> {
        if grid.shape() != self.shape() {
            return Err(GridError::ShapeMismatch {
                expected: self.shape(),
                found: grid.shape(),
            });
        }
        Ok(())
    }

    fn check_padded(&self, grid: &Grid) -> Result<(), GridError> {
        if grid.shape() != self.padded_shape() {
            return Err(GridError::ShapeMismatch {
                expected: self.padded_shape(),
                found: grid.shape(),
            });
        }
        Ok(())
    }
}

fn gather(padded: &Grid, map: &[usize], height: usize, width: usize) -> Grid {
    Grid {
        height,
        width,
        data: map.iter().map(|&i| padded.data[i]).collect(),
    }
}

/// Four neighbour views of an already padded grid, in [`Direction::ALL`] order.
pub fn shifted_padded(padded: &Grid, maps: &ShiftMaps) -> Result<[Grid; 4], GridError> {
    maps.check_padded(padded)?;
    let (height, width) = maps.shape();
    Ok(Direction::ALL.map(|dir| gather(padded, maps.index(dir), height, width)))
}

/// Four neighbour views of `grid`: cell `i` of view `dir` holds the value of
/// `i`'s neighbour in `dir`, or zero where that neighbour is outside.
pub fn shifted(grid: &Grid, maps: &ShiftMaps) -> Result<[Grid; 4], GridError> {
    maps.check_unpadded(grid)?;
    shifted_padded(&pad(grid), maps)
}

/// Scatter per-direction amounts into the receiving cell's frame.
///
/// `sent[dir]` holds what each cell sends toward its `dir` neighbour; view
/// `dir` of the result holds what each cell receives from its
/// `dir.opposite()` neighbour. Amounts sent across the edge are dropped.
pub fn unshifted(sent: &[Grid; 4], maps: &ShiftMaps) -> Result<[Grid; 4], GridError> {
    for grid in sent {
        maps.check_unpadded(grid)?;
    }
    let (height, width) = maps.shape();
    Ok(Direction::ALL.map(|dir| {
        let padded = pad(&sent[dir.index()]);
        gather(&padded, maps.unshift_index(dir), height, width)
    }))
}

/// Grid construction and indexing errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("Grid dimensions must be non-zero, got {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },
    #[error("Row {row} has {found} values, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Buffer holds {found} values, expected {expected}")]
    BufferLength { expected: usize, found: usize },
    #[error("Grid shape {found:?} does not match {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Cell ({row}, {col}) is outside a {height}x{width} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },
    #[error("A {height}x{width} grid has no interior to cut")]
    TooSmallToCut { height: usize, width: usize },
}
