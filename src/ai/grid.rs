//! Occupancy grid shared by the planner and every agent
//!
//! The grid is sampled once from the scene and never mutated afterwards.
//! World X maps to columns and world Z maps to rows; the origin is the world
//! position of the grid's minimum corner.

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Classification of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    /// Nothing on an obstacle layer above this cell
    #[default]
    Free,
    /// Scene geometry occupies this cell
    Blocked,
}

/// Integer (column, row) cell address.
///
/// Signed so that quantizing a world position outside the grid still yields
/// a value that can be rejected instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column index (world X)
    pub col: i32,
    /// Row index (world Z)
    pub row: i32,
}

impl GridCoord {
    /// Create a new coordinate
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Coordinate shifted by the given column/row delta
    #[must_use]
    pub const fn offset(self, dcol: i32, drow: i32) -> Self {
        Self {
            col: self.col + dcol,
            row: self.row + drow,
        }
    }

    /// Manhattan distance to another coordinate
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }

    /// True if `other` is exactly one cardinal step away
    #[must_use]
    pub fn is_cardinal_step(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Errors raised by grid construction and path queries
#[derive(Debug, Clone, PartialEq)]
pub enum NavError {
    /// A path was requested before any grid was installed
    GridNotBuilt,
    /// A world position quantized to a cell outside the grid
    OutOfBounds {
        /// The offending world position
        position: Vec3,
        /// The cell it quantized to
        coord: GridCoord,
    },
    /// Grid dimensions or cell data were inconsistent
    InvalidGrid(String),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridNotBuilt => write!(f, "navigation grid has not been built"),
            Self::OutOfBounds { position, coord } => {
                write!(f, "position {position} maps to cell {coord} outside the grid")
            }
            Self::InvalidGrid(e) => write!(f, "invalid grid: {e}"),
        }
    }
}

impl std::error::Error for NavError {}

/// Fixed-size, row-major occupancy grid
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    origin: Vec2,
    ground_height: f32,
    cells: Vec<CellState>,
}

impl OccupancyGrid {
    /// Create a grid from row-major cell data.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidGrid`] if the cell size is not positive or
    /// the cell count does not match `cols * rows`.
    pub fn from_cells(
        cols: usize,
        rows: usize,
        cell_size: f32,
        origin: Vec2,
        cells: Vec<CellState>,
    ) -> Result<Self, NavError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(NavError::InvalidGrid(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }
        if cols > i32::MAX as usize || rows > i32::MAX as usize {
            return Err(NavError::InvalidGrid(format!(
                "{cols}x{rows} exceeds the addressable range"
            )));
        }
        if cells.len() != cols * rows {
            return Err(NavError::InvalidGrid(format!(
                "expected {} cells for {cols}x{rows}, got {}",
                cols * rows,
                cells.len()
            )));
        }

        Ok(Self {
            cols,
            rows,
            cell_size,
            origin,
            ground_height: 0.0,
            cells,
        })
    }

    /// Create a grid by classifying every cell with a closure.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidGrid`] if the cell size is not positive.
    pub fn from_fn(
        cols: usize,
        rows: usize,
        cell_size: f32,
        origin: Vec2,
        mut classify: impl FnMut(GridCoord) -> CellState,
    ) -> Result<Self, NavError> {
        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(classify(GridCoord::new(col as i32, row as i32)));
            }
        }
        Self::from_cells(cols, rows, cell_size, origin, cells)
    }

    /// Parse a grid drawn as text: `#` is blocked, `.` is free.
    ///
    /// The first line is row 0. Leading and trailing blank lines and
    /// surrounding whitespace are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidGrid`] on ragged rows or unknown characters.
    pub fn from_ascii(text: &str, cell_size: f32, origin: Vec2) -> Result<Self, NavError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let cols = lines.first().map_or(0, |line| line.chars().count());
        let mut cells = Vec::with_capacity(cols * lines.len());

        for (row, line) in lines.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(NavError::InvalidGrid(format!(
                    "row {row} has {} cells, expected {cols}",
                    line.chars().count()
                )));
            }
            for ch in line.chars() {
                cells.push(match ch {
                    '#' => CellState::Blocked,
                    '.' => CellState::Free,
                    other => {
                        return Err(NavError::InvalidGrid(format!(
                            "unexpected character {other:?} in row {row}"
                        )));
                    }
                });
            }
        }

        Self::from_cells(cols, lines.len(), cell_size, origin, cells)
    }

    /// Set the world height that waypoints are placed at
    #[must_use]
    pub fn with_ground_height(mut self, height: f32) -> Self {
        self.ground_height = height;
        self
    }

    /// Number of columns
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell edge length in world units
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World X/Z of the grid's minimum corner
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World height of waypoints
    #[must_use]
    pub fn ground_height(&self) -> f32 {
        self.ground_height
    }

    /// Check if a coordinate lies inside the grid
    #[must_use]
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.col >= 0
            && coord.row >= 0
            && (coord.col as usize) < self.cols
            && (coord.row as usize) < self.rows
    }

    /// State of a cell. Anything outside the grid reads as blocked.
    #[must_use]
    pub fn state(&self, coord: GridCoord) -> CellState {
        if !self.contains(coord) {
            return CellState::Blocked;
        }
        self.cells[coord.row as usize * self.cols + coord.col as usize]
    }

    /// Check if a single cell is free (no clearance)
    #[must_use]
    pub fn is_free(&self, coord: GridCoord) -> bool {
        self.state(coord) == CellState::Free
    }

    /// Check if an agent with the given clearance can stand on a cell.
    ///
    /// Every cell in the square of half-width `clearance` around `coord`
    /// must be inside the grid and free.
    #[must_use]
    pub fn is_walkable(&self, coord: GridCoord, clearance: u32) -> bool {
        let r = clearance.min(i32::MAX as u32) as i32;
        for drow in -r..=r {
            for dcol in -r..=r {
                if !self.is_free(coord.offset(dcol, drow)) {
                    return false;
                }
            }
        }
        true
    }

    /// Number of free cells
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&cell| cell == CellState::Free)
            .count()
    }

    /// Quantize a world position to the cell containing it (not range checked)
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec3) -> GridCoord {
        let local = Vec2::new(pos.x, pos.z) - self.origin;
        GridCoord::new(
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
        )
    }

    /// Quantize a world position, rejecting positions outside the grid.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::OutOfBounds`] if the cell is not inside the grid.
    pub fn try_world_to_grid(&self, pos: Vec3) -> Result<GridCoord, NavError> {
        let coord = self.world_to_grid(pos);
        if self.contains(coord) {
            Ok(coord)
        } else {
            Err(NavError::OutOfBounds {
                position: pos,
                coord,
            })
        }
    }

    /// World position of a cell's center at ground height
    #[must_use]
    pub fn grid_to_world(&self, coord: GridCoord) -> Vec3 {
        Vec3::new(
            self.origin.x + (coord.col as f32 + 0.5) * self.cell_size,
            self.ground_height,
            self.origin.y + (coord.row as f32 + 0.5) * self.cell_size,
        )
    }

    /// Render the grid as text, one line per row (row 0 first)
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in self.cells.chunks(self.cols.max(1)).take(self.rows) {
            for cell in row {
                out.push(match cell {
                    CellState::Blocked => '#',
                    CellState::Free => '.',
                });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> OccupancyGrid {
        OccupancyGrid::from_ascii(
            "
            .....
            .#...
            .....
            ....#
            ",
            1.0,
            Vec2::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_from_ascii_dimensions() {
        let grid = small_grid();
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.state(GridCoord::new(1, 1)), CellState::Blocked);
        assert_eq!(grid.state(GridCoord::new(4, 3)), CellState::Blocked);
        assert_eq!(grid.free_count(), 18);
    }

    #[test]
    fn test_ascii_round_trip() {
        let grid = small_grid();
        let reparsed = OccupancyGrid::from_ascii(&grid.to_ascii(), 1.0, Vec2::ZERO).unwrap();
        assert_eq!(grid, reparsed);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = OccupancyGrid::from_ascii("...\n..\n", 1.0, Vec2::ZERO);
        assert!(matches!(result, Err(NavError::InvalidGrid(_))));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let result = OccupancyGrid::from_cells(1, 1, 0.0, Vec2::ZERO, vec![CellState::Free]);
        assert!(matches!(result, Err(NavError::InvalidGrid(_))));
    }

    #[test]
    fn test_out_of_range_reads_blocked() {
        let grid = small_grid();
        assert_eq!(grid.state(GridCoord::new(-1, 0)), CellState::Blocked);
        assert_eq!(grid.state(GridCoord::new(5, 0)), CellState::Blocked);
        assert_eq!(grid.state(GridCoord::new(0, 4)), CellState::Blocked);
    }

    #[test]
    fn test_walkable_square_clearance() {
        let grid = small_grid();

        // (2, 2) touches the blocked (1, 1) diagonally
        assert!(grid.is_walkable(GridCoord::new(2, 2), 0));
        assert!(!grid.is_walkable(GridCoord::new(2, 2), 1));

        // Neighborhood leaving the grid fails closed
        assert!(grid.is_walkable(GridCoord::new(0, 0), 0));
        assert!(!grid.is_walkable(GridCoord::new(0, 0), 1));

        assert!(grid.is_walkable(GridCoord::new(3, 1), 1));
    }

    #[test]
    fn test_world_grid_conversion() {
        let grid = OccupancyGrid::from_fn(200, 200, 0.4, Vec2::new(-40.0, -40.0), |_| {
            CellState::Free
        })
        .unwrap();

        let coord = grid.world_to_grid(Vec3::new(-40.0, 5.0, -40.0));
        assert_eq!(coord, GridCoord::new(0, 0));

        let coord = grid.world_to_grid(Vec3::new(0.1, 0.0, -0.1));
        assert_eq!(coord, GridCoord::new(100, 99));

        let center = grid.grid_to_world(GridCoord::new(100, 99));
        assert!((center.x - 0.2).abs() < 1e-4);
        assert!((center.z + 0.2).abs() < 1e-4);
        assert_eq!(center.y, 0.0);
    }

    #[test]
    fn test_try_world_to_grid_out_of_bounds() {
        let grid = small_grid();
        assert!(grid.try_world_to_grid(Vec3::new(2.5, 0.0, 1.5)).is_ok());
        assert!(matches!(
            grid.try_world_to_grid(Vec3::new(-0.5, 0.0, 1.0)),
            Err(NavError::OutOfBounds { .. })
        ));
        assert!(matches!(
            grid.try_world_to_grid(Vec3::new(1.0, 0.0, 4.0)),
            Err(NavError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_quantization_round_trip_is_idempotent() {
        let grid = OccupancyGrid::from_fn(16, 12, 0.25, Vec2::new(-2.0, -1.5), |_| {
            CellState::Free
        })
        .unwrap()
        .with_ground_height(0.5);

        let samples = [
            Vec3::new(-2.0, 0.0, -1.5),
            Vec3::new(-1.9, 3.0, -1.1),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.99, -1.0, 1.49),
            Vec3::new(0.374, 0.0, 0.126),
        ];

        for pos in samples {
            let coord = grid.world_to_grid(pos);
            assert!(grid.contains(coord));

            let center = grid.grid_to_world(coord);
            // Nearest center is never more than half a cell away on either axis
            assert!((center.x - pos.x).abs() <= 0.125 + 1e-5);
            assert!((center.z - pos.z).abs() <= 0.125 + 1e-5);
            assert_eq!(center.y, 0.5);

            // Converting again lands on the same cell and center
            assert_eq!(grid.world_to_grid(center), coord);
            assert_eq!(grid.grid_to_world(grid.world_to_grid(center)), center);
        }
    }

    #[test]
    fn test_coord_helpers() {
        let a = GridCoord::new(2, 3);
        assert_eq!(a.offset(-1, 2), GridCoord::new(1, 5));
        assert_eq!(a.manhattan(GridCoord::new(5, 1)), 5);
        assert!(a.is_cardinal_step(GridCoord::new(2, 4)));
        assert!(!a.is_cardinal_step(GridCoord::new(3, 4)));
        assert!(!a.is_cardinal_step(a));
    }
}
