//! A* pathfinding on the occupancy grid
//!
//! One engine shared by every agent type. The agent's footprint enters only
//! through the clearance radius argument.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};

use super::grid::{GridCoord, NavError, OccupancyGrid};

/// Cardinal neighbor offsets, in expansion order
const NEIGHBORS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A planned route from the start cell to the goal cell, inclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    cells: Vec<GridCoord>,
    waypoints: Vec<Vec3>,
}

impl Path {
    /// The "no path" result
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_cells(grid: &OccupancyGrid, cells: Vec<GridCoord>) -> Self {
        let waypoints = cells.iter().map(|&c| grid.grid_to_world(c)).collect();
        Self { cells, waypoints }
    }

    /// Check if no path was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Number of grid steps (waypoints minus one)
    #[must_use]
    pub fn steps(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Waypoints in world coordinates (cell centers)
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Grid cells under each waypoint
    #[must_use]
    pub fn cells(&self) -> &[GridCoord] {
        &self.cells
    }

    /// Final waypoint, if any
    #[must_use]
    pub fn last(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    /// Total world-space length
    #[must_use]
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Search record; `parent` indexes into the same search's record list
#[derive(Debug, Clone)]
struct NodeRecord {
    coord: GridCoord,
    parent: Option<usize>,
    cost_so_far: u32,
}

/// Open-set entry
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenEntry {
    estimated_total: u32,
    seq: u64,
    record: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap; earlier insertion wins ties
        other
            .estimated_total
            .cmp(&self.estimated_total)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path using A* over the 4-connected grid.
///
/// Both endpoints are quantized to cells. The start cell is where the agent
/// already stands and is not checked for walkability, so an agent that has
/// drifted into an obstacle's margin can still plan its way out. The first
/// waypoint may therefore sit on a cell that fails the clearance test; every
/// other cell on the path satisfies [`OccupancyGrid::is_walkable`] for
/// `clearance`.
///
/// An unreachable goal is not an error: it yields an empty [`Path`].
///
/// # Errors
///
/// Returns [`NavError::OutOfBounds`] if either endpoint lies outside the grid.
pub fn find_path(
    grid: &OccupancyGrid,
    start: Vec3,
    goal: Vec3,
    clearance: u32,
) -> Result<Path, NavError> {
    let start = grid.try_world_to_grid(start)?;
    let goal = grid.try_world_to_grid(goal)?;

    let mut records = vec![NodeRecord {
        coord: start,
        parent: None,
        cost_so_far: 0,
    }];
    let mut open = BinaryHeap::new();
    let mut open_best: FxHashMap<GridCoord, usize> = FxHashMap::default();
    let mut closed: FxHashSet<GridCoord> = FxHashSet::default();
    let mut seq = 0u64;

    open_best.insert(start, 0);
    open.push(OpenEntry {
        estimated_total: start.manhattan(goal),
        seq,
        record: 0,
    });

    while let Some(entry) = open.pop() {
        let current = records[entry.record].clone();

        // Superseded by a cheaper record for the same cell
        if closed.contains(&current.coord) || open_best.get(&current.coord) != Some(&entry.record)
        {
            continue;
        }

        if current.coord == goal {
            return Ok(Path::from_cells(grid, reconstruct(&records, entry.record)));
        }

        open_best.remove(&current.coord);
        closed.insert(current.coord);

        for (dcol, drow) in NEIGHBORS {
            let neighbor = current.coord.offset(dcol, drow);
            if closed.contains(&neighbor) || !grid.is_walkable(neighbor, clearance) {
                continue;
            }

            let tentative = current.cost_so_far + 1;
            let improves = open_best
                .get(&neighbor)
                .is_none_or(|&idx| tentative < records[idx].cost_so_far);
            if !improves {
                continue;
            }

            let index = records.len();
            records.push(NodeRecord {
                coord: neighbor,
                parent: Some(entry.record),
                cost_so_far: tentative,
            });
            open_best.insert(neighbor, index);
            seq += 1;
            open.push(OpenEntry {
                estimated_total: tentative + neighbor.manhattan(goal),
                seq,
                record: index,
            });
        }
    }

    log::debug!(
        "No path from {start} to {goal} (clearance {clearance}, {} cells closed)",
        closed.len()
    );
    Ok(Path::empty())
}

fn reconstruct(records: &[NodeRecord], last: usize) -> Vec<GridCoord> {
    let mut cells = Vec::new();
    let mut cursor = Some(last);
    while let Some(index) = cursor {
        cells.push(records[index].coord);
        cursor = records[index].parent;
    }
    cells.reverse();
    cells
}

/// Holds the shared grid and answers path queries for any number of agents
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    grid: Option<Arc<OccupancyGrid>>,
}

impl Navigator {
    /// Create a navigator over a built grid
    #[must_use]
    pub fn new(grid: Arc<OccupancyGrid>) -> Self {
        Self { grid: Some(grid) }
    }

    /// Create a navigator with no grid yet
    #[must_use]
    pub fn unbuilt() -> Self {
        Self::default()
    }

    /// Install the grid once decomposition has finished
    pub fn install(&mut self, grid: Arc<OccupancyGrid>) {
        self.grid = Some(grid);
    }

    /// Check if a grid has been installed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.grid.is_some()
    }

    /// The installed grid
    ///
    /// # Errors
    ///
    /// Returns [`NavError::GridNotBuilt`] if no grid has been installed
    pub fn grid(&self) -> Result<&OccupancyGrid, NavError> {
        self.grid.as_deref().ok_or(NavError::GridNotBuilt)
    }

    /// Find a path on the installed grid
    ///
    /// # Errors
    ///
    /// Returns [`NavError::GridNotBuilt`] before a grid is installed, or
    /// [`NavError::OutOfBounds`] for endpoints outside it
    pub fn find_path(&self, start: Vec3, goal: Vec3, clearance: u32) -> Result<Path, NavError> {
        find_path(self.grid()?, start, goal, clearance)
    }
}
