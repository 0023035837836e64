use std::cmp::Ordering;

use crate::engine::world::GridCoordinate;

/// Expansion cap used when a caller does not set one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// Distance cap used when a caller does not set one (unbounded).
pub const DEFAULT_MAX_DISTANCE: u32 = u32::MAX;

/// Outcome of one search.
///
/// `path` runs from the start cell to the target cell, or to the best-effort
/// cell when the search was capped and asked for a fallback. An absent path
/// is an ordinary outcome (unreachable target, caps hit), not an error.
///
/// `target_reached` is only `true` when the search was asked to go from a cell
/// to itself. Finding a path to a distinct target leaves it `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathfinderResult {
    pub path: Option<Vec<GridCoordinate>>,
    pub target_reached: bool,
}

impl PathfinderResult {
    pub fn at_target() -> Self {
        Self { path: None, target_reached: true }
    }

    pub fn not_found() -> Self {
        Self { path: None, target_reached: false }
    }

    pub fn found(path: Vec<GridCoordinate>) -> Self {
        Self { path: Some(path), target_reached: false }
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    /// Number of cells in the path, 0 when absent.
    pub fn len(&self) -> usize {
        self.path.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cell touched by a search. Lives in the search's arena and is dropped
/// with it.
#[derive(Clone, Debug)]
pub(super) struct SearchNode {
    pub coordinate: GridCoordinate,
    pub distance: u32,
    pub previous: Option<usize>,
    pub discovered: bool,
}

impl SearchNode {
    pub fn new(coordinate: GridCoordinate) -> Self {
        Self {
            coordinate,
            distance: u32::MAX,
            previous: None,
            discovered: false,
        }
    }
}

/// Frontier entry. Ordered by accumulated distance only; equal distances pop
/// in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Frontier {
    pub distance: u32,
    pub sequence: u64,
    pub index: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.distance.cmp(&self.distance)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
