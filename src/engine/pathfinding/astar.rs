use rustc_hash::FxHashMap;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

use crate::engine::world::GridCoordinate;
use super::filter::CoordinateFilter;
use super::heuristic::Heuristic;
use super::types::{Frontier, PathfinderResult, SearchNode, DEFAULT_MAX_DISTANCE, DEFAULT_MAX_ITERATIONS};

const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const ALL_DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

/// One self-contained grid search.
///
/// Holds everything it needs (filter, heuristic, caps) so it can be moved to a
/// worker thread and run with [`call`](Self::call). Searches never share
/// state; per-node bookkeeping lives in an arena owned by the call.
///
/// The frontier is ordered by accumulated distance only, with ties popped in
/// insertion order, and the heuristic also prices each step between adjacent
/// cells. This is what gives the paths their characteristic shapes, so keep
/// both properties when touching the loop.
#[derive(Clone)]
pub struct Pathfinder {
    start: GridCoordinate,
    target: GridCoordinate,
    filter: CoordinateFilter,
    allow_diagonal: bool,
    heuristic: Arc<dyn Heuristic>,
    max_iterations: u32,
    max_distance: u32,
    return_best_path_on_failure: bool,
}

impl fmt::Debug for Pathfinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pathfinder")
            .field("start", &self.start)
            .field("target", &self.target)
            .field("allow_diagonal", &self.allow_diagonal)
            .field("max_iterations", &self.max_iterations)
            .field("max_distance", &self.max_distance)
            .field("return_best_path_on_failure", &self.return_best_path_on_failure)
            .finish_non_exhaustive()
    }
}

impl Pathfinder {
    pub fn new(
        start: GridCoordinate,
        target: GridCoordinate,
        filter: CoordinateFilter,
        allow_diagonal: bool,
        heuristic: Arc<dyn Heuristic>,
    ) -> Self {
        Self {
            start,
            target,
            filter,
            allow_diagonal,
            heuristic,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_distance: DEFAULT_MAX_DISTANCE,
            return_best_path_on_failure: false,
        }
    }

    /// Cap on node expansions. Stale frontier entries do not count.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stop once the cheapest frontier node lies further than this from the start.
    pub fn with_max_distance(mut self, max_distance: u32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// On failure, return the path to the node the heuristic ranked closest
    /// to the target instead of nothing.
    pub fn with_best_path_on_failure(mut self, enabled: bool) -> Self {
        self.return_best_path_on_failure = enabled;
        self
    }

    pub fn start(&self) -> GridCoordinate { self.start }
    pub fn target(&self) -> GridCoordinate { self.target }

    fn directions(&self) -> &'static [(i32, i32)] {
        if self.allow_diagonal { &ALL_DIRECTIONS } else { &ORTHOGONAL }
    }

    /// Run the search to completion.
    pub fn call(self) -> PathfinderResult {
        if self.start == self.target {
            return PathfinderResult::at_target();
        }

        // Without a fallback, a target that is already out of range is not worth a search.
        if !self.return_best_path_on_failure
            && self.heuristic.between(self.start, self.target) > self.max_distance
        {
            return PathfinderResult::not_found();
        }

        let mut search = Search::new(self.start);
        let mut best: Option<(usize, u32)> = None;
        let mut expansions = 0u32;

        while expansions < self.max_iterations {
            let Some(Frontier { index, .. }) = search.frontier.pop() else { break };

            let node = &mut search.nodes[index];
            if node.discovered {
                continue;
            }
            node.discovered = true;
            expansions += 1;

            let (current, distance) = (node.coordinate, node.distance);
            if distance > self.max_distance {
                break;
            }

            let estimate = self.heuristic.between(current, self.target);
            if best.map_or(true, |(_, closest)| estimate < closest) {
                best = Some((index, estimate));
            }

            if current == self.target {
                return PathfinderResult::found(search.backtrack(index));
            }

            for &(dx, dy) in self.directions() {
                let next = current.offset(dx, dy);
                if search.is_discovered(next) || !(self.filter)(next) {
                    continue;
                }

                let total = distance.saturating_add(self.heuristic.between(current, next));
                search.relax(next, total, index);
            }
        }

        match best {
            Some((index, _)) if self.return_best_path_on_failure => {
                PathfinderResult::found(search.backtrack(index))
            }
            _ => PathfinderResult::not_found(),
        }
    }
}

/// Per-call search state. Nodes are addressed by arena index; predecessors
/// point back into the same arena.
struct Search {
    nodes: Vec<SearchNode>,
    index: FxHashMap<GridCoordinate, usize>,
    frontier: BinaryHeap<Frontier>,
    sequence: u64,
}

impl Search {
    fn new(start: GridCoordinate) -> Self {
        let mut search = Self {
            nodes: Vec::new(),
            index: FxHashMap::default(),
            frontier: BinaryHeap::new(),
            sequence: 0,
        };
        let root = search.node(start);
        search.nodes[root].distance = 0;
        search.push(root, 0);
        search
    }

    fn node(&mut self, coordinate: GridCoordinate) -> usize {
        if let Some(&index) = self.index.get(&coordinate) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(SearchNode::new(coordinate));
        self.index.insert(coordinate, index);
        index
    }

    fn is_discovered(&self, coordinate: GridCoordinate) -> bool {
        self.index
            .get(&coordinate)
            .is_some_and(|&index| self.nodes[index].discovered)
    }

    fn push(&mut self, index: usize, distance: u32) {
        self.frontier.push(Frontier { distance, sequence: self.sequence, index });
        self.sequence += 1;
    }

    /// Record a cheaper route to `coordinate` through `previous`. Older
    /// frontier entries for the node stay in the heap and are skipped when popped.
    fn relax(&mut self, coordinate: GridCoordinate, distance: u32, previous: usize) {
        let index = self.node(coordinate);
        let node = &mut self.nodes[index];
        if distance < node.distance {
            node.distance = distance;
            node.previous = Some(previous);
            self.push(index, distance);
        }
    }

    fn backtrack(&self, mut index: usize) -> Vec<GridCoordinate> {
        let mut path = vec![self.nodes[index].coordinate];
        while let Some(previous) = self.nodes[index].previous {
            index = previous;
            path.push(self.nodes[index].coordinate);
        }
        path.reverse();
        path
    }
}
