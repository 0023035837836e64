use smallvec::SmallVec;
use std::sync::Arc;

use crate::engine::world::{Category, GridBounds, GridCoordinate, WorldContainer};

/// Passability predicate consulted for every neighbour a search considers.
///
/// Must be safe to call from a worker thread while the simulation keeps
/// running, which is why it only ever reads an immutable world snapshot.
pub type CoordinateFilter = Arc<dyn Fn(GridCoordinate) -> bool + Send + Sync>;

/// World-backed filter: a cell is passable when no body of a blocking
/// category overlaps it.
#[derive(Clone)]
pub struct PassabilityFilter {
    world: Arc<WorldContainer>,
    blocking: SmallVec<[Category; 4]>,
    bounds: Option<GridBounds>,
}

impl PassabilityFilter {
    pub fn new(world: Arc<WorldContainer>) -> Self {
        Self {
            world,
            blocking: SmallVec::from_slice(Category::BLOCKING),
            bounds: None,
        }
    }

    /// Replace the set of categories that make a cell impassable.
    pub fn blocking(mut self, categories: &[Category]) -> Self {
        self.blocking = SmallVec::from_slice(categories);
        self
    }

    /// Also reject cells outside `bounds`.
    pub fn within(mut self, bounds: Option<GridBounds>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn passable(&self, coordinate: GridCoordinate) -> bool {
        if let Some(bounds) = self.bounds {
            if !bounds.contains(coordinate) {
                return false;
            }
        }
        !self
            .world
            .bodies_at(coordinate)
            .any(|body| self.blocking.contains(&body.category))
    }

    pub fn into_filter(self) -> CoordinateFilter {
        Arc::new(move |coordinate: GridCoordinate| self.passable(coordinate))
    }
}

/// Wrap `filter` so cells outside `bounds` are rejected before it is consulted.
pub fn bounded(filter: CoordinateFilter, bounds: GridBounds) -> CoordinateFilter {
    Arc::new(move |coordinate: GridCoordinate| bounds.contains(coordinate) && filter(coordinate))
}
