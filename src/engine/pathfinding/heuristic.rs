use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::world::{Category, GridCoordinate, WorldContainer};

/// Integer cost estimate between two cells.
///
/// The pathfinder uses the same heuristic for two jobs: as the goal estimate
/// that picks the best-effort node, and as the edge cost between adjacent
/// cells. Manhattan is exact for 4-connected grids; Euclidean and Chebyshev
/// are admissible for 8-connected ones.
pub trait Heuristic: Send + Sync {
    fn calculate(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u32;

    #[inline]
    fn between(&self, from: GridCoordinate, to: GridCoordinate) -> u32 {
        self.calculate(from.x, from.y, to.x, to.y)
    }
}

#[inline]
fn deltas(x1: i32, y1: i32, x2: i32, y2: i32) -> (i64, i64) {
    ((x1 as i64 - x2 as i64).abs(), (y1 as i64 - y2 as i64).abs())
}

#[inline]
fn saturate(cost: i64) -> u32 {
    u32::try_from(cost).unwrap_or(u32::MAX)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn calculate(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
        let (dx, dy) = deltas(x1, y1, x2, y2);
        saturate(dx + dy)
    }
}

/// Straight-line distance rounded to the nearest integer. A diagonal step costs 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl Heuristic for Euclidean {
    fn calculate(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
        let (dx, dy) = deltas(x1, y1, x2, y2);
        let (dx, dy) = (dx as f64, dy as f64);
        // Float-to-int casts saturate.
        (dx * dx + dy * dy).sqrt().round() as u32
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Chebyshev;

impl Heuristic for Chebyshev {
    fn calculate(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
        let (dx, dy) = deltas(x1, y1, x2, y2);
        saturate(dx.max(dy))
    }
}

/// Decorator that makes cells crowded by one category of body more expensive.
///
/// When the destination cell `(x2, y2)` holds a body of `category`, the base
/// cost is multiplied by `factor`. Used as edge cost this steers searches
/// around clutter; it is no longer admissible, so returned paths may be
/// longer than the shortest one.
#[derive(Clone)]
pub struct WeightedHeuristic {
    base: Arc<dyn Heuristic>,
    world: Arc<WorldContainer>,
    category: Category,
    factor: f32,
}

impl WeightedHeuristic {
    pub fn new(base: Arc<dyn Heuristic>, world: Arc<WorldContainer>, category: Category, factor: f32) -> Self {
        Self { base, world, category, factor }
    }
}

impl Heuristic for WeightedHeuristic {
    fn calculate(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
        let cost = self.base.calculate(x1, y1, x2, y2);
        let crowded = self
            .world
            .bodies_at(GridCoordinate::new(x2, y2))
            .any(|body| body.category == self.category);

        if crowded {
            (cost as f32 * self.factor).round() as u32
        } else {
            cost
        }
    }
}

/// Serializable heuristic choice, resolved against the world snapshot of the
/// tick a search is issued on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum HeuristicKind {
    Manhattan,
    #[default]
    Euclidean,
    Chebyshev,
    Weighted {
        base: Box<HeuristicKind>,
        category: Category,
        factor: f32,
    },
}

impl HeuristicKind {
    pub fn build(&self, world: &Arc<WorldContainer>) -> Arc<dyn Heuristic> {
        match self {
            HeuristicKind::Manhattan => Arc::new(Manhattan),
            HeuristicKind::Euclidean => Arc::new(Euclidean),
            HeuristicKind::Chebyshev => Arc::new(Chebyshev),
            HeuristicKind::Weighted { base, category, factor } => Arc::new(WeightedHeuristic::new(
                base.build(world),
                Arc::clone(world),
                *category,
                *factor,
            )),
        }
    }
}
