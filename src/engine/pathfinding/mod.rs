use bevy::prelude::*;

use crate::engine::config::NavigationConfig;
use crate::engine::world::WorldGrid;
use crate::engine::{configure_nav_sets, NavSet, SimTick};

mod types;
mod heuristic;
mod filter;
mod astar;
mod error;
mod components;
mod systems;
mod workers;

pub use types::{PathfinderResult, DEFAULT_MAX_DISTANCE, DEFAULT_MAX_ITERATIONS};
pub use heuristic::{Heuristic, HeuristicKind, Manhattan, Euclidean, Chebyshev, WeightedHeuristic};
pub use filter::{bounded, CoordinateFilter, PassabilityFilter};
pub use astar::Pathfinder;
pub use error::PathfindingError;
pub use components::{PathRequester, Pathfinding, PathfindingMode, PathfinderParams, ResetPathfinding};
pub use systems::drive_inline_pathfinding;
pub use workers::{AsyncPathfinder, CollectSummary, drive_background_pathfinding};

/// Background worker pool, result collection and per-entity bookkeeping.
///
/// Entity kinds opt in through [`PathfindingAppExt::add_path_requester`].
pub struct PathfindingPlugin;

impl Plugin for PathfindingPlugin {
    fn build(&self, app: &mut App) {
        configure_nav_sets(app);
        app.init_resource::<NavigationConfig>();
        app.init_resource::<SimTick>();
        app.init_resource::<WorldGrid>();
        app.init_resource::<AsyncPathfinder>();
        app.add_message::<ResetPathfinding>();

        app.add_systems(
            FixedUpdate,
            (
                workers::apply_worker_config.run_if(resource_changed::<NavigationConfig>),
                systems::forget_removed_pathfinding,
                systems::apply_pathfinding_resets,
                workers::collect_background_paths,
            )
                .chain()
                .in_set(NavSet::Collect),
        );
    }
}

pub trait PathfindingAppExt {
    /// Drive pathfinding for every entity that has both `R` and [`Pathfinding`].
    fn add_path_requester<R: PathRequester>(&mut self) -> &mut Self;
}

impl PathfindingAppExt for App {
    fn add_path_requester<R: PathRequester>(&mut self) -> &mut Self {
        self.add_systems(
            FixedUpdate,
            (
                drive_inline_pathfinding::<R>,
                drive_background_pathfinding::<R>,
            )
                .chain()
                .in_set(NavSet::Drive),
        )
    }
}
