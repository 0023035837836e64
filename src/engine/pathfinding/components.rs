use bevy::ecs::component::Mutable;
use bevy::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::config::NavigationConfig;
use crate::engine::world::{GridCoordinate, WorldContainer, WorldGrid};
use super::astar::Pathfinder;
use super::filter::{self, CoordinateFilter, PassabilityFilter};
use super::heuristic::HeuristicKind;
use super::types::{PathfinderResult, DEFAULT_MAX_DISTANCE, DEFAULT_MAX_ITERATIONS};

/// Search tunables carried by each navigating entity.
#[derive(Clone, Debug, PartialEq)]
pub struct PathfinderParams {
    pub allow_diagonal: bool,
    pub max_iterations: u32,
    pub max_distance: u32,
    pub return_best_path_on_failure: bool,
    /// When `false` and the [`WorldGrid`] has bounds, cells outside them are impassable.
    pub allow_out_of_bounds: bool,
    pub heuristic: HeuristicKind,
}

impl Default for PathfinderParams {
    fn default() -> Self {
        Self {
            allow_diagonal: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_distance: DEFAULT_MAX_DISTANCE,
            return_best_path_on_failure: false,
            allow_out_of_bounds: true,
            heuristic: HeuristicKind::default(),
        }
    }
}

impl PathfinderParams {
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            allow_diagonal: config.allow_diagonal,
            max_iterations: config.max_iterations,
            max_distance: config.max_distance(),
            return_best_path_on_failure: config.return_best_path_on_failure,
            allow_out_of_bounds: config.allow_out_of_bounds,
            heuristic: config.heuristic.clone(),
        }
    }
}

/// Where an entity's searches run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathfindingMode {
    /// Searched on the simulation thread during the tick that asks.
    #[default]
    Inline,
    /// Submitted to the [`AsyncPathfinder`](super::AsyncPathfinder) and
    /// delivered on a later tick.
    Background,
}

/// Entity-side contract of the navigation engine.
///
/// Implement on the component that owns an entity's navigation state, then
/// register it with
/// [`add_path_requester`](super::PathfindingAppExt::add_path_requester).
/// Every entity carrying both `Self` and [`Pathfinding`] is then searched for
/// on its own interval.
pub trait PathRequester: Component<Mutability = Mutable> {
    fn start(&self) -> GridCoordinate;

    fn target(&self) -> GridCoordinate;

    /// Checked once the interval elapses. Returning `false` skips this round.
    fn should_update(&self) -> bool {
        true
    }

    /// Passability for this entity's searches. Called on the simulation
    /// thread; the returned filter may run on a worker.
    fn filter(&self, world: &Arc<WorldContainer>) -> CoordinateFilter {
        PassabilityFilter::new(Arc::clone(world)).into_filter()
    }

    fn on_result(&mut self, result: &PathfinderResult);
}

/// Per-entity pathfinding state: tunables, update cadence and the result
/// waiting to be handed to the entity.
///
/// Each tick, in order: any waiting result is delivered, the interval timer
/// advances, and when it elapses (and the requester agrees) a new search is
/// issued. A result is therefore always delivered at the start of a later
/// tick than the one that requested it, whichever [`PathfindingMode`] is used.
#[derive(Component, Debug)]
pub struct Pathfinding {
    pub params: PathfinderParams,
    pub mode: PathfindingMode,
    interval: Timer,
    pending: Option<PathfinderResult>,
    last_result: Option<PathfinderResult>,
}

impl Default for Pathfinding {
    fn default() -> Self {
        Self::from_config(&NavigationConfig::default())
    }
}

impl Pathfinding {
    pub fn new(params: PathfinderParams, update_interval: Duration) -> Self {
        Self {
            params,
            mode: PathfindingMode::Inline,
            interval: Timer::new(update_interval, TimerMode::Once),
            pending: None,
            last_result: None,
        }
    }

    pub fn from_config(config: &NavigationConfig) -> Self {
        Self::new(PathfinderParams::from_config(config), config.update_interval())
    }

    pub fn in_background(mut self) -> Self {
        self.mode = PathfindingMode::Background;
        self
    }

    pub fn with_params(mut self, params: PathfinderParams) -> Self {
        self.params = params;
        self
    }

    pub fn update_interval(&self) -> Duration {
        self.interval.duration()
    }

    pub fn pending_result(&self) -> Option<&PathfinderResult> {
        self.pending.as_ref()
    }

    /// The result most recently handed to the requester.
    pub fn last_result(&self) -> Option<&PathfinderResult> {
        self.last_result.as_ref()
    }

    /// Park a result until the next delivery. A newer result replaces an undelivered one.
    pub fn store_result(&mut self, result: PathfinderResult) {
        self.pending = Some(result);
    }

    /// Hand the waiting result, if any, to `requester`.
    pub fn deliver<R: PathRequester>(&mut self, requester: &mut R) -> bool {
        let Some(result) = self.pending.take() else { return false };
        requester.on_result(&result);
        self.last_result = Some(result);
        true
    }

    /// Advance the interval timer by `delta`. Returns `true` (and rearms the
    /// timer) when the interval has elapsed.
    pub fn interval_elapsed(&mut self, delta: Duration) -> bool {
        if self.interval.tick(delta).just_finished() {
            self.interval.reset();
            true
        } else {
            false
        }
    }

    /// Restart the interval and drop the undelivered result.
    pub fn reset(&mut self) {
        self.interval.reset();
        self.pending = None;
    }

    /// Build the search `requester` wants right now against the current world snapshot.
    pub fn build_pathfinder<R: PathRequester>(&self, requester: &R, grid: &WorldGrid) -> Pathfinder {
        let world = grid.snapshot();

        let mut filter = requester.filter(&world);
        if !self.params.allow_out_of_bounds {
            if let Some(bounds) = grid.bounds() {
                filter = filter::bounded(filter, bounds);
            }
        }

        Pathfinder::new(
            requester.start(),
            requester.target(),
            filter,
            self.params.allow_diagonal,
            self.params.heuristic.build(&world),
        )
        .with_max_iterations(self.params.max_iterations)
        .with_max_distance(self.params.max_distance)
        .with_best_path_on_failure(self.params.return_best_path_on_failure)
    }
}

/// Ask the engine to restart an entity's pathfinding: its interval starts
/// over, any undelivered result is dropped and an in-flight background search
/// is abandoned.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPathfinding {
    pub entity: Entity,
}
