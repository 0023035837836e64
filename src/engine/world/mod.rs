use bevy::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::config::NavigationConfig;
use crate::engine::{configure_nav_sets, NavSet, SimTick};

mod types;
mod grid;
mod query;
mod components;
mod systems;

pub use types::{GridCoordinate, GridBounds, BodyKind, Category, Body, Fixture, BodyRef, FixtureRef};
pub use components::{SimBody, SimFixtures, FixtureShape};
pub use systems::{WorldGrid, populate_world_grid};

/// Default nudge applied to bounds that land exactly on a grid line.
pub const DEFAULT_GRID_EPSILON: f32 = 0.001;

/// Default cell edge length in world units.
pub const DEFAULT_CELL_SIZE: f32 = 32.0;

/// Broad-phase index of everything the physics collaborator reported this tick.
///
/// Bodies and fixtures are bucketed into every grid cell their axis-aligned
/// bounds overlap, so "what is in cell (x, y)" is a single hash lookup. The
/// pathfinder never sees this type directly; passability filters and weighted
/// heuristics query it while a search runs.
///
/// # Lifecycle
///
/// Rebuilt once per tick before any navigation query is issued (see
/// [`populate_world_grid`]), then read-only for the rest of the tick. Cloning
/// produces new maps holding the same body/fixture references, which is how a
/// snapshot is handed to background searches.
///
/// # Exact grid matches
///
/// A body spanning `[0, 32)` with a 32-unit cell touches the line `x = 32`
/// with its right edge. With `adjust_for_exact_grid_match` on, a maximum edge
/// lying exactly on a grid line is nudged inward by `epsilon` before
/// quantization, so the body occupies only cell 0. With it off, the body
/// occupies cells 0 and 1.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use harrier::engine::world::{Body, BodyKind, Category, WorldContainer};
///
/// let mut world = World::new();
/// let entity = world.spawn_empty().id();
///
/// let mut container = WorldContainer::new(10.0);
/// let body = Body::new(entity, BodyKind::Static, Category::Solid, Rect::new(0.0, 0.0, 10.0, 10.0));
/// assert!(container.add_body(&body));
///
/// let mut out = Vec::new();
/// container.get_bodies(0, 0, &mut out);
/// assert_eq!(out.len(), 1);
///
/// out.clear();
/// container.get_bodies(1, 1, &mut out);
/// assert!(out.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct WorldContainer {
    cell_size: f32,
    adjust_for_exact_grid_match: bool,
    epsilon: f32,
    bodies: FxHashMap<GridCoordinate, SmallVec<[BodyRef; 4]>>,
    fixtures: FxHashMap<GridCoordinate, SmallVec<[FixtureRef; 2]>>,
}

impl Default for WorldContainer {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl WorldContainer {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            adjust_for_exact_grid_match: true,
            epsilon: DEFAULT_GRID_EPSILON,
            bodies: FxHashMap::default(),
            fixtures: FxHashMap::default(),
        }
    }

    pub fn with_exact_grid_adjustment(mut self, enabled: bool) -> Self {
        self.adjust_for_exact_grid_match = enabled;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Empty container with the same grid geometry.
    pub fn empty_like(&self) -> Self {
        Self::new(self.cell_size)
            .with_exact_grid_adjustment(self.adjust_for_exact_grid_match)
            .with_epsilon(self.epsilon)
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.fixtures.clear();
    }

    // Getters for grid parameters
    pub fn cell_size(&self) -> f32 { self.cell_size }
    pub fn epsilon(&self) -> f32 { self.epsilon }
    pub fn adjusts_for_exact_grid_match(&self) -> bool { self.adjust_for_exact_grid_match }

    pub fn set_adjust_for_exact_grid_match(&mut self, enabled: bool) {
        self.adjust_for_exact_grid_match = enabled;
    }

    /// Number of (cell, body) pairs. A body spanning four cells counts four times.
    pub fn total_body_entries(&self) -> usize {
        self.bodies.values().map(|bucket| bucket.len()).sum()
    }

    pub fn total_fixture_entries(&self) -> usize {
        self.fixtures.values().map(|bucket| bucket.len()).sum()
    }

    /// Cells holding at least one body or fixture.
    pub fn non_empty_cells(&self) -> usize {
        let fixture_only = self
            .fixtures
            .keys()
            .filter(|cell| !self.bodies.contains_key(cell))
            .count();
        self.bodies.len() + fixture_only
    }
}

/// Keeps the shared [`WorldGrid`] in step with the simulation: applies grid
/// settings from [`NavigationConfig`] and republishes the snapshot every tick.
pub struct WorldGridPlugin;

impl Plugin for WorldGridPlugin {
    fn build(&self, app: &mut App) {
        configure_nav_sets(app);
        app.init_resource::<NavigationConfig>();
        app.init_resource::<SimTick>();
        app.init_resource::<WorldGrid>();
        app.add_systems(
            FixedUpdate,
            (
                systems::apply_grid_config.run_if(resource_changed::<NavigationConfig>),
                systems::populate_world_grid,
            )
                .chain()
                .in_set(NavSet::PopulateWorld),
        );
    }
}
