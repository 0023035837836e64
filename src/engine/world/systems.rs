use bevy::prelude::*;
use std::sync::Arc;

use crate::engine::config::NavigationConfig;
use crate::engine::profiling::profile;
use crate::engine::SimTick;
use super::{Body, Fixture, GridBounds, SimBody, SimFixtures, WorldContainer};

/// The world container shared by every navigation query of the current tick.
///
/// Searches running on background workers hold an `Arc` of the snapshot that
/// was current when they were submitted. Rebuilding reuses the container in
/// place when nobody else holds it and starts a fresh one otherwise, so a
/// running search never observes a half-built grid.
#[derive(Resource, Default)]
pub struct WorldGrid {
    snapshot: Arc<WorldContainer>,
    bounds: Option<GridBounds>,
}

impl WorldGrid {
    pub fn new(container: WorldContainer) -> Self {
        Self {
            snapshot: Arc::new(container),
            bounds: None,
        }
    }

    pub fn container(&self) -> &WorldContainer {
        &self.snapshot
    }

    /// Cheap handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<WorldContainer> {
        Arc::clone(&self.snapshot)
    }

    /// Playable extent of the loaded map, if the map collaborator set one.
    pub fn bounds(&self) -> Option<GridBounds> {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Option<GridBounds>) {
        self.bounds = bounds;
    }

    /// Clear the container and refill it through `fill`.
    pub fn rebuild(&mut self, fill: impl FnOnce(&mut WorldContainer)) {
        match Arc::get_mut(&mut self.snapshot) {
            Some(container) => {
                container.clear();
                fill(container);
            }
            None => {
                let mut container = self.snapshot.empty_like();
                fill(&mut container);
                self.snapshot = Arc::new(container);
            }
        }
    }

    /// Swap in a container built elsewhere.
    pub fn publish(&mut self, container: WorldContainer) {
        self.snapshot = Arc::new(container);
    }
}

pub(super) fn apply_grid_config(config: Res<NavigationConfig>, mut grid: ResMut<WorldGrid>) {
    let current = grid.container();
    if current.cell_size() == config.cell_size
        && current.adjusts_for_exact_grid_match() == config.adjust_for_exact_grid_match
        && current.epsilon() == config.grid_epsilon
    {
        return;
    }

    if !(config.cell_size.is_finite() && config.cell_size > 0.0) {
        error!("[WORLD_GRID] Rejecting cell_size {}; keeping {}", config.cell_size, current.cell_size());
        return;
    }

    info!(
        "[WORLD_GRID] Grid geometry: cell_size={} adjust_for_exact_grid_match={} epsilon={}",
        config.cell_size, config.adjust_for_exact_grid_match, config.grid_epsilon
    );
    grid.publish(
        WorldContainer::new(config.cell_size)
            .with_exact_grid_adjustment(config.adjust_for_exact_grid_match)
            .with_epsilon(config.grid_epsilon),
    );
}

/// Rebuild the world grid from every [`SimBody`] (and its [`SimFixtures`]).
///
/// Objects with non-finite bounds are skipped; one bad body never stops the
/// rest of the world from being indexed.
#[profile(2)]
pub fn populate_world_grid(
    tick: Res<SimTick>,
    mut grid: ResMut<WorldGrid>,
    bodies: Query<(Entity, &SimBody, Option<&SimFixtures>)>,
) {
    let mut rejected = 0usize;

    grid.rebuild(|container| {
        for (entity, body, fixtures) in &bodies {
            if !container.add_body(&Body::new(entity, body.kind, body.category, body.bounds)) {
                rejected += 1;
            }

            let Some(fixtures) = fixtures else { continue };
            for shape in &fixtures.0 {
                let fixture = Fixture::new(entity, shape.name.clone(), shape.category, shape.bounds);
                if !container.add_fixture(&fixture) {
                    rejected += 1;
                }
            }
        }
    });

    if rejected > 0 {
        warn!("[WORLD_GRID] Tick {}: skipped {} objects with unusable bounds", tick.0, rejected);
    }

    crate::profile_log!(
        tick,
        "[WORLD_GRID] {} body entries, {} fixture entries in {} cells",
        grid.container().total_body_entries(),
        grid.container().total_fixture_entries(),
        grid.container().non_empty_cells()
    );
}
