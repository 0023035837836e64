use bevy::prelude::*;

pub mod config;
pub mod profiling;
pub mod world;
pub mod pathfinding;

use config::NavigationConfigPlugin;
use world::WorldGridPlugin;
use pathfinding::PathfindingPlugin;

/// Simulation step counter. Advanced once per `FixedUpdate` before any
/// navigation work runs, and read by the `perf_stats` logging helpers.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTick(pub u64);

/// Ordering of the navigation work inside one simulation step.
///
/// The world snapshot is published first so every search issued in `Drive`
/// sees this tick's bodies; finished background searches are gathered in
/// `Collect` so their results reach consumers in the same step.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum NavSet {
    PopulateWorld,
    Collect,
    Drive,
}

pub(crate) fn configure_nav_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (NavSet::PopulateWorld, NavSet::Collect, NavSet::Drive).chain(),
    );
}

/// Everything the navigation engine needs, in dependency order.
pub struct EnginePlugin;

impl Plugin for EnginePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimTick>();
        app.add_plugins((
            NavigationConfigPlugin,
            WorldGridPlugin,
            PathfindingPlugin,
        ));
        app.add_systems(FixedUpdate, advance_sim_tick.before(NavSet::PopulateWorld));
    }
}

fn advance_sim_tick(mut tick: ResMut<SimTick>) {
    tick.0 += 1;
}
