use bevy::prelude::*;

use crate::engine::profiling::profile;
use crate::engine::world::WorldGrid;
use crate::engine::SimTick;
use super::components::{PathRequester, Pathfinding, PathfindingMode, ResetPathfinding};
use super::workers::AsyncPathfinder;

/// Deliver, tick and search for every [`PathfindingMode::Inline`] entity
/// carrying `R`. The search runs here; its result waits in [`Pathfinding`]
/// until the entity's next update.
#[profile(2)]
pub fn drive_inline_pathfinding<R: PathRequester>(
    tick: Res<SimTick>,
    time: Res<Time>,
    grid: Res<WorldGrid>,
    mut query: Query<(Entity, &mut Pathfinding, &mut R)>,
) {
    let delta = time.delta();
    let mut searches = 0usize;

    for (entity, mut pathfinding, mut requester) in &mut query {
        if pathfinding.mode != PathfindingMode::Inline {
            continue;
        }

        pathfinding.deliver(&mut *requester);

        if !pathfinding.interval_elapsed(delta) || !requester.should_update() {
            continue;
        }

        let result = pathfinding.build_pathfinder(&*requester, &grid).call();
        trace!(
            "[PATHFINDING] {} -> {} cells (target_reached={})",
            entity,
            result.len(),
            result.target_reached
        );
        pathfinding.store_result(result);
        searches += 1;
    }

    if searches > 0 {
        trace!("[PATHFINDING] Tick {}: {} inline searches", tick.0, searches);
    }
}

pub(super) fn apply_pathfinding_resets(
    mut resets: MessageReader<ResetPathfinding>,
    mut workers: ResMut<AsyncPathfinder>,
    mut query: Query<&mut Pathfinding>,
) {
    for ResetPathfinding { entity } in resets.read() {
        if workers.forget(*entity) {
            debug!("[PATHFINDING] Abandoned in-flight search for {}", entity);
        }
        if let Ok(mut pathfinding) = query.get_mut(*entity) {
            pathfinding.reset();
        }
    }
}

/// Entities that stop navigating (despawned or component removed) give up
/// their worker slot.
pub(super) fn forget_removed_pathfinding(
    mut removed: RemovedComponents<Pathfinding>,
    mut workers: ResMut<AsyncPathfinder>,
) {
    for entity in removed.read() {
        workers.forget(entity);
    }
}
