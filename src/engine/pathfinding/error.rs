use bevy::prelude::*;
use std::time::Duration;
use thiserror::Error;

/// Failures of the background search machinery.
///
/// A search that simply finds no path is not an error; it comes back as a
/// [`PathfinderResult`](super::PathfinderResult) with an absent path.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathfindingError {
    #[error("a search for {0} is already in flight")]
    AlreadyInFlight(Entity),
    #[error("the pathfinding worker pool has been shut down")]
    ShutDown,
    #[error("search for {owner} timed out after {waited:?}")]
    TimedOut { owner: Entity, waited: Duration },
    #[error("search worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("search for {0} ended without producing a result")]
    Interrupted(Entity),
}
