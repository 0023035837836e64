use bevy::prelude::*;
use bevy::tasks::{block_on, Task, TaskPool, TaskPoolBuilder};
use futures_lite::future;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::engine::config::NavigationConfig;
use crate::engine::profiling::profile;
use crate::engine::world::WorldGrid;
use crate::engine::SimTick;
use super::astar::Pathfinder;
use super::components::{PathRequester, Pathfinding, PathfindingMode};
use super::error::PathfindingError;
use super::types::PathfinderResult;

type SearchOutcome = Result<PathfinderResult, PathfindingError>;

struct InFlight {
    task: Task<SearchOutcome>,
    submitted_at: Instant,
}

/// Counts from one [`AsyncPathfinder::collect`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Runs searches on a dedicated worker pool, at most one per entity.
///
/// Results are never pushed into the simulation from a worker: the owner of
/// this resource polls with [`collect`](Self::collect) once per tick and
/// hands finished results over on the simulation thread.
///
/// The timeout is measured from submission. A search still running when it
/// expires is cancelled and its slot freed, so the entity simply asks again
/// on its next interval.
///
/// Time spent queued behind other searches counts against the timeout too.
/// When more entities submit on one tick than the pool can finish within the
/// timeout, the ones queued last keep expiring every interval; raise
/// `async_timeout_ms` or `worker_threads` for crowded maps.
#[derive(Resource)]
pub struct AsyncPathfinder {
    pool: Option<TaskPool>,
    threads: usize,
    timeout: Duration,
    in_flight: FxHashMap<Entity, InFlight>,
}

impl FromWorld for AsyncPathfinder {
    fn from_world(world: &mut World) -> Self {
        match world.get_resource::<NavigationConfig>() {
            Some(config) => Self::from_config(config),
            None => Self::from_config(&NavigationConfig::default()),
        }
    }
}

impl AsyncPathfinder {
    pub fn new(threads: usize, timeout: Duration) -> Self {
        let threads = threads.max(1);
        let pool = TaskPoolBuilder::new()
            .num_threads(threads)
            .thread_name("Pathfinding Worker".to_string())
            .build();

        Self {
            pool: Some(pool),
            threads,
            timeout,
            in_flight: FxHashMap::default(),
        }
    }

    pub fn from_config(config: &NavigationConfig) -> Self {
        Self::new(config.worker_threads, config.async_timeout())
    }

    pub fn threads(&self) -> usize { self.threads }
    pub fn timeout(&self) -> Duration { self.timeout }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn is_accepting(&self) -> bool {
        self.pool.is_some()
    }

    pub fn is_in_flight(&self, owner: Entity) -> bool {
        self.in_flight.contains_key(&owner)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Start `pathfinder` on a worker on behalf of `owner`.
    pub fn submit(&mut self, owner: Entity, pathfinder: Pathfinder) -> Result<(), PathfindingError> {
        let Some(pool) = &self.pool else {
            return Err(PathfindingError::ShutDown);
        };
        if self.in_flight.contains_key(&owner) {
            return Err(PathfindingError::AlreadyInFlight(owner));
        }

        let task = pool.spawn(async move { run_contained(pathfinder) });
        self.in_flight.insert(owner, InFlight { task, submitted_at: Instant::now() });
        Ok(())
    }

    /// Hand every finished result to `deliver`, and cancel searches that have
    /// outlived the timeout. Failed searches are logged and their slot freed.
    pub fn collect(&mut self, mut deliver: impl FnMut(Entity, PathfinderResult)) -> CollectSummary {
        let now = Instant::now();
        let timeout = self.timeout;
        let mut summary = CollectSummary::default();

        self.in_flight.retain(|&owner, flight| {
            if !flight.task.is_finished() {
                let waited = now.saturating_duration_since(flight.submitted_at);
                if waited <= timeout {
                    return true;
                }
                // Dropping the task cancels it.
                warn!("[PATHFINDING] {}", PathfindingError::TimedOut { owner, waited });
                summary.failed += 1;
                return false;
            }

            match block_on(future::poll_once(&mut flight.task)) {
                Some(Ok(result)) => {
                    deliver(owner, result);
                    summary.delivered += 1;
                }
                Some(Err(err)) => {
                    warn!("[PATHFINDING] Search for {} failed: {}", owner, err);
                    summary.failed += 1;
                }
                None => {
                    warn!("[PATHFINDING] {}", PathfindingError::Interrupted(owner));
                    summary.failed += 1;
                }
            }
            false
        });

        summary
    }

    /// Abandon `owner`'s in-flight search, if any. Its result will never be delivered.
    pub fn forget(&mut self, owner: Entity) -> bool {
        self.in_flight.remove(&owner).is_some()
    }

    /// Stop accepting work and wait for in-flight searches to finish. Their
    /// results are discarded.
    pub fn shutdown(&mut self) {
        let Some(pool) = self.pool.take() else { return };

        if !self.in_flight.is_empty() {
            info!(
                "[PATHFINDING] Waiting for {} in-flight searches before closing the worker pool",
                self.in_flight.len()
            );
        }
        for (_, flight) in self.in_flight.drain() {
            let _ = block_on(flight.task);
        }
        drop(pool);
    }
}

impl Drop for AsyncPathfinder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_contained(pathfinder: Pathfinder) -> SearchOutcome {
    panic::catch_unwind(AssertUnwindSafe(move || pathfinder.call()))
        .map_err(|payload| PathfindingError::WorkerPanicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Follow [`NavigationConfig`] changes. The pool is only rebuilt when the
/// thread count changes; in-flight searches of the old pool are waited for
/// and dropped.
pub(super) fn apply_worker_config(config: Res<NavigationConfig>, mut workers: ResMut<AsyncPathfinder>) {
    let threads = config.worker_threads.max(1);
    if workers.threads() != threads {
        info!("[PATHFINDING] Rebuilding worker pool with {} threads", threads);
        *workers = AsyncPathfinder::from_config(&config);
    } else if workers.timeout() != config.async_timeout() {
        workers.set_timeout(config.async_timeout());
    }
}

/// Move finished background results into their entities' [`Pathfinding`].
#[profile(1)]
pub(super) fn collect_background_paths(
    tick: Res<SimTick>,
    mut workers: ResMut<AsyncPathfinder>,
    mut query: Query<&mut Pathfinding>,
) {
    if workers.in_flight_count() == 0 {
        return;
    }

    let summary = workers.collect(|owner, result| match query.get_mut(owner) {
        Ok(mut pathfinding) => pathfinding.store_result(result),
        Err(_) => debug!("[PATHFINDING] Dropping result for {} which no longer navigates", owner),
    });

    if summary.failed > 0 {
        debug!("[PATHFINDING] Tick {}: {} background searches failed", tick.0, summary.failed);
    }
    crate::profile_log!(
        tick,
        "[PATHFINDING] Collected {} results, {} still in flight",
        summary.delivered,
        workers.in_flight_count()
    );
}

/// Deliver, tick and submit for every [`PathfindingMode::Background`] entity
/// carrying `R`. An entity whose previous search is still in flight waits for
/// its next interval.
#[profile(2)]
pub fn drive_background_pathfinding<R: PathRequester>(
    tick: Res<SimTick>,
    time: Res<Time>,
    grid: Res<WorldGrid>,
    mut workers: ResMut<AsyncPathfinder>,
    mut query: Query<(Entity, &mut Pathfinding, &mut R)>,
) {
    let delta = time.delta();
    let mut submitted = 0usize;

    for (entity, mut pathfinding, mut requester) in &mut query {
        if pathfinding.mode != PathfindingMode::Background {
            continue;
        }

        pathfinding.deliver(&mut *requester);

        if !pathfinding.interval_elapsed(delta) || !requester.should_update() {
            continue;
        }
        if workers.is_in_flight(entity) {
            trace!("[PATHFINDING] {} still has a search in flight", entity);
            continue;
        }

        let pathfinder = pathfinding.build_pathfinder(&*requester, &grid);
        match workers.submit(entity, pathfinder) {
            Ok(()) => submitted += 1,
            Err(err) => debug!("[PATHFINDING] Not submitting for {}: {}", entity, err),
        }
    }

    if submitted > 0 {
        trace!("[PATHFINDING] Tick {}: submitted {} background searches", tick.0, submitted);
    }
    crate::profile_log!(tick, "[PATHFINDING] {} searches in flight", workers.in_flight_count());
}
