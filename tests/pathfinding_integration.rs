use bevy::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use harrier::engine::config::NavigationConfig;
use harrier::engine::pathfinding::{
    AsyncPathfinder, CoordinateFilter, HeuristicKind, PathRequester, PathfinderParams, PathfinderResult,
    Pathfinding, PathfindingAppExt, ResetPathfinding,
};
use harrier::engine::world::{Category, GridCoordinate, SimBody, WorldContainer};
use harrier::engine::EnginePlugin;

const STEP: Duration = Duration::from_millis(50);
const INTERVAL: Duration = Duration::from_millis(100);

#[derive(Component, Default)]
struct Walker {
    start: GridCoordinate,
    target: GridCoordinate,
    paused: bool,
    /// Per-call delay for the passability filter, to keep a search busy on a worker.
    filter_delay: Option<Duration>,
    received: Vec<PathfinderResult>,
}

impl Walker {
    fn new(start: (i32, i32), target: (i32, i32)) -> Self {
        Self {
            start: start.into(),
            target: target.into(),
            ..Default::default()
        }
    }
}

impl PathRequester for Walker {
    fn start(&self) -> GridCoordinate { self.start }
    fn target(&self) -> GridCoordinate { self.target }

    fn should_update(&self) -> bool {
        !self.paused
    }

    fn filter(&self, world: &Arc<WorldContainer>) -> CoordinateFilter {
        let Some(delay) = self.filter_delay else {
            return harrier::engine::pathfinding::PassabilityFilter::new(Arc::clone(world)).into_filter();
        };
        Arc::new(move |_: GridCoordinate| {
            thread::sleep(delay);
            true
        })
    }

    fn on_result(&mut self, result: &PathfinderResult) {
        self.received.push(result.clone());
    }
}

fn orthogonal_params() -> PathfinderParams {
    PathfinderParams {
        allow_diagonal: false,
        heuristic: HeuristicKind::Manhattan,
        ..Default::default()
    }
}

fn setup_app() -> App {
    let mut app = App::new();
    app.insert_resource(NavigationConfig {
        async_timeout_ms: 2_000,
        ..Default::default()
    });
    app.add_plugins(EnginePlugin);
    app.add_path_requester::<Walker>();
    app.init_resource::<Time>();
    app
}

fn step(app: &mut App) {
    app.world_mut().resource_mut::<Time>().advance_by(STEP);
    app.world_mut().run_schedule(FixedUpdate);
}

fn received(app: &App, entity: Entity) -> Vec<PathfinderResult> {
    app.world().get::<Walker>(entity).map(|w| w.received.clone()).unwrap_or_default()
}

/// Solid column covering cells x = 2, y = 0..=2.
fn spawn_wall(app: &mut App) {
    let cell = app.world().resource::<NavigationConfig>().cell_size;
    app.world_mut().spawn(SimBody::static_box(
        Category::Solid,
        Vec2::new(2.0 * cell, 0.0),
        cell,
        3.0 * cell,
    ));
}

#[test]
fn test_inline_result_arrives_on_a_later_tick() {
    let mut app = setup_app();
    spawn_wall(&mut app);

    let walker = app
        .world_mut()
        .spawn((Walker::new((0, 0), (4, 0)), Pathfinding::new(orthogonal_params(), INTERVAL)))
        .id();

    step(&mut app);
    assert!(received(&app, walker).is_empty());

    // Interval elapses: the search runs but is only parked.
    step(&mut app);
    assert!(received(&app, walker).is_empty());
    assert!(app.world().get::<Pathfinding>(walker).and_then(|p| p.pending_result()).is_some());

    step(&mut app);
    let results = received(&app, walker);
    assert_eq!(results.len(), 1);

    let path = results[0].path.as_ref().expect("path around the wall");
    assert_eq!(path.first(), Some(&GridCoordinate::new(0, 0)));
    assert_eq!(path.last(), Some(&GridCoordinate::new(4, 0)));
    assert!(path.iter().all(|cell| !(cell.x == 2 && (0..=2).contains(&cell.y))));
}

#[test]
fn test_paused_requester_is_not_searched() {
    let mut app = setup_app();
    let mut walker = Walker::new((0, 0), (3, 0));
    walker.paused = true;
    let walker = app
        .world_mut()
        .spawn((walker, Pathfinding::new(orthogonal_params(), INTERVAL)))
        .id();

    for _ in 0..6 {
        step(&mut app);
    }

    assert!(received(&app, walker).is_empty());
    assert!(app.world().get::<Pathfinding>(walker).and_then(|p| p.last_result()).is_none());
}

#[test]
fn test_background_result_is_delivered() {
    let mut app = setup_app();
    spawn_wall(&mut app);

    let walker = app
        .world_mut()
        .spawn((
            Walker::new((0, 0), (4, 0)),
            Pathfinding::new(orthogonal_params(), INTERVAL).in_background(),
        ))
        .id();

    step(&mut app);
    step(&mut app);
    assert!(app.world().resource::<AsyncPathfinder>().is_in_flight(walker));
    assert!(received(&app, walker).is_empty());

    for _ in 0..200 {
        if !received(&app, walker).is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(2));
        step(&mut app);
    }

    let results = received(&app, walker);
    assert!(!results.is_empty(), "background search never delivered");
    // Under the wall through y = -1.
    assert_eq!(results[0].path.as_ref().map(|p| p.len()), Some(7));
}

#[test]
fn test_reset_drops_pending_result_and_restarts_interval() {
    let mut app = setup_app();
    let walker = app
        .world_mut()
        .spawn((Walker::new((0, 0), (3, 0)), Pathfinding::new(orthogonal_params(), INTERVAL)))
        .id();

    step(&mut app);
    step(&mut app);
    assert!(app.world().get::<Pathfinding>(walker).and_then(|p| p.pending_result()).is_some());

    app.world_mut().write_message(ResetPathfinding { entity: walker });
    step(&mut app);

    assert!(received(&app, walker).is_empty());
    assert!(app.world().get::<Pathfinding>(walker).and_then(|p| p.pending_result()).is_none());

    // Fresh interval: one more step elapses it, the step after delivers.
    step(&mut app);
    step(&mut app);
    assert_eq!(received(&app, walker).len(), 1);
}

#[test]
fn test_despawned_entity_releases_its_worker_slot() {
    let mut app = setup_app();
    let mut walker = Walker::new((0, 0), (50, 0));
    walker.filter_delay = Some(Duration::from_millis(20));
    let params = PathfinderParams {
        max_iterations: 2,
        ..orthogonal_params()
    };
    let walker = app
        .world_mut()
        .spawn((walker, Pathfinding::new(params, INTERVAL).in_background()))
        .id();

    step(&mut app);
    step(&mut app);
    assert_eq!(app.world().resource::<AsyncPathfinder>().in_flight_count(), 1);

    app.world_mut().despawn(walker);
    step(&mut app);

    assert_eq!(app.world().resource::<AsyncPathfinder>().in_flight_count(), 0);
}

#[test]
fn test_worker_settings_follow_config_changes() {
    let mut app = setup_app();
    step(&mut app);
    assert_eq!(app.world().resource::<AsyncPathfinder>().threads(), 2);

    {
        let mut config = app.world_mut().resource_mut::<NavigationConfig>();
        config.worker_threads = 3;
        config.async_timeout_ms = 25;
    }
    step(&mut app);

    let workers = app.world().resource::<AsyncPathfinder>();
    assert_eq!(workers.threads(), 3);
    assert_eq!(workers.timeout(), Duration::from_millis(25));
    assert!(workers.is_accepting());
}
