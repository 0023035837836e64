use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use harrier::engine::config::NavigationConfig;
use harrier::engine::pathfinding::{
    AsyncPathfinder, PathRequester, PathfinderResult, Pathfinding, PathfindingAppExt,
};
use harrier::engine::world::{BodyKind, Category, GridBounds, GridCoordinate, SimBody, WorldGrid};
use harrier::engine::{EnginePlugin, NavSet, SimTick};

const MAP_WIDTH: i32 = 40;
const MAP_HEIGHT: i32 = 24;
const WALL_CHANCE: f64 = 0.18;
const PATROL_COUNT: usize = 12;
/// Ticks a patrol waits between steps along its path.
const STEP_TICKS: u64 = 4;
const DEFAULT_DEMO_TICKS: u64 = 640;
const LOG_FILES_KEPT: usize = 25;

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    cleanup_old_logs(&log_dir, LOG_FILES_KEPT);

    let now = chrono::Local::now();
    let log_filename = format!("harrier_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path = log_dir.join(&log_filename).to_string_lossy().to_string();

    // One file per run; never rotated mid-run.
    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,harrier=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else { return };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|s| s.starts_with("harrier") && s.ends_with(".log"))
                .unwrap_or(false)
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

/// How long the demo runs, in simulation ticks.
#[derive(Resource)]
struct DemoLength(u64);

/// Wanders between random open cells of the demo map.
#[derive(Component, Debug)]
struct Patrol {
    cell: GridCoordinate,
    goal: GridCoordinate,
    path: Vec<GridCoordinate>,
    next_step: usize,
    arrivals: u32,
}

impl Patrol {
    fn new(cell: GridCoordinate, goal: GridCoordinate) -> Self {
        Self { cell, goal, path: Vec::new(), next_step: 1, arrivals: 0 }
    }
}

impl PathRequester for Patrol {
    fn start(&self) -> GridCoordinate { self.cell }
    fn target(&self) -> GridCoordinate { self.goal }

    fn on_result(&mut self, result: &PathfinderResult) {
        if result.target_reached {
            self.arrivals += 1;
            self.goal = random_cell(&mut rand::rng());
            self.path.clear();
            return;
        }
        match &result.path {
            Some(path) => {
                self.path = path.clone();
                self.next_step = 1;
            }
            // Goal walled in or out of range; try somewhere else.
            None => self.goal = random_cell(&mut rand::rng()),
        }
    }
}

fn random_cell(rng: &mut impl Rng) -> GridCoordinate {
    GridCoordinate::new(rng.random_range(0..MAP_WIDTH), rng.random_range(0..MAP_HEIGHT))
}

fn cell_box(cell: GridCoordinate, cell_size: f32) -> Rect {
    let min = Vec2::new(cell.x as f32, cell.y as f32) * cell_size;
    Rect::from_corners(min, min + Vec2::splat(cell_size))
}

fn setup_demo_world(
    mut commands: Commands,
    config: Res<NavigationConfig>,
    mut grid: ResMut<WorldGrid>,
) {
    let mut rng = rand::rng();
    grid.set_bounds(Some(GridBounds::from_size(MAP_WIDTH, MAP_HEIGHT)));

    let mut walls = 0;
    for x in 0..MAP_WIDTH {
        for y in 0..MAP_HEIGHT {
            if rng.random_bool(WALL_CHANCE) {
                let origin = Vec2::new(x as f32, y as f32) * config.cell_size;
                commands.spawn(SimBody::static_box(Category::Solid, origin, config.cell_size, config.cell_size));
                walls += 1;
            }
        }
    }

    for i in 0..PATROL_COUNT {
        let cell = random_cell(&mut rng);
        let mut pathfinding = Pathfinding::from_config(&config);
        if i % 2 == 1 {
            pathfinding = pathfinding.in_background();
        }
        commands.spawn((
            Patrol::new(cell, random_cell(&mut rng)),
            pathfinding,
            SimBody::new(BodyKind::Dynamic, Category::Actor, cell_box(cell, config.cell_size)),
        ));
    }

    info!(
        "Demo map {}x{}: {} walls, {} patrols ({} in background)",
        MAP_WIDTH, MAP_HEIGHT, walls, PATROL_COUNT, PATROL_COUNT / 2
    );
}

/// Step each patrol one cell along its current path every `STEP_TICKS`.
fn advance_patrols(
    tick: Res<SimTick>,
    config: Res<NavigationConfig>,
    mut patrols: Query<(&mut Patrol, &mut SimBody)>,
) {
    if tick.0 % STEP_TICKS != 0 {
        return;
    }

    for (mut patrol, mut body) in &mut patrols {
        let Some(&next) = patrol.path.get(patrol.next_step) else { continue };
        patrol.cell = next;
        patrol.next_step += 1;
        body.bounds = cell_box(next, config.cell_size);
    }
}

fn report_and_exit(
    tick: Res<SimTick>,
    length: Res<DemoLength>,
    workers: Res<AsyncPathfinder>,
    patrols: Query<(&Patrol, &Pathfinding)>,
    mut exit: MessageWriter<AppExit>,
) {
    if tick.0 % 128 == 0 || tick.0 >= length.0 {
        let routed = patrols.iter().filter(|(_, p)| p.last_result().is_some_and(PathfinderResult::has_path)).count();
        let arrivals: u32 = patrols.iter().map(|(patrol, _)| patrol.arrivals).sum();
        info!(
            "Tick {}: {}/{} patrols routed, {} arrivals, {} searches in flight",
            tick.0,
            routed,
            PATROL_COUNT,
            arrivals,
            workers.in_flight_count()
        );
    }

    if tick.0 >= length.0 {
        exit.write(AppExit::Success);
    }
}

fn main() {
    let log_file = match setup_file_logging() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Failed to set up logging: {err}");
            std::process::exit(1);
        }
    };
    println!("Harrier navigation demo, logging to {log_file}");

    let ticks = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_DEMO_TICKS);

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 64.0))))
        .add_plugins(EnginePlugin)
        .add_path_requester::<Patrol>()
        .insert_resource(DemoLength(ticks))
        .add_systems(PostStartup, setup_demo_world)
        .add_systems(FixedUpdate, (advance_patrols, report_and_exit).chain().after(NavSet::Drive))
        .run();
}
