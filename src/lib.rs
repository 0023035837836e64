pub mod engine;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a message every 100 ticks when the `perf_stats` feature is enabled.
///
/// `$tick` is anything with a `.0: u64` tick counter, normally `Res<SimTick>`.
/// Without `perf_stats` the macro expands to nothing and its arguments are
/// never evaluated.
///
/// ```ignore
/// profile_log!(tick, "[PATHFINDING] {} searches in flight", workers.in_flight_count());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
