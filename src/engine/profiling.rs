//! Performance profiling helpers.
//!
//! Both the `#[profile]` attribute and `profile_log!` compile to nothing unless
//! the `perf_stats` feature is enabled.

pub use harrier_macros::profile;
