//! # Timing & Permission Constants
//!
//! Values shared by every crate. Delays are expressed in host ticks.

// =============================================================================
// TICK CONFIGURATION
// =============================================================================

/// Host tick rate (ticks per second).
pub const TICK_RATE: u32 = 20;

/// Duration of one host tick in milliseconds.
pub const TICK_DURATION_MILLIS: u64 = 1_000 / TICK_RATE as u64;

// =============================================================================
// LIFECYCLE DELAYS
// =============================================================================

/// Grace delay between a connect event and the first board creation.
pub const JOIN_DELAY_TICKS: u64 = 5;

/// Delay between a world change and the board rebuild.
pub const WORLD_CHANGE_DELAY_TICKS: u64 = 1;

/// Initial delay before the first refresh cycle runs.
pub const REFRESH_INITIAL_DELAY_TICKS: u64 = 20;

/// Refresh period used when the configuration does not set one.
pub const DEFAULT_UPDATE_INTERVAL_TICKS: u64 = 20;

// =============================================================================
// PERMISSION NODES
// =============================================================================

/// Operator permission required by the `reload` subcommand.
pub const PERMISSION_RELOAD: &str = "sidebar.command";

/// Player permission required by the `toggle` subcommand.
pub const PERMISSION_TOGGLE: &str = "sidebar.toggle";
