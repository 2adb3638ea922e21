//! # Sidebar Shared
//!
//! Common types used by the scheduler, the config resolver and the board
//! registry.
//!
//! ## CRITICAL RULE
//!
//! This crate is a leaf. It must never depend on another workspace crate.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod entity;

pub use constants::{
    DEFAULT_UPDATE_INTERVAL_TICKS, JOIN_DELAY_TICKS, PERMISSION_RELOAD, PERMISSION_TOGGLE,
    REFRESH_INITIAL_DELAY_TICKS, TICK_DURATION_MILLIS, TICK_RATE, WORLD_CHANGE_DELAY_TICKS,
};
pub use entity::{EntityContext, EntityId, PlayerContext, SharedContext};
