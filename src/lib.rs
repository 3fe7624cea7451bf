//! Beam Balance - A pivoted-beam balancing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic game rules (balance control, spawning, merging, bombs)
//! - `tuning`: Data-driven game balance
//!
//! The physics solver, rendering and input polling live outside this crate.
//! They talk to the rules layer through [`sim::PhysicsWorld`], [`sim::TickInput`]
//! and [`sim::Snapshot`].

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep (one physics step per tick)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Player base (the shifting weight)
    pub const PLAYER_WIDTH: f32 = 80.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;
    pub const PLAYER_DENSITY: f32 = 0.01;

    /// Balance beam
    pub const BEAM_WIDTH: f32 = 400.0;
    pub const BEAM_HEIGHT: f32 = 15.0;
    pub const BEAM_DENSITY: f32 = 0.002;

    /// Buckets hanging off the beam ends
    pub const BUCKET_WIDTH: f32 = 80.0;
    pub const BUCKET_HEIGHT: f32 = 60.0;
    pub const BUCKET_WALL: f32 = 8.0;
    pub const BUCKET_DENSITY: f32 = 0.001;

    /// Bodies sharing a negative group never collide with each other
    pub const RIG_COLLISION_GROUP: i32 = -1;

    /// Gravity used by the in-memory world (pixels/s², y grows downward)
    pub const GRAVITY: f32 = 980.0;
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
