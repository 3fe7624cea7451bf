//! Deterministic game rules module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body handle)
//! - Physics only through the `PhysicsWorld` trait, no rendering or platform code

pub mod balance;
pub mod collision;
pub mod memory;
pub mod setup;
pub mod spawner;
pub mod state;
pub mod telemetry;
pub mod tick;
pub mod world;

pub use collision::{PairAction, ResolveReport, resolve_contacts};
pub use memory::MemoryWorld;
pub use setup::{Bucket, Rig, Side, build_bucket};
pub use state::{
    BlockSpec, ColorClass, Entity, EntityRegistry, GameEvent, GamePhase, GameState, Label,
    ScoreLedger, SpawnSchedule, despawn,
};
pub use telemetry::Snapshot;
pub use tick::{Game, TickInput, after_step, before_step};
pub use world::{
    BodyDesc, BodyHandle, ContactPair, JointDesc, JointHandle, JointKind, PhysicsWorld, RectPart,
    Shape,
};
