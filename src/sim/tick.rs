//! Fixed timestep simulation tick
//!
//! One tick is: sample input, run the balance controller and spawner, let the
//! physics world integrate, then resolve that step's contacts. Contacts from a
//! step are only ever resolved against the world as it was during that step,
//! so a block created by a merge shows up in next tick's contacts at the
//! earliest.

use serde::{Deserialize, Serialize};

use super::balance::run_controller;
use super::collision::{ResolveReport, resolve_contacts};
use super::spawner::{maybe_spawn, spawn_x_range};
use super::state::{GameEvent, GameState};
use super::telemetry::Snapshot;
use super::world::{ContactPair, PhysicsWorld};
use crate::consts::{MAX_SUBSTEPS, SIM_DT, SIM_HZ};
use crate::tuning::{Tuning, TuningError};

/// Latched input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
}

/// Everything that runs before the physics step: clock, controller, then
/// spawner
pub fn before_step(state: &mut GameState, world: &mut dyn PhysicsWorld, input: &TickInput) {
    if !state.is_game_over() {
        state.time_ticks += 1;
        // Derived from whole ticks so deadlines on tick boundaries stay exact
        state.clock_ms = state.time_ticks as f64 * 1000.0 / f64::from(SIM_HZ);
    }
    run_controller(state, world, input);
    maybe_spawn(state, world);
}

/// Resolve the contacts produced by the physics step. Nothing happens once
/// the game is over.
pub fn after_step(
    state: &mut GameState,
    world: &mut dyn PhysicsWorld,
    contacts: &[ContactPair],
) -> ResolveReport {
    if state.is_game_over() {
        return ResolveReport::default();
    }
    resolve_contacts(state, world, contacts)
}

/// A running game: the physics world plus the rules context that drives it
#[derive(Debug)]
pub struct Game<W: PhysicsWorld> {
    pub world: W,
    pub state: GameState,
    /// Unsimulated frame time carried between `update` calls (seconds)
    accumulator: f32,
}

impl<W: PhysicsWorld> Game<W> {
    /// Build the rig in `world` and start a run
    pub fn new(mut world: W, seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        let (lo, hi) = spawn_x_range(&tuning);
        if lo == hi {
            log::warn!(
                "Viewport width {} too narrow for spawn margin {}, spawning at x={}",
                tuning.viewport_width,
                tuning.spawn_margin,
                lo
            );
        }
        let state = GameState::new(&mut world, seed, tuning);
        log::info!("Game initialized with seed: {}", seed);
        Ok(Self {
            world,
            state,
            accumulator: 0.0,
        })
    }

    /// Run exactly one fixed-order tick of `SIM_DT`
    pub fn tick(&mut self, input: &TickInput) -> Snapshot {
        before_step(&mut self.state, &mut self.world, input);
        let contacts = self.world.step(SIM_DT);
        after_step(&mut self.state, &mut self.world, &contacts);
        Snapshot::capture(&self.state)
    }

    /// Advance by a variable frame time using fixed `SIM_DT` ticks.
    /// Caps the work per frame at `MAX_SUBSTEPS` and drops whatever backlog
    /// the cap leaves behind.
    pub fn update(&mut self, input: &TickInput, frame_dt: f32) -> Snapshot {
        self.accumulator += frame_dt.clamp(0.0, 0.25);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick(input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        Snapshot::capture(&self.state)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }
}

impl<W: PhysicsWorld + Default> Game<W> {
    /// Throw away the world and all run state and start over
    pub fn restart(&mut self, seed: u64) {
        let tuning = self.state.tuning.clone();
        self.world = W::default();
        self.state = GameState::new(&mut self.world, seed, tuning);
        self.accumulator = 0.0;
        log::info!("Game restarted with seed: {}", seed);
    }
}
