//! Game state and core simulation types
//!
//! All per-run state lives in [`GameState`]. It is constructed once per run
//! and thrown away wholesale on restart.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::setup::{Rig, build_rig};
use super::world::{BodyHandle, PhysicsWorld};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Running,
    /// Beam tipped past the max angle. Terminal until restart.
    GameOver,
}

/// Game-relevant role of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    PlayerBase,
    Beam,
    Bucket,
    Block,
    Bomb,
}

/// Block categories, in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorClass {
    Red,
    Green,
    Blue,
    Purple,
}

impl ColorClass {
    pub const ALL: [ColorClass; 4] = [
        ColorClass::Red,
        ColorClass::Green,
        ColorClass::Blue,
        ColorClass::Purple,
    ];

    /// Scales block density and merge score
    pub fn weight(self) -> f32 {
        match self {
            ColorClass::Red => 1.0,
            ColorClass::Green => 1.5,
            ColorClass::Blue => 2.0,
            ColorClass::Purple => 3.0,
        }
    }
}

/// Physical recipe of a block, kept so merges can scale it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub color: ColorClass,
    /// Edge length of the square
    pub size: f32,
    pub density: f32,
    pub friction: f32,
}

/// Registry entry for a live body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub label: Label,
    /// Present only for `Label::Block`
    pub block: Option<BlockSpec>,
}

impl Entity {
    pub fn tagged(label: Label) -> Self {
        Self { label, block: None }
    }

    pub fn block(spec: BlockSpec) -> Self {
        Self {
            label: Label::Block,
            block: Some(spec),
        }
    }
}

/// Live bodies and their tags, iterated in handle order for determinism
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<BodyHandle, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: BodyHandle, entity: Entity) {
        self.entities.insert(handle, entity);
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Entity> {
        self.entities.get(&handle)
    }

    pub fn label(&self, handle: BodyHandle) -> Option<Label> {
        self.entities.get(&handle).map(|e| e.label)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<Entity> {
        self.entities.remove(&handle)
    }

    pub fn count(&self, label: Label) -> usize {
        self.entities.values().filter(|e| e.label == label).count()
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BodyHandle, &BlockSpec)> {
        self.entities
            .iter()
            .filter_map(|(h, e)| e.block.as_ref().map(|spec| (*h, spec)))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Remove a body from the world and the registry in one step.
///
/// Returns `None` without touching anything if either side has already lost
/// the body, so a handle can never be processed twice.
pub fn despawn(
    world: &mut dyn PhysicsWorld,
    registry: &mut EntityRegistry,
    handle: BodyHandle,
) -> Option<Entity> {
    if !world.contains(handle) || !registry.contains(handle) {
        return None;
    }
    world.remove_body(handle);
    registry.remove(handle)
}

/// Running score, only ever increased by merges
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreLedger {
    total: f64,
    merges: u32,
}

impl ScoreLedger {
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn merges(&self) -> u32 {
        self.merges
    }

    /// Credit a merge. Negative or NaN amounts are ignored.
    pub fn credit(&mut self, points: f64) {
        if points > 0.0 {
            self.total += points;
            self.merges += 1;
        }
    }
}

/// Spawn cadence: interval shrinks by a fixed step until it hits the floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSchedule {
    pub last_spawn_ms: f64,
    pub interval_ms: f64,
    pub step_ms: f64,
    pub floor_ms: f64,
}

impl SpawnSchedule {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            last_spawn_ms: 0.0,
            interval_ms: tuning.spawn_interval_initial_ms.max(tuning.spawn_interval_floor_ms),
            step_ms: tuning.spawn_interval_step_ms.max(0.0),
            floor_ms: tuning.spawn_interval_floor_ms,
        }
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms - self.last_spawn_ms > self.interval_ms
    }

    /// Record a spawn at `now_ms` and tighten the interval
    pub fn record_spawn(&mut self, now_ms: f64) {
        self.last_spawn_ms = now_ms;
        if self.interval_ms > self.floor_ms {
            self.interval_ms = (self.interval_ms - self.step_ms).max(self.floor_ms);
        }
    }
}

/// Discrete things that happened during a tick, for effects and audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned {
        handle: BodyHandle,
        label: Label,
        color: Option<ColorClass>,
        pos: Vec2,
    },
    Merged {
        removed: [BodyHandle; 2],
        created: BodyHandle,
        color: ColorClass,
        pos: Vec2,
        points: f64,
    },
    Detonated {
        bomb: BodyHandle,
        pos: Vec2,
        affected: usize,
    },
    WarningChanged(bool),
    GameOver {
        score: f64,
        angle: f32,
    },
}

/// Complete per-run game context
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Fixed bodies created at startup
    pub rig: Rig,
    pub registry: EntityRegistry,
    pub score: ScoreLedger,
    pub spawn: SpawnSchedule,
    /// Simulated time since the run started
    pub clock_ms: f64,
    pub time_ticks: u64,
    /// Beam tilt sampled by the last controller pass
    pub beam_angle: f32,
    pub warning: bool,
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Build the rig in `world` and start a fresh run
    pub fn new(world: &mut dyn PhysicsWorld, seed: u64, tuning: Tuning) -> Self {
        let mut registry = EntityRegistry::new();
        let rig = build_rig(world, &tuning, &mut registry);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            spawn: SpawnSchedule::from_tuning(&tuning),
            tuning,
            phase: GamePhase::Running,
            rig,
            registry,
            score: ScoreLedger::default(),
            clock_ms: 0.0,
            time_ticks: 0,
            beam_angle: 0.0,
            warning: false,
            events: Vec::new(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemoryWorld;
    use crate::sim::world::{BodyDesc, Shape};

    #[test]
    fn test_new_state_registers_rig() {
        let mut world = MemoryWorld::new();
        let state = GameState::new(&mut world, 7, Tuning::default());
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.registry.label(state.rig.beam), Some(Label::Beam));
        assert_eq!(state.registry.label(state.rig.player), Some(Label::PlayerBase));
        assert_eq!(state.registry.count(Label::Bucket), 2);
        assert_eq!(state.registry.count(Label::Block), 0);
        assert_eq!(state.score.total(), 0.0);
    }

    #[test]
    fn test_despawn_is_atomic_and_idempotent() {
        let mut world = MemoryWorld::new();
        let mut registry = EntityRegistry::new();
        let handle = world.create_body(&BodyDesc::new(
            Label::Bomb,
            Shape::Circle { radius: 5.0 },
            Vec2::ZERO,
        ));
        registry.insert(handle, Entity::tagged(Label::Bomb));

        assert!(despawn(&mut world, &mut registry, handle).is_some());
        assert!(!world.contains(handle));
        assert!(!registry.contains(handle));
        assert!(despawn(&mut world, &mut registry, handle).is_none());
    }

    #[test]
    fn test_despawn_skips_body_missing_from_world() {
        let mut world = MemoryWorld::new();
        let mut registry = EntityRegistry::new();
        registry.insert(BodyHandle(99), Entity::tagged(Label::Bomb));
        assert!(despawn(&mut world, &mut registry, BodyHandle(99)).is_none());
        assert!(registry.contains(BodyHandle(99)));
    }

    #[test]
    fn test_score_ledger_ignores_non_positive() {
        let mut score = ScoreLedger::default();
        score.credit(150.0);
        score.credit(-20.0);
        score.credit(f64::NAN);
        assert_eq!(score.total(), 150.0);
        assert_eq!(score.merges(), 1);
    }

    #[test]
    fn test_spawn_schedule_stops_at_floor() {
        let mut schedule = SpawnSchedule {
            last_spawn_ms: 0.0,
            interval_ms: 130.0,
            step_ms: 50.0,
            floor_ms: 100.0,
        };
        schedule.record_spawn(200.0);
        assert_eq!(schedule.interval_ms, 100.0);
        schedule.record_spawn(400.0);
        assert_eq!(schedule.interval_ms, 100.0);
        assert!(!schedule.is_due(500.0));
        assert!(schedule.is_due(500.5));
    }

    #[test]
    fn test_color_order_and_weights() {
        assert_eq!(ColorClass::ALL[0], ColorClass::Red);
        assert_eq!(ColorClass::Red.weight(), 1.0);
        assert!(
            ColorClass::ALL
                .windows(2)
                .all(|w| w[0].weight() < w[1].weight())
        );
    }
}
