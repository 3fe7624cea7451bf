//! Falling object spawner
//!
//! Drops a block or bomb above the playfield whenever the spawn interval has
//! elapsed, then shortens the interval toward its floor.

use glam::Vec2;
use rand::Rng;

use super::state::{BlockSpec, ColorClass, Entity, EntityRegistry, GameEvent, GameState, Label};
use super::world::{BodyDesc, BodyHandle, PhysicsWorld, Shape};
use crate::tuning::Tuning;

/// Horizontal spawn band `[margin, width - margin]`, collapsed to the center
/// when the viewport is too narrow to hold it
pub fn spawn_x_range(tuning: &Tuning) -> (f32, f32) {
    let width = tuning.viewport_width.max(0.0);
    let lo = tuning.spawn_margin;
    let hi = width - tuning.spawn_margin;
    if lo <= hi {
        (lo, hi)
    } else {
        let mid = width / 2.0;
        (mid, mid)
    }
}

/// Recipe for a freshly spawned block of `color`
pub fn block_spec(tuning: &Tuning, color: ColorClass) -> BlockSpec {
    BlockSpec {
        color,
        size: tuning.block_size,
        density: tuning.block_base_density * color.weight(),
        friction: tuning.block_friction,
    }
}

/// Create a block body and register it
pub fn create_block(
    world: &mut dyn PhysicsWorld,
    registry: &mut EntityRegistry,
    spec: BlockSpec,
    pos: Vec2,
) -> BodyHandle {
    let handle = world.create_body(
        &BodyDesc::new(
            Label::Block,
            Shape::Rect {
                width: spec.size,
                height: spec.size,
            },
            pos,
        )
        .density(spec.density)
        .friction(spec.friction),
    );
    registry.insert(handle, Entity::block(spec));
    handle
}

/// Create a bomb body and register it
pub fn create_bomb(
    world: &mut dyn PhysicsWorld,
    registry: &mut EntityRegistry,
    tuning: &Tuning,
    pos: Vec2,
) -> BodyHandle {
    let handle = world.create_body(
        &BodyDesc::new(
            Label::Bomb,
            Shape::Circle {
                radius: tuning.bomb_radius,
            },
            pos,
        )
        .density(tuning.bomb_density)
        .restitution(tuning.bomb_restitution),
    );
    registry.insert(handle, Entity::tagged(Label::Bomb));
    handle
}

/// Spawn at most one object if the interval has elapsed.
///
/// Returns the new body, or `None` when nothing was due or the game is over.
pub fn maybe_spawn(state: &mut GameState, world: &mut dyn PhysicsWorld) -> Option<BodyHandle> {
    if state.is_game_over() || !state.spawn.is_due(state.clock_ms) {
        return None;
    }

    let (x_lo, x_hi) = spawn_x_range(&state.tuning);
    let x = if x_lo < x_hi {
        state.rng.random_range(x_lo..=x_hi)
    } else {
        x_lo
    };
    let y = if state.tuning.spawn_y_min < state.tuning.spawn_y_max {
        state
            .rng
            .random_range(state.tuning.spawn_y_min..=state.tuning.spawn_y_max)
    } else {
        state.tuning.spawn_y_min
    };
    let pos = Vec2::new(x, y);

    let is_bomb = state.rng.random_bool(state.tuning.bomb_chance.clamp(0.0, 1.0));
    let (handle, label, color) = if is_bomb {
        let handle = create_bomb(world, &mut state.registry, &state.tuning, pos);
        (handle, Label::Bomb, None)
    } else {
        let color = ColorClass::ALL[state.rng.random_range(0..ColorClass::ALL.len())];
        let spec = block_spec(&state.tuning, color);
        let handle = create_block(world, &mut state.registry, spec, pos);
        (handle, Label::Block, Some(color))
    };

    state.spawn.record_spawn(state.clock_ms);
    log::debug!(
        "Spawned {:?} {:?} at ({:.0}, {:.0}), next interval {:.0}ms",
        label,
        color,
        pos.x,
        pos.y,
        state.spawn.interval_ms
    );
    state.events.push(GameEvent::Spawned {
        handle,
        label,
        color,
        pos,
    });
    Some(handle)
}
