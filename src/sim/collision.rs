//! Collision rules: merging and bomb detonation
//!
//! Consumes the contact pairs produced by a physics step and applies the game
//! rules to them. Every body is re-checked for presence before it is touched,
//! so a block that was already merged or blown away earlier in the same batch
//! is skipped silently.

use glam::Vec2;

use super::spawner::create_block;
use super::state::{BlockSpec, GameEvent, GameState, Label, despawn};
use super::world::{BodyHandle, ContactPair, PhysicsWorld};
use crate::tuning::Tuning;

/// What a single contact pair means for the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairAction {
    Detonate(BodyHandle),
    Merge(BodyHandle, BodyHandle),
    Ignore,
}

/// Outcome of resolving one contact batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    pub merges: usize,
    pub detonations: usize,
    pub score_delta: f64,
    /// Blocks created by merges this batch
    pub created: Vec<BodyHandle>,
    /// Explosion impulses handed to the world
    pub impulses: Vec<(BodyHandle, Vec2)>,
}

/// Decide what a pair means. Bombs take priority over merges.
pub fn classify(state: &GameState, pair: ContactPair) -> PairAction {
    let registry = &state.registry;
    let label_a = registry.label(pair.a);
    let label_b = registry.label(pair.b);

    if label_a == Some(Label::Bomb) {
        return PairAction::Detonate(pair.a);
    }
    if label_b == Some(Label::Bomb) {
        return PairAction::Detonate(pair.b);
    }

    let color = |h: BodyHandle| registry.get(h).and_then(|e| e.block).map(|spec| spec.color);
    match (color(pair.a), color(pair.b)) {
        (Some(a), Some(b)) if a == b && pair.a != pair.b => PairAction::Merge(pair.a, pair.b),
        _ => PairAction::Ignore,
    }
}

/// Outward impulse on a body at `body_pos` from a blast at `origin`.
///
/// Magnitude falls off linearly from the max at the center to zero at the
/// radius. `None` at or beyond the radius, or when the two points coincide.
pub fn explosion_impulse(tuning: &Tuning, origin: Vec2, body_pos: Vec2) -> Option<Vec2> {
    let offset = body_pos - origin;
    let distance = offset.length();
    if distance >= tuning.explosion_radius {
        return None;
    }
    let direction = offset.normalize_or_zero();
    if direction == Vec2::ZERO {
        return None;
    }
    let falloff = (tuning.explosion_radius - distance) / tuning.explosion_radius;
    let magnitude = tuning.explosion_max_impulse * falloff;
    Some(direction * magnitude)
}

/// Remove a bomb and push every nearby dynamic body away from it.
///
/// Returns the impulses applied, or `None` if the bomb was already gone.
pub fn detonate(
    state: &mut GameState,
    world: &mut dyn PhysicsWorld,
    bomb: BodyHandle,
) -> Option<Vec<(BodyHandle, Vec2)>> {
    if state.registry.label(bomb) != Some(Label::Bomb) {
        return None;
    }
    let origin = world.position(bomb)?;
    despawn(world, &mut state.registry, bomb)?;

    let mut impulses = Vec::new();
    for handle in world.body_handles() {
        if world.is_static(handle) {
            continue;
        }
        let Some(pos) = world.position(handle) else {
            continue;
        };
        if let Some(impulse) = explosion_impulse(&state.tuning, origin, pos) {
            world.apply_impulse(handle, impulse);
            impulses.push((handle, impulse));
        }
    }

    log::debug!(
        "Bomb {:?} detonated at ({:.0}, {:.0}), {} bodies pushed",
        bomb,
        origin.x,
        origin.y,
        impulses.len()
    );
    state.events.push(GameEvent::Detonated {
        bomb,
        pos: origin,
        affected: impulses.len(),
    });
    Some(impulses)
}

/// Recipe for the block two same-colored blocks merge into
pub fn merged_spec(tuning: &Tuning, source: &BlockSpec) -> BlockSpec {
    BlockSpec {
        color: source.color,
        size: source.size * tuning.merge_size_factor,
        density: source.density * tuning.merge_density_factor,
        friction: source.friction,
    }
}

/// Merge two same-colored blocks into one bigger, denser block at their
/// midpoint. The first block's recipe is the one scaled up.
///
/// Returns the new block and the points earned, or `None` if either block is
/// already gone or they do not match.
pub fn merge_blocks(
    state: &mut GameState,
    world: &mut dyn PhysicsWorld,
    a: BodyHandle,
    b: BodyHandle,
) -> Option<(BodyHandle, f64)> {
    if a == b {
        return None;
    }
    let spec_a = state.registry.get(a)?.block?;
    let spec_b = state.registry.get(b)?.block?;
    if spec_a.color != spec_b.color {
        return None;
    }
    let pos_a = world.position(a)?;
    let pos_b = world.position(b)?;
    let midpoint = (pos_a + pos_b) * 0.5;

    despawn(world, &mut state.registry, a)?;
    despawn(world, &mut state.registry, b)?;

    let spec = merged_spec(&state.tuning, &spec_a);
    let created = create_block(world, &mut state.registry, spec, midpoint);
    let points = state.tuning.merge_score * f64::from(spec.color.weight());
    state.score.credit(points);

    log::debug!(
        "Merged {:?}+{:?} -> {:?} ({:?}, size {:.1}), +{} points",
        a,
        b,
        created,
        spec.color,
        spec.size,
        points
    );
    state.events.push(GameEvent::Merged {
        removed: [a, b],
        created,
        color: spec.color,
        pos: midpoint,
        points,
    });
    Some((created, points))
}

/// Apply the game rules to one step's contact pairs, in order.
///
/// Each pair is handled on its own; with `Tuning::bomb_ends_batch` set, the
/// first bomb pair ends the batch instead.
pub fn resolve_contacts(
    state: &mut GameState,
    world: &mut dyn PhysicsWorld,
    pairs: &[ContactPair],
) -> ResolveReport {
    let mut report = ResolveReport::default();

    for &pair in pairs {
        match classify(state, pair) {
            PairAction::Detonate(bomb) => {
                if let Some(impulses) = detonate(state, world, bomb) {
                    report.detonations += 1;
                    report.impulses.extend(impulses);
                }
                if state.tuning.bomb_ends_batch {
                    break;
                }
            }
            PairAction::Merge(a, b) => {
                if let Some((created, points)) = merge_blocks(state, world, a, b) {
                    report.merges += 1;
                    report.score_delta += points;
                    report.created.push(created);
                }
            }
            PairAction::Ignore => {}
        }
    }

    report
}
